// Copyright (C) 2025 Paul Hampson
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License version 3 as  published by the
// Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <https://www.gnu.org/licenses/>.

//! Software stand-in for an ADS1256, used by the host runner when no converter is attached.

use crate::adc::board::BoardConfig;
use crate::adc::{AdcDriver, AdcError, AdcErrorKind, DataRate, CHANNEL_COUNT};
use log::trace;

/// Peak deviation added to every simulated input, in volts.
const NOISE_AMPLITUDE: f32 = 0.002;
const NOISE_PERIOD: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Mirrors the bus errors a real converter produces while it is still powering up.
    NotResponding,
    /// The mux code is not one of the single ended settings.
    InvalidMux(u8),
}

impl AdcError for Error {
    fn kind(&self) -> AdcErrorKind {
        match self {
            Error::NotResponding => AdcErrorKind::Transient,
            Error::InvalidMux(_) => AdcErrorKind::Fatal,
        }
    }
}

pub struct SimulatedAds1256 {
    board: BoardConfig,
    input_volts: [f32; CHANNEL_COUNT],
    unresponsive_reads: u32,
    data_rate: Option<DataRate>,
    calibrations: u32,
    tick: u32,
}

impl SimulatedAds1256 {
    pub fn new(board: BoardConfig, input_volts: [f32; CHANNEL_COUNT]) -> Self {
        Self {
            board,
            input_volts,
            unresponsive_reads: 0,
            data_rate: None,
            calibrations: 0,
            tick: 0,
        }
    }

    /// The first `reads` sequence reads fail as if the device were still booting.
    pub fn with_boot_delay(mut self, reads: u32) -> Self {
        self.unresponsive_reads = reads;
        self
    }

    pub fn data_rate(&self) -> Option<DataRate> {
        self.data_rate
    }

    pub fn calibrations(&self) -> u32 {
        self.calibrations
    }

    fn noise(&self) -> f32 {
        // triangle wave between -1 and 1
        let phase = (self.tick % NOISE_PERIOD) as f32 / NOISE_PERIOD as f32;
        let triangle = 1.0 - 4.0 * (phase - 0.5).abs();
        triangle * NOISE_AMPLITUDE
    }
}

impl AdcDriver for SimulatedAds1256 {
    type Error = Error;

    async fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Self::Error> {
        self.data_rate = Some(rate);
        Ok(())
    }

    async fn self_calibrate(&mut self) -> Result<(), Self::Error> {
        self.calibrations += 1;
        Ok(())
    }

    async fn read_sequence(
        &mut self,
        sequence: &[u8; CHANNEL_COUNT],
    ) -> Result<[i32; CHANNEL_COUNT], Self::Error> {
        if self.unresponsive_reads > 0 {
            self.unresponsive_reads -= 1;
            return Err(Error::NotResponding);
        }

        let mut codes = [0i32; CHANNEL_COUNT];
        for (code, mux) in codes.iter_mut().zip(sequence.iter()) {
            let input = (mux >> 4) as usize;
            if mux & 0x0F != 0x08 || input >= CHANNEL_COUNT {
                return Err(Error::InvalidMux(*mux));
            }
            *code = self
                .board
                .code_for_voltage(self.input_volts[input] + self.noise());
        }
        self.tick = self.tick.wrapping_add(1);
        trace!("Simulated codes {:?}", codes);
        Ok(codes)
    }

    fn volts_per_digit(&self) -> f32 {
        self.board.volts_per_digit()
    }
}
