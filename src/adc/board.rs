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

//! Static description of how the converter is wired on the board.

use strum::{EnumIter, FromRepr};

/// Largest positive code of the 24 bit two's complement conversion result.
pub const FULL_SCALE_CODE: i32 = 0x7F_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u8)]
pub enum PgaGain {
    Gain1 = 1,
    Gain2 = 2,
    Gain4 = 4,
    Gain8 = 8,
    Gain16 = 16,
    Gain32 = 32,
    Gain64 = 64,
}

impl PgaGain {
    pub const fn factor(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardConfig {
    /// Reference voltage across VREFP and VREFN
    pub v_ref: f32,
    pub gain: PgaGain,
}

impl BoardConfig {
    pub const fn new(v_ref: f32, gain: PgaGain) -> Self {
        Self { v_ref, gain }
    }

    /// Input range is +/- 2 * VREF / gain, spread over the positive full scale code.
    pub fn volts_per_digit(&self) -> f32 {
        2.0 * self.v_ref / (self.gain.factor() as f32 * FULL_SCALE_CODE as f32)
    }

    pub fn code_for_voltage(&self, volts: f32) -> i32 {
        let code = volts / self.volts_per_digit();
        if code >= FULL_SCALE_CODE as f32 {
            FULL_SCALE_CODE
        } else if code <= -(FULL_SCALE_CODE as f32) - 1.0 {
            -FULL_SCALE_CODE - 1
        } else {
            code as i32
        }
    }
}

/// Waveshare High-Precision AD/DA board: 2.5 V reference, buffer off, unity gain.
pub static BOARD_CONFIG: BoardConfig = BoardConfig::new(2.5, PgaGain::Gain1);
