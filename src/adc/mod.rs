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

pub mod board;
pub mod simulated;

use core::fmt::Debug;
use strum::{EnumIter, FromRepr, IntoStaticStr};

pub const CHANNEL_COUNT: usize = 8;

const NEG_AINCOM: u8 = 0x08;

/// Single ended analog inputs of the ADS1256, each measured against AINCOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum Channel {
    Ain0 = 0,
    Ain1 = 1,
    Ain2 = 2,
    Ain3 = 3,
    Ain4 = 4,
    Ain5 = 5,
    Ain6 = 6,
    Ain7 = 7,
}

impl Channel {
    /// MUX register value selecting this input as positive and AINCOM as negative input.
    pub const fn mux(self) -> u8 {
        ((self as u8) << 4) | NEG_AINCOM
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Scan order used for every batch read, one entry per [`Channel`].
pub const CHANNEL_SEQUENCE: [u8; CHANNEL_COUNT] = [
    Channel::Ain0.mux(),
    Channel::Ain1.mux(),
    Channel::Ain2.mux(),
    Channel::Ain3.mux(),
    Channel::Ain4.mux(),
    Channel::Ain5.mux(),
    Channel::Ain6.mux(),
    Channel::Ain7.mux(),
];

/// DRATE register settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
#[repr(u8)]
pub enum DataRate {
    Sps30000 = 0xF0,
    Sps15000 = 0xE0,
    Sps7500 = 0xD0,
    Sps3750 = 0xC0,
    Sps2000 = 0xB0,
    Sps1000 = 0xA1,
    Sps500 = 0x92,
    Sps100 = 0x82,
    Sps60 = 0x72,
    Sps50 = 0x63,
    Sps30 = 0x53,
    Sps25 = 0x43,
    Sps15 = 0x33,
    Sps10 = 0x23,
    Sps5 = 0x13,
    Sps2_5 = 0x03,
}

impl DataRate {
    pub const fn register_value(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcErrorKind {
    /// The device did not answer or a transfer failed. Retrying may succeed, e.g. while the
    /// converter is still booting after power up.
    Transient,
    /// The device or its bus is unusable and retrying will not help.
    Fatal,
}

pub trait AdcError: Debug {
    fn kind(&self) -> AdcErrorKind;
}

/// Capability the acquisition service needs from an ADS1256 style converter. The electrical
/// protocol lives behind this trait.
///
/// None of these calls can be pre-empted: a driver that never returns stalls the caller.
#[allow(async_fn_in_trait)]
pub trait AdcDriver {
    type Error: AdcError;

    /// Program the output data rate used by subsequent conversions.
    async fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Self::Error>;

    /// Run the converter's internal offset and gain self calibration.
    async fn self_calibrate(&mut self) -> Result<(), Self::Error>;

    /// Convert every multiplexer setting of `sequence` in order and return the raw codes.
    async fn read_sequence(
        &mut self,
        sequence: &[u8; CHANNEL_COUNT],
    ) -> Result<[i32; CHANNEL_COUNT], Self::Error>;

    /// Volts represented by one digit of a raw code
    fn volts_per_digit(&self) -> f32;
}
