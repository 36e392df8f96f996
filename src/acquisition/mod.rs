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

pub mod acquisition_service;
pub mod sample_cache;

use crate::adc::{AdcError, AdcErrorKind, DataRate};
use core::fmt::{Debug, Display, Formatter};
use embassy_time::Duration;

/// Sequence reads attempted while waiting for the converter to respond after power up.
pub const BOOT_ATTEMPTS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionConfig {
    pub data_rate: DataRate,
    /// Pause between successful sampling cycles
    pub interval: Duration,
    /// Delay before the first contact with the converter
    pub settle_delay: Duration,
    pub boot_attempts: u32,
    pub boot_retry_delay: Duration,
    /// Pause after a failed sampling cycle
    pub error_backoff: Duration,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            data_rate: DataRate::Sps100,
            interval: Duration::from_secs(5),
            settle_delay: Duration::from_millis(100),
            boot_attempts: BOOT_ATTEMPTS,
            boot_retry_delay: Duration::from_secs(1),
            error_backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    RetriesExhausted,
    FatalDriverError,
}

impl Display for DegradedReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            DegradedReason::RetriesExhausted => write!(f, "converter never responded"),
            DegradedReason::FatalDriverError => write!(f, "converter reported an unrecoverable error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Booting,
    Ready,
    /// Terminal for this service instance, sampling never starts.
    Degraded(DegradedReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    Ready,
    Degraded(DegradedReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionError<E> {
    SetDataRate(E),
    SelfCalibration(E),
    ReadSequence(E),
}

impl<E: AdcError> AcquisitionError<E> {
    pub fn kind(&self) -> AdcErrorKind {
        match self {
            AcquisitionError::SetDataRate(e)
            | AcquisitionError::SelfCalibration(e)
            | AcquisitionError::ReadSequence(e) => e.kind(),
        }
    }
}

impl<E: Debug> Display for AcquisitionError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            AcquisitionError::SetDataRate(e) => write!(f, "setting data rate failed: {:?}", e),
            AcquisitionError::SelfCalibration(e) => write!(f, "self calibration failed: {:?}", e),
            AcquisitionError::ReadSequence(e) => write!(f, "sequence read failed: {:?}", e),
        }
    }
}

/// Running totals kept by the sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcquisitionStats {
    pub cycles: u64,
    pub published: u64,
    pub failures: u64,
    pub consecutive_failures: u32,
}
