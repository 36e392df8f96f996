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

use crate::adc::{Channel, CHANNEL_COUNT};
use core::cell::Cell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::Instant;

/// One batch conversion of all inputs, already scaled to volts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    timestamp: Instant,
    voltages: [f32; CHANNEL_COUNT],
}

impl RawSample {
    pub const fn new(timestamp: Instant, voltages: [f32; CHANNEL_COUNT]) -> Self {
        Self {
            timestamp,
            voltages,
        }
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub fn voltages(&self) -> &[f32; CHANNEL_COUNT] {
        &self.voltages
    }

    pub fn voltage(&self, channel: Channel) -> f32 {
        self.voltages[channel.index()]
    }
}

/// Holds the most recent [`RawSample`]. Written by the acquisition service only, read by any
/// number of sensor channels. A publish replaces the whole sample inside a critical section so
/// readers never see fields from two different samples.
pub struct SampleCache {
    latest: Mutex<CriticalSectionRawMutex, Cell<Option<RawSample>>>,
}

impl SampleCache {
    pub const fn new() -> Self {
        Self {
            latest: Mutex::new(Cell::new(None)),
        }
    }

    pub fn publish(&self, sample: RawSample) {
        self.latest.lock(|latest| latest.set(Some(sample)));
    }

    pub fn latest(&self) -> Option<RawSample> {
        self.latest.lock(|latest| latest.get())
    }
}

impl Default for SampleCache {
    fn default() -> Self {
        Self::new()
    }
}
