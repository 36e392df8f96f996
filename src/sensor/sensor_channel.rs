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

use crate::acquisition::sample_cache::{RawSample, SampleCache};
use crate::control::RunControl;
use crate::sensor::calibration::{calibrate, round_to_millivolts, CalibrationModel};
use crate::sensor::SensorConfig;
use core::cell::Cell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Instant, Timer};
use log::{debug, info, warn};

/// Rejected values in a row before the channel starts warning about it.
pub const MAX_CONSECUTIVE_REJECTS: u8 = 2;

/// Destination of a sensor's readings.
pub trait UpdateSink {
    /// `fresh` is true when `value` was derived from a sample not seen before, false for the
    /// heartbeat that repeats the current value.
    fn push_update(&mut self, value: f32, fresh: bool);
}

impl<T: UpdateSink + ?Sized> UpdateSink for &mut T {
    fn push_update(&mut self, value: f32, fresh: bool) {
        (**self).push_update(value, fresh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub value: f32,
}

/// Last value of a sensor, readable from outside while the channel loop owns the channel.
pub struct SensorStatus {
    reading: Mutex<CriticalSectionRawMutex, Cell<SensorReading>>,
}

impl SensorStatus {
    pub const fn new() -> Self {
        Self {
            reading: Mutex::new(Cell::new(SensorReading { value: 0.0 })),
        }
    }

    pub fn get_state(&self) -> SensorReading {
        self.reading.lock(|reading| reading.get())
    }

    fn set(&self, value: f32) {
        self.reading.lock(|reading| reading.set(SensorReading { value }));
    }
}

impl Default for SensorStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorState {
    last_value: f32,
    last_observed: Option<Instant>,
    reject_counter: u8,
}

impl SensorState {
    const fn new() -> Self {
        Self {
            last_value: 0.0,
            last_observed: None,
            reject_counter: 0,
        }
    }

    pub fn last_value(&self) -> f32 {
        self.last_value
    }

    pub fn last_observed(&self) -> Option<Instant> {
        self.last_observed
    }

    pub fn reject_counter(&self) -> u8 {
        self.reject_counter
    }

    fn is_fresh(&self, sample: &RawSample) -> bool {
        match self.last_observed {
            Some(seen) => sample.timestamp() > seen,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorTiming {
    /// Time between loop iterations, and so between heartbeats
    pub heartbeat_period: Duration,
}

impl Default for SensorTiming {
    fn default() -> Self {
        Self {
            heartbeat_period: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivationError {
    /// The configured transform produced NaN or an infinity for this input voltage.
    NonFinite { volts: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Nothing has been published yet.
    NoSample,
    /// The latest sample was already consumed.
    Stale,
    Fresh(f32),
    Rejected(DerivationError),
}

/// One logical sensor bound to one ADC input.
pub struct SensorChannel<'a, S> {
    name: &'a str,
    config: SensorConfig,
    model: CalibrationModel,
    state: SensorState,
    timing: SensorTiming,
    cache: &'a SampleCache,
    status: &'a SensorStatus,
    sink: S,
}

impl<'a, S> SensorChannel<'a, S>
where
    S: UpdateSink,
{
    pub fn new(
        name: &'a str,
        config: SensorConfig,
        cache: &'a SampleCache,
        status: &'a SensorStatus,
        sink: S,
    ) -> Self {
        Self {
            name,
            model: CalibrationModel::from_config(&config),
            config,
            state: SensorState::new(),
            timing: SensorTiming::default(),
            cache,
            status,
            sink,
        }
    }

    pub fn with_timing(mut self, timing: SensorTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn state(&self) -> &SensorState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn get_state(&self) -> SensorReading {
        SensorReading {
            value: self.state.last_value,
        }
    }

    /// Polls the cache every heartbeat period until `control` is deactivated.
    pub async fn run(&mut self, control: &RunControl) {
        debug!(
            "{}: reading {:?} as {:?}",
            self.name,
            self.config.channel(),
            self.config.sensor_type()
        );
        while control.is_active() {
            self.step();
            Timer::after(self.timing.heartbeat_period).await;
        }
        debug!("{}: stopped", self.name);
    }

    /// One loop iteration: consume the latest sample if it is new, then send the heartbeat.
    /// Nothing is sent before the first sample is published.
    pub fn step(&mut self) -> StepOutcome {
        let outcome = match self.cache.latest() {
            None => return StepOutcome::NoSample,
            Some(sample) if !self.state.is_fresh(&sample) => StepOutcome::Stale,
            Some(sample) => self.consume(&sample),
        };

        if let StepOutcome::Fresh(value) = outcome {
            self.sink.push_update(value, true);
            info!("{}: {}", self.name, value);
        }
        self.sink.push_update(self.state.last_value, false);
        self.status.set(self.state.last_value);

        outcome
    }

    fn consume(&mut self, sample: &RawSample) -> StepOutcome {
        self.state.last_observed = Some(sample.timestamp());
        let volts = round_to_millivolts(sample.voltage(self.config.channel()));

        match self.derive(volts) {
            Ok(value) => {
                self.state.last_value = value;
                self.state.reject_counter = 0;
                StepOutcome::Fresh(value)
            }
            Err(e) => {
                self.state.reject_counter = self.state.reject_counter.saturating_add(1);
                if self.state.reject_counter >= MAX_CONSECUTIVE_REJECTS {
                    warn!(
                        "{}: {} values in a row rejected, last {:?}",
                        self.name, self.state.reject_counter, e
                    );
                } else {
                    debug!("{}: value rejected {:?}", self.name, e);
                }
                StepOutcome::Rejected(e)
            }
        }
    }

    fn derive(&self, volts: f32) -> Result<f32, DerivationError> {
        let values = calibrate(volts, &self.config, &self.model);
        let value = values.select(self.config.sensor_type(), volts);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(DerivationError::NonFinite { volts })
        }
    }
}
