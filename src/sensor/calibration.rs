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

//! Voltage to engineering unit conversion. Everything here is a pure function of its inputs.
//!
//! The constants are the historical ones, including the short value of pi, so that readings
//! stay identical to what existing installations have logged.

use crate::sensor::{PressureUnit, SensorConfig, SensorType};

pub const GRAVITY: f32 = 9.807;
pub const PI: f32 = 3.1416;
/// PSI in one kPa
pub const KPA_TO_PSI: f32 = 0.145;
const LITRES_PER_CUBIC_METRE: f32 = 1000.0;

pub fn kpa_to_psi(kpa: f32) -> f32 {
    kpa * KPA_TO_PSI
}

pub fn psi_to_kpa(psi: f32) -> f32 {
    psi / KPA_TO_PSI
}

/// Expresses a pressure given in kPa in `unit`.
pub fn from_kpa(kpa: f32, unit: PressureUnit) -> f32 {
    match unit {
        PressureUnit::Kpa => kpa,
        PressureUnit::Psi => kpa_to_psi(kpa),
    }
}

/// Rounds to whole millivolts.
pub fn round_to_millivolts(volts: f32) -> f32 {
    (volts * 1000.0).round() / 1000.0
}

/// Straight line through the configured (voltage, pressure) end points, in the sensor's
/// pressure unit per volt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationModel {
    slope: f32,
    intercept: f32,
}

impl CalibrationModel {
    /// `SensorConfig` guarantees a non zero voltage span.
    pub fn from_config(config: &SensorConfig) -> Self {
        let slope = (config.pressure_high() - config.pressure_low())
            / (config.volt_high() - config.volt_low());
        let intercept = if config.volt_low() > 0.0 {
            -config.volt_low() * slope
        } else {
            0.0
        };
        Self { slope, intercept }
    }

    pub fn slope(&self) -> f32 {
        self.slope
    }

    pub fn intercept(&self) -> f32 {
        self.intercept
    }

    pub fn pressure(&self, volts: f32) -> f32 {
        self.slope * volts + self.intercept
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedValues {
    /// In the sensor's pressure unit
    pub pressure: f32,
    pub liquid_level_m: f32,
    pub volume_l: f32,
}

impl CalibratedValues {
    /// Picks the quantity reported by a sensor of type `sensor_type`; `volts` is the input the
    /// values were derived from.
    pub fn select(&self, sensor_type: SensorType, volts: f32) -> f32 {
        match sensor_type {
            SensorType::Voltage => volts,
            SensorType::Pressure => self.pressure,
            SensorType::LiquidLevel => self.liquid_level_m,
            SensorType::Volume => self.volume_l,
        }
    }
}

/// The level is the pressure divided by `GRAVITY` in whatever unit the sensor reports pressure.
pub fn calibrate(volts: f32, config: &SensorConfig, model: &CalibrationModel) -> CalibratedValues {
    let pressure = model.pressure(volts);
    let liquid_level_m = pressure / GRAVITY;
    let radius = config.kettle_diameter_m() / 2.0;
    let volume_l = PI * radius * radius * liquid_level_m * LITRES_PER_CUBIC_METRE;

    CalibratedValues {
        pressure,
        liquid_level_m,
        volume_l,
    }
}
