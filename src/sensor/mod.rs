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

pub mod calibration;
pub mod sensor_channel;
pub mod settings;

use crate::adc::Channel;
use core::fmt::{Display, Formatter};
use embassy_time::Duration;
use strum::{EnumIter, EnumString, FromRepr, IntoStaticStr};

/// Quantity a logical sensor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr)]
pub enum SensorType {
    Voltage,
    Pressure,
    #[strum(to_string = "Liquid Level", serialize = "LiquidLevel")]
    LiquidLevel,
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr)]
pub enum PressureUnit {
    #[strum(serialize = "kPa")]
    Kpa,
    #[strum(serialize = "PSI")]
    Psi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, FromRepr)]
#[repr(u8)]
pub enum PollInterval {
    Secs1 = 1,
    Secs5 = 5,
    Secs10 = 10,
    Secs30 = 30,
    Secs60 = 60,
}

impl PollInterval {
    pub const fn seconds(self) -> u32 {
        self as u32
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.seconds() as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// `volt_high` equals `volt_low`, the calibration slope would divide by zero.
    VoltageSpanZero,
    InvalidChannel(u8),
    InvalidPollInterval(u32),
    UnknownSensorType,
    UnknownPressureUnit,
    UnknownProperty,
    InvalidNumber,
    NonFiniteValue,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::VoltageSpanZero => write!(f, "voltHigh must differ from voltLow"),
            ConfigError::InvalidChannel(c) => write!(f, "ADC channel {} does not exist", c),
            ConfigError::InvalidPollInterval(s) => write!(f, "unsupported interval of {}s", s),
            ConfigError::UnknownSensorType => write!(f, "unknown sensor type"),
            ConfigError::UnknownPressureUnit => write!(f, "unknown pressure unit"),
            ConfigError::UnknownProperty => write!(f, "unknown property"),
            ConfigError::InvalidNumber => write!(f, "value is not a number"),
            ConfigError::NonFiniteValue => write!(f, "value must be finite"),
        }
    }
}

/// Validated configuration of one logical sensor. The pressure range is entered in kPa and held
/// in `pressure_unit`. Built through [`settings::SensorConfigBuilder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorConfig {
    channel: Channel,
    sensor_type: SensorType,
    pressure_unit: PressureUnit,
    volt_low: f32,
    volt_high: f32,
    pressure_low: f32,
    pressure_high: f32,
    sensor_height_m: f32,
    kettle_diameter_m: f32,
    poll_interval: PollInterval,
}

impl SensorConfig {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    /// Unit pressures are reported in
    pub fn pressure_unit(&self) -> PressureUnit {
        self.pressure_unit
    }

    pub fn volt_low(&self) -> f32 {
        self.volt_low
    }

    pub fn volt_high(&self) -> f32 {
        self.volt_high
    }

    /// Pressure at `volt_low`, in `pressure_unit`
    pub fn pressure_low(&self) -> f32 {
        self.pressure_low
    }

    /// Pressure at `volt_high`, in `pressure_unit`
    pub fn pressure_high(&self) -> f32 {
        self.pressure_high
    }

    /// Mounting height of the transducer above the kettle floor. Stored for reporting only, the
    /// level formula measures from the sensor.
    pub fn sensor_height_m(&self) -> f32 {
        self.sensor_height_m
    }

    pub fn kettle_diameter_m(&self) -> f32 {
        self.kettle_diameter_m
    }

    pub fn poll_interval(&self) -> PollInterval {
        self.poll_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn sensor_type_parses_display_names() {
        assert_eq!(SensorType::from_str("Voltage"), Ok(SensorType::Voltage));
        assert_eq!(SensorType::from_str("Liquid Level"), Ok(SensorType::LiquidLevel));
        assert_eq!(SensorType::from_str("LiquidLevel"), Ok(SensorType::LiquidLevel));
        assert!(SensorType::from_str("Temperature").is_err());

        let name: &'static str = SensorType::LiquidLevel.into();
        assert_eq!(name, "Liquid Level");
    }

    #[test]
    fn pressure_unit_parses_display_names() {
        assert_eq!(PressureUnit::from_str("kPa"), Ok(PressureUnit::Kpa));
        assert_eq!(PressureUnit::from_str("PSI"), Ok(PressureUnit::Psi));
        assert!(PressureUnit::from_str("bar").is_err());
    }

    #[test]
    fn only_listed_poll_intervals_exist() {
        assert_eq!(PollInterval::from_repr(10), Some(PollInterval::Secs10));
        assert_eq!(PollInterval::from_repr(2), None);
        assert_eq!(PollInterval::Secs60.as_duration(), Duration::from_secs(60));
    }
}
