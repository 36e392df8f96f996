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

//! Ingestion of per sensor settings. Property names and defaults are the ones the plugin
//! host has always stored for these sensors, so existing sensor definitions load unchanged.

use crate::adc::Channel;
use crate::sensor::calibration::from_kpa;
use crate::sensor::{ConfigError, PollInterval, PressureUnit, SensorConfig, SensorType};
use core::str::FromStr;
use strum::{EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr)]
pub enum SensorProperty {
    #[strum(serialize = "ADSchannel")]
    AdsChannel,
    #[strum(serialize = "sensorType")]
    SensorType,
    #[strum(serialize = "pressureType")]
    PressureType,
    #[strum(serialize = "voltLow")]
    VoltLow,
    #[strum(serialize = "voltHigh")]
    VoltHigh,
    #[strum(serialize = "pressureLow")]
    PressureLow,
    #[strum(serialize = "pressureHigh")]
    PressureHigh,
    #[strum(serialize = "sensorHeight")]
    SensorHeight,
    #[strum(serialize = "kettleDiameter")]
    KettleDiameter,
    #[strum(serialize = "Interval")]
    Interval,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorConfigBuilder {
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

impl SensorConfigBuilder {
    pub fn new() -> Self {
        Self {
            channel: Channel::Ain0,
            sensor_type: SensorType::LiquidLevel,
            pressure_unit: PressureUnit::Kpa,
            volt_low: 0.0,
            volt_high: 5.0,
            pressure_low: 0.0,
            pressure_high: 10.0,
            sensor_height_m: 0.0,
            kettle_diameter_m: 0.0,
            poll_interval: PollInterval::Secs5,
        }
    }

    /// Builds a configuration from `(name, value)` pairs as stored by the plugin host.
    /// Missing properties keep their defaults.
    pub fn from_properties<'p>(
        properties: impl IntoIterator<Item = (&'p str, &'p str)>,
    ) -> Result<SensorConfig, ConfigError> {
        let mut builder = Self::new();
        for (name, value) in properties {
            builder.set_property(name, value)?;
        }
        builder.build()
    }

    pub fn set_property(&mut self, name: &str, value: &str) -> Result<&mut Self, ConfigError> {
        let property = SensorProperty::from_str(name).map_err(|_| ConfigError::UnknownProperty)?;
        let value = value.trim();
        match property {
            SensorProperty::AdsChannel => {
                let index = parse_integer(value)?;
                let channel = u8::try_from(index)
                    .ok()
                    .and_then(Channel::from_repr)
                    .ok_or(ConfigError::InvalidChannel(index.min(u8::MAX as u32) as u8))?;
                self.channel(channel);
            }
            SensorProperty::SensorType => {
                let sensor_type =
                    SensorType::from_str(value).map_err(|_| ConfigError::UnknownSensorType)?;
                self.sensor_type(sensor_type);
            }
            SensorProperty::PressureType => {
                let unit =
                    PressureUnit::from_str(value).map_err(|_| ConfigError::UnknownPressureUnit)?;
                self.pressure_unit(unit);
            }
            SensorProperty::VoltLow => self.volt_low = parse_number(value)?,
            SensorProperty::VoltHigh => self.volt_high = parse_number(value)?,
            SensorProperty::PressureLow => self.pressure_low = parse_number(value)?,
            SensorProperty::PressureHigh => self.pressure_high = parse_number(value)?,
            SensorProperty::SensorHeight => self.sensor_height_m = parse_number(value)?,
            SensorProperty::KettleDiameter => self.kettle_diameter_m = parse_number(value)?,
            SensorProperty::Interval => {
                let seconds = parse_integer(value)?;
                let interval = u8::try_from(seconds)
                    .ok()
                    .and_then(PollInterval::from_repr)
                    .ok_or(ConfigError::InvalidPollInterval(seconds))?;
                self.poll_interval(interval);
            }
        }
        Ok(self)
    }

    pub fn channel(&mut self, channel: Channel) -> &mut Self {
        self.channel = channel;
        self
    }

    pub fn sensor_type(&mut self, sensor_type: SensorType) -> &mut Self {
        self.sensor_type = sensor_type;
        self
    }

    /// Unit the sensor reports pressure in. The pressure range is converted to it on build.
    pub fn pressure_unit(&mut self, unit: PressureUnit) -> &mut Self {
        self.pressure_unit = unit;
        self
    }

    pub fn volt_range(&mut self, low: f32, high: f32) -> &mut Self {
        self.volt_low = low;
        self.volt_high = high;
        self
    }

    /// Pressures in kPa at `volt_low` and `volt_high`
    pub fn pressure_range(&mut self, low: f32, high: f32) -> &mut Self {
        self.pressure_low = low;
        self.pressure_high = high;
        self
    }

    pub fn sensor_height_m(&mut self, height: f32) -> &mut Self {
        self.sensor_height_m = height;
        self
    }

    pub fn kettle_diameter_m(&mut self, diameter: f32) -> &mut Self {
        self.kettle_diameter_m = diameter;
        self
    }

    pub fn poll_interval(&mut self, interval: PollInterval) -> &mut Self {
        self.poll_interval = interval;
        self
    }

    pub fn build(&self) -> Result<SensorConfig, ConfigError> {
        let numbers = [
            self.volt_low,
            self.volt_high,
            self.pressure_low,
            self.pressure_high,
            self.sensor_height_m,
            self.kettle_diameter_m,
        ];
        if numbers.iter().any(|n| !n.is_finite()) {
            return Err(ConfigError::NonFiniteValue);
        }
        if self.volt_high == self.volt_low {
            return Err(ConfigError::VoltageSpanZero);
        }

        Ok(SensorConfig {
            channel: self.channel,
            sensor_type: self.sensor_type,
            pressure_unit: self.pressure_unit,
            volt_low: self.volt_low,
            volt_high: self.volt_high,
            pressure_low: from_kpa(self.pressure_low, self.pressure_unit),
            pressure_high: from_kpa(self.pressure_high, self.pressure_unit),
            sensor_height_m: self.sensor_height_m,
            kettle_diameter_m: self.kettle_diameter_m,
            poll_interval: self.poll_interval,
        })
    }
}

impl Default for SensorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number(value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidNumber)
}

/// Whole numbers, also accepting the `"5.0"` form some hosts store select options in.
fn parse_integer(value: &str) -> Result<u32, ConfigError> {
    if let Ok(n) = value.parse::<u32>() {
        return Ok(n);
    }
    let n = parse_number(value)?;
    if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f32 {
        Ok(n as u32)
    } else {
        Err(ConfigError::InvalidNumber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stored_property_defaults() {
        let config = SensorConfigBuilder::new().build().unwrap();
        assert_eq!(config.channel(), Channel::Ain0);
        assert_eq!(config.sensor_type(), SensorType::LiquidLevel);
        assert_eq!(config.pressure_unit(), PressureUnit::Kpa);
        assert_eq!(config.volt_low(), 0.0);
        assert_eq!(config.volt_high(), 5.0);
        assert_eq!(config.pressure_low(), 0.0);
        assert_eq!(config.pressure_high(), 10.0);
        assert_eq!(config.kettle_diameter_m(), 0.0);
        assert_eq!(config.poll_interval(), PollInterval::Secs5);
    }

    #[test]
    fn loads_a_full_property_set() {
        let config = SensorConfigBuilder::from_properties([
            ("ADSchannel", "3"),
            ("sensorType", "Volume"),
            ("pressureType", "kPa"),
            ("voltLow", "0.5"),
            ("voltHigh", "4.5"),
            ("pressureLow", "0"),
            ("pressureHigh", "20"),
            ("sensorHeight", "0.05"),
            ("kettleDiameter", "0.4"),
            ("Interval", "10"),
        ])
        .unwrap();

        assert_eq!(config.channel(), Channel::Ain3);
        assert_eq!(config.sensor_type(), SensorType::Volume);
        assert_eq!(config.volt_low(), 0.5);
        assert_eq!(config.volt_high(), 4.5);
        assert_eq!(config.pressure_high(), 20.0);
        assert_eq!(config.sensor_height_m(), 0.05);
        assert_eq!(config.kettle_diameter_m(), 0.4);
        assert_eq!(config.poll_interval(), PollInterval::Secs10);
    }

    #[test]
    fn psi_sensors_hold_their_range_in_psi() {
        let config = SensorConfigBuilder::from_properties([
            ("pressureType", "PSI"),
            ("pressureLow", "20"),
            ("pressureHigh", "100"),
        ])
        .unwrap();

        assert_eq!(config.pressure_unit(), PressureUnit::Psi);
        assert!((config.pressure_low() - 2.9).abs() < 1e-5);
        assert!((config.pressure_high() - 14.5).abs() < 1e-5);
    }

    #[test]
    fn equal_voltage_limits_are_rejected() {
        let result = SensorConfigBuilder::new().volt_range(2.0, 2.0).build();
        assert_eq!(result, Err(ConfigError::VoltageSpanZero));

        let result = SensorConfigBuilder::from_properties([("voltLow", "5"), ("voltHigh", "5.0")]);
        assert_eq!(result, Err(ConfigError::VoltageSpanZero));
    }

    #[test]
    fn rejects_values_outside_the_legal_sets() {
        assert_eq!(
            SensorConfigBuilder::from_properties([("ADSchannel", "8")]),
            Err(ConfigError::InvalidChannel(8))
        );
        assert_eq!(
            SensorConfigBuilder::from_properties([("ADSchannel", "-1")]),
            Err(ConfigError::InvalidNumber)
        );
        assert_eq!(
            SensorConfigBuilder::from_properties([("Interval", "15")]),
            Err(ConfigError::InvalidPollInterval(15))
        );
        assert_eq!(
            SensorConfigBuilder::from_properties([("sensorType", "Flow")]),
            Err(ConfigError::UnknownSensorType)
        );
        assert_eq!(
            SensorConfigBuilder::from_properties([("pressureType", "bar")]),
            Err(ConfigError::UnknownPressureUnit)
        );
        assert_eq!(
            SensorConfigBuilder::from_properties([("colour", "red")]),
            Err(ConfigError::UnknownProperty)
        );
        assert_eq!(
            SensorConfigBuilder::from_properties([("voltHigh", "high")]),
            Err(ConfigError::InvalidNumber)
        );
        assert_eq!(
            SensorConfigBuilder::from_properties([("voltHigh", "inf")]),
            Err(ConfigError::NonFiniteValue)
        );
    }

    #[test]
    fn select_options_stored_as_floats_are_accepted() {
        let config =
            SensorConfigBuilder::from_properties([("ADSchannel", "7.0"), ("Interval", " 60 ")])
                .unwrap();
        assert_eq!(config.channel(), Channel::Ain7);
        assert_eq!(config.poll_interval(), PollInterval::Secs60);
    }
}
