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

//! Acquisition and derivation pipeline for an ADS1256 based 8 channel analog front end.
//!
//! One [`AcquisitionService`](acquisition::acquisition_service::AcquisitionService) owns the
//! ADC and publishes the latest multi-channel sample into a
//! [`SampleCache`](acquisition::sample_cache::SampleCache). Any number of
//! [`SensorChannel`](sensor::sensor_channel::SensorChannel)s read that cache and turn their
//! channel's voltage into voltage, pressure, liquid level or volume readings.

pub mod acquisition;
pub mod adc;
pub mod control;
pub mod sensor;
