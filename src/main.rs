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

//! Host runner: one acquisition task feeding a set of sensor tasks, with a simulated ADS1256
//! standing in for the converter.

use analog_sensor::acquisition::acquisition_service::AcquisitionService;
use analog_sensor::acquisition::sample_cache::SampleCache;
use analog_sensor::acquisition::AcquisitionConfig;
use analog_sensor::adc::board::BOARD_CONFIG;
use analog_sensor::adc::simulated::SimulatedAds1256;
use analog_sensor::control::RunControl;
use analog_sensor::sensor::sensor_channel::{SensorChannel, SensorStatus, UpdateSink};
use analog_sensor::sensor::settings::SensorConfigBuilder;
use analog_sensor::sensor::SensorConfig;
use core::str::FromStr;
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use heapless::Vec;
use log::{error, info, trace, warn, LevelFilter};

const MAX_SENSORS: usize = 8;

static SAMPLE_CACHE: SampleCache = SampleCache::new();
static RUN_CONTROL: RunControl = RunControl::new();
static SENSOR_STATUS: [SensorStatus; MAX_SENSORS] = [const { SensorStatus::new() }; MAX_SENSORS];

/// Sensor definitions in the form the plugin host stores them.
const SENSOR_DEFINITIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Kettle voltage",
        &[("ADSchannel", "0"), ("sensorType", "Voltage")],
    ),
    (
        "Kettle pressure",
        &[
            ("ADSchannel", "0"),
            ("sensorType", "Pressure"),
            ("voltLow", "0.5"),
            ("voltHigh", "4.5"),
            ("pressureLow", "0"),
            ("pressureHigh", "10"),
        ],
    ),
    (
        "Kettle level",
        &[
            ("ADSchannel", "0"),
            ("sensorType", "Liquid Level"),
            ("voltLow", "0.5"),
            ("voltHigh", "4.5"),
            ("pressureHigh", "10"),
        ],
    ),
    (
        "Kettle volume",
        &[
            ("ADSchannel", "0"),
            ("sensorType", "Volume"),
            ("voltLow", "0.5"),
            ("voltHigh", "4.5"),
            ("pressureHigh", "10"),
            ("kettleDiameter", "0.45"),
        ],
    ),
    (
        "Fermenter pressure",
        &[
            ("ADSchannel", "1"),
            ("sensorType", "Pressure"),
            ("pressureType", "PSI"),
            ("voltLow", "0"),
            ("voltHigh", "5"),
            ("pressureHigh", "207"),
        ],
    ),
];

/// Simulated transmitter outputs in volts
const SIMULATED_INPUTS: [f32; 8] = [1.62, 2.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];

struct LogSink {
    name: &'static str,
}

impl UpdateSink for LogSink {
    fn push_update(&mut self, value: f32, fresh: bool) {
        if !fresh {
            trace!("{}: still {}", self.name, value);
        }
    }
}

#[embassy_executor::task]
async fn acquisition_task(adc: SimulatedAds1256, config: AcquisitionConfig) {
    let mut service = AcquisitionService::new(adc, &SAMPLE_CACHE, config);
    let state = service.run(&RUN_CONTROL).await;
    warn!("Acquisition finished in state {:?}", state);
}

#[embassy_executor::task(pool_size = 8)]
async fn sensor_task(name: &'static str, config: SensorConfig, status: &'static SensorStatus) {
    let mut channel = SensorChannel::new(name, config, &SAMPLE_CACHE, status, LogSink { name });
    channel.run(&RUN_CONTROL).await;
}

#[embassy_executor::task]
async fn status_task(sensors: Vec<(&'static str, &'static SensorStatus), MAX_SENSORS>) {
    loop {
        Timer::after(Duration::from_secs(10)).await;
        for (name, status) in sensors.iter() {
            info!("{} = {}", name, status.get_state().value);
        }
    }
}

fn load_sensors() -> Vec<(&'static str, SensorConfig), MAX_SENSORS> {
    let mut sensors = Vec::new();
    for (name, properties) in SENSOR_DEFINITIONS {
        match SensorConfigBuilder::from_properties(properties.iter().copied()) {
            Ok(config) => {
                if sensors.push((*name, config)).is_err() {
                    warn!("Only {} sensors supported, ignoring {}", MAX_SENSORS, name);
                }
            }
            Err(e) => error!("Sensor {} not started: {}", name, e),
        }
    }
    sensors
}

/// Level from `--log-level <level>` or `--log-level=<level>`, INFO when absent or unknown.
fn log_level_from_args(mut args: impl Iterator<Item = String>) -> LevelFilter {
    while let Some(arg) = args.next() {
        let value = match arg.strip_prefix("--log-level") {
            Some("") => args.next(),
            Some(inline) => match inline.strip_prefix('=') {
                Some(level) => Some(level.to_owned()),
                None => continue,
            },
            None => continue,
        };

        return match value.as_deref().map(LevelFilter::from_str) {
            Some(Ok(level)) => level,
            Some(Err(_)) => {
                eprintln!(
                    "Unknown log level {:?}, using INFO",
                    value.as_deref().unwrap_or_default()
                );
                LevelFilter::Info
            }
            None => {
                eprintln!("--log-level needs a value, using INFO");
                LevelFilter::Info
            }
        };
    }

    LevelFilter::Info
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    env_logger::Builder::from_default_env()
        .filter_level(log_level_from_args(std::env::args().skip(1)))
        .format_timestamp_millis()
        .init();

    info!("ADS1256 analog sensor");

    let adc = SimulatedAds1256::new(BOARD_CONFIG, SIMULATED_INPUTS).with_boot_delay(2);
    if let Err(e) = spawner.spawn(acquisition_task(adc, AcquisitionConfig::default())) {
        error!("Unable to start acquisition: {:?}", e);
        return;
    }

    let mut running = Vec::new();
    for ((name, config), status) in load_sensors().into_iter().zip(SENSOR_STATUS.iter()) {
        match spawner.spawn(sensor_task(name, config, status)) {
            // same capacity as the sensor list, cannot overflow
            Ok(()) => {
                let _ = running.push((name, status));
            }
            Err(e) => error!("Unable to start sensor {}: {:?}", name, e),
        }
    }

    if let Err(e) = spawner.spawn(status_task(running)) {
        error!("Unable to start status reporting: {:?}", e);
    }
}
