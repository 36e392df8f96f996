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
use crate::acquisition::{
    AcquisitionConfig, AcquisitionError, AcquisitionState, AcquisitionStats, BootOutcome,
    DegradedReason,
};
use crate::adc::{AdcDriver, AdcError, AdcErrorKind, CHANNEL_COUNT, CHANNEL_SEQUENCE};
use crate::control::RunControl;
use embassy_time::{Instant, Timer};
use log::{debug, error, info, trace, warn};

/// Owns the converter: brings it up, then keeps the [`SampleCache`] filled with fresh samples.
pub struct AcquisitionService<'a, ADC> {
    adc: ADC,
    cache: &'a SampleCache,
    config: AcquisitionConfig,
    state: AcquisitionState,
    stats: AcquisitionStats,
}

impl<'a, ADC, AdcE> AcquisitionService<'a, ADC>
where
    ADC: AdcDriver<Error = AdcE>,
    AdcE: AdcError,
{
    pub fn new(adc: ADC, cache: &'a SampleCache, config: AcquisitionConfig) -> Self {
        Self {
            adc,
            cache,
            config,
            state: AcquisitionState::Booting,
            stats: AcquisitionStats::default(),
        }
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    pub fn driver(&self) -> &ADC {
        &self.adc
    }

    /// Boots the converter and then samples until `control` is deactivated. Returns straight
    /// away with the degraded state if the converter never came up.
    pub async fn run(&mut self, control: &RunControl) -> AcquisitionState {
        match self.boot().await {
            BootOutcome::Ready => {
                Timer::after(self.config.interval).await;
                self.run_sampling(control).await;
            }
            BootOutcome::Degraded(reason) => {
                error!("ADC acquisition disabled: {}", reason);
            }
        }
        self.state
    }

    /// A freshly powered converter can take a few seconds before it answers, so transient
    /// failures are retried up to `boot_attempts` times.
    pub async fn boot(&mut self) -> BootOutcome {
        self.state = AcquisitionState::Booting;
        Timer::after(self.config.settle_delay).await;

        let mut retries = self.config.boot_attempts;
        while retries > 0 {
            match self.prepare_and_read().await {
                Ok(_) => {
                    info!(
                        "ADC ready after {} attempt(s)",
                        self.config.boot_attempts - retries + 1
                    );
                    self.state = AcquisitionState::Ready;
                    return BootOutcome::Ready;
                }
                Err(e) if e.kind() == AdcErrorKind::Transient => {
                    debug!("ADC not responding yet: {}", e);
                }
                Err(e) => {
                    error!("ADC boot aborted: {}", e);
                    return self.degrade(DegradedReason::FatalDriverError);
                }
            }

            retries -= 1;
            if retries > 0 {
                Timer::after(self.config.boot_retry_delay).await;
            }
        }

        error!(
            "Timed out waiting for ADC after {} attempts",
            self.config.boot_attempts
        );
        self.degrade(DegradedReason::RetriesExhausted)
    }

    fn degrade(&mut self, reason: DegradedReason) -> BootOutcome {
        self.state = AcquisitionState::Degraded(reason);
        BootOutcome::Degraded(reason)
    }

    /// Sampling loop. A failed cycle is logged and retried after `error_backoff`; nothing ends
    /// the loop except deactivation.
    pub async fn run_sampling(&mut self, control: &RunControl) {
        if self.state != AcquisitionState::Ready {
            warn!("Sampling not started, ADC state is {:?}", self.state);
            return;
        }

        while control.is_active() {
            self.stats.cycles += 1;
            match self.sample_once().await {
                Ok(sample) => {
                    self.stats.published += 1;
                    self.stats.consecutive_failures = 0;
                    trace!("Published sample {:?}", sample);
                    Timer::after(self.config.interval).await;
                }
                Err(e) => {
                    self.stats.failures += 1;
                    self.stats.consecutive_failures += 1;
                    match e.kind() {
                        AdcErrorKind::Transient => warn!("ADC sampling cycle failed: {}", e),
                        AdcErrorKind::Fatal => error!(
                            "ADC sampling cycle failed ({} in a row): {}",
                            self.stats.consecutive_failures, e
                        ),
                    }
                    Timer::after(self.config.error_backoff).await;
                }
            }
        }
        debug!("Sampling stopped after {} cycles", self.stats.cycles);
    }

    /// Runs one full cycle: rate, self calibration, batch read, scaling and publish.
    pub async fn sample_once(&mut self) -> Result<RawSample, AcquisitionError<AdcE>> {
        let codes = self.prepare_and_read().await?;
        let volts_per_digit = self.adc.volts_per_digit();
        let voltages: [f32; CHANNEL_COUNT] = codes.map(|code| code as f32 * volts_per_digit);

        let sample = RawSample::new(Instant::now(), voltages);
        self.cache.publish(sample);
        Ok(sample)
    }

    async fn prepare_and_read(&mut self) -> Result<[i32; CHANNEL_COUNT], AcquisitionError<AdcE>> {
        self.adc
            .set_data_rate(self.config.data_rate)
            .await
            .map_err(AcquisitionError::SetDataRate)?;
        self.adc
            .self_calibrate()
            .await
            .map_err(AcquisitionError::SelfCalibration)?;
        self.adc
            .read_sequence(&CHANNEL_SEQUENCE)
            .await
            .map_err(AcquisitionError::ReadSequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adc::DataRate;
    use embassy_futures::block_on;
    use embassy_futures::join::join;
    use embassy_time::Duration;

    const VOLTS_PER_DIGIT: f32 = 0.001;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum FakeError {
        Busy,
        Broken,
    }

    impl AdcError for FakeError {
        fn kind(&self) -> AdcErrorKind {
            match self {
                FakeError::Busy => AdcErrorKind::Transient,
                FakeError::Broken => AdcErrorKind::Fatal,
            }
        }
    }

    /// Returns codes 100, 200, .. 800 and fails the reads listed in `failing_reads` (1 based).
    struct ScriptedAdc {
        failing_reads: Vec<u32>,
        failure: FakeError,
        reads: u32,
        rate_changes: u32,
        calibrations: u32,
        last_rate: Option<DataRate>,
    }

    impl ScriptedAdc {
        fn failing(failing_reads: impl IntoIterator<Item = u32>, failure: FakeError) -> Self {
            Self {
                failing_reads: failing_reads.into_iter().collect(),
                failure,
                reads: 0,
                rate_changes: 0,
                calibrations: 0,
                last_rate: None,
            }
        }

        fn healthy() -> Self {
            Self::failing(core::iter::empty(), FakeError::Busy)
        }
    }

    impl AdcDriver for ScriptedAdc {
        type Error = FakeError;

        async fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Self::Error> {
            self.rate_changes += 1;
            self.last_rate = Some(rate);
            Ok(())
        }

        async fn self_calibrate(&mut self) -> Result<(), Self::Error> {
            self.calibrations += 1;
            Ok(())
        }

        async fn read_sequence(
            &mut self,
            sequence: &[u8; CHANNEL_COUNT],
        ) -> Result<[i32; CHANNEL_COUNT], Self::Error> {
            assert_eq!(sequence, &CHANNEL_SEQUENCE);
            self.reads += 1;
            if self.failing_reads.contains(&self.reads) {
                return Err(self.failure);
            }
            Ok([100, 200, 300, 400, 500, 600, 700, 800])
        }

        fn volts_per_digit(&self) -> f32 {
            VOLTS_PER_DIGIT
        }
    }

    fn fast_config() -> AcquisitionConfig {
        AcquisitionConfig {
            data_rate: DataRate::Sps100,
            interval: Duration::from_millis(2),
            settle_delay: Duration::from_millis(1),
            boot_attempts: 30,
            boot_retry_delay: Duration::from_millis(1),
            error_backoff: Duration::from_millis(1),
        }
    }

    fn run_for(service: &mut AcquisitionService<'_, ScriptedAdc>, millis: u64) -> AcquisitionState {
        let control = RunControl::new();
        let (state, _) = block_on(join(service.run(&control), async {
            Timer::after(Duration::from_millis(millis)).await;
            control.deactivate();
        }));
        state
    }

    #[test]
    fn boot_succeeds_on_the_last_attempt() {
        let cache = SampleCache::new();
        let adc = ScriptedAdc::failing(1..=29, FakeError::Busy);
        let mut service = AcquisitionService::new(adc, &cache, fast_config());

        assert_eq!(block_on(service.boot()), BootOutcome::Ready);
        assert_eq!(service.state(), AcquisitionState::Ready);
        assert_eq!(service.driver().reads, 30);
    }

    #[test]
    fn boot_degrades_when_retries_are_exhausted() {
        let cache = SampleCache::new();
        let adc = ScriptedAdc::failing(1..=30, FakeError::Busy);
        let mut service = AcquisitionService::new(adc, &cache, fast_config());

        assert_eq!(
            block_on(service.boot()),
            BootOutcome::Degraded(DegradedReason::RetriesExhausted)
        );
        assert_eq!(service.driver().reads, 30);
    }

    #[test]
    fn degraded_service_never_samples() {
        let cache = SampleCache::new();
        let adc = ScriptedAdc::failing(1..=30, FakeError::Busy);
        let mut service = AcquisitionService::new(adc, &cache, fast_config());

        let state = run_for(&mut service, 20);

        assert_eq!(
            state,
            AcquisitionState::Degraded(DegradedReason::RetriesExhausted)
        );
        assert_eq!(service.driver().reads, 30);
        assert_eq!(service.stats().cycles, 0);
        assert_eq!(cache.latest(), None);
    }

    #[test]
    fn fatal_error_during_boot_is_not_retried() {
        let cache = SampleCache::new();
        let adc = ScriptedAdc::failing([1], FakeError::Broken);
        let mut service = AcquisitionService::new(adc, &cache, fast_config());

        assert_eq!(
            block_on(service.boot()),
            BootOutcome::Degraded(DegradedReason::FatalDriverError)
        );
        assert_eq!(service.driver().reads, 1);
    }

    #[test]
    fn boot_probe_is_not_published() {
        let cache = SampleCache::new();
        let mut service = AcquisitionService::new(ScriptedAdc::healthy(), &cache, fast_config());

        assert_eq!(block_on(service.boot()), BootOutcome::Ready);
        assert_eq!(cache.latest(), None);
    }

    #[test]
    fn sample_once_scales_codes_to_volts() {
        let cache = SampleCache::new();
        let mut service = AcquisitionService::new(ScriptedAdc::healthy(), &cache, fast_config());

        let sample = block_on(service.sample_once()).unwrap();

        let expected = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
        for (volts, expected) in sample.voltages().iter().zip(expected.iter()) {
            assert!((volts - expected).abs() < 1e-6);
        }
        assert_eq!(cache.latest(), Some(sample));
    }

    #[test]
    fn every_cycle_reapplies_rate_and_calibration() {
        let cache = SampleCache::new();
        let mut service = AcquisitionService::new(ScriptedAdc::healthy(), &cache, fast_config());

        run_for(&mut service, 30);

        let adc = service.driver();
        assert!(adc.reads > 2);
        assert_eq!(adc.rate_changes, adc.reads);
        assert_eq!(adc.calibrations, adc.reads);
        assert_eq!(adc.last_rate, Some(DataRate::Sps100));
    }

    #[test]
    fn sampling_recovers_after_a_failed_cycle() {
        let cache = SampleCache::new();
        // read 1 is the boot probe, read 3 is the second sampling cycle
        let adc = ScriptedAdc::failing([3], FakeError::Broken);
        let mut service = AcquisitionService::new(adc, &cache, fast_config());

        let state = run_for(&mut service, 40);

        assert_eq!(state, AcquisitionState::Ready);
        let stats = service.stats();
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.consecutive_failures, 0);
        assert!(stats.published >= 2);
        assert_eq!(stats.cycles, stats.published + stats.failures);
        assert!(cache.latest().is_some());
    }

    #[test]
    fn published_timestamps_increase() {
        let cache = SampleCache::new();
        let mut service = AcquisitionService::new(ScriptedAdc::healthy(), &cache, fast_config());

        let first = block_on(service.sample_once()).unwrap();
        block_on(Timer::after(Duration::from_millis(1)));
        let second = block_on(service.sample_once()).unwrap();

        assert!(second.timestamp() > first.timestamp());
        assert_eq!(cache.latest(), Some(second));
    }

    #[test]
    fn inactive_control_skips_sampling() {
        let cache = SampleCache::new();
        let mut service = AcquisitionService::new(ScriptedAdc::healthy(), &cache, fast_config());
        let control = RunControl::new();
        control.deactivate();

        let state = block_on(service.run(&control));

        assert_eq!(state, AcquisitionState::Ready);
        assert_eq!(service.stats().cycles, 0);
        assert_eq!(cache.latest(), None);
    }
}
