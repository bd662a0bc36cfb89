//! Spin ordering sampler
//!
//! Spins the same parent repeatedly, one sample per `spacing`, and counts how
//! often the spin value failed to increase. With a spacing of at least one
//! counter step the only decreases come from the counter wrapping.

use std::time::Duration;

use corvec::codec::DELIMITER;
use corvec::{
    CorrelationVector, CvResult, ManualClock, SpinParameters, SpinValue, SystemClock, TickSource,
    Ticks,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Sampler configuration
#[derive(Debug, Clone)]
pub struct SpinSampleConfig {
    /// Spin parameters under test
    pub params: SpinParameters,
    /// Number of spins
    pub samples: usize,
    /// Time between spins
    pub spacing: Duration,
}

impl SpinSampleConfig {
    /// One sample per counter step
    pub fn per_step(params: SpinParameters, samples: usize) -> Self {
        Self {
            params,
            samples,
            spacing: params.interval.step(),
        }
    }

    /// Override the time between spins
    pub fn with_spacing(mut self, spacing: Duration) -> Self {
        self.spacing = spacing;
        self
    }
}

impl Default for SpinSampleConfig {
    fn default() -> Self {
        Self {
            params: SpinParameters::fine_grained(),
            samples: 101,
            spacing: Duration::from_millis(10),
        }
    }
}

/// Sampled spin values in the order they were produced
#[derive(Debug, Clone, Default)]
pub struct SpinSampleResult {
    pub values: Vec<SpinValue>,
    /// Samples whose value was not greater than the previous one
    pub wraps: usize,
}

impl SpinSampleResult {
    fn push(&mut self, value: SpinValue) {
        if let Some(last) = self.values.last() {
            if value.value() <= last.value() {
                self.wraps += 1;
            }
        }
        self.values.push(value);
    }

    /// Counters of all samples, in order
    pub fn counters(&self, params: &SpinParameters) -> Vec<u64> {
        self.values.iter().map(|v| v.counter(params)).collect()
    }
}

/// Extract the spin value a spin of `parent` appended
pub fn spin_value_of(parent: &str, spun: &CorrelationVector, params: &SpinParameters) -> Option<SpinValue> {
    let base_vector = spun.base_vector();
    let segments = base_vector
        .strip_prefix(parent)?
        .strip_prefix(DELIMITER)?;
    SpinValue::parse(segments, params)
}

/// Sample against a manual clock starting at `start`; deterministic per `seed`
pub fn sample_manual(
    parent: &str,
    config: &SpinSampleConfig,
    start: Ticks,
    seed: u64,
) -> CvResult<SpinSampleResult> {
    let clock = ManualClock::new(start);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut result = SpinSampleResult::default();

    for _ in 0..config.samples {
        let spun = CorrelationVector::spin_at(parent, &config.params, &clock, &mut rng)?;
        if let Some(value) = spin_value_of(parent, &spun, &config.params) {
            result.push(value);
        }
        clock.advance(config.spacing);
    }

    tracing::debug!(
        samples = result.values.len(),
        wraps = result.wraps,
        "manual spin sampling finished"
    );
    Ok(result)
}

/// Sample against the system clock, sleeping `spacing` between spins
pub fn sample_system(parent: &str, config: &SpinSampleConfig) -> CvResult<SpinSampleResult> {
    let mut rng = rand::thread_rng();
    let mut result = SpinSampleResult::default();

    for i in 0..config.samples {
        let spun = CorrelationVector::spin_at(parent, &config.params, &SystemClock, &mut rng)?;
        if let Some(value) = spin_value_of(parent, &spun, &config.params) {
            result.push(value);
        }
        if i + 1 < config.samples {
            std::thread::sleep(config.spacing);
        }
    }

    tracing::debug!(
        samples = result.values.len(),
        wraps = result.wraps,
        now = ?SystemClock.now(),
        "system spin sampling finished"
    );
    Ok(result)
}
