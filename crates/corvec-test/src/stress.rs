//! Concurrent increment stress runs
//!
//! Many threads hammer `increment()` on one shared vector. A run passes when
//! no extension value was handed out twice and, unless the vector froze, the
//! final extension equals the number of increments performed.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use corvec::codec::is_immutable;
use corvec::CorrelationVector;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Stress run configuration
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of threads sharing the vector
    pub threads: usize,
    /// Increments performed by each thread
    pub increments_per_thread: usize,
}

impl StressConfig {
    pub fn new(threads: usize, increments_per_thread: usize) -> Self {
        Self {
            threads,
            increments_per_thread,
        }
    }

    /// Quick run for unit tests: 4 threads, 1k increments
    pub fn minimal() -> Self {
        Self::new(4, 250)
    }

    /// Default run: 16 threads, 80k increments
    pub fn standard() -> Self {
        Self::new(16, 5_000)
    }

    /// Full contention run: 100 threads, one million increments
    pub fn stress() -> Self {
        Self::new(100, 10_000)
    }

    #[inline]
    pub fn total_increments(&self) -> usize {
        self.threads * self.increments_per_thread
    }
}

impl Default for StressConfig {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// RESULT
// ============================================================================

/// Outcome of a stress run
#[derive(Debug, Clone)]
pub struct StressResult {
    /// Increments attempted
    pub attempted: usize,
    /// Distinct non-terminated values returned
    pub distinct_values: usize,
    /// Non-terminated values returned more than once
    pub duplicates: usize,
    /// Calls that returned a terminated value
    pub terminated_returns: usize,
    /// Extension before the run
    pub start_extension: u32,
    /// Extension after the run
    pub final_extension: u32,
    /// Whether the vector ended terminated
    pub frozen: bool,
    /// Wall time of the run
    pub elapsed: Duration,
}

impl StressResult {
    /// No lost or repeated updates
    pub fn passed(&self) -> bool {
        if self.duplicates != 0 {
            return false;
        }
        let advanced = (self.final_extension - self.start_extension) as usize;
        if self.frozen {
            advanced == self.distinct_values
        } else {
            advanced == self.attempted && self.distinct_values == self.attempted
        }
    }

    pub fn increments_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempted as f64 / secs
        } else {
            0.0
        }
    }
}

// ============================================================================
// RUNNER
// ============================================================================

/// Drive `config.threads` threads incrementing `cv` concurrently
pub fn run_increment_stress(cv: &CorrelationVector, config: &StressConfig) -> StressResult {
    let start_extension = cv.extension();
    let started = Instant::now();

    let per_thread = run_workers(config, || cv.increment());
    let elapsed = started.elapsed();

    let mut seen = HashSet::new();
    let mut duplicates = 0;
    let mut terminated_returns = 0;
    for value in per_thread.iter().flatten() {
        if is_immutable(value) {
            terminated_returns += 1;
        } else if !seen.insert(value.as_str()) {
            duplicates += 1;
        }
    }

    let result = StressResult {
        attempted: config.total_increments(),
        distinct_values: seen.len(),
        duplicates,
        terminated_returns,
        start_extension,
        final_extension: cv.extension(),
        frozen: cv.is_immutable(),
        elapsed,
    };
    tracing::debug!(
        ?result,
        per_second = result.increments_per_second(),
        "increment stress run finished"
    );
    result
}

/// Call `op` from every worker thread; a panicking worker panics the caller
fn run_workers<F>(config: &StressConfig, op: F) -> Vec<Vec<String>>
where
    F: Fn() -> String + Sync,
{
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..config.threads)
            .map(|_| s.spawn(|| (0..config.increments_per_thread).map(|_| op()).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|payload| std::panic::resume_unwind(payload)))
            .collect()
    })
}
