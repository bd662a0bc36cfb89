//! Extension counter
//!
//! The counter is a two-state machine packed into one atomic word:
//!
//! ```text
//! bit 32     : frozen flag
//! bits 0..32 : extension
//! ```
//!
//! `Active(n)` may advance to `Active(n + 1)` or to `Frozen(n)`; `Frozen` is
//! absorbing. Both transitions go through a single compare-exchange, so the
//! decision to freeze is atomic with the extension it was taken on.

use std::sync::atomic::{AtomicU64, Ordering};

use corvec_core::is_oversized;

const FROZEN_BIT: u64 = 1 << 32;
const EXTENSION_MASK: u64 = FROZEN_BIT - 1;

/// Observable counter state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CounterState {
    /// Extension may still grow
    Active(u32),
    /// Terminated; never changes again
    Frozen(u32),
}

impl CounterState {
    #[inline]
    pub fn extension(self) -> u32 {
        match self {
            CounterState::Active(ext) | CounterState::Frozen(ext) => ext,
        }
    }

    #[inline]
    pub fn is_frozen(self) -> bool {
        matches!(self, CounterState::Frozen(_))
    }

    #[inline]
    fn pack(self) -> u64 {
        match self {
            CounterState::Active(ext) => u64::from(ext),
            CounterState::Frozen(ext) => u64::from(ext) | FROZEN_BIT,
        }
    }

    #[inline]
    fn unpack(word: u64) -> Self {
        let ext = (word & EXTENSION_MASK) as u32;
        if word & FROZEN_BIT != 0 {
            CounterState::Frozen(ext)
        } else {
            CounterState::Active(ext)
        }
    }
}

/// Lock-free, overflow-safe extension counter
#[derive(Debug)]
pub struct ExtensionCounter {
    state: AtomicU64,
}

impl ExtensionCounter {
    pub fn new(state: CounterState) -> Self {
        ExtensionCounter {
            state: AtomicU64::new(state.pack()),
        }
    }

    /// Current state
    #[inline]
    pub fn state(&self) -> CounterState {
        CounterState::unpack(self.state.load(Ordering::Acquire))
    }

    /// Advance the extension by one.
    ///
    /// Returns the state the caller should render:
    /// - `Frozen(n)` unchanged if already terminated
    /// - `Active(u32::MAX)` unchanged once the counter is exhausted
    /// - `Frozen(n)` if `{base_vector}.{n + 1}` would exceed `max_length`
    /// - `Active(n + 1)` otherwise
    pub fn increment(&self, base_vector: &str, max_length: usize) -> CounterState {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let snapshot = CounterState::unpack(current);
            let ext = match snapshot {
                CounterState::Frozen(_) => return snapshot,
                CounterState::Active(u32::MAX) => return snapshot,
                CounterState::Active(ext) => ext,
            };

            let next = ext + 1;
            let target = if is_oversized(base_vector, next, max_length) {
                CounterState::Frozen(ext)
            } else {
                CounterState::Active(next)
            };

            match self.state.compare_exchange_weak(
                current,
                target.pack(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if target.is_frozen() {
                        tracing::debug!(
                            base_vector,
                            extension = ext,
                            max_length,
                            "correlation vector frozen: next extension would be oversized"
                        );
                    }
                    return target;
                }
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clone for ExtensionCounter {
    fn clone(&self) -> Self {
        ExtensionCounter::new(self.state())
    }
}
