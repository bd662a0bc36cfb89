//! Spin values
//!
//! A spin value packs a coarse wall-clock counter and a few random bytes
//! into one integer:
//!
//! ```text
//! [ counter: periodicity bits ][ entropy: entropy * 8 bits ]
//! ```
//!
//! The counter is the tick count with the `interval` low bits dropped, so
//! spin values taken at least one counter step apart sort chronologically
//! until the counter wraps.

use std::fmt;
use std::time::Duration;

use rand::RngCore;

use crate::{Ticks, NANOS_PER_TICK};

/// Low tick bits dropped when computing the counter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SpinCounterInterval {
    /// Drop 24 bits: the counter steps every ~1.67 seconds
    #[default]
    Coarse = 24,
    /// Drop 16 bits: the counter steps every ~6.5 milliseconds
    Fine = 16,
}

impl SpinCounterInterval {
    #[inline]
    pub fn bits_to_drop(self) -> u32 {
        self as u32
    }

    /// Wall-clock time between counter steps
    pub fn step(self) -> Duration {
        Duration::from_nanos((1u64 << self.bits_to_drop()) * NANOS_PER_TICK)
    }
}

/// Bits kept for the counter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SpinCounterPeriodicity {
    /// No counter, entropy only
    None = 0,
    #[default]
    Short = 16,
    Medium = 24,
    Long = 32,
}

impl SpinCounterPeriodicity {
    #[inline]
    pub fn bits(self) -> u32 {
        self as u32
    }
}

/// Random bytes appended after the counter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SpinEntropy {
    None = 0,
    One = 1,
    #[default]
    Two = 2,
    Three = 3,
    Four = 4,
}

impl SpinEntropy {
    #[inline]
    pub fn bytes(self) -> usize {
        self as usize
    }

    pub fn from_bytes(n: usize) -> Option<Self> {
        match n {
            0 => Some(SpinEntropy::None),
            1 => Some(SpinEntropy::One),
            2 => Some(SpinEntropy::Two),
            3 => Some(SpinEntropy::Three),
            4 => Some(SpinEntropy::Four),
            _ => None,
        }
    }
}

/// Spin operator configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct SpinParameters {
    /// Counter resolution
    pub interval: SpinCounterInterval,
    /// Counter width, i.e. how often it wraps to zero
    pub periodicity: SpinCounterPeriodicity,
    /// Number of random bytes
    pub entropy: SpinEntropy,
}

impl SpinParameters {
    pub fn new(
        interval: SpinCounterInterval,
        periodicity: SpinCounterPeriodicity,
        entropy: SpinEntropy,
    ) -> Self {
        SpinParameters {
            interval,
            periodicity,
            entropy,
        }
    }

    /// Fine counter, short period: orders events a few milliseconds apart
    pub fn fine_grained() -> Self {
        SpinParameters::new(
            SpinCounterInterval::Fine,
            SpinCounterPeriodicity::Short,
            SpinEntropy::Two,
        )
    }

    /// Coarse counter that wraps only after years, with full entropy
    pub fn long_lived() -> Self {
        SpinParameters::new(
            SpinCounterInterval::Coarse,
            SpinCounterPeriodicity::Long,
            SpinEntropy::Four,
        )
    }

    /// Total width of the spin value
    #[inline]
    pub fn total_bits(&self) -> u32 {
        self.periodicity.bits() + self.entropy.bytes() as u32 * 8
    }

    #[inline]
    pub fn entropy_bits(&self) -> u32 {
        self.entropy.bytes() as u32 * 8
    }

    /// Time until the counter wraps, `None` when there is no counter
    pub fn period(&self) -> Option<Duration> {
        match self.periodicity {
            SpinCounterPeriodicity::None => None,
            p => Some(self.interval.step() * (1u32 << (p.bits() - 1)) * 2),
        }
    }
}

/// Counter and entropy packed into one integer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpinValue {
    value: u64,
    total_bits: u32,
}

impl SpinValue {
    /// Compute the spin value for `ticks`, drawing entropy from `rng`
    pub fn compute<R: RngCore + ?Sized>(ticks: Ticks, params: &SpinParameters, rng: &mut R) -> Self {
        let mut entropy = [0u8; 4];
        let entropy = &mut entropy[..params.entropy.bytes()];
        rng.fill_bytes(entropy);

        let mut value = ticks.as_u64() >> params.interval.bits_to_drop();
        for byte in entropy.iter() {
            value = (value << 8) | u64::from(*byte);
        }

        let total_bits = params.total_bits();
        SpinValue {
            value: value & mask(total_bits),
            total_bits,
        }
    }

    /// Rebuild a spin value from its rendered segment(s)
    pub fn parse(segments: &str, params: &SpinParameters) -> Option<Self> {
        let total_bits = params.total_bits();
        let value = if total_bits > 32 {
            let (high, low) = segments.split_once('.')?;
            let high: u32 = high.parse().ok()?;
            let low: u32 = low.parse().ok()?;
            (u64::from(high) << 32) | u64::from(low)
        } else {
            u64::from(segments.parse::<u32>().ok()?)
        };
        if value & !mask(total_bits) != 0 {
            return None;
        }
        Some(SpinValue { value, total_bits })
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    #[inline]
    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    /// The clock-derived part
    pub fn counter(&self, params: &SpinParameters) -> u64 {
        self.value.checked_shr(params.entropy_bits()).unwrap_or(0)
    }
}

/// Renders as one decimal segment, or `high.low` when wider than 32 bits
impl fmt::Display for SpinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let low = self.value as u32;
        if self.total_bits > 32 {
            write!(f, "{}.{}", (self.value >> 32) as u32, low)
        } else {
            write!(f, "{}", low)
        }
    }
}

#[inline]
fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
