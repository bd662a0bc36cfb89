//! Version policy
//!
//! Each protocol version fixes the length of the vector base and the maximum
//! length of the whole vector. Peers never announce their version; it is
//! inferred from the shape of the string.

use std::fmt;

use crate::codec::DELIMITER;

/// Correlation vector protocol version
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Version {
    /// 16 character random base, 63 characters max, no spin
    #[default]
    V1 = 1,
    /// 22 character UUID-derived base, 127 characters max, spin supported
    V2 = 2,
}

impl Version {
    pub const ALL: [Version; 2] = [Version::V1, Version::V2];

    /// Length of the vector base
    #[inline]
    pub const fn base_length(self) -> usize {
        match self {
            Version::V1 => 16,
            Version::V2 => 22,
        }
    }

    /// Maximum length of a mutable vector value
    #[inline]
    pub const fn max_length(self) -> usize {
        match self {
            Version::V1 => 63,
            Version::V2 => 127,
        }
    }

    /// Whether the spin operator is defined for this version
    #[inline]
    pub const fn supports_spin(self) -> bool {
        matches!(self, Version::V2)
    }

    #[inline]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Infer the version from the length of the first segment.
    ///
    /// Only the distance to the first delimiter is considered. Anything that
    /// matches neither base length, or has no delimiter at all, is V1.
    pub fn infer(correlation_vector: &str) -> Self {
        if let Some(index) = correlation_vector.chars().position(|c| c == DELIMITER) {
            if index == Version::V1.base_length() {
                return Version::V1;
            } else if index == Version::V2.base_length() {
                return Version::V2;
            }
        }
        Version::V1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.number())
    }
}
