//! Process-wide configuration
//!
//! A single switch controls whether vectors created from inbound strings are
//! validated strictly. It is off by default: foreign headers are tolerated and
//! oversized input is frozen instead of rejected.

use std::sync::atomic::{AtomicBool, Ordering};

static VALIDATE_DURING_CREATION: AtomicBool = AtomicBool::new(false);

/// Whether `extend`, `spin` and `base_as_uuid` validate strictly
#[inline]
pub fn validate_during_creation() -> bool {
    VALIDATE_DURING_CREATION.load(Ordering::Relaxed)
}

/// Toggle strict validation for the whole process
pub fn set_validate_during_creation(enabled: bool) {
    let previous = VALIDATE_DURING_CREATION.swap(enabled, Ordering::Relaxed);
    if previous != enabled {
        tracing::debug!(enabled, "correlation vector validation during creation changed");
    }
}
