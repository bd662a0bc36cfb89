//! Correlation vector and its entry points

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use corvec_core::codec::{self, decode, is_immutable, is_oversized, validate};
use corvec_core::{
    base_from_uuid, random_base, validate_during_creation, CvError, CvResult, Version, DELIMITER,
    TERMINATOR,
};
use corvec_time::{SpinParameters, SpinValue, SystemClock, TickSource};
use rand::RngCore;
use uuid::Uuid;

use crate::{CounterState, ExtensionCounter};

/// A correlation vector instance.
///
/// `base_vector` and `version` are fixed at construction; only the extension
/// counter changes, and it may be shared across threads.
pub struct CorrelationVector {
    base_vector: String,
    version: Version,
    counter: ExtensionCounter,
}

impl CorrelationVector {
    /// New V1 vector with a random base.
    ///
    /// Use this only when no vector arrived with the request.
    pub fn new() -> Self {
        Self::with_version(Version::V1)
    }

    /// New vector of the given version with a random base
    pub fn with_version(version: Version) -> Self {
        Self::from_parts(random_base(version), 0, false, version)
    }

    /// New V2 vector whose base encodes `uuid`
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self::with_version_and_uuid(Version::V2, uuid)
    }

    /// New vector of the given version whose base encodes `uuid`
    pub fn with_version_and_uuid(version: Version, uuid: Uuid) -> Self {
        Self::from_parts(
            base_from_uuid(&uuid, version.base_length()),
            0,
            false,
            version,
        )
    }

    fn from_parts(base_vector: String, extension: u32, immutable: bool, version: Version) -> Self {
        let frozen = immutable || is_oversized(&base_vector, extension, version.max_length());
        let state = if frozen {
            CounterState::Frozen(extension)
        } else {
            CounterState::Active(extension)
        };
        CorrelationVector {
            base_vector,
            version,
            counter: ExtensionCounter::new(state),
        }
    }

    /// Rebuild a vector from its string form without changing it.
    ///
    /// Never fails: input without a valid last extension yields a fresh
    /// vector of the inferred version.
    pub fn parse(correlation_vector: &str) -> Self {
        let version = Version::infer(correlation_vector);
        match decode(correlation_vector) {
            Some(d) => Self::from_parts(d.base_vector.to_owned(), d.extension, d.immutable, version),
            None => {
                tracing::debug!(
                    correlation_vector,
                    %version,
                    "unparseable correlation vector, starting a new one"
                );
                Self::with_version(version)
            }
        }
    }

    /// Adopt an inbound vector as the base of a new one with extension 0.
    ///
    /// Terminated input is returned as is. Input too long to extend is
    /// terminated instead. With validation during creation enabled,
    /// malformed input is rejected with [`CvError::InvalidArgument`].
    pub fn extend(correlation_vector: &str) -> CvResult<Self> {
        let version = Version::infer(correlation_vector);
        if is_immutable(correlation_vector) {
            return Ok(Self::parse(correlation_vector));
        }

        if validate_during_creation() {
            check(correlation_vector, version)?;
        }

        if is_oversized(correlation_vector, 0, version.max_length()) {
            tracing::debug!(
                correlation_vector,
                max_length = version.max_length(),
                "correlation vector too long to extend, terminating"
            );
            return Ok(Self::parse(&terminated(correlation_vector)));
        }

        Ok(Self::from_parts(
            correlation_vector.to_owned(),
            0,
            false,
            version,
        ))
    }

    /// Apply the spin operator with default parameters
    pub fn spin(correlation_vector: &str) -> CvResult<Self> {
        Self::spin_with(correlation_vector, &SpinParameters::default())
    }

    /// Apply the spin operator using the system clock
    pub fn spin_with(correlation_vector: &str, params: &SpinParameters) -> CvResult<Self> {
        Self::spin_at(correlation_vector, params, &SystemClock, &mut rand::thread_rng())
    }

    /// Apply the spin operator with an explicit clock and entropy source.
    ///
    /// `base.ext` becomes `base.ext.{spin}.0`. Fails with
    /// [`CvError::InvalidOperation`] for versions without spin support.
    pub fn spin_at<C, R>(
        correlation_vector: &str,
        params: &SpinParameters,
        clock: &C,
        rng: &mut R,
    ) -> CvResult<Self>
    where
        C: TickSource + ?Sized,
        R: RngCore + ?Sized,
    {
        let version = Version::infer(correlation_vector);
        if !version.supports_spin() {
            return Err(CvError::InvalidOperation(format!(
                "Spin is not supported in Correlation Vector {}",
                version
            )));
        }

        if is_immutable(correlation_vector) {
            return Ok(Self::parse(correlation_vector));
        }

        if validate_during_creation() {
            check(correlation_vector, version)?;
        }

        let value = SpinValue::compute(clock.now(), params, rng);
        tracing::trace!(correlation_vector, spin = value.value(), "spin");

        let base_vector = format!("{}{}{}", correlation_vector, DELIMITER, value);
        if is_oversized(&base_vector, 0, version.max_length()) {
            tracing::debug!(
                correlation_vector,
                max_length = version.max_length(),
                "correlation vector too long to spin, terminating"
            );
            return Ok(Self::parse(&terminated(correlation_vector)));
        }

        Ok(Self::from_parts(base_vector, 0, false, version))
    }

    /// Advance the extension and return the new value.
    ///
    /// Never fails. A vector that cannot grow any further is terminated
    /// and keeps returning its last value.
    pub fn increment(&self) -> String {
        self.render(self.counter.increment(&self.base_vector, self.version.max_length()))
    }

    /// Current string form, suitable for the outbound header
    pub fn value(&self) -> String {
        self.render(self.counter.state())
    }

    /// Root segment identifying the trace
    pub fn base(&self) -> &str {
        self.base_vector
            .split(DELIMITER)
            .next()
            .unwrap_or_default()
    }

    /// Everything before the live extension
    #[inline]
    pub fn base_vector(&self) -> &str {
        &self.base_vector
    }

    #[inline]
    pub fn extension(&self) -> u32 {
        self.counter.state().extension()
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn is_immutable(&self) -> bool {
        self.counter.state().is_frozen()
    }

    /// Decode a V2 base back into its UUID.
    ///
    /// With validation during creation enabled, bases that would lose
    /// precision are rejected with [`CvError::InvalidOperation`].
    pub fn base_as_uuid(&self) -> CvResult<Uuid> {
        corvec_core::base_as_uuid(self.base(), self.version, validate_during_creation())
    }

    fn render(&self, state: CounterState) -> String {
        codec::format(&self.base_vector, state.extension(), state.is_frozen())
    }
}

fn check(correlation_vector: &str, version: Version) -> CvResult<()> {
    validate(
        correlation_vector,
        version.base_length(),
        version.max_length(),
    )
    .map_err(|e| {
        tracing::warn!(correlation_vector, %version, error = %e, "rejected correlation vector");
        e
    })
}

fn terminated(correlation_vector: &str) -> String {
    let mut out = String::with_capacity(correlation_vector.len() + 1);
    out.push_str(correlation_vector);
    out.push(TERMINATOR);
    out
}

impl Default for CorrelationVector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CorrelationVector {
    fn clone(&self) -> Self {
        CorrelationVector {
            base_vector: self.base_vector.clone(),
            version: self.version,
            counter: self.counter.clone(),
        }
    }
}

impl PartialEq for CorrelationVector {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for CorrelationVector {}

impl fmt::Display for CorrelationVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value())
    }
}

impl fmt::Debug for CorrelationVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CV{}({})", self.version.number(), self.value())
    }
}

/// Same as [`CorrelationVector::parse`]
impl FromStr for CorrelationVector {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvec_core::set_validate_during_creation;
    use corvec_time::{ManualClock, Ticks};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serial_test::serial;

    const V1_BASE: &str = "tul4NUsfs9Cl7mOf";
    const V2_BASE: &str = "KZY+dsX2jEaZesgCPjJ2Ng";

    #[test]
    fn test_new_defaults_to_v1() {
        let cv = CorrelationVector::new();
        assert_eq!(cv.version(), Version::V1);
        assert_eq!(cv.extension(), 0);
        assert_eq!(cv.base().len(), 16);
        assert!(!cv.is_immutable());
    }

    #[test]
    fn test_explicit_versions() {
        assert_eq!(CorrelationVector::with_version(Version::V1).version(), Version::V1);
        let v2 = CorrelationVector::with_version(Version::V2);
        assert_eq!(v2.version(), Version::V2);
        assert_eq!(v2.base().len(), 22);
    }

    #[test]
    #[serial]
    fn test_extend_then_increment() {
        set_validate_during_creation(false);
        let cv = CorrelationVector::extend(V1_BASE).unwrap();
        assert_eq!(cv.value(), "tul4NUsfs9Cl7mOf.0");
        assert_eq!(cv.increment(), "tul4NUsfs9Cl7mOf.1");
        assert_eq!(cv.extension(), 1);
        assert_eq!(cv.base(), V1_BASE);
    }

    #[test]
    fn test_parse_keeps_fields() {
        let cv = CorrelationVector::parse("KZY+dsX2jEaZesgCPjJ2Ng.1.5");
        assert_eq!(cv.version(), Version::V2);
        assert_eq!(cv.base(), V2_BASE);
        assert_eq!(cv.base_vector(), "KZY+dsX2jEaZesgCPjJ2Ng.1");
        assert_eq!(cv.extension(), 5);
        assert_eq!(cv.value(), "KZY+dsX2jEaZesgCPjJ2Ng.1.5");
    }

    #[test]
    fn test_parse_malformed_starts_fresh() {
        let cv = CorrelationVector::parse("KZY+dsX2jEaZesgCPjJ2Ng.x");
        assert_eq!(cv.version(), Version::V2);
        assert_eq!(cv.extension(), 0);
        assert_ne!(cv.base(), V2_BASE);

        let cv: CorrelationVector = "".parse().unwrap();
        assert_eq!(cv.version(), Version::V1);
        assert_eq!(cv.extension(), 0);
    }

    #[test]
    fn test_parse_oversized_is_frozen() {
        let long = format!("{}.{}", V1_BASE, "1".repeat(50));
        let cv = CorrelationVector::parse(&format!("{}.1", long));
        assert!(cv.is_immutable());
        assert_eq!(cv.value(), format!("{}.1!", long));
    }

    #[test]
    fn test_clone_snapshots_counter() {
        let cv = CorrelationVector::parse("tul4NUsfs9Cl7mOf.3");
        let copy = cv.clone();
        cv.increment();
        assert_eq!(copy.extension(), 3);
        assert_eq!(cv.extension(), 4);
        assert_ne!(cv, copy);
        assert_eq!(copy, CorrelationVector::parse("tul4NUsfs9Cl7mOf.3"));
    }

    #[test]
    fn test_display_and_debug() {
        let cv = CorrelationVector::parse("tul4NUsfs9Cl7mOf.3!");
        assert_eq!(cv.to_string(), "tul4NUsfs9Cl7mOf.3!");
        assert_eq!(format!("{:?}", cv), "CV1(tul4NUsfs9Cl7mOf.3!)");
    }

    #[test]
    #[serial]
    fn test_spin_at_layout() {
        set_validate_during_creation(false);
        let clock = ManualClock::new(Ticks::new(0x0000_0001_2345_0000));
        let mut rng = StdRng::seed_from_u64(1);
        let params = SpinParameters::fine_grained();

        let parent = format!("{}.0", V2_BASE);
        let cv = CorrelationVector::spin_at(&parent, &params, &clock, &mut rng).unwrap();
        let value = cv.value();
        let parts: Vec<&str> = value.split(DELIMITER).collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], V2_BASE);
        assert_eq!(parts[1], "0");
        assert_eq!(parts[3], "0");

        let spin = SpinValue::parse(parts[2], &params).unwrap();
        assert_eq!(spin.counter(&params), 0x2345);
        assert_eq!(cv.base(), V2_BASE);
        assert_eq!(cv.extension(), 0);
    }

    #[test]
    fn test_spin_v1_unsupported() {
        let err = CorrelationVector::spin("tul4NUsfs9Cl7mOf.0").unwrap_err();
        assert_eq!(
            err,
            CvError::InvalidOperation("Spin is not supported in Correlation Vector V1".into())
        );
    }

    #[test]
    #[serial]
    fn test_spin_validates_when_strict() {
        set_validate_during_creation(true);
        let result = CorrelationVector::spin("KZY+dsX2jEaZesgCPjJ2Ng.x");
        set_validate_during_creation(false);
        assert!(matches!(result, Err(CvError::InvalidArgument(_))));
    }

    #[test]
    #[serial]
    fn test_base_as_uuid_roundtrip() {
        set_validate_during_creation(false);
        let uuid = Uuid::new_v4();
        let cv = CorrelationVector::from_uuid(uuid);
        assert_eq!(cv.version(), Version::V2);
        assert_eq!(cv.base_as_uuid().unwrap(), uuid);

        cv.increment();
        assert_eq!(cv.base_as_uuid().unwrap(), uuid);
    }

    #[test]
    fn test_v1_from_uuid_truncates() {
        let uuid = Uuid::parse_str("ffffffff-ffff-ffff-ffff-fffffffffffc").unwrap();
        let cv = CorrelationVector::with_version_and_uuid(Version::V1, uuid);
        assert_eq!(cv.value(), "////////////////.0");
        assert!(cv.base_as_uuid().is_err());
    }

    proptest! {
        #[test]
        fn prop_parse_value_roundtrip(
            base in "[A-Za-z0-9+/]{16}",
            exts in proptest::collection::vec(any::<u32>(), 1..4),
        ) {
            let tail: Vec<String> = exts.iter().map(|e| e.to_string()).collect();
            let s = format!("{}.{}", base, tail.join("."));
            let cv = CorrelationVector::parse(&s);
            prop_assert_eq!(cv.value(), s.clone());
            prop_assert_eq!(cv.extension(), *exts.last().unwrap());
            prop_assert_eq!(CorrelationVector::parse(&cv.value()), cv);
        }

        #[test]
        fn prop_increment_never_exceeds_max(base in "[A-Za-z0-9+/]{16}", ext in 0u32..1_000_000) {
            let cv = CorrelationVector::parse(&format!("{}.{}", base, ext));
            for _ in 0..16 {
                let value = cv.increment();
                if !cv.is_immutable() {
                    prop_assert!(value.len() <= Version::V1.max_length());
                }
            }
        }
    }
}
