//! Vector base generation
//!
//! - V1: 12 random bytes, base64 encoded (exactly 16 characters)
//! - V2: the 16 UUID bytes, base64 encoded and cut to 22 characters
//!
//! Cutting the V2 encoding drops the padding. The last sextet then holds only
//! 2 bits of the UUID, so a base decodes to a UUID without loss only when it
//! ends in `A`, `Q`, `g` or `w` (low 4 bits zero). Bases generated from a
//! UUID always do; bases received from peers may not.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::Engine;
use uuid::Uuid;

use crate::{CvError, CvResult, Version};

/// Padding that turns a 22 character V2 base back into canonical base64
const V2_PADDING: &str = "==";

/// Last characters whose low 4 bits are zero
const LOSSLESS_TAIL: [char; 4] = ['A', 'Q', 'g', 'w'];

/// Standard alphabet that accepts non-zero trailing bits on decode
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Generate a fresh 16 character V1 base
pub fn random_v1_base() -> String {
    let bytes: [u8; 12] = rand::random();
    STANDARD.encode(bytes)
}

/// Encode a UUID as a vector base of `base_length` characters
pub fn base_from_uuid(uuid: &Uuid, base_length: usize) -> String {
    let mut encoded = STANDARD.encode(uuid.as_bytes());
    encoded.truncate(base_length);
    encoded
}

/// Generate a fresh base for the given version
pub fn random_base(version: Version) -> String {
    match version {
        Version::V1 => random_v1_base(),
        Version::V2 => base_from_uuid(&Uuid::new_v4(), Version::V2.base_length()),
    }
}

/// Does this base survive a base -> UUID -> base round trip?
#[inline]
pub fn is_lossless_uuid_base(base: &str) -> bool {
    base.chars().last().is_some_and(|c| LOSSLESS_TAIL.contains(&c))
}

/// Decode a V2 vector base back into the UUID it was generated from.
///
/// With `strict` set, bases whose last character carries low bits that a
/// UUID cannot hold are rejected; otherwise those bits are dropped.
pub fn base_as_uuid(base: &str, version: Version, strict: bool) -> CvResult<Uuid> {
    if version == Version::V1 {
        return Err(CvError::InvalidOperation(
            "Cannot convert a V1 correlation vector base to a UUID.".into(),
        ));
    }

    if strict && !is_lossless_uuid_base(base) {
        return Err(CvError::InvalidOperation(
            "The four least significant bits of the base64 encoded vector base must be zeros to reliably convert to a UUID."
                .into(),
        ));
    }

    let padded = format!("{}{}", base, V2_PADDING);
    let bytes = LENIENT.decode(padded).map_err(|e| {
        CvError::InvalidOperation(format!(
            "The vector base {} is not a base64 encoded UUID: {}",
            base, e
        ))
    })?;

    Uuid::from_slice(&bytes).map_err(|_| {
        CvError::InvalidOperation(format!(
            "The vector base {} decodes to {} bytes, expected 16",
            base,
            bytes.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_random_v1_base_shape() {
        for _ in 0..32 {
            let base = random_v1_base();
            assert_eq!(base.len(), Version::V1.base_length());
            assert!(!base.contains('.'));
            assert!(!base.contains('='));
        }
    }

    #[test]
    fn test_random_base_lengths() {
        for v in Version::ALL {
            assert_eq!(random_base(v).len(), v.base_length());
        }
        assert_ne!(random_base(Version::V2), random_base(Version::V2));
    }

    #[test]
    fn test_known_uuid_encoding() {
        let uuid = Uuid::parse_str("ffffffff-ffff-ffff-ffff-fffffffffffc").unwrap();
        assert_eq!(base_from_uuid(&uuid, 22), "/////////////////////A");
    }

    #[test]
    fn test_lossless_tails() {
        let cases = [
            ("/////////////////////A", "ffffffff-ffff-ffff-ffff-fffffffffffc"),
            ("/////////////////////Q", "ffffffff-ffff-ffff-ffff-fffffffffffd"),
            ("/////////////////////g", "ffffffff-ffff-ffff-ffff-fffffffffffe"),
            ("/////////////////////w", "ffffffff-ffff-ffff-ffff-ffffffffffff"),
        ];
        for (base, expected) in cases {
            let uuid = base_as_uuid(base, Version::V2, true).unwrap();
            assert_eq!(uuid, Uuid::parse_str(expected).unwrap());
            assert_eq!(base_from_uuid(&uuid, 22), base);
        }
    }

    #[test]
    fn test_lossy_base() {
        let base = "/////////////////////B";
        let err = base_as_uuid(base, Version::V2, true).unwrap_err();
        assert!(matches!(err, CvError::InvalidOperation(_)));

        let uuid = base_as_uuid(base, Version::V2, false).unwrap();
        assert_eq!(
            uuid,
            Uuid::parse_str("ffffffff-ffff-ffff-ffff-fffffffffffc").unwrap()
        );
        assert_eq!(base_from_uuid(&uuid, 22), "/////////////////////A");
    }

    #[test]
    fn test_v1_base_rejected() {
        let err = base_as_uuid("tul4NUsfs9Cl7mOf", Version::V1, false).unwrap_err();
        assert_eq!(
            err.message(),
            "Cannot convert a V1 correlation vector base to a UUID."
        );
    }

    #[test]
    fn test_undecodable_base() {
        assert!(base_as_uuid("not*base64*at*all*!!!!", Version::V2, false).is_err());
        assert!(base_as_uuid("short", Version::V2, false).is_err());
    }

    proptest! {
        #[test]
        fn prop_uuid_base_roundtrip(bytes in any::<[u8; 16]>()) {
            let uuid = Uuid::from_bytes(bytes);
            let base = base_from_uuid(&uuid, 22);
            prop_assert!(is_lossless_uuid_base(&base));
            prop_assert_eq!(base_as_uuid(&base, Version::V2, true).unwrap(), uuid);
        }
    }
}
