//! WireGuard keys.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Raw length of a WireGuard key.
pub const KEY_LEN: usize = 32;

/// Length of a key in padded standard base64.
pub const ENCODED_KEY_LEN: usize = 44;

/// Standard alphabet that tolerates non-zero trailing bits in the final
/// symbol, as `wg` and other WireGuard tooling do.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// A 32-byte Curve25519 public or symmetric preshared key.
///
/// Equality runs in constant time.
#[derive(Clone, Copy)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    /// Wraps raw key bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Decodes a key from standard base64.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] when the text is not base64 or does not decode
    /// to exactly 32 bytes.
    pub fn from_base64(text: &str) -> Result<Self, KeyError> {
        let bytes = LENIENT.decode(text)?;
        let raw: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|bytes: Vec<u8>| KeyError::Size(bytes.len()))?;
        Ok(Self(raw))
    }

    /// Encodes the key as padded standard base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl ConstantTimeEq for Key {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Key {}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

// Preshared keys are secrets; never print key material.
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(..)")
    }
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::from_base64(text)
    }
}

/// Failures decoding a key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The text was not valid base64.
    #[error("failed to parse base64-encoded key: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded key had the wrong length.
    #[error("incorrect key size: {0}")]
    Size(usize),
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const SAMPLE: &str = "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=";

    #[test]
    fn round_trips_through_base64() {
        let key = Key::from_base64(SAMPLE).expect("decode key");
        assert_eq!(key.to_base64(), SAMPLE);
        assert_eq!(key.to_string().len(), ENCODED_KEY_LEN);
    }

    #[rstest]
    #[case("not base64!")]
    #[case("AAAA")]
    #[case("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")]
    fn rejects_bad_keys(#[case] text: &str) {
        assert!(Key::from_base64(text).is_err());
    }

    #[test]
    fn accepts_non_canonical_trailing_bits() {
        let text = format!("{}B=", "A".repeat(42));
        let key = Key::from_base64(&text).expect("decode key");
        assert_eq!(key, Key::from_bytes([0; KEY_LEN]));
        assert_eq!(key.to_base64(), format!("{}A=", "A".repeat(42)));
    }

    #[test]
    fn equality_compares_every_byte() {
        let mut bytes = [9; KEY_LEN];
        let key = Key::from_bytes(bytes);
        bytes[KEY_LEN - 1] = 8;
        assert_ne!(key, Key::from_bytes(bytes));
        assert_eq!(key, Key::from_bytes([9; KEY_LEN]));
    }

    #[test]
    fn short_keys_report_their_size() {
        assert_eq!(Key::from_base64("AAAA"), Err(KeyError::Size(3)));
    }

    #[test]
    fn debug_output_hides_key_material() {
        let key = Key::from_bytes([7; KEY_LEN]);
        assert_eq!(format!("{key:?}"), "Key(..)");
    }
}
