//! Opaque member and recipient identities.
//!
//! The governance core never authenticates anyone. It receives an already
//! authenticated caller identity from the boundary layer and trusts it.
//! Identities are fixed 32-byte values; the CLI derives them from either a
//! 64-character hex string or a human-readable name hashed with SHA-256.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of an identity in bytes.
pub const IDENTITY_LEN: usize = 32;

/// A 32-byte opaque identity (member, recipient, or caller).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberId([u8; IDENTITY_LEN]);

/// Identity parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("identity must not be empty")]
    Empty,

    #[error("invalid hex identity: {0}")]
    InvalidHex(String),
}

impl MemberId {
    /// Create from a 32-byte array.
    pub const fn new(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a byte slice.
    ///
    /// Returns `None` unless the slice is exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; IDENTITY_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Get bytes.
    pub fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// Derive an identity from a human-readable name.
    ///
    /// Deterministic: the same name always yields the same identity.
    pub fn from_name(name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let mut bytes = [0u8; IDENTITY_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// First four bytes as hex, for log lines and compact listings.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl FromStr for MemberId {
    type Err = IdentityError;

    /// Parse a 64-character hex identity, or hash anything else as a name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdentityError::Empty);
        }

        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        if hex_part.len() == IDENTITY_LEN * 2 && hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            let bytes =
                hex::decode(hex_part).map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
            return Self::from_slice(&bytes)
                .ok_or_else(|| IdentityError::InvalidHex(format!("expected 32 bytes: {}", s)));
        }

        Ok(Self::from_name(s))
    }
}

/// Hex string in human-readable formats (JSON, TOML), raw bytes otherwise.
impl Serialize for MemberId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for MemberId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(&s))
                .map_err(serde::de::Error::custom)?;
            Self::from_slice(&bytes)
                .ok_or_else(|| serde::de::Error::custom("identity must be 32 bytes"))
        } else {
            <[u8; IDENTITY_LEN]>::deserialize(deserializer).map(Self)
        }
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberId({}…)", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_deterministic() {
        assert_eq!(MemberId::from_name("alice"), MemberId::from_name("alice"));
        assert_ne!(MemberId::from_name("alice"), MemberId::from_name("bob"));
    }

    #[test]
    fn test_display_is_hex() {
        let id = MemberId::new([0x42; 32]);
        let display = id.to_string();
        assert_eq!(display.len(), 64);
        assert!(display.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_parse_hex_roundtrips_display() {
        let id = MemberId::from_name("carol");
        let parsed: MemberId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_accepts_0x_prefix() {
        let id = MemberId::new([0xab; 32]);
        let parsed: MemberId = format!("0x{}", id).parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_name_falls_back_to_hash() {
        let parsed: MemberId = "alice".parse().unwrap();
        assert_eq!(parsed, MemberId::from_name("alice"));
    }

    #[test]
    fn test_parse_empty_rejected() {
        assert_eq!("  ".parse::<MemberId>(), Err(IdentityError::Empty));
    }

    #[test]
    fn test_from_slice_requires_exact_length() {
        assert!(MemberId::from_slice(&[1u8; 31]).is_none());
        assert!(MemberId::from_slice(&[1u8; 32]).is_some());
    }

    #[test]
    fn test_json_uses_hex_string() {
        let id = MemberId::new([0x01; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));

        let back: MemberId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_json_rejects_short_hex() {
        assert!(serde_json::from_str::<MemberId>("\"abcd\"").is_err());
    }

    #[test]
    fn test_short_is_eight_hex_chars() {
        let id = MemberId::new([0x0f; 32]);
        assert_eq!(id.short(), "0f0f0f0f");
    }
}
