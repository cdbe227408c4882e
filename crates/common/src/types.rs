use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Error returned when an identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The value is not a 24-character hexadecimal object ID.
    #[error("invalid object id {value:?}: expected 24 hexadecimal characters")]
    InvalidObjectId { value: String },

    /// A required identifier was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// Opaque 12-byte document identifier, rendered as 24 lowercase hex characters.
///
/// Newly generated IDs carry the creation time (big-endian unix seconds) in
/// the first four bytes, followed by eight random bytes, so they sort
/// roughly by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Creates a new object ID stamped with the current time.
    pub fn new() -> Self {
        let seconds = chrono::Utc::now().timestamp().clamp(0, i64::from(u32::MAX)) as u32;
        let random = Uuid::new_v4();

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..].copy_from_slice(&random.as_bytes()[..8]);
        Self(bytes)
    }

    /// Creates an object ID from raw bytes.
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Parses a 24-character hex string (either case).
    pub fn parse_str(value: &str) -> Result<Self, IdError> {
        let invalid = || IdError::InvalidObjectId {
            value: value.to_string(),
        };

        if value.len() != 24 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &value[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
        }
        Ok(Self(bytes))
    }

    /// Returns the raw bytes.
    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Returns the lowercase hex representation.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse_str(&value).map_err(serde::de::Error::custom)
    }
}

macro_rules! owner_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parses a non-empty identifier, trimming surrounding whitespace.
            pub fn parse(value: impl AsRef<str>) -> Result<Self, IdError> {
                let trimmed = value.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(IdError::Empty { field: $field });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

owner_id!(
    /// Identifier of the teacher who owns a set of carts.
    TeacherId,
    "teacher_id"
);

owner_id!(
    /// Identifier of the student a cart is kept for.
    StudentId,
    "student_id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_new_creates_unique_ids() {
        let id1 = ObjectId::new();
        let id2 = ObjectId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn object_id_hex_is_24_lowercase_chars() {
        let hex = ObjectId::new().to_hex();
        assert_eq!(hex.len(), 24);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn object_id_parse_accepts_upper_and_lower_case() {
        let lower = ObjectId::parse_str("65f1a2b3c4d5e6f708192a3b").unwrap();
        let upper = ObjectId::parse_str("65F1A2B3C4D5E6F708192A3B").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.to_string(), "65f1a2b3c4d5e6f708192a3b");
    }

    #[test]
    fn object_id_parse_rejects_bad_input() {
        for bad in ["", "abc", "65f1a2b3c4d5e6f708192a3", "65f1a2b3c4d5e6f708192a3bz", "zzf1a2b3c4d5e6f708192a3b", "+5f1a2b3c4d5e6f708192a3b", "é5f1a2b3c4d5e6f708192a3"] {
            assert!(
                matches!(ObjectId::parse_str(bad), Err(IdError::InvalidObjectId { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn object_id_serializes_as_hex_string() {
        let id = ObjectId::parse_str("65f1a2b3c4d5e6f708192a3b").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"65f1a2b3c4d5e6f708192a3b\"");
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn object_id_deserialize_rejects_invalid_hex() {
        let result: Result<ObjectId, _> = serde_json::from_str("\"not-an-id\"");
        assert!(result.is_err());
    }

    #[test]
    fn owner_ids_reject_blank_values() {
        assert_eq!(
            TeacherId::parse("   "),
            Err(IdError::Empty {
                field: "teacher_id"
            })
        );
        assert_eq!(
            StudentId::parse(""),
            Err(IdError::Empty {
                field: "student_id"
            })
        );
        assert_eq!(TeacherId::parse(" t-1 ").unwrap().as_str(), "t-1");
    }
}
