//! String-typed identifiers.
//!
//! The platform sends chat, message, user and media identifiers either as
//! JSON strings or as JSON numbers. Both shapes decode into the same [`Id`],
//! which always serializes back as a string. `null` decodes as the empty id.

use std::fmt;
use std::num::ParseIntError;

use serde::{Deserialize, Deserializer, Serialize};

/// A platform identifier, normalized to its string form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Id(String);

/// The two accepted wire shapes of an identifier.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl From<WireId> for Id {
    fn from(wire: WireId) -> Self {
        match wire {
            WireId::Text(text) => Self(text),
            WireId::Number(number) => Self(number.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<WireId>::deserialize(deserializer)
            .map(|wire| wire.map(Self::from).unwrap_or_default())
    }
}

impl Id {
    /// Creates an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the identifier as a signed 64-bit integer.
    pub fn as_i64(&self) -> Result<i64, ParseIntError> {
        self.0.parse()
    }

    /// Consumes the identifier and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for Id {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_string_and_number() {
        let from_text: Id = serde_json::from_str(r#""abc-1""#).unwrap();
        let from_number: Id = serde_json::from_str("42").unwrap();
        let from_negative: Id = serde_json::from_str("-1001").unwrap();

        assert_eq!(from_text, "abc-1");
        assert_eq!(from_number, "42");
        assert_eq!(from_negative.as_i64().unwrap(), -1001);
    }

    #[test]
    fn test_null_decodes_as_empty() {
        let id: Id = serde_json::from_str("null").unwrap();
        assert!(id.is_empty());
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(serde_json::from_str::<Id>("true").is_err());
        assert!(serde_json::from_str::<Id>("{}").is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let id = Id::from(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""42""#);
    }
}
