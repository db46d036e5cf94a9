//! Type-safe order identifier.
//!
//! Orders arrive on the stream with a caller-assigned string identifier that
//! is the sole key for storage and cache lookups. Wrapping it in a newtype
//! keeps it from being mixed up with the other free-form strings on the
//! aggregate (track numbers, transaction ids, ...).

use serde::{Deserialize, Serialize};

/// Globally unique order identifier.
///
/// Immutable once assigned; the primary key across the order, delivery,
/// payment, and item records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Create a new ID from a string value.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the ID, returning the underlying string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the identifier is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_inner() {
        let id = OrderId::from("b563feb7b2b84b6test");
        assert_eq!(id.to_string(), "b563feb7b2b84b6test");
        assert_eq!(id.as_str(), "b563feb7b2b84b6test");
    }

    #[test]
    fn test_serde_transparent() {
        let id = OrderId::from("abc123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc123\"");

        let back: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_is_empty() {
        assert!(OrderId::from("").is_empty());
        assert!(!OrderId::from("x").is_empty());
    }
}
