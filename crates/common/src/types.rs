use serde::{Deserialize, Serialize};

/// Storage-assigned identifier of an item.
///
/// Wraps the database key to keep item IDs from being mixed up with
/// other integers (roles, counts, ports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Creates an item ID from a raw key.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying key.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Role claim attached to an item's external identity.
///
/// The value is opaque to this system; it is persisted locally and pushed to
/// the identity provider as the `role` custom claim.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Role(i32);

impl Role {
    /// Creates a role from its numeric value.
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Role {
    fn from(value: i32) -> Self {
        Self(value)
    }
}
