//! The item entity and its write models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{ItemId, Role};

/// A locally managed user record linked to an external identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub email_address: String,
    /// Set only when the item was created through the orchestration path.
    pub external_user_id: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when inserting a new item.
///
/// `id` and the timestamps are assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub email_address: String,
    pub role: Role,
    pub external_user_id: Option<String>,
}

impl NewItem {
    /// Creates a new item without an external identity.
    pub fn new(name: impl Into<String>, email_address: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            email_address: email_address.into(),
            role,
            external_user_id: None,
        }
    }

    /// Returns a copy carrying the identity provider's user ID.
    pub fn with_external_user_id(mut self, external_user_id: impl Into<String>) -> Self {
        self.external_user_id = Some(external_user_id.into());
        self
    }
}

/// The locally mutable subset of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: String,
}

impl ItemUpdate {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Custom claims pushed onto an external identity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Claim key holding the item's role.
    pub const ROLE: &'static str = "role";

    /// Builds the claim set for an item's role.
    pub fn for_role(role: Role) -> Self {
        let mut claims = Map::new();
        claims.insert(Self::ROLE.to_string(), Value::from(role.value()));
        Self(claims)
    }

    /// Returns the claim value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the role claim, if present and numeric.
    pub fn role(&self) -> Option<Role> {
        self.get(Self::ROLE)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
            .map(Role::new)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes the claims as a JSON object string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }
}
