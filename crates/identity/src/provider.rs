use async_trait::async_trait;
use common::{Claims, NewItem};

use crate::{Credential, Result};

/// An external user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    /// The user ID issued by the provider.
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub custom_claims: Claims,
}

/// Trait for identity provider operations.
///
/// None of these calls take part in a local storage transaction; callers
/// that need all-or-nothing behaviour must compensate themselves.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an external user for an item.
    async fn create_user(&self, item: &NewItem, credential: &Credential) -> Result<UserRecord>;

    /// Deletes an external user.
    async fn delete_user(&self, uid: &str) -> Result<()>;

    /// Replaces the custom claims of an external user.
    async fn set_custom_claims(&self, uid: &str, claims: &Claims) -> Result<()>;

    /// Verifies a bearer token, returning its subject (the user ID).
    async fn verify_token(&self, token: &str) -> Result<String>;
}
