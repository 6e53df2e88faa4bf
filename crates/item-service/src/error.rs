//! Service error types.

use common::ItemId;
use identity::IdentityError;
use item_store::StoreError;
use thiserror::Error;

/// Errors surfaced at the service boundary.
///
/// Store and identity provider failures stay distinguishable for logging,
/// but callers normally only need [`ServiceError::is_not_found`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No item has the given ID.
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    /// Local persistence failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The identity provider call failed.
    #[error("Identity provider error: {0}")]
    IdentityProvider(#[from] IdentityError),
}

impl ServiceError {
    /// Returns true if the error means the item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
