use async_trait::async_trait;

use crate::{Item, ItemFilter, ItemId, ItemUpdate, NewItem, Result};

/// Core trait for item store implementations.
///
/// Reads and writes go through an explicit transaction handle. The caller
/// owns the handle: it passes `&mut` into each operation and decides the
/// outcome with [`ItemStore::commit`]. Dropping the handle without committing
/// rolls back every write made through it.
///
/// Stores never talk to the identity provider.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Transaction handle type.
    type Tx: Send;

    /// Opens a new transaction.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Commits a transaction, making its writes visible.
    async fn commit(&self, tx: Self::Tx) -> Result<()>;

    /// Rolls back a transaction explicitly.
    async fn rollback(&self, tx: Self::Tx) -> Result<()>;

    /// Retrieves every item, ordered by ID.
    async fn find_all(&self, tx: &mut Self::Tx) -> Result<Vec<Item>>;

    /// Retrieves items matching a filter, ordered by ID.
    async fn find(&self, tx: &mut Self::Tx, filter: &ItemFilter) -> Result<Vec<Item>>;

    /// Retrieves a single item.
    ///
    /// Returns `Ok(None)` when no item has the given ID.
    async fn find_by_id(&self, tx: &mut Self::Tx, id: ItemId) -> Result<Option<Item>>;

    /// Inserts an item, returning it with storage-assigned fields filled in.
    async fn create(&self, tx: &mut Self::Tx, item: &NewItem) -> Result<Item>;

    /// Applies a local update.
    ///
    /// Returns `Ok(None)` when no item has the given ID.
    async fn update(
        &self,
        tx: &mut Self::Tx,
        id: ItemId,
        update: &ItemUpdate,
    ) -> Result<Option<Item>>;

    /// Deletes an item.
    ///
    /// Returns `Ok(false)` when no item had the given ID.
    async fn delete(&self, tx: &mut Self::Tx, id: ItemId) -> Result<bool>;
}
