//! Item persistence.
//!
//! Every store operation runs against a caller-owned transaction handle
//! obtained from [`ItemStore::begin`]. Committing is explicit; a handle that
//! is dropped without [`ItemStore::commit`] rolls back.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{Item, ItemId, ItemUpdate, NewItem, Role};
pub use error::{Result, StoreError};
pub use memory::{InMemoryItemStore, InMemoryTransaction};
pub use postgres::PostgresItemStore;
pub use query::ItemFilter;
pub use store::ItemStore;
