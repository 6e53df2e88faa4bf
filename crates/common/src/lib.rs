//! Shared types for the item backend.
//!
//! Every crate in the workspace speaks in terms of [`Item`] and its identifiers,
//! so they live here rather than in the store or the service.

pub mod item;
pub mod types;

pub use item::{Claims, Item, ItemUpdate, NewItem};
pub use types::{ItemId, Role};
