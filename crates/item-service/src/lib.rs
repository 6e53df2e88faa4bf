//! Item orchestration service.
//!
//! Keeps an item and its external identity in lockstep even though they live
//! in two independently failing systems: a transactional local store and a
//! non-transactional identity provider.
//!
//! Creating an item runs three steps inside one store transaction:
//! 1. Create the external user
//! 2. Persist the item with the issued user ID
//! 3. Set the role claim on the external user
//!
//! If step 2 or 3 (or the final commit) fails, the external user is deleted
//! as a single best-effort compensation and the original failure is reported.
//! Deleting removes the external user first and never deletes the local
//! record while its external identity still exists.

pub mod error;
pub mod service;
pub mod steps;

pub use error::ServiceError;
pub use service::ItemService;
pub use steps::Step;
