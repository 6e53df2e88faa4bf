//! Identity provider client.
//!
//! The identity provider owns credentials and issues tokens. This crate
//! exposes it as the [`IdentityProvider`] capability trait with two
//! implementations: [`HttpIdentityProvider`] for an Identity Toolkit style
//! REST API and [`InMemoryIdentityProvider`] for tests and local runs.

pub mod credential;
pub mod error;
pub mod http;
pub mod memory;
pub mod provider;

pub use credential::Credential;
pub use error::{IdentityError, Result};
pub use http::{HttpIdentityConfig, HttpIdentityProvider};
pub use memory::InMemoryIdentityProvider;
pub use provider::{IdentityProvider, UserRecord};
