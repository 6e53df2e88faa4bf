use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Claims, NewItem};

use crate::{Credential, IdentityError, IdentityProvider, Result, UserRecord};

#[derive(Debug, Default)]
struct InMemoryIdentityState {
    users: HashMap<String, UserRecord>,
    tokens: HashMap<String, String>,
    next_id: u32,
    create_calls: usize,
    delete_calls: Vec<String>,
    claims_calls: Vec<(String, Claims)>,
    fail_on_create: bool,
    fail_on_delete: bool,
    fail_on_set_claims: bool,
}

/// In-memory identity provider for testing and local runs.
///
/// Issues sequential user IDs (`ext-1`, `ext-2`, ...) and records every
/// delete and claims call, including rejected ones.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityProvider {
    state: Arc<RwLock<InMemoryIdentityState>>,
}

impl InMemoryIdentityProvider {
    /// Creates a new in-memory identity provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bearer token that verifies to `subject`.
    pub fn register_token(&self, token: impl Into<String>, subject: impl Into<String>) {
        self.state
            .write()
            .unwrap()
            .tokens
            .insert(token.into(), subject.into());
    }

    /// Configures the service to fail on create calls.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Configures the service to fail on delete calls.
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.state.write().unwrap().fail_on_delete = fail;
    }

    /// Configures the service to fail on claims calls.
    pub fn set_fail_on_set_claims(&self, fail: bool) {
        self.state.write().unwrap().fail_on_set_claims = fail;
    }

    /// Returns the number of existing users.
    pub fn user_count(&self) -> usize {
        self.state.read().unwrap().users.len()
    }

    /// Returns a user by ID.
    pub fn user(&self, uid: &str) -> Option<UserRecord> {
        self.state.read().unwrap().users.get(uid).cloned()
    }

    /// Returns true if a user exists with the given ID.
    pub fn has_user(&self, uid: &str) -> bool {
        self.state.read().unwrap().users.contains_key(uid)
    }

    /// Returns how many times `create_user` was called.
    pub fn create_calls(&self) -> usize {
        self.state.read().unwrap().create_calls
    }

    /// Returns the user IDs passed to `delete_user`, in call order.
    pub fn delete_calls(&self) -> Vec<String> {
        self.state.read().unwrap().delete_calls.clone()
    }

    /// Returns the arguments passed to `set_custom_claims`, in call order.
    pub fn claims_calls(&self) -> Vec<(String, Claims)> {
        self.state.read().unwrap().claims_calls.clone()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_user(&self, item: &NewItem, _credential: &Credential) -> Result<UserRecord> {
        let mut state = self.state.write().unwrap();
        state.create_calls += 1;

        if state.fail_on_create {
            return Err(IdentityError::Unavailable("create rejected".to_string()));
        }
        if state.users.values().any(|u| u.email == item.email_address) {
            return Err(IdentityError::EmailExists(item.email_address.clone()));
        }

        state.next_id += 1;
        let uid = format!("ext-{}", state.next_id);
        let record = UserRecord {
            uid: uid.clone(),
            email: item.email_address.clone(),
            display_name: item.name.clone(),
            custom_claims: Claims::default(),
        };
        state.users.insert(uid, record.clone());

        Ok(record)
    }

    async fn delete_user(&self, uid: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.delete_calls.push(uid.to_string());

        if state.fail_on_delete {
            return Err(IdentityError::Unavailable("delete rejected".to_string()));
        }
        state
            .users
            .remove(uid)
            .map(|_| ())
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))
    }

    async fn set_custom_claims(&self, uid: &str, claims: &Claims) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.claims_calls.push((uid.to_string(), claims.clone()));

        if state.fail_on_set_claims {
            return Err(IdentityError::Unavailable("claims rejected".to_string()));
        }
        let user = state
            .users
            .get_mut(uid)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))?;
        user.custom_claims = claims.clone();
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> Result<String> {
        self.state
            .read()
            .unwrap()
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::InvalidToken("unknown token".to_string()))
    }
}
