//! Item service sequencing store and identity provider calls.

use common::{Claims, Item, ItemId, ItemUpdate, NewItem};
use identity::{Credential, IdentityError, IdentityProvider};
use item_store::{ItemFilter, ItemStore};

use crate::error::{Result, ServiceError};
use crate::steps::Step;

/// Orchestrates item reads and writes.
///
/// Every operation runs inside one store transaction. Identity provider
/// calls sit outside that transaction's rollback, so create and delete
/// order their steps to bound the inconsistency window and compensate by
/// deleting the external user when a later create step fails.
pub struct ItemService<S, I>
where
    S: ItemStore,
    I: IdentityProvider,
{
    store: S,
    identity: I,
}

impl<S, I> ItemService<S, I>
where
    S: ItemStore,
    I: IdentityProvider,
{
    /// Creates a new item service.
    pub fn new(store: S, identity: I) -> Self {
        Self { store, identity }
    }

    /// Lists every item.
    ///
    /// An empty table is a success with an empty list.
    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Item>> {
        let mut tx = self.store.begin().await?;
        let items = self.store.find_all(&mut tx).await.map_err(|e| {
            tracing::error!(error = %e, "listing items failed");
            e
        })?;
        self.store.commit(tx).await?;
        Ok(items)
    }

    /// Lists items matching a filter; no match is an empty list.
    #[tracing::instrument(skip(self))]
    pub async fn find(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        let mut tx = self.store.begin().await?;
        let items = self.store.find(&mut tx, filter).await.map_err(|e| {
            tracing::error!(error = %e, "filtering items failed");
            e
        })?;
        self.store.commit(tx).await?;
        Ok(items)
    }

    /// Loads an item by ID.
    ///
    /// Returns `Ok(None)` if the item doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>> {
        let mut tx = self.store.begin().await?;
        let item = self.store.find_by_id(&mut tx, id).await.map_err(|e| {
            tracing::error!(item_id = %id, error = %e, "loading item failed");
            e
        })?;
        self.store.commit(tx).await?;
        Ok(item)
    }

    /// Creates an item together with its external user.
    ///
    /// Steps run in strict order inside one store transaction: create the
    /// external user, persist the item carrying the issued user ID, set the
    /// role claim, commit. A failure after the external user exists deletes
    /// it once (no retry) and reports the original failure, whatever the
    /// outcome of that deletion.
    #[tracing::instrument(skip(self, item, credential), fields(name = %item.name))]
    pub async fn create(&self, item: NewItem, credential: &Credential) -> Result<Item> {
        let started = std::time::Instant::now();

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| self.create_failed(Step::Begin, e.into()))?;

        // 1. External user; nothing to undo if this fails
        let user = self
            .identity
            .create_user(&item, credential)
            .await
            .map_err(|e| self.create_failed(Step::CreateUser, e.into()))?;
        let uid = user.uid;
        tracing::info!(external_user_id = %uid, "external user created");

        // 2. Local record carrying the external user ID
        let item = item.with_external_user_id(uid.as_str());
        let created = match self.store.create(&mut tx, &item).await {
            Ok(created) => created,
            Err(e) => {
                drop(tx);
                return Err(self.abort_create(Step::PersistItem, &uid, e.into()).await);
            }
        };

        // 3. Role claim on the external user
        let claims = Claims::for_role(created.role);
        if let Err(e) = self.identity.set_custom_claims(&uid, &claims).await {
            drop(tx);
            return Err(self.abort_create(Step::SetClaims, &uid, e.into()).await);
        }

        if let Err(e) = self.store.commit(tx).await {
            return Err(self.abort_create(Step::Commit, &uid, e.into()).await);
        }

        metrics::counter!("items_created_total").increment(1);
        metrics::histogram!("item_create_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(item_id = %created.id, external_user_id = %uid, "item created");

        Ok(created)
    }

    /// Renames an item. The identity provider is not involved.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: ItemId, update: ItemUpdate) -> Result<Item> {
        let mut tx = self.store.begin().await?;
        let updated = self
            .store
            .update(&mut tx, id, &update)
            .await
            .map_err(|e| {
                tracing::error!(item_id = %id, error = %e, "updating item failed");
                e
            })?
            .ok_or(ServiceError::NotFound(id))?;
        self.store.commit(tx).await?;

        tracing::info!(item_id = %id, "item updated");
        Ok(updated)
    }

    /// Deletes an item and its external user.
    ///
    /// The external user goes first. If that fails the local record is left
    /// untouched, so no external user is ever left without its local record.
    /// A user the provider no longer knows counts as already deleted, so a
    /// delete whose local step failed can be retried.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ItemId) -> Result<()> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| self.delete_failed(id, Step::Begin, e.into()))?;

        let item = self
            .store
            .find_by_id(&mut tx, id)
            .await
            .map_err(|e| self.delete_failed(id, Step::LookupItem, e.into()))?
            .ok_or(ServiceError::NotFound(id))?;

        match item.external_user_id.as_deref() {
            Some(uid) => match self.identity.delete_user(uid).await {
                Ok(()) => {
                    tracing::info!(item_id = %id, external_user_id = %uid, "external user deleted");
                }
                Err(e) if e.is_user_not_found() => {
                    tracing::warn!(
                        item_id = %id,
                        external_user_id = %uid,
                        "external user already gone, deleting local record"
                    );
                }
                Err(e) => return Err(self.delete_failed(id, Step::DeleteUser, e.into())),
            },
            None => {
                tracing::warn!(item_id = %id, "item has no external user, deleting local record");
            }
        }

        let deleted = self
            .store
            .delete(&mut tx, id)
            .await
            .map_err(|e| self.delete_failed(id, Step::DeleteItem, e.into()))?;
        if !deleted {
            return Err(ServiceError::NotFound(id));
        }

        self.store
            .commit(tx)
            .await
            .map_err(|e| self.delete_failed(id, Step::Commit, e.into()))?;

        metrics::counter!("items_deleted_total").increment(1);
        tracing::info!(item_id = %id, "item deleted");
        Ok(())
    }

    /// Verifies a bearer token with the identity provider.
    #[tracing::instrument(skip(self, token))]
    pub async fn verify_token(&self, token: &str) -> std::result::Result<String, IdentityError> {
        self.identity.verify_token(token).await
    }

    /// Deletes the external user left behind by a failed create step and
    /// returns the original error.
    async fn abort_create(&self, step: Step, uid: &str, err: ServiceError) -> ServiceError {
        let err = self.create_failed(step, err);
        if step.orphans_external_user() {
            self.compensate(step, uid).await;
        }
        err
    }

    async fn compensate(&self, step: Step, uid: &str) {
        match self.identity.delete_user(uid).await {
            Ok(()) => {
                metrics::counter!("item_compensations_total", "outcome" => "succeeded")
                    .increment(1);
                tracing::warn!(%step, external_user_id = %uid, "external user removed after failed create");
            }
            Err(e) => {
                metrics::counter!("item_compensations_total", "outcome" => "failed").increment(1);
                tracing::error!(
                    %step,
                    external_user_id = %uid,
                    error = %e,
                    "compensation failed, external user is orphaned"
                );
            }
        }
    }

    fn create_failed(&self, step: Step, err: ServiceError) -> ServiceError {
        metrics::counter!("item_create_failures_total", "step" => step.as_str()).increment(1);
        tracing::error!(%step, error = %err, "item create failed");
        err
    }

    fn delete_failed(&self, id: ItemId, step: Step, err: ServiceError) -> ServiceError {
        metrics::counter!("item_delete_failures_total", "step" => step.as_str()).increment(1);
        match step {
            Step::DeleteItem | Step::Commit => tracing::error!(
                item_id = %id,
                %step,
                error = %err,
                "item delete failed after its external user was removed"
            ),
            _ => tracing::error!(item_id = %id, %step, error = %err, "item delete failed"),
        }
        err
    }
}
