use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Item, ItemFilter, ItemId, ItemUpdate, NewItem, Result, StoreError, store::ItemStore,
};

#[derive(Debug, Clone, Default)]
struct Table {
    rows: BTreeMap<ItemId, Item>,
    last_id: i64,
}

#[derive(Debug, Default)]
struct FailureSwitches {
    fail_on_begin: bool,
    fail_on_commit: bool,
    fail_on_read: bool,
    fail_on_create: bool,
    fail_on_update: bool,
    fail_on_delete: bool,
}

/// In-memory item store implementation for testing and local runs.
///
/// A transaction holds the table lock for its whole lifetime and works on a
/// staged copy, so transactions are serialized and a dropped handle leaves
/// the table untouched.
#[derive(Clone, Default)]
pub struct InMemoryItemStore {
    table: Arc<Mutex<Table>>,
    failures: Arc<RwLock<FailureSwitches>>,
}

/// Transaction handle for [`InMemoryItemStore`].
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Table>,
    staged: Table,
}

impl InMemoryItemStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an item in its own committed transaction.
    pub async fn insert(&self, item: NewItem) -> Result<Item> {
        let mut tx = self.begin().await?;
        let created = self.create(&mut tx, &item).await?;
        self.commit(tx).await?;
        Ok(created)
    }

    /// Returns the number of committed items.
    pub async fn item_count(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    /// Returns a committed item by ID.
    pub async fn get(&self, id: ItemId) -> Option<Item> {
        self.table.lock().await.rows.get(&id).cloned()
    }

    /// Configures the store to fail when opening a transaction.
    pub fn set_fail_on_begin(&self, fail: bool) {
        self.failures.write().unwrap().fail_on_begin = fail;
    }

    /// Configures the store to fail when committing.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.failures.write().unwrap().fail_on_commit = fail;
    }

    /// Configures the store to fail on reads.
    pub fn set_fail_on_read(&self, fail: bool) {
        self.failures.write().unwrap().fail_on_read = fail;
    }

    /// Configures the store to fail on inserts.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.failures.write().unwrap().fail_on_create = fail;
    }

    /// Configures the store to fail on updates.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.failures.write().unwrap().fail_on_update = fail;
    }

    /// Configures the store to fail on deletes.
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.failures.write().unwrap().fail_on_delete = fail;
    }

    fn check(&self, select: impl Fn(&FailureSwitches) -> bool, op: &str) -> Result<()> {
        let failures = self.failures.read().unwrap();
        if select(&*failures) {
            return Err(StoreError::Unavailable(format!("{op} rejected")));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        self.check(|f| f.fail_on_begin, "begin")?;
        let guard = self.table.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryTransaction { guard, staged })
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        self.check(|f| f.fail_on_commit, "commit")?;
        let InMemoryTransaction { mut guard, staged } = tx;
        *guard = staged;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        drop(tx);
        Ok(())
    }

    async fn find_all(&self, tx: &mut Self::Tx) -> Result<Vec<Item>> {
        self.check(|f| f.fail_on_read, "read")?;
        Ok(tx.staged.rows.values().cloned().collect())
    }

    async fn find(&self, tx: &mut Self::Tx, filter: &ItemFilter) -> Result<Vec<Item>> {
        self.check(|f| f.fail_on_read, "read")?;
        Ok(tx
            .staged
            .rows
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, tx: &mut Self::Tx, id: ItemId) -> Result<Option<Item>> {
        self.check(|f| f.fail_on_read, "read")?;
        Ok(tx.staged.rows.get(&id).cloned())
    }

    async fn create(&self, tx: &mut Self::Tx, item: &NewItem) -> Result<Item> {
        self.check(|f| f.fail_on_create, "insert")?;

        // Unique constraint simulation
        if let Some(ref external_id) = item.external_user_id
            && tx
                .staged
                .rows
                .values()
                .any(|existing| existing.external_user_id.as_ref() == Some(external_id))
        {
            return Err(StoreError::Conflict(format!(
                "external user {external_id} is already linked"
            )));
        }

        tx.staged.last_id += 1;
        let id = ItemId::new(tx.staged.last_id);
        let now = Utc::now();
        let created = Item {
            id,
            name: item.name.clone(),
            email_address: item.email_address.clone(),
            external_user_id: item.external_user_id.clone(),
            role: item.role,
            created_at: now,
            updated_at: now,
        };
        tx.staged.rows.insert(id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        tx: &mut Self::Tx,
        id: ItemId,
        update: &ItemUpdate,
    ) -> Result<Option<Item>> {
        self.check(|f| f.fail_on_update, "update")?;
        Ok(tx.staged.rows.get_mut(&id).map(|item| {
            item.name = update.name.clone();
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn delete(&self, tx: &mut Self::Tx, id: ItemId) -> Result<bool> {
        self.check(|f| f.fail_on_delete, "delete")?;
        Ok(tx.staged.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use common::Role;

    use super::*;

    fn new_item(name: &str) -> NewItem {
        NewItem::new(name, format!("{name}@example.com"), Role::new(0))
    }

    #[tokio::test]
    async fn create_assigns_ids_and_timestamps() {
        let store = InMemoryItemStore::new();

        let first = store.insert(new_item("a")).await.unwrap();
        let second = store.insert(new_item("b")).await.unwrap();

        assert_eq!(first.id, ItemId::new(1));
        assert_eq!(second.id, ItemId::new(2));
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(store.item_count().await, 2);
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = InMemoryItemStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            store.create(&mut tx, &new_item("a")).await.unwrap();
            assert_eq!(store.find_all(&mut tx).await.unwrap().len(), 1);
        }

        assert_eq!(store.item_count().await, 0);
    }

    #[tokio::test]
    async fn explicit_rollback_discards_writes() {
        let store = InMemoryItemStore::new();
        let item = store.insert(new_item("a")).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(store.delete(&mut tx, item.id).await.unwrap());
        store.rollback(tx).await.unwrap();

        assert!(store.get(item.id).await.is_some());
    }

    #[tokio::test]
    async fn find_by_id_missing_is_none() {
        let store = InMemoryItemStore::new();
        let mut tx = store.begin().await.unwrap();

        let found = store.find_by_id(&mut tx, ItemId::new(99)).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn find_applies_filter() {
        let store = InMemoryItemStore::new();
        store.insert(new_item("a")).await.unwrap();
        store.insert(new_item("b")).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let found = store
            .find(&mut tx, &ItemFilter::by_name("b"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "b");

        let none = store
            .find(&mut tx, &ItemFilter::by_email_address("nobody@example.com"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn update_touches_only_name() {
        let store = InMemoryItemStore::new();
        let item = store
            .insert(new_item("a").with_external_user_id("ext-1"))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        let updated = store
            .update(&mut tx, item.id, &ItemUpdate::new("renamed"))
            .await
            .unwrap()
            .unwrap();
        store.commit(tx).await.unwrap();

        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.email_address, item.email_address);
        assert_eq!(updated.external_user_id.as_deref(), Some("ext-1"));
        assert!(updated.updated_at >= item.updated_at);
    }

    #[tokio::test]
    async fn update_and_delete_missing_report_absence() {
        let store = InMemoryItemStore::new();
        let mut tx = store.begin().await.unwrap();

        let updated = store
            .update(&mut tx, ItemId::new(5), &ItemUpdate::new("x"))
            .await
            .unwrap();
        assert!(updated.is_none());
        assert!(!store.delete(&mut tx, ItemId::new(5)).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_external_user_conflicts() {
        let store = InMemoryItemStore::new();
        store
            .insert(new_item("a").with_external_user_id("ext-1"))
            .await
            .unwrap();

        let result = store
            .insert(new_item("b").with_external_user_id("ext-1"))
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.item_count().await, 1);
    }

    #[tokio::test]
    async fn failure_switches_reject_operations() {
        let store = InMemoryItemStore::new();
        store.set_fail_on_create(true);

        let result = store.insert(new_item("a")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        store.set_fail_on_create(false);
        store.set_fail_on_commit(true);
        assert!(store.insert(new_item("a")).await.is_err());
        assert_eq!(store.item_count().await, 0);
    }
}
