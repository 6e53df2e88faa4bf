use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    Item, ItemFilter, ItemId, ItemUpdate, NewItem, Result, Role, StoreError, store::ItemStore,
};

const ITEM_COLUMNS: &str =
    "id, name, email_address, external_user_id, role, created_at, updated_at";

/// PostgreSQL-backed item store implementation.
#[derive(Clone)]
pub struct PostgresItemStore {
    pool: PgPool,
}

impl PostgresItemStore {
    /// Creates a new PostgreSQL item store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_item(row: PgRow) -> Result<Item> {
        Ok(Item {
            id: ItemId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            email_address: row.try_get("email_address")?,
            external_user_id: row.try_get("external_user_id")?,
            role: Role::new(row.try_get("role")?),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

/// Maps unique-constraint violations to [`StoreError::Conflict`].
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(
            db_err
                .constraint()
                .unwrap_or("unique constraint")
                .to_string(),
        );
    }
    StoreError::Database(e)
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        tx.rollback().await?;
        Ok(())
    }

    async fn find_all(&self, tx: &mut Self::Tx) -> Result<Vec<Item>> {
        let rows = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id ASC"))
            .fetch_all(&mut **tx)
            .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn find(&self, tx: &mut Self::Tx, filter: &ItemFilter) -> Result<Vec<Item>> {
        let mut sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if filter.name().is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND name = ${param_count}"));
        }
        if filter.email_address().is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND email_address = ${param_count}"));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut query = sqlx::query(&sql);
        if let Some(name) = filter.name() {
            query = query.bind(name);
        }
        if let Some(email) = filter.email_address() {
            query = query.bind(email);
        }

        let rows = query.fetch_all(&mut **tx).await?;
        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn find_by_id(&self, tx: &mut Self::Tx, id: ItemId) -> Result<Option<Item>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
                .bind(id.as_i64())
                .fetch_optional(&mut **tx)
                .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn create(&self, tx: &mut Self::Tx, item: &NewItem) -> Result<Item> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO items (name, email_address, external_user_id, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&item.name)
        .bind(&item.email_address)
        .bind(item.external_user_id.as_deref())
        .bind(item.role.value())
        .fetch_one(&mut **tx)
        .await
        .map_err(map_write_error)?;

        let created = Self::row_to_item(row)?;
        tracing::debug!(item_id = %created.id, "item row inserted");
        Ok(created)
    }

    async fn update(
        &self,
        tx: &mut Self::Tx,
        id: ItemId,
        update: &ItemUpdate,
    ) -> Result<Option<Item>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            r#"
            UPDATE items SET name = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(&update.name)
        .bind(id.as_i64())
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_write_error)?;

        row.map(Self::row_to_item).transpose()
    }

    async fn delete(&self, tx: &mut Self::Tx, id: ItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
