use async_trait::async_trait;
use chrono::Utc;
use common::{IdError, ObjectId, StudentId, TeacherId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Cart, CartHistoryEntry, CartItem, HistoryEventType, HistoryQuery, Result, StoreError, Version,
    store::{CartStore, HistoryStore},
};

const CART_COLUMNS: &str =
    "id, teacher_id, student_id, items, total_price, version, created_at, updated_at";

const HISTORY_COLUMNS: &str =
    "id, teacher_id, student_id, product_id, event_type, quantity, occurred_at";

/// Runs the database migrations for the cart and history tables.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

fn corrupt(err: IdError) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

fn parse_object_id(value: &str) -> Result<ObjectId> {
    ObjectId::parse_str(value.trim()).map_err(corrupt)
}

fn owners(row: &PgRow) -> Result<(TeacherId, StudentId)> {
    let teacher: String = row.try_get("teacher_id")?;
    let student: String = row.try_get("student_id")?;
    Ok((
        TeacherId::parse(teacher).map_err(corrupt)?,
        StudentId::parse(student).map_err(corrupt)?,
    ))
}

fn quantity_to_db(quantity: u32) -> Result<i32> {
    i32::try_from(quantity)
        .map_err(|_| StoreError::Corrupt(format!("quantity {quantity} out of range")))
}

/// PostgreSQL-backed cart store.
///
/// Items are kept as a JSONB array on the cart row; `version` provides
/// compare-and-swap on replace.
#[derive(Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    /// Creates a new PostgreSQL cart store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_cart(row: PgRow) -> Result<Cart> {
        let id: String = row.try_get("id")?;
        let items: serde_json::Value = row.try_get("items")?;
        let items: Vec<CartItem> = serde_json::from_value(items)?;
        let (teacher_id, student_id) = owners(&row)?;

        Ok(Cart {
            id: parse_object_id(&id)?,
            teacher_id,
            student_id,
            items,
            total_price: row.try_get("total_price")?,
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn get_or_create(&self, teacher_id: &TeacherId, student_id: &StudentId) -> Result<Cart> {
        let fresh = Cart::new(teacher_id.clone(), student_id.clone());

        // The unique owner constraint makes the insert a no-op for losers of a race.
        sqlx::query(
            r#"
            INSERT INTO carts (id, teacher_id, student_id, items, total_price, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (teacher_id, student_id) DO NOTHING
            "#,
        )
        .bind(fresh.id.to_hex())
        .bind(teacher_id.as_str())
        .bind(student_id.as_str())
        .bind(serde_json::to_value(&fresh.items)?)
        .bind(fresh.total_price)
        .bind(fresh.version.as_i64())
        .bind(fresh.created_at)
        .bind(fresh.updated_at)
        .execute(&self.pool)
        .await?;

        self.find(teacher_id, student_id)
            .await?
            .ok_or(StoreError::CartNotFound(fresh.id))
    }

    async fn find(&self, teacher_id: &TeacherId, student_id: &StudentId) -> Result<Option<Cart>> {
        let row = sqlx::query(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE teacher_id = $1 AND student_id = $2"
        ))
        .bind(teacher_id.as_str())
        .bind(student_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart).transpose()
    }

    async fn replace(&self, cart: &Cart) -> Result<Version> {
        let new_version: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE carts
            SET items = $1, total_price = $2, updated_at = $3, version = version + 1
            WHERE id = $4 AND version = $5
            RETURNING version
            "#,
        )
        .bind(serde_json::to_value(&cart.items)?)
        .bind(cart.total_price)
        .bind(Utc::now())
        .bind(cart.id.to_hex())
        .bind(cart.version.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(version) = new_version {
            return Ok(Version::new(version));
        }

        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM carts WHERE id = $1")
            .bind(cart.id.to_hex())
            .fetch_optional(&self.pool)
            .await?;

        match actual {
            Some(actual) => Err(StoreError::ConcurrencyConflict {
                cart_id: cart.id,
                expected: cart.version,
                actual: Version::new(actual),
            }),
            None => Err(StoreError::CartNotFound(cart.id)),
        }
    }

    async fn carts_for_teacher(&self, teacher_id: &TeacherId) -> Result<Vec<Cart>> {
        let rows = sqlx::query(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE teacher_id = $1 ORDER BY student_id ASC"
        ))
        .bind(teacher_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cart).collect()
    }

    async fn all_carts(&self) -> Result<Vec<Cart>> {
        let rows = sqlx::query(&format!(
            "SELECT {CART_COLUMNS} FROM carts ORDER BY teacher_id ASC, student_id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cart).collect()
    }
}

/// PostgreSQL-backed history ledger.
#[derive(Clone)]
pub struct PostgresHistoryStore {
    pool: PgPool,
}

impl PostgresHistoryStore {
    /// Creates a new PostgreSQL history store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: PgRow) -> Result<CartHistoryEntry> {
        let id: String = row.try_get("id")?;
        let product_id: String = row.try_get("product_id")?;
        let event_type: String = row.try_get("event_type")?;
        let quantity: i32 = row.try_get("quantity")?;
        let (teacher_id, student_id) = owners(&row)?;

        Ok(CartHistoryEntry {
            id: parse_object_id(&id)?,
            teacher_id,
            student_id,
            product_id: parse_object_id(&product_id)?,
            event_type: HistoryEventType::parse(&event_type)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown event type {event_type}")))?,
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::Corrupt(format!("negative quantity {quantity}")))?,
            occurred_at: row.try_get("occurred_at")?,
        })
    }
}

#[async_trait]
impl HistoryStore for PostgresHistoryStore {
    async fn append(&self, entries: Vec<CartHistoryEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for entry in &entries {
            sqlx::query(
                r#"
                INSERT INTO cart_history (id, teacher_id, student_id, product_id, event_type, quantity, occurred_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(entry.id.to_hex())
            .bind(entry.teacher_id.as_str())
            .bind(entry.student_id.as_str())
            .bind(entry.product_id.to_hex())
            .bind(entry.event_type.as_str())
            .bind(quantity_to_db(entry.quantity)?)
            .bind(entry.occurred_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn query(&self, query: HistoryQuery) -> Result<Vec<CartHistoryEntry>> {
        let mut sql = format!("SELECT {HISTORY_COLUMNS} FROM cart_history WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if query.teacher_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND teacher_id = ${param_count}"));
        }
        if query.student_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND student_id = ${param_count}"));
        }
        if query.product_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND product_id = ${param_count}"));
        }
        if query.event_types.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND event_type = ANY(${param_count})"));
        }
        if query.from_timestamp.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND occurred_at >= ${param_count}"));
        }
        if query.to_timestamp.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND occurred_at <= ${param_count}"));
        }

        sql.push_str(" ORDER BY occurred_at ASC, seq ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(teacher_id) = query.teacher_id {
            sqlx_query = sqlx_query.bind(teacher_id.as_str().to_string());
        }
        if let Some(student_id) = query.student_id {
            sqlx_query = sqlx_query.bind(student_id.as_str().to_string());
        }
        if let Some(product_id) = query.product_id {
            sqlx_query = sqlx_query.bind(product_id.to_hex());
        }
        if let Some(event_types) = query.event_types {
            let names: Vec<String> = event_types.iter().map(|t| t.as_str().to_string()).collect();
            sqlx_query = sqlx_query.bind(names);
        }
        if let Some(from_ts) = query.from_timestamp {
            sqlx_query = sqlx_query.bind(from_ts);
        }
        if let Some(to_ts) = query.to_timestamp {
            sqlx_query = sqlx_query.bind(to_ts);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_entry).collect()
    }
}
