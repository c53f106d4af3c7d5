//! Part Catalog Repository
//!
//! Reads and writes catalog parts and their recorded alternatives.
//! Functions taking a connection run inside the caller's transaction.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use solderline_models::{LifecycleStage, PartAlternative, PartCatalogEntry};

pub(crate) const PART_COLUMNS: &str = "id, manufacturer_part_number, manufacturer, name, footprint, specifications, \
     unit_price, on_hand_quantity, lifecycle_stage, category, last_time_buy, created_at, updated_at";

pub struct PartRepository {
    pool: PgPool,
}

impl PartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every part, in catalog order
    pub async fn load_all(conn: &mut PgConnection) -> Result<Vec<PartCatalogEntry>> {
        let rows: Vec<PartRow> = sqlx::query_as(&format!(
            "SELECT {} FROM parts ORDER BY manufacturer_part_number, id",
            PART_COLUMNS
        ))
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load part catalog")?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn load_alternatives(conn: &mut PgConnection) -> Result<Vec<PartAlternative>> {
        let rows: Vec<AlternativeRow> = sqlx::query_as(
            r#"
            SELECT part_id, alternative_id, compatibility_score, notes
            FROM part_alternatives
            ORDER BY part_id, alternative_id
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .context("Failed to load part alternatives")?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_all(&self) -> Result<Vec<PartCatalogEntry>> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        Self::load_all(&mut conn).await
    }

    pub async fn find_all_alternatives(&self) -> Result<Vec<PartAlternative>> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        Self::load_alternatives(&mut conn).await
    }

    /// Inserts a part or replaces the stored copy with the same id
    pub async fn upsert(conn: &mut PgConnection, part: &PartCatalogEntry) -> Result<()> {
        let specifications = serde_json::to_value(&part.specifications)?;

        sqlx::query(&format!(
            r#"
            INSERT INTO parts ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO UPDATE SET
                manufacturer_part_number = EXCLUDED.manufacturer_part_number,
                manufacturer = EXCLUDED.manufacturer,
                name = EXCLUDED.name,
                footprint = EXCLUDED.footprint,
                specifications = EXCLUDED.specifications,
                unit_price = EXCLUDED.unit_price,
                on_hand_quantity = EXCLUDED.on_hand_quantity,
                lifecycle_stage = EXCLUDED.lifecycle_stage,
                category = EXCLUDED.category,
                last_time_buy = EXCLUDED.last_time_buy,
                updated_at = EXCLUDED.updated_at
            "#,
            PART_COLUMNS
        ))
        .bind(part.id)
        .bind(&part.manufacturer_part_number)
        .bind(&part.manufacturer)
        .bind(&part.name)
        .bind(&part.footprint)
        .bind(&specifications)
        .bind(part.unit_price)
        .bind(i64::from(part.on_hand_quantity))
        .bind(part.lifecycle_stage.as_str())
        .bind(&part.category)
        .bind(part.last_time_buy)
        .bind(part.created_at)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to store part {}", part.manufacturer_part_number))?;

        Ok(())
    }

    pub async fn upsert_alternative(conn: &mut PgConnection, alternative: &PartAlternative) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO part_alternatives (part_id, alternative_id, compatibility_score, notes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (part_id, alternative_id)
            DO UPDATE SET compatibility_score = EXCLUDED.compatibility_score, notes = EXCLUDED.notes
            "#,
        )
        .bind(alternative.part_id)
        .bind(alternative.alternative_id)
        .bind(alternative.compatibility_score)
        .bind(&alternative.notes)
        .execute(&mut *conn)
        .await
        .context("Failed to store part alternative")?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PartRow {
    id: Uuid,
    manufacturer_part_number: String,
    manufacturer: Option<String>,
    name: String,
    footprint: String,
    specifications: serde_json::Value,
    unit_price: Decimal,
    on_hand_quantity: i64,
    lifecycle_stage: String,
    category: Option<String>,
    last_time_buy: Option<NaiveDate>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl TryFrom<PartRow> for PartCatalogEntry {
    type Error = anyhow::Error;

    fn try_from(row: PartRow) -> Result<Self> {
        let lifecycle_stage = row
            .lifecycle_stage
            .parse::<LifecycleStage>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Invalid lifecycle stage for part {}", row.id))?;

        Ok(Self {
            id: row.id,
            manufacturer_part_number: row.manufacturer_part_number,
            manufacturer: row.manufacturer,
            name: row.name,
            footprint: row.footprint,
            specifications: serde_json::from_value(row.specifications)
                .with_context(|| format!("Invalid specifications for part {}", row.id))?,
            unit_price: row.unit_price,
            on_hand_quantity: u32::try_from(row.on_hand_quantity.max(0)).unwrap_or(u32::MAX),
            lifecycle_stage,
            category: row.category,
            last_time_buy: row.last_time_buy,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AlternativeRow {
    part_id: Uuid,
    alternative_id: Uuid,
    compatibility_score: f64,
    notes: Option<String>,
}

impl From<AlternativeRow> for PartAlternative {
    fn from(row: AlternativeRow) -> Self {
        Self {
            part_id: row.part_id,
            alternative_id: row.alternative_id,
            compatibility_score: row.compatibility_score,
            notes: row.notes,
        }
    }
}
