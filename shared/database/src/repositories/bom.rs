//! BOM Snapshot Repository
//!
//! A snapshot and all of its items are written on the caller's transaction.
//! Items keep their snapshot order through the `position` column.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use solderline_models::{BomLineItem, BomSnapshot, PartCatalogEntry, ResolutionMethod, ResolvedBomItem};

use super::part::{PartRow, PART_COLUMNS};

/// Snapshot header without items, for listings
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SnapshotSummary {
    pub id: Uuid,
    pub project_id: Uuid,
    pub version_label: String,
    pub source_filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub item_count: i64,
}

pub struct BomRepository {
    pool: PgPool,
}

impl BomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Writes the snapshot header and every item on the given connection
    pub async fn insert_snapshot(conn: &mut PgConnection, snapshot: &BomSnapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bom_snapshots
                (id, project_id, version_label, source_filename, source_checksum, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(snapshot.id)
        .bind(snapshot.project_id)
        .bind(&snapshot.version_label)
        .bind(&snapshot.source_filename)
        .bind(&snapshot.source_checksum)
        .bind(snapshot.created_at)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to insert snapshot {}", snapshot.version_label))?;

        for (position, item) in snapshot.items.iter().enumerate() {
            let line = &item.line_item;
            sqlx::query(
                r#"
                INSERT INTO bom_items
                    (snapshot_id, position, designator, value, footprint, manufacturer_part,
                     quantity, notes, source_row, part_id, resolution, allocated)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(snapshot.id)
            .bind(i32::try_from(position).context("Too many BOM items")?)
            .bind(&line.designator)
            .bind(&line.value)
            .bind(&line.footprint)
            .bind(&line.manufacturer_part)
            .bind(i32::try_from(line.quantity).context("Quantity out of range")?)
            .bind(&line.notes)
            .bind(line.source_row.and_then(|r| i32::try_from(r).ok()))
            .bind(item.part_id())
            .bind(item.resolution.as_str())
            .bind(item.allocated)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to insert BOM item {}", line.designator))?;
        }

        tracing::debug!(
            snapshot_id = %snapshot.id,
            items = snapshot.items.len(),
            "Inserted BOM snapshot"
        );
        Ok(())
    }

    pub async fn find_by_label(&self, project_id: Uuid, version_label: &str) -> Result<Option<BomSnapshot>> {
        let header: Option<SnapshotRow> = sqlx::query_as(
            r#"
            SELECT id, project_id, version_label, source_filename, source_checksum, created_at
            FROM bom_snapshots
            WHERE project_id = $1 AND version_label = $2
            "#,
        )
        .bind(project_id)
        .bind(version_label)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch snapshot by label")?;

        match header {
            Some(header) => Ok(Some(self.load_items(header).await?)),
            None => Ok(None),
        }
    }

    pub async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<SnapshotSummary>> {
        let rows: Vec<SnapshotSummary> = sqlx::query_as(
            r#"
            SELECT s.id, s.project_id, s.version_label, s.source_filename, s.created_at,
                   COUNT(i.designator) AS item_count
            FROM bom_snapshots s
            LEFT JOIN bom_items i ON i.snapshot_id = s.id
            WHERE s.project_id = $1
            GROUP BY s.id
            ORDER BY s.created_at
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list snapshots")?;

        Ok(rows)
    }

    /// Changes one item's allocation flag; returns false if the designator is unknown
    pub async fn set_allocation(&self, snapshot_id: Uuid, designator: &str, allocated: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE bom_items SET allocated = $3 WHERE snapshot_id = $1 AND designator = $2",
        )
        .bind(snapshot_id)
        .bind(designator)
        .bind(allocated)
        .execute(&self.pool)
        .await
        .context("Failed to update allocation")?;

        Ok(result.rows_affected() > 0)
    }

    async fn load_items(&self, header: SnapshotRow) -> Result<BomSnapshot> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT designator, value, footprint, manufacturer_part, quantity, notes,
                   source_row, part_id, resolution, allocated
            FROM bom_items
            WHERE snapshot_id = $1
            ORDER BY position
            "#,
        )
        .bind(header.id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch BOM items")?;

        let part_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.part_id).collect();
        let part_rows: Vec<PartRow> = sqlx::query_as(&format!(
            "SELECT {} FROM parts WHERE id = ANY($1)",
            PART_COLUMNS
        ))
        .bind(&part_ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch snapshot parts")?;

        let mut parts: HashMap<Uuid, PartCatalogEntry> = HashMap::new();
        for row in part_rows {
            let part: PartCatalogEntry = row.try_into()?;
            parts.insert(part.id, part);
        }

        let items = rows
            .into_iter()
            .map(|row| row.into_item(&parts))
            .collect::<Result<Vec<_>>>()?;

        Ok(BomSnapshot {
            id: header.id,
            project_id: header.project_id,
            version_label: header.version_label,
            source_filename: header.source_filename,
            source_checksum: header.source_checksum,
            items,
            created_at: header.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SnapshotRow {
    id: Uuid,
    project_id: Uuid,
    version_label: String,
    source_filename: Option<String>,
    source_checksum: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    designator: String,
    value: String,
    footprint: String,
    manufacturer_part: Option<String>,
    quantity: i32,
    notes: Option<String>,
    source_row: Option<i32>,
    part_id: Option<Uuid>,
    resolution: String,
    allocated: bool,
}

impl ItemRow {
    fn into_item(self, parts: &HashMap<Uuid, PartCatalogEntry>) -> Result<ResolvedBomItem> {
        let resolution = self
            .resolution
            .parse::<ResolutionMethod>()
            .map_err(anyhow::Error::msg)?;

        let part = match self.part_id {
            Some(id) => Some(
                parts
                    .get(&id)
                    .cloned()
                    .with_context(|| format!("Part {} referenced by {} is missing", id, self.designator))?,
            ),
            None => None,
        };

        Ok(ResolvedBomItem {
            line_item: BomLineItem {
                designator: self.designator,
                value: self.value,
                footprint: self.footprint,
                manufacturer_part: self.manufacturer_part,
                quantity: u32::try_from(self.quantity).context("Negative quantity")?,
                notes: self.notes,
                source_row: self.source_row.and_then(|r| usize::try_from(r).ok()),
            },
            part,
            resolution,
            allocated: self.allocated,
        })
    }
}
