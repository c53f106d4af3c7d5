use anyhow::Result;
use sqlx::PgPool;

pub async fn run_postgres_migrations(pool: &PgPool) -> Result<()> {
    tracing::info!("Running PostgreSQL migrations");

    // Create projects table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR NOT NULL,
            customer_name VARCHAR,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create parts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            manufacturer_part_number VARCHAR NOT NULL,
            manufacturer VARCHAR,
            name VARCHAR NOT NULL,
            footprint VARCHAR NOT NULL DEFAULT '',
            specifications JSONB NOT NULL DEFAULT '{}',
            unit_price NUMERIC(18, 6) NOT NULL CHECK (unit_price >= 0),
            on_hand_quantity BIGINT NOT NULL DEFAULT 0 CHECK (on_hand_quantity >= 0),
            lifecycle_stage VARCHAR NOT NULL DEFAULT 'active',
            category VARCHAR,
            last_time_buy DATE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create part_alternatives table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS part_alternatives (
            part_id UUID NOT NULL REFERENCES parts(id) ON DELETE CASCADE,
            alternative_id UUID NOT NULL REFERENCES parts(id) ON DELETE CASCADE,
            compatibility_score DOUBLE PRECISION NOT NULL
                CHECK (compatibility_score >= 0 AND compatibility_score <= 1),
            notes TEXT,
            PRIMARY KEY (part_id, alternative_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create bom_snapshots table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bom_snapshots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            project_id UUID NOT NULL REFERENCES projects(id),
            version_label VARCHAR NOT NULL,
            source_filename VARCHAR,
            source_checksum VARCHAR,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (project_id, version_label)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create bom_items table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bom_items (
            snapshot_id UUID NOT NULL REFERENCES bom_snapshots(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            designator VARCHAR NOT NULL,
            value VARCHAR NOT NULL,
            footprint VARCHAR NOT NULL,
            manufacturer_part VARCHAR,
            quantity INTEGER NOT NULL CHECK (quantity >= 1),
            notes TEXT,
            source_row INTEGER,
            part_id UUID REFERENCES parts(id),
            resolution VARCHAR NOT NULL,
            allocated BOOLEAN NOT NULL DEFAULT FALSE,
            PRIMARY KEY (snapshot_id, designator)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better performance
    // Projects are looked up by name, case-insensitively
    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_projects_name ON projects (LOWER(name))")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_parts_mpn ON parts(manufacturer_part_number)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bom_snapshots_project_id ON bom_snapshots(project_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bom_items_part_id ON bom_items(part_id)")
        .execute(pool)
        .await?;

    tracing::info!("PostgreSQL migrations completed successfully");
    Ok(())
}
