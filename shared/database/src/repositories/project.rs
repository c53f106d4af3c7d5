//! Project Repository

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use solderline_models::Project;

const PROJECT_COLUMNS: &str = "id, name, customer_name, created_at, updated_at";

pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Case-insensitive exact name lookup
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Project>> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        Self::fetch_by_name(&mut conn, name).await
    }

    /// Returns the project with this name, inserting `project` if none exists.
    ///
    /// Runs on the caller's connection so an import can roll the new project
    /// back together with its snapshot.
    pub async fn find_or_create(conn: &mut PgConnection, project: &Project) -> Result<Project> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO projects (id, name, customer_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ((LOWER(name))) DO NOTHING
            "#,
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.customer_name)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to create project {}", project.name))?;

        Self::fetch_by_name(conn, &project.name)
            .await?
            .with_context(|| format!("Project {} vanished after insert", project.name))
    }

    async fn fetch_by_name(conn: &mut PgConnection, name: &str) -> Result<Option<Project>> {
        let row: Option<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {} FROM projects WHERE LOWER(name) = LOWER($1)",
            PROJECT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch project by name")?;

        Ok(row.map(Into::into))
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    customer_name: Option<String>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            customer_name: row.customer_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
