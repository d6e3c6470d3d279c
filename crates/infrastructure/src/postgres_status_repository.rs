use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use safehaven_application::StatusRepository;
use safehaven_core::{AppError, AppResult};
use safehaven_domain::{Status, StatusId};

/// PostgreSQL-backed repository for the shared status catalog.
#[derive(Clone)]
pub struct PostgresStatusRepository {
    pool: PgPool,
}

impl PostgresStatusRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct StatusRow {
    id: uuid::Uuid,
    name: String,
}

impl StatusRow {
    fn into_status(self) -> AppResult<Status> {
        Status::new(StatusId::from_uuid(self.id), self.name.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid stored status '{}': {error}", self.name))
        })
    }
}

#[async_trait]
impl StatusRepository for PostgresStatusRepository {
    async fn list_statuses(&self) -> AppResult<Vec<Status>> {
        let rows = sqlx::query_as::<_, StatusRow>(
            r#"
            SELECT id, name
            FROM statuses
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list statuses: {error}")))?;

        rows.into_iter().map(StatusRow::into_status).collect()
    }

    async fn find_status_by_name(&self, name: &str) -> AppResult<Option<Status>> {
        let row = sqlx::query_as::<_, StatusRow>(
            r#"
            SELECT id, name
            FROM statuses
            WHERE name = $1
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find status: {error}")))?;

        row.map(StatusRow::into_status).transpose()
    }

    async fn find_status(&self, id: StatusId) -> AppResult<Option<Status>> {
        let row = sqlx::query_as::<_, StatusRow>(
            r#"
            SELECT id, name
            FROM statuses
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find status: {error}")))?;

        row.map(StatusRow::into_status).transpose()
    }

    async fn ensure_status(&self, name: &str) -> AppResult<Status> {
        // Validate the name before touching the table so a malformed seed
        // entry never lands in the catalog.
        Status::new(StatusId::new(), name)?;

        let row = sqlx::query_as::<_, StatusRow>(
            r#"
            INSERT INTO statuses (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE
            SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to ensure status: {error}")))?;

        row.into_status()
    }
}
