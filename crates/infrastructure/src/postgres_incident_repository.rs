use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use safehaven_application::{IncidentRepository, IncidentScope, ListQuery};
use safehaven_core::{AppError, AppResult, NonEmptyString, UserId};
use safehaven_domain::{Incident, IncidentId, IncidentLocation, StatusId, TrackingCode};

/// PostgreSQL-backed repository for incident records.
#[derive(Clone)]
pub struct PostgresIncidentRepository {
    pool: PgPool,
}

impl PostgresIncidentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct IncidentRow {
    id: uuid::Uuid,
    survivor_id: Option<uuid::Uuid>,
    status_id: uuid::Uuid,
    description: String,
    location: Option<String>,
    address: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    contact_info: Option<String>,
    tracking_code: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl IncidentRow {
    fn into_incident(self) -> AppResult<Incident> {
        let description = NonEmptyString::new(self.description).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored description for incident '{}': {error}",
                self.id
            ))
        })?;
        let tracking_code = self
            .tracking_code
            .map(TrackingCode::parse)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored tracking code for incident '{}': {error}",
                    self.id
                ))
            })?;

        Ok(Incident::from_storage(
            IncidentId::from_uuid(self.id),
            self.survivor_id.map(UserId::from_uuid),
            StatusId::from_uuid(self.status_id),
            description,
            IncidentLocation {
                location: self.location,
                address: self.address,
                latitude: self.latitude,
                longitude: self.longitude,
            },
            self.contact_info,
            tracking_code,
            self.created_at,
            self.updated_at,
            self.deleted_at,
        ))
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, survivor_id, status_id, description, location, address,
        latitude, longitude, contact_info, tracking_code,
        created_at, updated_at, deleted_at
    FROM incidents
"#;

#[async_trait]
impl IncidentRepository for PostgresIncidentRepository {
    async fn insert_incident(&self, incident: Incident) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO incidents (
                id, survivor_id, status_id, description, location, address,
                latitude, longitude, contact_info, tracking_code,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(incident.id().as_uuid())
        .bind(incident.survivor_id().map(|survivor| survivor.as_uuid()))
        .bind(incident.status_id().as_uuid())
        .bind(incident.description().as_str())
        .bind(incident.location().location.as_deref())
        .bind(incident.location().address.as_deref())
        .bind(incident.location().latitude)
        .bind(incident.location().longitude)
        .bind(incident.contact_info())
        .bind(incident.tracking_code().map(TrackingCode::as_str))
        .bind(incident.created_at())
        .bind(incident.updated_at())
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    async fn find_incident(&self, id: IncidentId) -> AppResult<Option<Incident>> {
        let row = sqlx::query_as::<_, IncidentRow>(&format!(
            "{SELECT_COLUMNS} WHERE id = $1 AND deleted_at IS NULL LIMIT 1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find incident: {error}")))?;

        row.map(IncidentRow::into_incident).transpose()
    }

    async fn find_by_tracking_code(&self, code: &TrackingCode) -> AppResult<Option<Incident>> {
        let row = sqlx::query_as::<_, IncidentRow>(&format!(
            "{SELECT_COLUMNS} WHERE tracking_code = $1 AND deleted_at IS NULL LIMIT 1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve tracking code: {error}"))
        })?;

        row.map(IncidentRow::into_incident).transpose()
    }

    async fn update_incident(&self, incident: Incident) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE incidents
            SET status_id = $2,
                contact_info = $3,
                updated_at = $4,
                deleted_at = $5
            WHERE id = $1
            "#,
        )
        .bind(incident.id().as_uuid())
        .bind(incident.status_id().as_uuid())
        .bind(incident.contact_info())
        .bind(incident.updated_at())
        .bind(incident.deleted_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update incident: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "incident '{}' does not exist",
                incident.id()
            )));
        }

        Ok(())
    }

    async fn list_incidents(
        &self,
        scope: IncidentScope,
        query: ListQuery,
    ) -> AppResult<Vec<Incident>> {
        // The scope predicate sits in the WHERE clause ahead of
        // pagination, so limit/offset never widen visibility.
        let rows = match scope {
            IncidentScope::All => {
                sqlx::query_as::<_, IncidentRow>(&format!(
                    "{SELECT_COLUMNS} WHERE deleted_at IS NULL \
                     ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                ))
                .bind(to_pg_count(query.limit))
                .bind(to_pg_count(query.offset))
                .fetch_all(&self.pool)
                .await
            }
            IncidentScope::SurvivorOnly(survivor_id) => {
                sqlx::query_as::<_, IncidentRow>(&format!(
                    "{SELECT_COLUMNS} WHERE deleted_at IS NULL AND survivor_id = $1 \
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3"
                ))
                .bind(survivor_id.as_uuid())
                .bind(to_pg_count(query.limit))
                .bind(to_pg_count(query.offset))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|error| AppError::Internal(format!("failed to list incidents: {error}")))?;

        rows.into_iter().map(IncidentRow::into_incident).collect()
    }

    async fn count_unresolved_for_survivor(
        &self,
        survivor_id: UserId,
        resolved_status_ids: &[StatusId],
    ) -> AppResult<usize> {
        let resolved: Vec<uuid::Uuid> = resolved_status_ids
            .iter()
            .map(StatusId::as_uuid)
            .collect();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM incidents
            WHERE survivor_id = $1
                AND deleted_at IS NULL
                AND NOT (status_id = ANY($2))
            "#,
        )
        .bind(survivor_id.as_uuid())
        .bind(&resolved)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count unresolved incidents: {error}"))
        })?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn map_insert_error(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict("tracking code is already taken".to_owned());
    }

    AppError::Internal(format!("failed to insert incident: {error}"))
}

fn to_pg_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
