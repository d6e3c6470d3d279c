use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use safehaven_application::{CaseRepository, CaseScope, ListQuery};
use safehaven_core::{AppError, AppResult, NonEmptyString, UserId};
use safehaven_domain::{Case, CaseId, CaseUpdate, CaseUpdateId, IncidentId, StatusId};

/// PostgreSQL-backed repository for case records and their update trail.
#[derive(Clone)]
pub struct PostgresCaseRepository {
    pool: PgPool,
}

impl PostgresCaseRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CaseRow {
    id: uuid::Uuid,
    incident_id: uuid::Uuid,
    assigned_to: Option<uuid::Uuid>,
    status_id: uuid::Uuid,
    resolution_notes: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<CaseRow> for Case {
    fn from(row: CaseRow) -> Self {
        Case::from_storage(
            CaseId::from_uuid(row.id),
            IncidentId::from_uuid(row.incident_id),
            row.assigned_to.map(UserId::from_uuid),
            StatusId::from_uuid(row.status_id),
            row.resolution_notes,
            row.created_at,
            row.updated_at,
            row.deleted_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct CaseUpdateRow {
    id: uuid::Uuid,
    case_id: uuid::Uuid,
    updated_by: uuid::Uuid,
    note: String,
    created_at: chrono::DateTime<chrono::Utc>,
    deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl CaseUpdateRow {
    fn into_update(self) -> AppResult<CaseUpdate> {
        let note = NonEmptyString::new(self.note).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored note for case update '{}': {error}",
                self.id
            ))
        })?;

        Ok(CaseUpdate::from_storage(
            CaseUpdateId::from_uuid(self.id),
            CaseId::from_uuid(self.case_id),
            UserId::from_uuid(self.updated_by),
            note,
            self.created_at,
            self.deleted_at,
        ))
    }
}

const SELECT_CASE: &str = r#"
    SELECT id, incident_id, assigned_to, status_id, resolution_notes,
        created_at, updated_at, deleted_at
    FROM cases
"#;

#[async_trait]
impl CaseRepository for PostgresCaseRepository {
    async fn insert_case(&self, case: Case) -> AppResult<()> {
        // The unique index on incident_id decides the promotion race; the
        // loser sees zero affected rows.
        let rows_affected = sqlx::query(
            r#"
            INSERT INTO cases (
                id, incident_id, assigned_to, status_id, resolution_notes,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (incident_id) DO NOTHING
            "#,
        )
        .bind(case.id().as_uuid())
        .bind(case.incident_id().as_uuid())
        .bind(case.assigned_to().map(|assignee| assignee.as_uuid()))
        .bind(case.status_id().as_uuid())
        .bind(case.resolution_notes())
        .bind(case.created_at())
        .bind(case.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert case: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::CaseAlreadyExists(format!(
                "incident '{}' already has a case",
                case.incident_id()
            )));
        }

        Ok(())
    }

    async fn find_case(&self, id: CaseId) -> AppResult<Option<Case>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "{SELECT_CASE} WHERE id = $1 AND deleted_at IS NULL LIMIT 1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find case: {error}")))?;

        Ok(row.map(Case::from))
    }

    async fn find_case_by_incident(&self, incident_id: IncidentId) -> AppResult<Option<Case>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            "{SELECT_CASE} WHERE incident_id = $1 AND deleted_at IS NULL LIMIT 1"
        ))
        .bind(incident_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find case: {error}")))?;

        Ok(row.map(Case::from))
    }

    async fn update_case(&self, case: Case) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE cases
            SET assigned_to = $2,
                status_id = $3,
                resolution_notes = $4,
                updated_at = $5,
                deleted_at = $6
            WHERE id = $1
            "#,
        )
        .bind(case.id().as_uuid())
        .bind(case.assigned_to().map(|assignee| assignee.as_uuid()))
        .bind(case.status_id().as_uuid())
        .bind(case.resolution_notes())
        .bind(case.updated_at())
        .bind(case.deleted_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update case: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "case '{}' does not exist",
                case.id()
            )));
        }

        Ok(())
    }

    async fn list_cases(&self, scope: CaseScope, query: ListQuery) -> AppResult<Vec<Case>> {
        let rows = match scope {
            CaseScope::All => {
                sqlx::query_as::<_, CaseRow>(&format!(
                    "{SELECT_CASE} WHERE deleted_at IS NULL \
                     ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                ))
                .bind(to_pg_count(query.limit))
                .bind(to_pg_count(query.offset))
                .fetch_all(&self.pool)
                .await
            }
            CaseScope::SurvivorOnly(survivor_id) => {
                sqlx::query_as::<_, CaseRow>(
                    r#"
                    SELECT cases.id, cases.incident_id, cases.assigned_to,
                        cases.status_id, cases.resolution_notes,
                        cases.created_at, cases.updated_at, cases.deleted_at
                    FROM cases
                    INNER JOIN incidents
                        ON incidents.id = cases.incident_id
                    WHERE cases.deleted_at IS NULL
                        AND incidents.deleted_at IS NULL
                        AND incidents.survivor_id = $1
                    ORDER BY cases.created_at DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(survivor_id.as_uuid())
                .bind(to_pg_count(query.limit))
                .bind(to_pg_count(query.offset))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|error| AppError::Internal(format!("failed to list cases: {error}")))?;

        Ok(rows.into_iter().map(Case::from).collect())
    }

    async fn append_update(&self, update: CaseUpdate) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO case_updates (id, case_id, updated_by, note, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(update.id().as_uuid())
        .bind(update.case_id().as_uuid())
        .bind(update.updated_by().as_uuid())
        .bind(update.note().as_str())
        .bind(update.created_at())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append case update: {error}")))?;

        Ok(())
    }

    async fn list_updates(&self, case_id: CaseId) -> AppResult<Vec<CaseUpdate>> {
        let rows = sqlx::query_as::<_, CaseUpdateRow>(
            r#"
            SELECT id, case_id, updated_by, note, created_at, deleted_at
            FROM case_updates
            WHERE case_id = $1
                AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(case_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list case updates: {error}")))?;

        rows.into_iter().map(CaseUpdateRow::into_update).collect()
    }

    async fn count_cases_for_assignee(
        &self,
        assignee: UserId,
        status_ids: &[StatusId],
    ) -> AppResult<usize> {
        let statuses: Vec<uuid::Uuid> = status_ids.iter().map(StatusId::as_uuid).collect();

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM cases
            WHERE assigned_to = $1
                AND deleted_at IS NULL
                AND status_id = ANY($2)
            "#,
        )
        .bind(assignee.as_uuid())
        .bind(&statuses)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count assigned cases: {error}"))
        })?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn to_pg_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
