use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use safehaven_application::AuthorizationRepository;
use safehaven_core::{AppError, AppResult, UserId};
use safehaven_domain::{Permission, RoleName};

/// PostgreSQL-backed repository for role membership and permission
/// lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleNameRow {
    name: String,
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    permission: String,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleName>> {
        let rows = sqlx::query_as::<_, RoleNameRow>(
            r#"
            SELECT roles.name
            FROM user_roles
            INNER JOIN roles
                ON roles.id = user_roles.role_id
            WHERE user_roles.user_id = $1
            ORDER BY roles.name
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load roles: {error}")))?;

        rows.into_iter()
            .map(|row| {
                RoleName::from_str(row.name.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "invalid stored role '{}' for user '{user_id}': {error}",
                        row.name
                    ))
                })
            })
            .collect()
    }

    async fn list_permissions_for_user(&self, user_id: UserId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT permissions.name AS permission
            FROM user_roles
            INNER JOIN role_permissions AS grants
                ON grants.role_id = user_roles.role_id
            INNER JOIN permissions
                ON permissions.id = grants.permission_id
            WHERE user_roles.user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Permission::from_str(row.permission.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "invalid stored permission '{}' for user '{user_id}': {error}",
                        row.permission
                    ))
                })
            })
            .collect()
    }

    async fn attach_role(&self, user_id: UserId, role: RoleName) -> AppResult<bool> {
        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            SELECT id
            FROM roles
            WHERE name = $1
            LIMIT 1
            "#,
        )
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("role '{role}' is not seeded")))?;

        let rows_affected = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| map_attach_error(error, user_id))?
        .rows_affected();

        Ok(rows_affected == 1)
    }

    async fn detach_role(&self, user_id: UserId, role: RoleName) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        if role == RoleName::Admin {
            // Lock the holder rows so two concurrent detaches cannot both
            // observe a safe count.
            let holders = sqlx::query_scalar::<_, uuid::Uuid>(
                r#"
                SELECT user_roles.user_id
                FROM user_roles
                INNER JOIN roles
                    ON roles.id = user_roles.role_id
                WHERE roles.name = $1
                FOR UPDATE OF user_roles
                "#,
            )
            .bind(role.as_str())
            .fetch_all(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to count role holders: {error}"))
            })?;

            // The guard applies only when the detach target is itself a
            // holder; otherwise the DELETE below reports NotFound.
            if holders.contains(&user_id.as_uuid()) && holders.len() <= 1 {
                return Err(AppError::ProtectedRoleRemoval(
                    "removal would leave no admin holder".to_owned(),
                ));
            }
        }

        let rows_affected = sqlx::query(
            r#"
            DELETE FROM user_roles
            USING roles
            WHERE user_roles.role_id = roles.id
                AND user_roles.user_id = $1
                AND roles.name = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to detach role: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' does not hold role '{role}'"
            )));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }
}

fn map_attach_error(error: sqlx::Error, user_id: UserId) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::NotFound(format!("user '{user_id}' does not exist"));
    }

    AppError::Internal(format!("failed to attach role: {error}"))
}
