use std::collections::BTreeMap;

use safehaven_application::{StatusCatalogService, StatusRepository};
use safehaven_core::{AppError, AppResult};
use safehaven_domain::{CaseStatusName, IncidentStatusName, Permission, RoleName};
use sqlx::PgPool;
use tracing::info;

/// Seeds the fixed casework vocabulary: the permission catalog, roles with
/// their default grants, and both status namespaces. Idempotent; runs on
/// every startup.
pub async fn run(
    pool: &PgPool,
    status_repository: &dyn StatusRepository,
    status_catalog: &StatusCatalogService,
) -> AppResult<()> {
    let permission_catalog = ensure_permissions(pool).await?;
    ensure_roles(pool, &permission_catalog).await?;

    for name in IncidentStatusName::all() {
        status_repository
            .ensure_status(name.qualified().as_str())
            .await?;
    }
    for name in CaseStatusName::all() {
        status_repository
            .ensure_status(name.qualified().as_str())
            .await?;
    }

    // A catalog that fails verification aborts startup loudly.
    status_catalog.verify_catalog().await?;

    info!("casework vocabulary seeded");
    Ok(())
}

async fn ensure_permissions(pool: &PgPool) -> AppResult<BTreeMap<Permission, uuid::Uuid>> {
    let mut catalog = BTreeMap::new();
    for permission in Permission::all() {
        let permission_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO permissions (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE
            SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(permission.as_str())
        .fetch_one(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to seed permission: {error}")))?;

        catalog.insert(*permission, permission_id);
    }

    Ok(catalog)
}

async fn ensure_roles(
    pool: &PgPool,
    permission_catalog: &BTreeMap<Permission, uuid::Uuid>,
) -> AppResult<()> {
    for role in RoleName::all() {
        let role_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE
            SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(role.as_str())
        .fetch_one(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to seed role: {error}")))?;

        for permission in Permission::defaults_for(*role) {
            let permission_id =
                permission_catalog.get(permission).copied().ok_or_else(|| {
                    AppError::Internal(format!(
                        "permission '{}' missing from the seeded catalog",
                        permission.as_str()
                    ))
                })?;

            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                VALUES ($1, $2)
                ON CONFLICT (role_id, permission_id) DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission_id)
            .execute(pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to seed role grant: {error}"))
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use safehaven_domain::{Permission, RoleName};

    #[test]
    fn every_default_grant_is_in_the_permission_catalog() {
        for role in RoleName::all() {
            for permission in Permission::defaults_for(*role) {
                assert!(Permission::all().contains(permission));
            }
        }
    }
}
