//! SafeHaven API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod dto;
mod error;
mod handlers;
mod middleware;
mod seed;
mod state;

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use safehaven_application::{
    AuthorizationService, CaseService, IncidentService, StatusCatalogService, UserAdminService,
};
use safehaven_core::AppError;
use safehaven_infrastructure::{
    PostgresAuthorizationRepository, PostgresCaseRepository, PostgresIncidentRepository,
    PostgresStatusRepository, PostgresUserRepository,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let authorization_repository = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let authorization_service = AuthorizationService::new(authorization_repository);

    let status_repository = Arc::new(PostgresStatusRepository::new(pool.clone()));
    let status_catalog_service = StatusCatalogService::new(status_repository.clone());

    let incident_repository = Arc::new(PostgresIncidentRepository::new(pool.clone()));
    let incident_service = IncidentService::new(
        incident_repository.clone(),
        authorization_service.clone(),
        status_catalog_service.clone(),
    );

    let case_repository = Arc::new(PostgresCaseRepository::new(pool.clone()));
    let case_service = CaseService::new(
        case_repository.clone(),
        incident_repository.clone(),
        authorization_service.clone(),
        status_catalog_service.clone(),
    );

    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let user_admin_service = UserAdminService::new(
        user_repository,
        case_repository,
        incident_repository,
        authorization_service.clone(),
        status_catalog_service.clone(),
    );

    seed::run(&pool, status_repository.as_ref(), &status_catalog_service).await?;

    let app_state = AppState {
        authorization_service,
        status_catalog_service,
        incident_service,
        case_service,
        user_admin_service,
        pool,
    };

    let protected_routes = Router::new()
        .route(
            "/api/incidents",
            get(handlers::incidents::list_incidents_handler)
                .post(handlers::incidents::create_incident_handler),
        )
        .route(
            "/api/incidents/{incident_id}",
            get(handlers::incidents::get_incident_handler)
                .delete(handlers::incidents::delete_incident_handler),
        )
        .route(
            "/api/incidents/{incident_id}/status",
            put(handlers::incidents::update_incident_status_handler),
        )
        .route(
            "/api/incidents/{incident_id}/case",
            post(handlers::cases::promote_case_handler),
        )
        .route(
            "/api/cases",
            get(handlers::cases::list_cases_handler),
        )
        .route(
            "/api/cases/{case_id}",
            get(handlers::cases::get_case_handler).delete(handlers::cases::delete_case_handler),
        )
        .route(
            "/api/cases/{case_id}/status",
            put(handlers::cases::update_case_status_handler),
        )
        .route(
            "/api/cases/{case_id}/assignee",
            put(handlers::cases::assign_case_handler),
        )
        .route(
            "/api/cases/{case_id}/resolution",
            put(handlers::cases::set_resolution_notes_handler),
        )
        .route(
            "/api/cases/{case_id}/updates",
            get(handlers::cases::list_case_updates_handler)
                .post(handlers::cases::add_case_update_handler),
        )
        .route(
            "/api/statuses",
            get(handlers::statuses::list_statuses_handler),
        )
        .route(
            "/api/security/roles",
            get(handlers::security::list_roles_handler),
        )
        .route(
            "/api/security/permissions",
            get(handlers::security::list_permissions_handler),
        )
        .route(
            "/api/security/me/permissions",
            get(handlers::security::my_permissions_handler),
        )
        .route(
            "/api/security/role-assignments",
            post(handlers::security::assign_role_handler),
        )
        .route(
            "/api/security/bulk-role-assignments",
            post(handlers::security::bulk_assign_roles_handler),
        )
        .route(
            "/api/security/role-unassignments",
            post(handlers::security::unassign_role_handler),
        )
        .route(
            "/api/security/users/{user_id}",
            delete(handlers::security::delete_user_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_identity,
        ));

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/incidents/anonymous",
            post(handlers::incidents::create_anonymous_incident_handler),
        )
        .route(
            "/api/tracking/{code}",
            get(handlers::tracking::resolve_tracking_code_handler),
        )
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "safehaven-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
