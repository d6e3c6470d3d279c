use safehaven_application::{
    AuthorizationService, CaseService, IncidentService, StatusCatalogService, UserAdminService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub status_catalog_service: StatusCatalogService,
    pub incident_service: IncidentService,
    pub case_service: CaseService,
    pub user_admin_service: UserAdminService,
    pub pool: PgPool,
}
