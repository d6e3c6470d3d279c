//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod case_service;
mod incident_service;
mod status_catalog_service;
mod user_admin_service;
mod visibility;

pub use authorization_service::{AuthorizationRepository, AuthorizationService};
pub use case_service::{CaseRepository, CaseService};
pub use incident_service::{IncidentRepository, IncidentService, ReportIncidentInput};
pub use status_catalog_service::{StatusCatalogService, StatusRepository};
pub use user_admin_service::{UserAdminService, UserRepository};
pub use visibility::{CaseScope, IncidentScope, ListQuery};
