//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_casework_repository;
mod postgres_authorization_repository;
mod postgres_case_repository;
mod postgres_incident_repository;
mod postgres_status_repository;
mod postgres_user_repository;

pub use in_memory_casework_repository::InMemoryCaseworkRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_case_repository::PostgresCaseRepository;
pub use postgres_incident_repository::PostgresIncidentRepository;
pub use postgres_status_repository::PostgresStatusRepository;
pub use postgres_user_repository::PostgresUserRepository;
