use std::sync::Arc;

use async_trait::async_trait;
use safehaven_core::{AppError, AppResult, UserId, UserIdentity};
use safehaven_domain::Permission;

use crate::{AuthorizationService, CaseRepository, IncidentRepository, StatusCatalogService};

/// Repository port for user account administration.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Removes a user account and its role memberships. Fails with
    /// `NotFound` when the account does not exist.
    async fn delete_user(&self, user_id: UserId) -> AppResult<()>;
}

/// Application service for user administration. Deletion is refused while
/// the account still anchors active casework.
#[derive(Clone)]
pub struct UserAdminService {
    repository: Arc<dyn UserRepository>,
    case_repository: Arc<dyn CaseRepository>,
    incident_repository: Arc<dyn IncidentRepository>,
    authorization_service: AuthorizationService,
    status_catalog: StatusCatalogService,
}

impl UserAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn UserRepository>,
        case_repository: Arc<dyn CaseRepository>,
        incident_repository: Arc<dyn IncidentRepository>,
        authorization_service: AuthorizationService,
        status_catalog: StatusCatalogService,
    ) -> Self {
        Self {
            repository,
            case_repository,
            incident_repository,
            authorization_service,
            status_catalog,
        }
    }

    /// Deletes a user account.
    ///
    /// The account must carry no active work: no open case assigned to it
    /// and no unresolved incident reported by it. Reassign or resolve the
    /// work first, then retry.
    pub async fn delete_user(&self, actor: &UserIdentity, user_id: UserId) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::ManageUsers)
            .await?;

        let open_status_ids = self.status_catalog.open_case_status_ids().await?;
        let open_cases = self
            .case_repository
            .count_cases_for_assignee(user_id, &open_status_ids)
            .await?;

        let resolved_status_ids = self.status_catalog.resolved_incident_status_ids().await?;
        let unresolved_incidents = self
            .incident_repository
            .count_unresolved_for_survivor(user_id, &resolved_status_ids)
            .await?;

        if open_cases > 0 || unresolved_incidents > 0 {
            return Err(AppError::ActiveWorkExists(format!(
                "user '{user_id}' still has {open_cases} open case(s) assigned and \
                 {unresolved_incidents} unresolved incident(s) reported"
            )));
        }

        self.repository.delete_user(user_id).await
    }
}
