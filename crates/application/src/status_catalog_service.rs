use std::sync::Arc;

use async_trait::async_trait;
use safehaven_core::{AppError, AppResult};
use safehaven_domain::{
    CaseStatusName, CaseWorkState, IncidentStatusName, Status, StatusDomain, StatusId,
};

/// Repository port for the shared status catalog.
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Lists every status in the catalog.
    async fn list_statuses(&self) -> AppResult<Vec<Status>>;

    /// Finds a status by its prefix-qualified name.
    async fn find_status_by_name(&self, name: &str) -> AppResult<Option<Status>>;

    /// Finds a status by identifier.
    async fn find_status(&self, id: StatusId) -> AppResult<Option<Status>>;

    /// Inserts a status if its name is not present yet; returns the stored
    /// record either way. Seed-time only.
    async fn ensure_status(&self, name: &str) -> AppResult<Status>;
}

/// Application service over the status catalog: domain membership queries
/// and the initial-status fallback chains.
#[derive(Clone)]
pub struct StatusCatalogService {
    repository: Arc<dyn StatusRepository>,
}

impl StatusCatalogService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn StatusRepository>) -> Self {
        Self { repository }
    }

    /// Returns all statuses in one domain.
    pub async fn members_of(&self, domain: StatusDomain) -> AppResult<Vec<Status>> {
        let statuses = self.repository.list_statuses().await?;
        Ok(statuses
            .into_iter()
            .filter(|status| status.domain() == domain)
            .collect())
    }

    /// Returns a status by identifier or fails with `NotFound`.
    pub async fn get(&self, id: StatusId) -> AppResult<Status> {
        self.repository
            .find_status(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("status '{id}' does not exist")))
    }

    /// Selects the initial status for a new incident.
    ///
    /// Authenticated reports prefer "Reported" and fall back to "Pending";
    /// anonymous reports prefer "Anonymous", then "Reported", then
    /// "Pending". An exhausted chain is a fatal configuration error.
    pub async fn initial_incident_status(&self, anonymous: bool) -> AppResult<Status> {
        let chain: &[IncidentStatusName] = if anonymous {
            &[
                IncidentStatusName::Anonymous,
                IncidentStatusName::Reported,
                IncidentStatusName::Pending,
            ]
        } else {
            &[IncidentStatusName::Reported, IncidentStatusName::Pending]
        };

        for candidate in chain {
            if let Some(status) = self
                .repository
                .find_status_by_name(candidate.qualified().as_str())
                .await?
            {
                return Ok(status);
            }
        }

        Err(AppError::MissingSeedStatus(format!(
            "no incident status seeded; tried {}",
            chain
                .iter()
                .map(|name| format!("'{}'", name.qualified()))
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    /// Selects the initial status for a promoted case.
    pub async fn initial_case_status(&self) -> AppResult<Status> {
        let name = CaseStatusName::Open.qualified();
        self.repository
            .find_status_by_name(name.as_str())
            .await?
            .ok_or_else(|| AppError::MissingSeedStatus(format!("status '{name}' is not seeded")))
    }

    /// Identifiers of Case statuses that count as active work.
    pub async fn open_case_status_ids(&self) -> AppResult<Vec<StatusId>> {
        let members = self.members_of(StatusDomain::Case).await?;
        let mut ids = Vec::new();
        for status in members {
            if status.work_state()? == CaseWorkState::Open {
                ids.push(status.id());
            }
        }
        Ok(ids)
    }

    /// Identifiers of Incident statuses that terminate a report.
    pub async fn resolved_incident_status_ids(&self) -> AppResult<Vec<StatusId>> {
        let members = self.members_of(StatusDomain::Incident).await?;
        Ok(members
            .into_iter()
            .filter(|status| status.display_name() == IncidentStatusName::Resolved.label())
            .map(|status| status.id())
            .collect())
    }

    /// Seed-time validation: every stored name must parse into exactly one
    /// domain and every Case status must classify into the open/closed
    /// partition. Run after seeding; a failing catalog aborts startup.
    pub async fn verify_catalog(&self) -> AppResult<()> {
        let statuses = self.repository.list_statuses().await?;
        for status in statuses {
            if status.domain() == StatusDomain::Case {
                status.work_state().map_err(|error| {
                    AppError::Validation(format!(
                        "status catalog failed verification: {error}"
                    ))
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use safehaven_core::{AppError, AppResult};
    use safehaven_domain::{Status, StatusDomain, StatusId};
    use tokio::sync::Mutex;

    use super::{StatusCatalogService, StatusRepository};

    #[derive(Default)]
    struct FakeStatusRepository {
        statuses: Mutex<Vec<Status>>,
    }

    impl FakeStatusRepository {
        fn seeded(names: &[&str]) -> Self {
            let statuses = names
                .iter()
                .filter_map(|name| Status::new(StatusId::new(), *name).ok())
                .collect();
            Self {
                statuses: Mutex::new(statuses),
            }
        }
    }

    #[async_trait]
    impl StatusRepository for FakeStatusRepository {
        async fn list_statuses(&self) -> AppResult<Vec<Status>> {
            Ok(self.statuses.lock().await.clone())
        }

        async fn find_status_by_name(&self, name: &str) -> AppResult<Option<Status>> {
            Ok(self
                .statuses
                .lock()
                .await
                .iter()
                .find(|status| status.name() == name)
                .cloned())
        }

        async fn find_status(&self, id: StatusId) -> AppResult<Option<Status>> {
            Ok(self
                .statuses
                .lock()
                .await
                .iter()
                .find(|status| status.id() == id)
                .cloned())
        }

        async fn ensure_status(&self, name: &str) -> AppResult<Status> {
            if let Some(existing) = self.find_status_by_name(name).await? {
                return Ok(existing);
            }
            let status = Status::new(StatusId::new(), name)?;
            self.statuses.lock().await.push(status.clone());
            Ok(status)
        }
    }

    fn service(names: &[&str]) -> StatusCatalogService {
        StatusCatalogService::new(Arc::new(FakeStatusRepository::seeded(names)))
    }

    #[tokio::test]
    async fn members_of_partitions_by_domain() {
        let service = service(&["Incident: Reported", "Case: Open", "Case: Closed"]);

        let cases = service.members_of(StatusDomain::Case).await;
        assert!(cases.is_ok());
        assert_eq!(cases.unwrap_or_default().len(), 2);

        let incidents = service.members_of(StatusDomain::Incident).await;
        assert!(incidents.is_ok());
        assert_eq!(incidents.unwrap_or_default().len(), 1);
    }

    #[tokio::test]
    async fn initial_status_prefers_reported() {
        let service = service(&["Incident: Reported", "Incident: Pending"]);

        let status = service.initial_incident_status(false).await;
        assert!(status.is_ok());
        assert_eq!(
            status.map(|status| status.display_name().to_owned()).ok(),
            Some("Reported".to_owned())
        );
    }

    #[tokio::test]
    async fn initial_status_falls_back_to_pending() {
        let service = service(&["Incident: Pending"]);

        let status = service.initial_incident_status(false).await;
        assert_eq!(
            status.map(|status| status.display_name().to_owned()).ok(),
            Some("Pending".to_owned())
        );
    }

    #[tokio::test]
    async fn anonymous_chain_falls_back_through_reported_to_pending() {
        let service = service(&["Incident: Pending"]);

        let status = service.initial_incident_status(true).await;
        assert_eq!(
            status.map(|status| status.display_name().to_owned()).ok(),
            Some("Pending".to_owned())
        );
    }

    #[tokio::test]
    async fn anonymous_chain_prefers_anonymous() {
        let service = service(&["Incident: Anonymous", "Incident: Reported"]);

        let status = service.initial_incident_status(true).await;
        assert_eq!(
            status.map(|status| status.display_name().to_owned()).ok(),
            Some("Anonymous".to_owned())
        );
    }

    #[tokio::test]
    async fn exhausted_chain_is_a_fatal_configuration_error() {
        let service = service(&["Case: Open"]);

        let status = service.initial_incident_status(false).await;
        assert!(matches!(status, Err(AppError::MissingSeedStatus(_))));
    }

    #[tokio::test]
    async fn missing_case_open_blocks_promotion() {
        let service = service(&["Incident: Reported"]);

        let status = service.initial_case_status().await;
        assert!(matches!(status, Err(AppError::MissingSeedStatus(_))));
    }

    #[tokio::test]
    async fn open_case_status_ids_cover_the_open_partition() {
        let service = service(&[
            "Case: Open",
            "Case: In Progress",
            "Case: Pending Review",
            "Case: Pending External",
            "Case: Resolved",
            "Case: Closed",
        ]);

        let ids = service.open_case_status_ids().await;
        assert!(ids.is_ok());
        assert_eq!(ids.unwrap_or_default().len(), 4);
    }

    #[tokio::test]
    async fn verify_catalog_rejects_unclassified_case_status() {
        let service = service(&["Case: Escalated"]);

        let result = service.verify_catalog().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn verify_catalog_accepts_full_seed() {
        let service = service(&[
            "Incident: Reported",
            "Incident: Anonymous",
            "Case: Open",
            "Case: Resolved",
        ]);

        let result = service.verify_catalog().await;
        assert!(result.is_ok());
    }
}
