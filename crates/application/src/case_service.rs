use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use safehaven_core::{AppError, AppResult, NonEmptyString, UserId, UserIdentity};
use safehaven_domain::{
    Case, CaseId, CaseUpdate, CaseUpdateId, IncidentId, Permission, StatusId,
};

use crate::{
    AuthorizationService, CaseScope, IncidentRepository, ListQuery, StatusCatalogService,
};

/// Repository port for case persistence. Every read excludes soft-deleted
/// rows.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Persists a new case. The incident reference is unique: the loser of
    /// a concurrent promotion of the same incident observes
    /// `CaseAlreadyExists`, enforced atomically with the insert.
    async fn insert_case(&self, case: Case) -> AppResult<()>;

    /// Finds a case by identifier.
    async fn find_case(&self, id: CaseId) -> AppResult<Option<Case>>;

    /// Finds the case promoted from an incident, if any.
    async fn find_case_by_incident(&self, incident_id: IncidentId) -> AppResult<Option<Case>>;

    /// Persists mutations to an existing case. Last writer wins; no
    /// domain invariant depends on write ordering here.
    async fn update_case(&self, case: Case) -> AppResult<()>;

    /// Lists cases admitted by the scope, applying pagination after the
    /// scope predicate.
    async fn list_cases(&self, scope: CaseScope, query: ListQuery) -> AppResult<Vec<Case>>;

    /// Appends an immutable update entry.
    async fn append_update(&self, update: CaseUpdate) -> AppResult<()>;

    /// Lists a case's update trail, oldest first.
    async fn list_updates(&self, case_id: CaseId) -> AppResult<Vec<CaseUpdate>>;

    /// Counts non-deleted cases assigned to a user whose status is in the
    /// given set.
    async fn count_cases_for_assignee(
        &self,
        assignee: UserId,
        status_ids: &[StatusId],
    ) -> AppResult<usize>;
}

/// Application service for the case lifecycle: promotion, assignment, the
/// append-only update trail, and scoped reads.
#[derive(Clone)]
pub struct CaseService {
    repository: Arc<dyn CaseRepository>,
    incident_repository: Arc<dyn IncidentRepository>,
    authorization_service: AuthorizationService,
    status_catalog: StatusCatalogService,
}

impl CaseService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn CaseRepository>,
        incident_repository: Arc<dyn IncidentRepository>,
        authorization_service: AuthorizationService,
        status_catalog: StatusCatalogService,
    ) -> Self {
        Self {
            repository,
            incident_repository,
            authorization_service,
            status_catalog,
        }
    }

    /// Promotes an incident into a case. At most one case ever exists per
    /// incident; a concurrent promotion race has exactly one winner.
    pub async fn promote(&self, actor: &UserIdentity, incident_id: IncidentId) -> AppResult<Case> {
        self.authorization_service
            .require_permission(actor, Permission::CreateCase)
            .await?;

        if self
            .incident_repository
            .find_incident(incident_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "incident '{incident_id}' does not exist"
            )));
        }

        let status = self.status_catalog.initial_case_status().await?;
        let case = Case::opened(CaseId::new(), incident_id, &status, Utc::now())?;
        self.repository.insert_case(case.clone()).await?;
        Ok(case)
    }

    /// Sets the assignee unconditionally. Re-assignment is always
    /// permitted; the last writer wins.
    pub async fn assign(
        &self,
        actor: &UserIdentity,
        case_id: CaseId,
        assignee: UserId,
    ) -> AppResult<Case> {
        self.authorization_service
            .require_permission(actor, Permission::AssignCase)
            .await?;

        let mut case = self.require_case(case_id).await?;
        case.assign(assignee, Utc::now());
        self.repository.update_case(case.clone()).await?;
        Ok(case)
    }

    /// Appends an update entry. The entry is immutable once created and
    /// never touches the case's own status or resolution notes.
    pub async fn add_update(
        &self,
        actor: &UserIdentity,
        case_id: CaseId,
        note: impl Into<String>,
    ) -> AppResult<CaseUpdate> {
        self.authorization_service
            .require_permission(actor, Permission::UpdateCase)
            .await?;

        let case = self.require_case(case_id).await?;
        let update = CaseUpdate::new(
            CaseUpdateId::new(),
            case.id(),
            actor.user_id(),
            NonEmptyString::new(note.into())?,
            Utc::now(),
        );
        self.repository.append_update(update.clone()).await?;
        Ok(update)
    }

    /// Moves a case to a new status.
    pub async fn update_status(
        &self,
        actor: &UserIdentity,
        case_id: CaseId,
        status_id: StatusId,
    ) -> AppResult<Case> {
        self.authorization_service
            .require_permission(actor, Permission::UpdateCase)
            .await?;

        let mut case = self.require_case(case_id).await?;
        let status = self.status_catalog.get(status_id).await?;
        case.set_status(&status, Utc::now())?;
        self.repository.update_case(case.clone()).await?;
        Ok(case)
    }

    /// Records resolution notes on a case.
    pub async fn set_resolution_notes(
        &self,
        actor: &UserIdentity,
        case_id: CaseId,
        notes: impl Into<String>,
    ) -> AppResult<Case> {
        self.authorization_service
            .require_permission(actor, Permission::UpdateCase)
            .await?;

        let mut case = self.require_case(case_id).await?;
        case.set_resolution_notes(notes, Utc::now());
        self.repository.update_case(case.clone()).await?;
        Ok(case)
    }

    /// Returns one case, subject to visibility scoping. Records outside
    /// the caller's scope are indistinguishable from missing ones.
    pub async fn get_case(&self, actor: &UserIdentity, case_id: CaseId) -> AppResult<Case> {
        let case = self.require_case(case_id).await?;
        self.require_in_scope(actor, &case).await?;
        Ok(case)
    }

    /// Lists cases visible to the caller.
    pub async fn list_cases(
        &self,
        actor: &UserIdentity,
        query: ListQuery,
    ) -> AppResult<Vec<Case>> {
        let scope = self.scope_for(actor.user_id()).await?;
        self.repository.list_cases(scope, query).await
    }

    /// Lists a case's update trail, subject to the case's own scope.
    pub async fn list_updates(
        &self,
        actor: &UserIdentity,
        case_id: CaseId,
    ) -> AppResult<Vec<CaseUpdate>> {
        let case = self.require_case(case_id).await?;
        self.require_in_scope(actor, &case).await?;
        self.repository.list_updates(case.id()).await
    }

    /// Soft-deletes a case. Cases are deletable regardless of their
    /// open/closed state; only user deletion is guarded by active work.
    pub async fn delete_case(&self, actor: &UserIdentity, case_id: CaseId) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::DeleteCase)
            .await?;

        let mut case = self.require_case(case_id).await?;
        case.mark_deleted(Utc::now());
        self.repository.update_case(case).await
    }

    async fn require_case(&self, case_id: CaseId) -> AppResult<Case> {
        self.repository
            .find_case(case_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("case '{case_id}' does not exist")))
    }

    async fn require_in_scope(&self, actor: &UserIdentity, case: &Case) -> AppResult<()> {
        let scope = self.scope_for(actor.user_id()).await?;
        if scope == CaseScope::All {
            return Ok(());
        }

        let survivor_id = self
            .incident_repository
            .find_incident(case.incident_id())
            .await?
            .and_then(|incident| incident.survivor_id());

        if scope.admits(survivor_id) {
            return Ok(());
        }

        Err(AppError::NotFound(format!(
            "case '{}' does not exist",
            case.id()
        )))
    }

    async fn scope_for(&self, user_id: UserId) -> AppResult<CaseScope> {
        if self
            .authorization_service
            .has_permission(user_id, Permission::ViewAllCases)
            .await?
        {
            return Ok(CaseScope::All);
        }

        Ok(CaseScope::SurvivorOnly(user_id))
    }
}
