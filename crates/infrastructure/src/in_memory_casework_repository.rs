use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use safehaven_application::{
    AuthorizationRepository, CaseRepository, CaseScope, IncidentRepository, IncidentScope,
    ListQuery, StatusRepository, UserRepository,
};
use safehaven_core::{AppError, AppResult, UserId};
use safehaven_domain::{
    Case, CaseId, CaseUpdate, Incident, IncidentId, Permission, RoleName, Status, StatusId,
    TrackingCode,
};
use tokio::sync::RwLock;

/// In-memory implementation of every casework port, backing tests and
/// local development without a database.
#[derive(Debug, Default)]
pub struct InMemoryCaseworkRepository {
    users: RwLock<HashSet<UserId>>,
    user_roles: RwLock<HashMap<UserId, Vec<RoleName>>>,
    role_grants: RwLock<HashMap<RoleName, Vec<Permission>>>,
    statuses: RwLock<Vec<Status>>,
    incidents: RwLock<HashMap<IncidentId, Incident>>,
    cases: RwLock<HashMap<CaseId, Case>>,
    case_updates: RwLock<Vec<CaseUpdate>>,
}

impl InMemoryCaseworkRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user account so role attachment and casework can
    /// reference it.
    pub async fn ensure_user(&self, user_id: UserId) {
        self.users.write().await.insert(user_id);
    }

    /// Grants every role its default permission set.
    pub async fn seed_default_grants(&self) {
        let mut grants = self.role_grants.write().await;
        for role in RoleName::all() {
            grants
                .entry(*role)
                .or_insert_with(|| Permission::defaults_for(*role).to_vec());
        }
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryCaseworkRepository {
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleName>> {
        Ok(self
            .user_roles
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_permissions_for_user(&self, user_id: UserId) -> AppResult<Vec<Permission>> {
        let held = self
            .user_roles
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        let grants = self.role_grants.read().await;

        Ok(held
            .iter()
            .flat_map(|role| grants.get(role).cloned().unwrap_or_default())
            .collect())
    }

    async fn attach_role(&self, user_id: UserId, role: RoleName) -> AppResult<bool> {
        if !self.users.read().await.contains(&user_id) {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' does not exist"
            )));
        }

        let mut user_roles = self.user_roles.write().await;
        let held = user_roles.entry(user_id).or_default();
        if held.contains(&role) {
            return Ok(false);
        }

        held.push(role);
        Ok(true)
    }

    async fn detach_role(&self, user_id: UserId, role: RoleName) -> AppResult<()> {
        // One write lock covers the holder count and the removal, so two
        // concurrent detaches cannot both pass the guard.
        let mut user_roles = self.user_roles.write().await;

        if !user_roles
            .get(&user_id)
            .is_some_and(|held| held.contains(&role))
        {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' does not hold role '{role}'"
            )));
        }

        if role == RoleName::Admin {
            let holders = user_roles
                .values()
                .filter(|held| held.contains(&RoleName::Admin))
                .count();
            if holders <= 1 {
                return Err(AppError::ProtectedRoleRemoval(
                    "removal would leave no admin holder".to_owned(),
                ));
            }
        }

        if let Some(held) = user_roles.get_mut(&user_id) {
            held.retain(|existing| existing != &role);
        }
        Ok(())
    }
}

#[async_trait]
impl StatusRepository for InMemoryCaseworkRepository {
    async fn list_statuses(&self) -> AppResult<Vec<Status>> {
        Ok(self.statuses.read().await.clone())
    }

    async fn find_status_by_name(&self, name: &str) -> AppResult<Option<Status>> {
        Ok(self
            .statuses
            .read()
            .await
            .iter()
            .find(|status| status.name() == name)
            .cloned())
    }

    async fn find_status(&self, id: StatusId) -> AppResult<Option<Status>> {
        Ok(self
            .statuses
            .read()
            .await
            .iter()
            .find(|status| status.id() == id)
            .cloned())
    }

    async fn ensure_status(&self, name: &str) -> AppResult<Status> {
        let mut statuses = self.statuses.write().await;
        if let Some(existing) = statuses.iter().find(|status| status.name() == name) {
            return Ok(existing.clone());
        }

        let status = Status::new(StatusId::new(), name)?;
        statuses.push(status.clone());
        Ok(status)
    }
}

#[async_trait]
impl IncidentRepository for InMemoryCaseworkRepository {
    async fn insert_incident(&self, incident: Incident) -> AppResult<()> {
        let mut incidents = self.incidents.write().await;

        if let Some(code) = incident.tracking_code()
            && incidents
                .values()
                .any(|existing| existing.tracking_code() == Some(code))
        {
            return Err(AppError::Conflict(format!(
                "tracking code '{code}' is already taken"
            )));
        }

        incidents.insert(incident.id(), incident);
        Ok(())
    }

    async fn find_incident(&self, id: IncidentId) -> AppResult<Option<Incident>> {
        Ok(self
            .incidents
            .read()
            .await
            .get(&id)
            .filter(|incident| incident.deleted_at().is_none())
            .cloned())
    }

    async fn find_by_tracking_code(&self, code: &TrackingCode) -> AppResult<Option<Incident>> {
        Ok(self
            .incidents
            .read()
            .await
            .values()
            .find(|incident| {
                incident.tracking_code() == Some(code) && incident.deleted_at().is_none()
            })
            .cloned())
    }

    async fn update_incident(&self, incident: Incident) -> AppResult<()> {
        let mut incidents = self.incidents.write().await;
        if !incidents.contains_key(&incident.id()) {
            return Err(AppError::NotFound(format!(
                "incident '{}' does not exist",
                incident.id()
            )));
        }

        incidents.insert(incident.id(), incident);
        Ok(())
    }

    async fn list_incidents(
        &self,
        scope: IncidentScope,
        query: ListQuery,
    ) -> AppResult<Vec<Incident>> {
        let incidents = self.incidents.read().await;
        let mut listed: Vec<Incident> = incidents
            .values()
            .filter(|incident| {
                incident.deleted_at().is_none() && scope.admits(incident.survivor_id())
            })
            .cloned()
            .collect();
        listed.sort_by(|left, right| right.created_at().cmp(&left.created_at()));

        Ok(listed
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn count_unresolved_for_survivor(
        &self,
        survivor_id: UserId,
        resolved_status_ids: &[StatusId],
    ) -> AppResult<usize> {
        Ok(self
            .incidents
            .read()
            .await
            .values()
            .filter(|incident| {
                incident.deleted_at().is_none()
                    && incident.survivor_id() == Some(survivor_id)
                    && !resolved_status_ids.contains(&incident.status_id())
            })
            .count())
    }
}

#[async_trait]
impl CaseRepository for InMemoryCaseworkRepository {
    async fn insert_case(&self, case: Case) -> AppResult<()> {
        // One write lock covers the uniqueness check and the insert, so a
        // concurrent promotion of the same incident has exactly one winner.
        let mut cases = self.cases.write().await;

        if cases
            .values()
            .any(|existing| existing.incident_id() == case.incident_id())
        {
            return Err(AppError::CaseAlreadyExists(format!(
                "incident '{}' already has a case",
                case.incident_id()
            )));
        }

        cases.insert(case.id(), case);
        Ok(())
    }

    async fn find_case(&self, id: CaseId) -> AppResult<Option<Case>> {
        Ok(self
            .cases
            .read()
            .await
            .get(&id)
            .filter(|case| case.deleted_at().is_none())
            .cloned())
    }

    async fn find_case_by_incident(&self, incident_id: IncidentId) -> AppResult<Option<Case>> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .find(|case| case.incident_id() == incident_id && case.deleted_at().is_none())
            .cloned())
    }

    async fn update_case(&self, case: Case) -> AppResult<()> {
        let mut cases = self.cases.write().await;
        if !cases.contains_key(&case.id()) {
            return Err(AppError::NotFound(format!(
                "case '{}' does not exist",
                case.id()
            )));
        }

        cases.insert(case.id(), case);
        Ok(())
    }

    async fn list_cases(&self, scope: CaseScope, query: ListQuery) -> AppResult<Vec<Case>> {
        let incidents = self.incidents.read().await;
        let cases = self.cases.read().await;

        let mut listed: Vec<Case> = cases
            .values()
            .filter(|case| {
                case.deleted_at().is_none()
                    && scope.admits(
                        incidents
                            .get(&case.incident_id())
                            .and_then(|incident| incident.survivor_id()),
                    )
            })
            .cloned()
            .collect();
        listed.sort_by(|left, right| right.created_at().cmp(&left.created_at()));

        Ok(listed
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn append_update(&self, update: CaseUpdate) -> AppResult<()> {
        self.case_updates.write().await.push(update);
        Ok(())
    }

    async fn list_updates(&self, case_id: CaseId) -> AppResult<Vec<CaseUpdate>> {
        let mut listed: Vec<CaseUpdate> = self
            .case_updates
            .read()
            .await
            .iter()
            .filter(|update| update.case_id() == case_id && update.deleted_at().is_none())
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.created_at().cmp(&right.created_at()));
        Ok(listed)
    }

    async fn count_cases_for_assignee(
        &self,
        assignee: UserId,
        status_ids: &[StatusId],
    ) -> AppResult<usize> {
        Ok(self
            .cases
            .read()
            .await
            .values()
            .filter(|case| {
                case.deleted_at().is_none()
                    && case.assigned_to() == Some(assignee)
                    && status_ids.contains(&case.status_id())
            })
            .count())
    }
}

#[async_trait]
impl UserRepository for InMemoryCaseworkRepository {
    async fn delete_user(&self, user_id: UserId) -> AppResult<()> {
        if !self.users.write().await.remove(&user_id) {
            return Err(AppError::NotFound(format!(
                "user '{user_id}' does not exist"
            )));
        }

        self.user_roles.write().await.remove(&user_id);

        // Mirror the database's SET NULL semantics: surviving records keep
        // their history but drop the reference.
        let mut incidents = self.incidents.write().await;
        for incident in incidents.values_mut() {
            if incident.survivor_id() == Some(user_id) {
                *incident = Incident::from_storage(
                    incident.id(),
                    None,
                    incident.status_id(),
                    incident.description().clone(),
                    incident.location().clone(),
                    incident.contact_info().map(str::to_owned),
                    incident.tracking_code().cloned(),
                    incident.created_at(),
                    incident.updated_at(),
                    incident.deleted_at(),
                );
            }
        }
        drop(incidents);

        let mut cases = self.cases.write().await;
        for case in cases.values_mut() {
            if case.assigned_to() == Some(user_id) {
                *case = Case::from_storage(
                    case.id(),
                    case.incident_id(),
                    None,
                    case.status_id(),
                    case.resolution_notes().map(str::to_owned),
                    case.created_at(),
                    case.updated_at(),
                    case.deleted_at(),
                );
            }
        }

        Ok(())
    }
}
