use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use safehaven_core::{AppError, AppResult, NonEmptyString, UserId, UserIdentity};
use safehaven_domain::{
    Incident, IncidentId, IncidentLocation, Permission, StatusId, TRACKING_CODE_LENGTH,
    TRACKING_CODE_PREFIX, TrackingCode,
};

use crate::{AuthorizationService, IncidentScope, ListQuery, StatusCatalogService};

const TRACKING_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Largest multiple of the charset size that fits in a byte. Draws at or
/// above this value are discarded so every character stays equally likely.
const UNBIASED_DRAW_LIMIT: usize = 256 - (256 % TRACKING_CODE_CHARSET.len());

/// Upper bound on tracking-code regeneration when the store reports a
/// collision. The 36^8 code space makes even one retry rare.
const MAX_TRACKING_CODE_ATTEMPTS: usize = 5;

/// Input payload for filing an incident.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportIncidentInput {
    /// Free-text description of the event.
    pub description: String,
    /// Where the event took place.
    pub location: IncidentLocation,
    /// Optional reporter contact information.
    pub contact_info: Option<String>,
}

/// Repository port for incident persistence. Every read excludes
/// soft-deleted rows.
#[async_trait]
pub trait IncidentRepository: Send + Sync {
    /// Persists a new incident. Fails with `Conflict` when the tracking
    /// code is already taken.
    async fn insert_incident(&self, incident: Incident) -> AppResult<()>;

    /// Finds an incident by identifier.
    async fn find_incident(&self, id: IncidentId) -> AppResult<Option<Incident>>;

    /// Finds an incident by exact tracking-code match.
    async fn find_by_tracking_code(&self, code: &TrackingCode) -> AppResult<Option<Incident>>;

    /// Persists mutations to an existing incident.
    async fn update_incident(&self, incident: Incident) -> AppResult<()>;

    /// Lists incidents admitted by the scope, applying pagination after
    /// the scope predicate.
    async fn list_incidents(
        &self,
        scope: IncidentScope,
        query: ListQuery,
    ) -> AppResult<Vec<Incident>>;

    /// Counts a survivor's incidents whose status is not terminal.
    async fn count_unresolved_for_survivor(
        &self,
        survivor_id: UserId,
        resolved_status_ids: &[StatusId],
    ) -> AppResult<usize>;
}

/// Application service for the incident lifecycle and anonymous tracking.
#[derive(Clone)]
pub struct IncidentService {
    repository: Arc<dyn IncidentRepository>,
    authorization_service: AuthorizationService,
    status_catalog: StatusCatalogService,
}

impl IncidentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn IncidentRepository>,
        authorization_service: AuthorizationService,
        status_catalog: StatusCatalogService,
    ) -> Self {
        Self {
            repository,
            authorization_service,
            status_catalog,
        }
    }

    /// Files an incident on behalf of the authenticated caller. The
    /// initial status comes from the Reported-then-Pending fallback chain.
    pub async fn create_incident(
        &self,
        actor: &UserIdentity,
        input: ReportIncidentInput,
    ) -> AppResult<Incident> {
        let status = self.status_catalog.initial_incident_status(false).await?;
        let incident = Incident::reported(
            IncidentId::new(),
            actor.user_id(),
            &status,
            NonEmptyString::new(input.description)?,
            input.location,
            input.contact_info,
            Utc::now(),
        )?;

        self.repository.insert_incident(incident.clone()).await?;
        Ok(incident)
    }

    /// Files an anonymous incident and attaches a fresh tracking code.
    /// The store owns code uniqueness; generation retries a bounded number
    /// of times on collision.
    pub async fn create_anonymous_incident(
        &self,
        input: ReportIncidentInput,
    ) -> AppResult<Incident> {
        let status = self.status_catalog.initial_incident_status(true).await?;
        let description = NonEmptyString::new(input.description)?;

        for _ in 0..MAX_TRACKING_CODE_ATTEMPTS {
            let incident = Incident::anonymous(
                IncidentId::new(),
                &status,
                description.clone(),
                input.location.clone(),
                input.contact_info.clone(),
                generate_tracking_code()?,
                Utc::now(),
            )?;

            match self.repository.insert_incident(incident.clone()).await {
                Ok(()) => return Ok(incident),
                Err(AppError::Conflict(_)) => continue,
                Err(error) => return Err(error),
            }
        }

        Err(AppError::Internal(format!(
            "failed to allocate a unique tracking code after {MAX_TRACKING_CODE_ATTEMPTS} attempts"
        )))
    }

    /// Moves an incident to a new status. Transitions are unconstrained
    /// state assignments; the actor must hold `update_incident` or be the
    /// incident's own survivor.
    pub async fn update_status(
        &self,
        actor: &UserIdentity,
        incident_id: IncidentId,
        status_id: StatusId,
    ) -> AppResult<Incident> {
        let mut incident = self.require_incident(incident_id).await?;

        let permitted = self
            .authorization_service
            .has_permission(actor.user_id(), Permission::UpdateIncident)
            .await?
            || incident.survivor_id() == Some(actor.user_id());
        if !permitted {
            return Err(AppError::Forbidden(format!(
                "user '{}' may not update incident '{incident_id}'",
                actor.user_id()
            )));
        }

        let status = self.status_catalog.get(status_id).await?;
        incident.set_status(&status, Utc::now())?;
        self.repository.update_incident(incident.clone()).await?;
        Ok(incident)
    }

    /// Returns one incident, subject to visibility scoping. Records
    /// outside the caller's scope are indistinguishable from missing ones.
    pub async fn get_incident(
        &self,
        actor: &UserIdentity,
        incident_id: IncidentId,
    ) -> AppResult<Incident> {
        let scope = self.scope_for(actor.user_id()).await?;
        let incident = self.require_incident(incident_id).await?;

        if !scope.admits(incident.survivor_id()) {
            return Err(AppError::NotFound(format!(
                "incident '{incident_id}' does not exist"
            )));
        }

        Ok(incident)
    }

    /// Lists incidents visible to the caller.
    pub async fn list_incidents(
        &self,
        actor: &UserIdentity,
        query: ListQuery,
    ) -> AppResult<Vec<Incident>> {
        let scope = self.scope_for(actor.user_id()).await?;
        self.repository.list_incidents(scope, query).await
    }

    /// Soft-deletes an incident.
    pub async fn delete_incident(
        &self,
        actor: &UserIdentity,
        incident_id: IncidentId,
    ) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor, Permission::DeleteIncident)
            .await?;

        let mut incident = self.require_incident(incident_id).await?;
        incident.mark_deleted(Utc::now());
        self.repository.update_incident(incident).await
    }

    /// Resolves a tracking code to its anonymous incident. Wrong codes,
    /// deleted records, and codes attached to non-anonymous incidents all
    /// answer the same way.
    pub async fn resolve_tracking_code(&self, code: &str) -> AppResult<Incident> {
        let unknown = || AppError::NotFound("unknown tracking code".to_owned());

        let code = TrackingCode::parse(code).map_err(|_| unknown())?;
        match self.repository.find_by_tracking_code(&code).await? {
            Some(incident) if incident.is_anonymous() => Ok(incident),
            _ => Err(unknown()),
        }
    }

    async fn require_incident(&self, incident_id: IncidentId) -> AppResult<Incident> {
        self.repository
            .find_incident(incident_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("incident '{incident_id}' does not exist")))
    }

    async fn scope_for(&self, user_id: UserId) -> AppResult<IncidentScope> {
        if self
            .authorization_service
            .has_permission(user_id, Permission::ViewAllIncidents)
            .await?
        {
            return Ok(IncidentScope::All);
        }

        Ok(IncidentScope::SurvivorOnly(user_id))
    }
}

/// Draws a tracking code from OS randomness: the fixed prefix followed by
/// eight uppercase alphanumeric characters, sampled by rejection so no
/// character is over-represented.
fn generate_tracking_code() -> AppResult<TrackingCode> {
    let mut suffix = String::with_capacity(TRACKING_CODE_LENGTH);
    while suffix.len() < TRACKING_CODE_LENGTH {
        let mut bytes = [0u8; TRACKING_CODE_LENGTH];
        getrandom::fill(&mut bytes).map_err(|error| {
            AppError::Internal(format!("failed to draw tracking code randomness: {error}"))
        })?;

        for byte in bytes {
            if suffix.len() == TRACKING_CODE_LENGTH {
                break;
            }
            if let Some(character) = code_character(byte) {
                suffix.push(character);
            }
        }
    }

    TrackingCode::parse(format!("{TRACKING_CODE_PREFIX}{suffix}"))
}

/// Maps one random byte onto the code charset, rejecting draws past the
/// unbiased limit.
fn code_character(byte: u8) -> Option<char> {
    let draw = usize::from(byte);
    if draw >= UNBIASED_DRAW_LIMIT {
        return None;
    }

    Some(TRACKING_CODE_CHARSET[draw % TRACKING_CODE_CHARSET.len()] as char)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use safehaven_core::{AppError, AppResult, UserId, UserIdentity};
    use safehaven_domain::{
        Incident, IncidentId, IncidentLocation, Permission, RoleName, Status, StatusId,
        TrackingCode,
    };
    use tokio::sync::Mutex;

    use crate::{
        AuthorizationRepository, AuthorizationService, IncidentScope, ListQuery,
        StatusCatalogService, StatusRepository,
    };

    use super::{IncidentRepository, IncidentService, ReportIncidentInput};

    struct FakeAuthorizationRepository {
        roles: HashMap<UserId, Vec<RoleName>>,
    }

    #[async_trait]
    impl AuthorizationRepository for FakeAuthorizationRepository {
        async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleName>> {
            Ok(self.roles.get(&user_id).cloned().unwrap_or_default())
        }

        async fn list_permissions_for_user(&self, user_id: UserId) -> AppResult<Vec<Permission>> {
            Ok(self
                .roles
                .get(&user_id)
                .map(|held| {
                    held.iter()
                        .flat_map(|role| Permission::defaults_for(*role).iter().copied())
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn attach_role(&self, _user_id: UserId, _role: RoleName) -> AppResult<bool> {
            Ok(true)
        }

        async fn detach_role(&self, _user_id: UserId, _role: RoleName) -> AppResult<()> {
            Ok(())
        }
    }

    struct FakeStatusRepository {
        statuses: Vec<Status>,
    }

    impl FakeStatusRepository {
        fn seeded(names: &[&str]) -> Self {
            Self {
                statuses: names
                    .iter()
                    .filter_map(|name| Status::new(StatusId::new(), *name).ok())
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl StatusRepository for FakeStatusRepository {
        async fn list_statuses(&self) -> AppResult<Vec<Status>> {
            Ok(self.statuses.clone())
        }

        async fn find_status_by_name(&self, name: &str) -> AppResult<Option<Status>> {
            Ok(self
                .statuses
                .iter()
                .find(|status| status.name() == name)
                .cloned())
        }

        async fn find_status(&self, id: StatusId) -> AppResult<Option<Status>> {
            Ok(self.statuses.iter().find(|status| status.id() == id).cloned())
        }

        async fn ensure_status(&self, name: &str) -> AppResult<Status> {
            Status::new(StatusId::new(), name)
        }
    }

    #[derive(Default)]
    struct FakeIncidentRepository {
        incidents: Mutex<Vec<Incident>>,
        forced_conflicts: Mutex<usize>,
    }

    #[async_trait]
    impl IncidentRepository for FakeIncidentRepository {
        async fn insert_incident(&self, incident: Incident) -> AppResult<()> {
            let mut forced = self.forced_conflicts.lock().await;
            if *forced > 0 {
                *forced -= 1;
                return Err(AppError::Conflict("tracking code taken".to_owned()));
            }
            drop(forced);

            let mut incidents = self.incidents.lock().await;
            if incident.tracking_code().is_some()
                && incidents
                    .iter()
                    .any(|existing| existing.tracking_code() == incident.tracking_code())
            {
                return Err(AppError::Conflict("tracking code taken".to_owned()));
            }
            incidents.push(incident);
            Ok(())
        }

        async fn find_incident(&self, id: IncidentId) -> AppResult<Option<Incident>> {
            Ok(self
                .incidents
                .lock()
                .await
                .iter()
                .find(|incident| incident.id() == id && incident.deleted_at().is_none())
                .cloned())
        }

        async fn find_by_tracking_code(
            &self,
            code: &TrackingCode,
        ) -> AppResult<Option<Incident>> {
            Ok(self
                .incidents
                .lock()
                .await
                .iter()
                .find(|incident| {
                    incident.tracking_code() == Some(code) && incident.deleted_at().is_none()
                })
                .cloned())
        }

        async fn update_incident(&self, incident: Incident) -> AppResult<()> {
            let mut incidents = self.incidents.lock().await;
            let Some(slot) = incidents
                .iter_mut()
                .find(|existing| existing.id() == incident.id())
            else {
                return Err(AppError::NotFound(format!(
                    "incident '{}' does not exist",
                    incident.id()
                )));
            };
            *slot = incident;
            Ok(())
        }

        async fn list_incidents(
            &self,
            scope: IncidentScope,
            query: ListQuery,
        ) -> AppResult<Vec<Incident>> {
            Ok(self
                .incidents
                .lock()
                .await
                .iter()
                .filter(|incident| {
                    incident.deleted_at().is_none() && scope.admits(incident.survivor_id())
                })
                .skip(query.offset)
                .take(query.limit)
                .cloned()
                .collect())
        }

        async fn count_unresolved_for_survivor(
            &self,
            survivor_id: UserId,
            resolved_status_ids: &[StatusId],
        ) -> AppResult<usize> {
            Ok(self
                .incidents
                .lock()
                .await
                .iter()
                .filter(|incident| {
                    incident.deleted_at().is_none()
                        && incident.survivor_id() == Some(survivor_id)
                        && !resolved_status_ids.contains(&incident.status_id())
                })
                .count())
        }
    }

    fn input() -> ReportIncidentInput {
        ReportIncidentInput {
            description: "streetlight tampering near the shelter".to_owned(),
            location: IncidentLocation::default(),
            contact_info: None,
        }
    }

    fn build_service(
        statuses: &[&str],
        roles: &[(UserId, Vec<RoleName>)],
    ) -> (IncidentService, Arc<FakeIncidentRepository>) {
        let repository = Arc::new(FakeIncidentRepository::default());
        let authorization_service = AuthorizationService::new(Arc::new(
            FakeAuthorizationRepository {
                roles: roles.iter().cloned().collect(),
            },
        ));
        let status_catalog =
            StatusCatalogService::new(Arc::new(FakeStatusRepository::seeded(statuses)));
        let service = IncidentService::new(
            repository.clone(),
            authorization_service,
            status_catalog,
        );
        (service, repository)
    }

    #[tokio::test]
    async fn authenticated_creation_prefers_reported() {
        let survivor = UserId::new();
        let actor = UserIdentity::new(survivor, "sam");
        let (service, _) = build_service(
            &["Incident: Reported", "Incident: Pending"],
            &[(survivor, vec![RoleName::Survivor])],
        );

        let incident = service.create_incident(&actor, input()).await;
        assert!(incident.is_ok());

        let incident = incident.unwrap_or_else(|_| unreachable!());
        assert_eq!(incident.survivor_id(), Some(survivor));
        assert!(incident.tracking_code().is_none());
    }

    #[tokio::test]
    async fn creation_falls_back_to_pending() {
        let survivor = UserId::new();
        let actor = UserIdentity::new(survivor, "sam");
        let (service, _) = build_service(
            &["Incident: Pending"],
            &[(survivor, vec![RoleName::Survivor])],
        );

        let incident = service.create_incident(&actor, input()).await;
        assert!(incident.is_ok());
    }

    #[tokio::test]
    async fn creation_fails_without_any_seed_status() {
        let survivor = UserId::new();
        let actor = UserIdentity::new(survivor, "sam");
        let (service, _) = build_service(&[], &[(survivor, vec![RoleName::Survivor])]);

        let incident = service.create_incident(&actor, input()).await;
        assert!(matches!(incident, Err(AppError::MissingSeedStatus(_))));
    }

    #[tokio::test]
    async fn anonymous_creation_attaches_a_tracking_code() {
        let (service, _) = build_service(&["Incident: Anonymous"], &[]);

        let incident = service.create_anonymous_incident(input()).await;
        assert!(incident.is_ok());

        let incident = incident.unwrap_or_else(|_| unreachable!());
        assert!(incident.is_anonymous());
        assert!(incident.tracking_code().is_some());
    }

    #[tokio::test]
    async fn anonymous_creation_falls_back_to_pending() {
        let (service, _) = build_service(&["Incident: Pending"], &[]);

        let incident = service.create_anonymous_incident(input()).await;
        assert!(incident.is_ok());
    }

    #[tokio::test]
    async fn anonymous_creation_retries_on_code_collision() {
        let (service, repository) = build_service(&["Incident: Anonymous"], &[]);
        *repository.forced_conflicts.lock().await = 2;

        let incident = service.create_anonymous_incident(input()).await;
        assert!(incident.is_ok());
    }

    #[tokio::test]
    async fn anonymous_creation_gives_up_after_bounded_retries() {
        let (service, repository) = build_service(&["Incident: Anonymous"], &[]);
        *repository.forced_conflicts.lock().await = 100;

        let incident = service.create_anonymous_incident(input()).await;
        assert!(matches!(incident, Err(AppError::Internal(_))));
    }

    #[test]
    fn code_characters_are_drawn_uniformly() {
        let mut counts = HashMap::new();
        let mut rejected = 0usize;
        for byte in u8::MIN..=u8::MAX {
            match super::code_character(byte) {
                Some(character) => *counts.entry(character).or_insert(0usize) += 1,
                None => rejected += 1,
            }
        }

        // 256 = 7 * 36 + 4: every charset character has exactly seven
        // byte preimages and the four overflow draws are rejected.
        assert_eq!(rejected, 256 % super::TRACKING_CODE_CHARSET.len());
        assert_eq!(counts.len(), super::TRACKING_CODE_CHARSET.len());
        assert!(counts.values().all(|count| *count == 7));
    }

    #[tokio::test]
    async fn resolve_round_trips_for_anonymous_incident() {
        let (service, _) = build_service(&["Incident: Anonymous"], &[]);

        let incident = service
            .create_anonymous_incident(input())
            .await
            .unwrap_or_else(|_| unreachable!());
        let code = incident
            .tracking_code()
            .map(|code| code.as_str().to_owned())
            .unwrap_or_default();

        let resolved = service.resolve_tracking_code(code.as_str()).await;
        assert!(resolved.is_ok());
        assert_eq!(
            resolved.map(|found| found.id()).ok(),
            Some(incident.id())
        );
    }

    #[tokio::test]
    async fn resolve_never_returns_non_anonymous_incidents() {
        let survivor = UserId::new();
        let actor = UserIdentity::new(survivor, "sam");
        let (service, repository) = build_service(
            &["Incident: Reported"],
            &[(survivor, vec![RoleName::Survivor])],
        );

        // Simulate legacy data: a survivor-linked incident that still
        // carries a tracking code must never resolve.
        let incident = service
            .create_incident(&actor, input())
            .await
            .unwrap_or_else(|_| unreachable!());
        let code = TrackingCode::parse("ANO-LEGACY01").unwrap_or_else(|_| unreachable!());
        {
            let mut incidents = repository.incidents.lock().await;
            let stored = incidents
                .iter_mut()
                .find(|existing| existing.id() == incident.id())
                .unwrap_or_else(|| unreachable!());
            *stored = Incident::from_storage(
                stored.id(),
                stored.survivor_id(),
                stored.status_id(),
                stored.description().clone(),
                stored.location().clone(),
                None,
                Some(code.clone()),
                stored.created_at(),
                stored.updated_at(),
                None,
            );
        }

        let resolved = service.resolve_tracking_code(code.as_str()).await;
        assert!(matches!(resolved, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn resolve_rejects_malformed_codes_as_not_found() {
        let (service, _) = build_service(&["Incident: Anonymous"], &[]);

        let resolved = service.resolve_tracking_code("not-a-code").await;
        assert!(matches!(resolved, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn survivor_may_update_own_incident_status() {
        let survivor = UserId::new();
        let actor = UserIdentity::new(survivor, "sam");
        let statuses = ["Incident: Reported", "Incident: Resolved"];
        let (service, _) = build_service(&statuses, &[(survivor, vec![RoleName::Survivor])]);

        let incident = service
            .create_incident(&actor, input())
            .await
            .unwrap_or_else(|_| unreachable!());

        let resolved_id = service
            .status_catalog
            .members_of(safehaven_domain::StatusDomain::Incident)
            .await
            .unwrap_or_default()
            .into_iter()
            .find(|status| status.display_name() == "Resolved")
            .map(|status| status.id())
            .unwrap_or_default();

        let updated = service
            .update_status(&actor, incident.id(), resolved_id)
            .await;
        assert!(updated.is_ok());
    }

    #[tokio::test]
    async fn stranger_without_permission_may_not_update_status() {
        let survivor = UserId::new();
        let stranger = UserId::new();
        let statuses = ["Incident: Reported", "Incident: Resolved"];
        let (service, _) = build_service(
            &statuses,
            &[
                (survivor, vec![RoleName::Survivor]),
                (stranger, vec![RoleName::LawEnforcement]),
            ],
        );

        let incident = service
            .create_incident(&UserIdentity::new(survivor, "sam"), input())
            .await
            .unwrap_or_else(|_| unreachable!());

        let updated = service
            .update_status(
                &UserIdentity::new(stranger, "lex"),
                incident.id(),
                incident.status_id(),
            )
            .await;
        assert!(matches!(updated, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn listing_is_scoped_to_own_reports_without_view_all() {
        let survivor = UserId::new();
        let other = UserId::new();
        let (service, _) = build_service(
            &["Incident: Reported"],
            &[
                (survivor, vec![RoleName::Survivor]),
                (other, vec![RoleName::Survivor]),
            ],
        );

        let first = service
            .create_incident(&UserIdentity::new(survivor, "sam"), input())
            .await;
        assert!(first.is_ok());
        let second = service
            .create_incident(&UserIdentity::new(other, "kim"), input())
            .await;
        assert!(second.is_ok());

        let listed = service
            .list_incidents(&UserIdentity::new(survivor, "sam"), ListQuery::default())
            .await;
        assert!(listed.is_ok());

        let listed = listed.unwrap_or_default();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].survivor_id(), Some(survivor));
    }

    #[tokio::test]
    async fn out_of_scope_get_is_indistinguishable_from_missing() {
        let survivor = UserId::new();
        let other = UserId::new();
        let (service, _) = build_service(
            &["Incident: Reported"],
            &[
                (survivor, vec![RoleName::Survivor]),
                (other, vec![RoleName::Survivor]),
            ],
        );

        let incident = service
            .create_incident(&UserIdentity::new(survivor, "sam"), input())
            .await
            .unwrap_or_else(|_| unreachable!());

        let fetched = service
            .get_incident(&UserIdentity::new(other, "kim"), incident.id())
            .await;
        assert!(matches!(fetched, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn caseworker_sees_all_incidents() {
        let survivor = UserId::new();
        let worker = UserId::new();
        let (service, _) = build_service(
            &["Incident: Reported"],
            &[
                (survivor, vec![RoleName::Survivor]),
                (worker, vec![RoleName::Caseworker]),
            ],
        );

        let created = service
            .create_incident(&UserIdentity::new(survivor, "sam"), input())
            .await;
        assert!(created.is_ok());

        let listed = service
            .list_incidents(&UserIdentity::new(worker, "wes"), ListQuery::default())
            .await;
        assert_eq!(listed.unwrap_or_default().len(), 1);
    }

    #[tokio::test]
    async fn deletion_requires_permission_and_hides_the_record() {
        let survivor = UserId::new();
        let admin = UserId::new();
        let (service, _) = build_service(
            &["Incident: Reported"],
            &[
                (survivor, vec![RoleName::Survivor]),
                (admin, vec![RoleName::Admin]),
            ],
        );

        let incident = service
            .create_incident(&UserIdentity::new(survivor, "sam"), input())
            .await
            .unwrap_or_else(|_| unreachable!());

        let denied = service
            .delete_incident(&UserIdentity::new(survivor, "sam"), incident.id())
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let deleted = service
            .delete_incident(&UserIdentity::new(admin, "ada"), incident.id())
            .await;
        assert!(deleted.is_ok());

        let fetched = service
            .get_incident(&UserIdentity::new(admin, "ada"), incident.id())
            .await;
        assert!(matches!(fetched, Err(AppError::NotFound(_))));
    }
}
