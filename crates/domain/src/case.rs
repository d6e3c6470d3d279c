use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use safehaven_core::{AppError, AppResult, NonEmptyString, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{IncidentId, Status, StatusDomain, StatusId};

/// Unique identifier for a case record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseId(Uuid);

impl CaseId {
    /// Creates a new random case identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a case identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CaseId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Unique identifier for a case update entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseUpdateId(Uuid);

impl CaseUpdateId {
    /// Creates a new random case update identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a case update identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CaseUpdateId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CaseUpdateId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Work item opened against an incident. A case always descends from
/// exactly one incident; the 1:1 link is enforced at creation by the
/// repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    id: CaseId,
    incident_id: IncidentId,
    assigned_to: Option<UserId>,
    status_id: StatusId,
    resolution_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Case {
    /// Creates an unassigned case for an incident.
    pub fn opened(
        id: CaseId,
        incident_id: IncidentId,
        status: &Status,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        require_case_status(status)?;

        Ok(Self {
            id,
            incident_id,
            assigned_to: None,
            status_id: status.id(),
            resolution_notes: None,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        })
    }

    /// Rehydrates a case from storage without re-running creation rules.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: CaseId,
        incident_id: IncidentId,
        assigned_to: Option<UserId>,
        status_id: StatusId,
        resolution_notes: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            incident_id,
            assigned_to,
            status_id,
            resolution_notes,
            created_at,
            updated_at,
            deleted_at,
        }
    }

    /// Returns the case identifier.
    #[must_use]
    pub fn id(&self) -> CaseId {
        self.id
    }

    /// Returns the owning incident reference.
    #[must_use]
    pub fn incident_id(&self) -> IncidentId {
        self.incident_id
    }

    /// Returns the assigned worker, if any.
    #[must_use]
    pub fn assigned_to(&self) -> Option<UserId> {
        self.assigned_to
    }

    /// Returns the current lifecycle status reference.
    #[must_use]
    pub fn status_id(&self) -> StatusId {
        self.status_id
    }

    /// Returns the recorded resolution notes, if any.
    #[must_use]
    pub fn resolution_notes(&self) -> Option<&str> {
        self.resolution_notes.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-modification timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the soft-delete timestamp, if the record was deleted.
    #[must_use]
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Sets the assignee unconditionally; re-assignment always wins.
    pub fn assign(&mut self, assignee: UserId, now: DateTime<Utc>) {
        self.assigned_to = Some(assignee);
        self.updated_at = now;
    }

    /// Assigns a new lifecycle status.
    pub fn set_status(&mut self, status: &Status, now: DateTime<Utc>) -> AppResult<()> {
        require_case_status(status)?;
        self.status_id = status.id();
        self.updated_at = now;
        Ok(())
    }

    /// Records resolution notes.
    pub fn set_resolution_notes(&mut self, notes: impl Into<String>, now: DateTime<Utc>) {
        self.resolution_notes = Some(notes.into());
        self.updated_at = now;
    }

    /// Marks the record soft-deleted.
    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}

/// Append-only progress note on a case. Immutable once created; soft
/// deletion is the only allowed change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseUpdate {
    id: CaseUpdateId,
    case_id: CaseId,
    updated_by: UserId,
    note: NonEmptyString,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl CaseUpdate {
    /// Creates a case update entry.
    #[must_use]
    pub fn new(
        id: CaseUpdateId,
        case_id: CaseId,
        updated_by: UserId,
        note: NonEmptyString,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            case_id,
            updated_by,
            note,
            created_at,
            deleted_at: None,
        }
    }

    /// Rehydrates a case update from storage.
    #[must_use]
    pub fn from_storage(
        id: CaseUpdateId,
        case_id: CaseId,
        updated_by: UserId,
        note: NonEmptyString,
        created_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            case_id,
            updated_by,
            note,
            created_at,
            deleted_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn id(&self) -> CaseUpdateId {
        self.id
    }

    /// Returns the owning case reference.
    #[must_use]
    pub fn case_id(&self) -> CaseId {
        self.case_id
    }

    /// Returns the author reference.
    #[must_use]
    pub fn updated_by(&self) -> UserId {
        self.updated_by
    }

    /// Returns the note text.
    #[must_use]
    pub fn note(&self) -> &NonEmptyString {
        &self.note
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the soft-delete timestamp, if the entry was deleted.
    #[must_use]
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

fn require_case_status(status: &Status) -> AppResult<()> {
    if status.domain() != StatusDomain::Case {
        return Err(AppError::Validation(format!(
            "status '{}' is not a case status",
            status.name()
        )));
    }

    Ok(())
}
