use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use safehaven_core::{AppError, AppResult, NonEmptyString, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Status, StatusDomain, StatusId};

/// Unique identifier for an incident record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncidentId(Uuid);

impl IncidentId {
    /// Creates a new random incident identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an incident identifier from an existing UUID value.
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

impl Default for IncidentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for IncidentId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Fixed literal prefix carried by every tracking code.
pub const TRACKING_CODE_PREFIX: &str = "ANO-";

/// Number of random characters following the prefix.
pub const TRACKING_CODE_LENGTH: usize = 8;

/// Opaque identifier allowing anonymous status lookup without
/// authentication. Globally unique and immutable once attached to an
/// incident.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingCode(String);

impl TrackingCode {
    /// Parses and validates a tracking code value.
    pub fn parse(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        let Some(suffix) = value.strip_prefix(TRACKING_CODE_PREFIX) else {
            return Err(AppError::Validation(format!(
                "tracking code must start with '{TRACKING_CODE_PREFIX}'"
            )));
        };

        if suffix.len() != TRACKING_CODE_LENGTH
            || !suffix
                .chars()
                .all(|character| character.is_ascii_uppercase() || character.is_ascii_digit())
        {
            return Err(AppError::Validation(format!(
                "tracking code suffix must be {TRACKING_CODE_LENGTH} uppercase alphanumeric characters"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the validated code string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TrackingCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Where the reported event took place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentLocation {
    /// Free-text location description.
    pub location: Option<String>,
    /// Street address, when known.
    pub address: Option<String>,
    /// Latitude in decimal degrees.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    pub longitude: Option<f64>,
}

/// A single reported event, the root record of the workflow.
///
/// Invariant: a tracking code is present exactly when the survivor
/// reference is absent; both constructors enforce it and no mutator can
/// break it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    id: IncidentId,
    survivor_id: Option<UserId>,
    status_id: StatusId,
    description: NonEmptyString,
    location: IncidentLocation,
    contact_info: Option<String>,
    tracking_code: Option<TrackingCode>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Incident {
    /// Creates an authenticated incident filed by a survivor.
    pub fn reported(
        id: IncidentId,
        survivor_id: UserId,
        status: &Status,
        description: NonEmptyString,
        location: IncidentLocation,
        contact_info: Option<String>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        require_incident_status(status)?;

        Ok(Self {
            id,
            survivor_id: Some(survivor_id),
            status_id: status.id(),
            description,
            location,
            contact_info,
            tracking_code: None,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        })
    }

    /// Creates an anonymous incident with its tracking code.
    pub fn anonymous(
        id: IncidentId,
        status: &Status,
        description: NonEmptyString,
        location: IncidentLocation,
        contact_info: Option<String>,
        tracking_code: TrackingCode,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        require_incident_status(status)?;

        Ok(Self {
            id,
            survivor_id: None,
            status_id: status.id(),
            description,
            location,
            contact_info,
            tracking_code: Some(tracking_code),
            created_at,
            updated_at: created_at,
            deleted_at: None,
        })
    }

    /// Rehydrates an incident from storage without re-running creation
    /// rules.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: IncidentId,
        survivor_id: Option<UserId>,
        status_id: StatusId,
        description: NonEmptyString,
        location: IncidentLocation,
        contact_info: Option<String>,
        tracking_code: Option<TrackingCode>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            survivor_id,
            status_id,
            description,
            location,
            contact_info,
            tracking_code,
            created_at,
            updated_at,
            deleted_at,
        }
    }

    /// Returns the incident identifier.
    #[must_use]
    pub fn id(&self) -> IncidentId {
        self.id
    }

    /// Returns the reporting survivor, absent for anonymous reports.
    #[must_use]
    pub fn survivor_id(&self) -> Option<UserId> {
        self.survivor_id
    }

    /// Returns the current lifecycle status reference.
    #[must_use]
    pub fn status_id(&self) -> StatusId {
        self.status_id
    }

    /// Returns the report description.
    #[must_use]
    pub fn description(&self) -> &NonEmptyString {
        &self.description
    }

    /// Returns the reported location.
    #[must_use]
    pub fn location(&self) -> &IncidentLocation {
        &self.location
    }

    /// Returns optional reporter contact information.
    #[must_use]
    pub fn contact_info(&self) -> Option<&str> {
        self.contact_info.as_deref()
    }

    /// Returns the tracking code, present only for anonymous reports.
    #[must_use]
    pub fn tracking_code(&self) -> Option<&TrackingCode> {
        self.tracking_code.as_ref()
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

    /// Whether the report was filed without a survivor reference.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.survivor_id.is_none()
    }

    /// Assigns a new lifecycle status. Transitions are unconstrained;
    /// authorization is the caller's concern.
    pub fn set_status(&mut self, status: &Status, now: DateTime<Utc>) -> AppResult<()> {
        require_incident_status(status)?;
        self.status_id = status.id();
        self.updated_at = now;
        Ok(())
    }

    /// Marks the record soft-deleted.
    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.updated_at = now;
    }
}

fn require_incident_status(status: &Status) -> AppResult<()> {
    if status.domain() != StatusDomain::Incident {
        return Err(AppError::Validation(format!(
            "status '{}' is not an incident status",
            status.name()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;
    use safehaven_core::{NonEmptyString, UserId};

    use crate::{Status, StatusId};

    use super::{Incident, IncidentId, IncidentLocation, TrackingCode};

    fn incident_status(name: &str) -> Status {
        Status::new(StatusId::new(), name).unwrap_or_else(|_| unreachable!())
    }

    fn description() -> NonEmptyString {
        NonEmptyString::new("reported event").unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn reported_incident_has_no_tracking_code() {
        let incident = Incident::reported(
            IncidentId::new(),
            UserId::new(),
            &incident_status("Incident: Reported"),
            description(),
            IncidentLocation::default(),
            None,
            Utc::now(),
        );
        assert!(incident.is_ok());

        let incident = incident.unwrap_or_else(|_| unreachable!());
        assert!(!incident.is_anonymous());
        assert!(incident.tracking_code().is_none());
    }

    #[test]
    fn anonymous_incident_carries_tracking_code() {
        let code = TrackingCode::parse("ANO-A1B2C3D4").unwrap_or_else(|_| unreachable!());
        let incident = Incident::anonymous(
            IncidentId::new(),
            &incident_status("Incident: Anonymous"),
            description(),
            IncidentLocation::default(),
            Some("signal: +1 555 0100".to_owned()),
            code.clone(),
            Utc::now(),
        );
        assert!(incident.is_ok());

        let incident = incident.unwrap_or_else(|_| unreachable!());
        assert!(incident.is_anonymous());
        assert_eq!(incident.tracking_code(), Some(&code));
    }

    #[test]
    fn creation_rejects_case_domain_status() {
        let incident = Incident::reported(
            IncidentId::new(),
            UserId::new(),
            &incident_status("Case: Open"),
            description(),
            IncidentLocation::default(),
            None,
            Utc::now(),
        );
        assert!(incident.is_err());
    }

    #[test]
    fn status_assignment_rejects_case_domain_status() {
        let mut incident = Incident::reported(
            IncidentId::new(),
            UserId::new(),
            &incident_status("Incident: Reported"),
            description(),
            IncidentLocation::default(),
            None,
            Utc::now(),
        )
        .unwrap_or_else(|_| unreachable!());

        let result = incident.set_status(&incident_status("Case: Open"), Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn tracking_code_rejects_lowercase_suffix() {
        assert!(TrackingCode::parse("ANO-a1b2c3d4").is_err());
    }

    #[test]
    fn tracking_code_rejects_wrong_prefix() {
        assert!(TrackingCode::parse("TRK-A1B2C3D4").is_err());
    }

    #[test]
    fn tracking_code_rejects_short_suffix() {
        assert!(TrackingCode::parse("ANO-A1B2C3").is_err());
    }

    proptest! {
        #[test]
        fn well_formed_tracking_codes_parse(suffix in "[A-Z0-9]{8}") {
            let value = format!("ANO-{suffix}");
            prop_assert!(TrackingCode::parse(value).is_ok());
        }

        #[test]
        fn nine_character_suffixes_are_rejected(suffix in "[A-Z0-9]{9}") {
            let value = format!("ANO-{suffix}");
            prop_assert!(TrackingCode::parse(value).is_err());
        }
    }
}
