use std::fmt::{Display, Formatter};

use safehaven_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusId(Uuid);

impl StatusId {
    /// Creates a new random status identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a status identifier from an existing UUID value.
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

impl Default for StatusId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for StatusId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The Case-vs-Incident partition of the shared status catalog. Every
/// status belongs to exactly one domain, determined solely by its name
/// prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDomain {
    /// Statuses driving the incident lifecycle.
    Incident,
    /// Statuses driving the case lifecycle.
    Case,
}

impl StatusDomain {
    /// Returns the name prefix carried by statuses in this domain.
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Incident => "Incident: ",
            Self::Case => "Case: ",
        }
    }

    /// Derives the domain from a stored status name.
    ///
    /// A name carrying neither prefix is a configuration error, not a
    /// runtime case to tolerate.
    pub fn of(name: &str) -> AppResult<Self> {
        if name.starts_with(Self::Incident.prefix()) {
            return Ok(Self::Incident);
        }
        if name.starts_with(Self::Case.prefix()) {
            return Ok(Self::Case);
        }

        Err(AppError::Validation(format!(
            "status name '{name}' carries no domain prefix"
        )))
    }
}

/// A named lifecycle state from the shared status catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    id: StatusId,
    name: String,
    domain: StatusDomain,
}

impl Status {
    /// Creates a status, validating that the name carries a domain prefix.
    pub fn new(id: StatusId, name: impl Into<String>) -> AppResult<Self> {
        let name = name.into();
        let domain = StatusDomain::of(name.as_str())?;

        Ok(Self { id, name, domain })
    }

    /// Returns the status identifier.
    #[must_use]
    pub fn id(&self) -> StatusId {
        self.id
    }

    /// Returns the stored name including the domain prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the domain derived from the name prefix.
    #[must_use]
    pub fn domain(&self) -> StatusDomain {
        self.domain
    }

    /// Returns the display label with the domain prefix stripped.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .strip_prefix(self.domain.prefix())
            .unwrap_or(self.name.as_str())
    }

    /// Classifies a Case-domain status into the open/closed grouping.
    ///
    /// Fails for Incident-domain statuses and for Case labels outside the
    /// fixed vocabulary; unclassified labels are rejected, never bucketed.
    pub fn work_state(&self) -> AppResult<CaseWorkState> {
        if self.domain != StatusDomain::Case {
            return Err(AppError::Validation(format!(
                "status '{}' is not a case status",
                self.name
            )));
        }

        CaseWorkState::classify(self.display_name())
    }

    /// Whether a Case-domain status counts as active work.
    pub fn is_open(&self) -> AppResult<bool> {
        Ok(self.work_state()? == CaseWorkState::Open)
    }
}

/// Incident lifecycle state vocabulary used for seeding and fallback
/// chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatusName {
    /// Initial state for authenticated reports.
    Reported,
    /// A caseworker is actively investigating.
    UnderInvestigation,
    /// The report has been corroborated.
    Verified,
    /// Terminal state; the record persists.
    Resolved,
    /// Fallback initial state when the preferred seed is absent.
    Pending,
    /// Initial state for anonymous submissions.
    Anonymous,
}

impl IncidentStatusName {
    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reported => "Reported",
            Self::UnderInvestigation => "Under Investigation",
            Self::Verified => "Verified",
            Self::Resolved => "Resolved",
            Self::Pending => "Pending",
            Self::Anonymous => "Anonymous",
        }
    }

    /// Returns the prefix-qualified stored name.
    #[must_use]
    pub fn qualified(&self) -> String {
        format!("{}{}", StatusDomain::Incident.prefix(), self.label())
    }

    /// Returns all incident statuses, in seed order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[IncidentStatusName] = &[
            IncidentStatusName::Reported,
            IncidentStatusName::UnderInvestigation,
            IncidentStatusName::Verified,
            IncidentStatusName::Resolved,
            IncidentStatusName::Pending,
            IncidentStatusName::Anonymous,
        ];

        ALL
    }
}

/// Case lifecycle state vocabulary used for seeding and classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatusName {
    /// Initial state on promotion.
    Open,
    /// A worker is actively handling the case.
    InProgress,
    /// Awaiting internal review.
    PendingReview,
    /// Awaiting an external party.
    PendingExternal,
    /// Work finished; resolution recorded.
    Resolved,
    /// Terminal state.
    Closed,
}

impl CaseStatusName {
    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::PendingReview => "Pending Review",
            Self::PendingExternal => "Pending External",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        }
    }

    /// Returns the prefix-qualified stored name.
    #[must_use]
    pub fn qualified(&self) -> String {
        format!("{}{}", StatusDomain::Case.prefix(), self.label())
    }

    /// Returns all case statuses, in seed order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[CaseStatusName] = &[
            CaseStatusName::Open,
            CaseStatusName::InProgress,
            CaseStatusName::PendingReview,
            CaseStatusName::PendingExternal,
            CaseStatusName::Resolved,
            CaseStatusName::Closed,
        ];

        ALL
    }
}

/// Open/closed grouping of Case statuses used for workload queries and the
/// user-deletion guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseWorkState {
    /// Active work: Open, In Progress, Pending Review, Pending External.
    Open,
    /// Terminal: Resolved, Closed.
    Closed,
}

impl CaseWorkState {
    /// Classifies a Case display label into the fixed open/closed
    /// partition. Labels outside the vocabulary are a modeling gap and
    /// fail instead of defaulting to either bucket.
    pub fn classify(label: &str) -> AppResult<Self> {
        match label {
            "Open" | "In Progress" | "Pending Review" | "Pending External" => Ok(Self::Open),
            "Resolved" | "Closed" => Ok(Self::Closed),
            _ => Err(AppError::Validation(format!(
                "case status label '{label}' has no open/closed classification"
            ))),
        }
    }
}
