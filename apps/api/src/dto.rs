use chrono::{DateTime, Utc};
use safehaven_application::{ListQuery, ReportIncidentInput};
use safehaven_domain::{
    Case, CaseUpdate, Incident, IncidentLocation, Permission, RoleName, Status, TrackingCode,
};
use serde::{Deserialize, Serialize};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for filing an incident, authenticated or anonymous.
#[derive(Debug, Deserialize)]
pub struct ReportIncidentRequest {
    pub description: String,
    pub location: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub contact_info: Option<String>,
}

impl From<ReportIncidentRequest> for ReportIncidentInput {
    fn from(value: ReportIncidentRequest) -> Self {
        Self {
            description: value.description,
            location: IncidentLocation {
                location: value.location,
                address: value.address,
                latitude: value.latitude,
                longitude: value.longitude,
            },
            contact_info: value.contact_info,
        }
    }
}

/// Incoming payload for a status transition.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status_id: uuid::Uuid,
}

/// Incoming payload for case assignment.
#[derive(Debug, Deserialize)]
pub struct AssignCaseRequest {
    pub assignee: uuid::Uuid,
}

/// Incoming payload for appending a case update.
#[derive(Debug, Deserialize)]
pub struct AddCaseUpdateRequest {
    pub note: String,
}

/// Incoming payload for recording resolution notes.
#[derive(Debug, Deserialize)]
pub struct ResolutionNotesRequest {
    pub notes: String,
}

/// Incoming payload for single role assignment or removal.
#[derive(Debug, Deserialize)]
pub struct RoleAssignmentRequest {
    pub user_id: uuid::Uuid,
    pub role_name: String,
}

/// Incoming payload for bulk role assignment.
#[derive(Debug, Deserialize)]
pub struct BulkRoleAssignmentRequest {
    pub user_id: uuid::Uuid,
    pub role_names: Vec<String>,
}

/// Number of roles newly attached by a bulk assignment.
#[derive(Debug, Serialize)]
pub struct BulkRoleAssignmentResponse {
    pub attached: usize,
}

/// Query parameters for status catalog listing.
#[derive(Debug, Default, Deserialize)]
pub struct StatusListParams {
    pub domain: Option<String>,
}

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<ListParams> for ListQuery {
    fn from(value: ListParams) -> Self {
        let default = ListQuery::default();
        Self {
            limit: value.limit.unwrap_or(default.limit),
            offset: value.offset.unwrap_or(default.offset),
        }
    }
}

/// API representation of an incident.
#[derive(Debug, Serialize)]
pub struct IncidentResponse {
    pub id: uuid::Uuid,
    pub survivor_id: Option<uuid::Uuid>,
    pub status_id: uuid::Uuid,
    pub description: String,
    pub location: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub contact_info: Option<String>,
    pub tracking_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Incident> for IncidentResponse {
    fn from(incident: Incident) -> Self {
        Self {
            id: incident.id().as_uuid(),
            survivor_id: incident.survivor_id().map(|survivor| survivor.as_uuid()),
            status_id: incident.status_id().as_uuid(),
            description: incident.description().as_str().to_owned(),
            location: incident.location().location.clone(),
            address: incident.location().address.clone(),
            latitude: incident.location().latitude,
            longitude: incident.location().longitude,
            contact_info: incident.contact_info().map(str::to_owned),
            tracking_code: incident
                .tracking_code()
                .map(TrackingCode::as_str)
                .map(str::to_owned),
            created_at: incident.created_at(),
            updated_at: incident.updated_at(),
        }
    }
}

/// API representation of a case.
#[derive(Debug, Serialize)]
pub struct CaseResponse {
    pub id: uuid::Uuid,
    pub incident_id: uuid::Uuid,
    pub assigned_to: Option<uuid::Uuid>,
    pub status_id: uuid::Uuid,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Case> for CaseResponse {
    fn from(case: Case) -> Self {
        Self {
            id: case.id().as_uuid(),
            incident_id: case.incident_id().as_uuid(),
            assigned_to: case.assigned_to().map(|assignee| assignee.as_uuid()),
            status_id: case.status_id().as_uuid(),
            resolution_notes: case.resolution_notes().map(str::to_owned),
            created_at: case.created_at(),
            updated_at: case.updated_at(),
        }
    }
}

/// API representation of one case update entry.
#[derive(Debug, Serialize)]
pub struct CaseUpdateResponse {
    pub id: uuid::Uuid,
    pub case_id: uuid::Uuid,
    pub updated_by: uuid::Uuid,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl From<CaseUpdate> for CaseUpdateResponse {
    fn from(update: CaseUpdate) -> Self {
        Self {
            id: update.id().as_uuid(),
            case_id: update.case_id().as_uuid(),
            updated_by: update.updated_by().as_uuid(),
            note: update.note().as_str().to_owned(),
            created_at: update.created_at(),
        }
    }
}

/// API representation of one catalog status.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: uuid::Uuid,
    pub name: String,
    pub display_name: String,
}

impl From<Status> for StatusResponse {
    fn from(status: Status) -> Self {
        Self {
            id: status.id().as_uuid(),
            name: status.name().to_owned(),
            display_name: status.display_name().to_owned(),
        }
    }
}

/// API representation of a role and its default grants.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub name: String,
    pub permissions: Vec<String>,
}

impl From<RoleName> for RoleResponse {
    fn from(role: RoleName) -> Self {
        Self {
            name: role.as_str().to_owned(),
            permissions: Permission::defaults_for(role)
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

/// Effective permission tags held by one user.
#[derive(Debug, Serialize)]
pub struct PermissionSetResponse {
    pub permissions: Vec<String>,
}
