//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod case;
mod incident;
mod permission;
mod role;
mod status;

pub use case::{Case, CaseId, CaseUpdate, CaseUpdateId};
pub use incident::{
    Incident, IncidentId, IncidentLocation, TRACKING_CODE_LENGTH, TRACKING_CODE_PREFIX,
    TrackingCode,
};
pub use permission::Permission;
pub use role::{Role, RoleId, RoleName};
pub use status::{
    CaseStatusName, CaseWorkState, IncidentStatusName, Status, StatusDomain, StatusId,
};
