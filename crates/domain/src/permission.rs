use std::str::FromStr;

use safehaven_core::AppError;
use serde::{Deserialize, Serialize};

use crate::RoleName;

/// Permissions enforced by application policy checks. The catalog is flat
/// and seeded once; users hold permissions only through roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows filing an incident on behalf of another reporter.
    CreateIncident,
    /// Allows moving an incident between lifecycle states.
    UpdateIncident,
    /// Allows soft-deleting an incident.
    DeleteIncident,
    /// Allows reading incidents beyond the caller's own reports.
    ViewAllIncidents,
    /// Allows promoting an incident into a case.
    CreateCase,
    /// Allows case status transitions, resolution notes, and updates.
    UpdateCase,
    /// Allows assigning or re-assigning a case to a worker.
    AssignCase,
    /// Allows soft-deleting a case.
    DeleteCase,
    /// Allows reading cases beyond the caller's own incidents.
    ViewAllCases,
    /// Allows assigning and removing user roles.
    ManageRoles,
    /// Allows deleting user accounts.
    ManageUsers,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateIncident => "create_incident",
            Self::UpdateIncident => "update_incident",
            Self::DeleteIncident => "delete_incident",
            Self::ViewAllIncidents => "view_all_incidents",
            Self::CreateCase => "create_case",
            Self::UpdateCase => "update_case",
            Self::AssignCase => "assign_case",
            Self::DeleteCase => "delete_case",
            Self::ViewAllCases => "view_all_cases",
            Self::ManageRoles => "manage_roles",
            Self::ManageUsers => "manage_users",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::CreateIncident,
            Permission::UpdateIncident,
            Permission::DeleteIncident,
            Permission::ViewAllIncidents,
            Permission::CreateCase,
            Permission::UpdateCase,
            Permission::AssignCase,
            Permission::DeleteCase,
            Permission::ViewAllCases,
            Permission::ManageRoles,
            Permission::ManageUsers,
        ];

        ALL
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }

    /// Default grant set attached to a role at seed time.
    #[must_use]
    pub fn defaults_for(role: RoleName) -> &'static [Self] {
        match role {
            RoleName::Admin => Self::all(),
            RoleName::Survivor => &[Permission::CreateIncident, Permission::UpdateIncident],
            RoleName::Caseworker => &[
                Permission::ViewAllIncidents,
                Permission::UpdateIncident,
                Permission::CreateCase,
                Permission::UpdateCase,
                Permission::AssignCase,
                Permission::ViewAllCases,
            ],
            RoleName::LawEnforcement => {
                &[Permission::ViewAllIncidents, Permission::ViewAllCases]
            }
            RoleName::System => &[
                Permission::CreateIncident,
                Permission::UpdateIncident,
                Permission::ViewAllIncidents,
                Permission::ViewAllCases,
            ],
        }
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create_incident" => Ok(Self::CreateIncident),
            "update_incident" => Ok(Self::UpdateIncident),
            "delete_incident" => Ok(Self::DeleteIncident),
            "view_all_incidents" => Ok(Self::ViewAllIncidents),
            "create_case" => Ok(Self::CreateCase),
            "update_case" => Ok(Self::UpdateCase),
            "assign_case" => Ok(Self::AssignCase),
            "delete_case" => Ok(Self::DeleteCase),
            "view_all_cases" => Ok(Self::ViewAllCases),
            "manage_roles" => Ok(Self::ManageRoles),
            "manage_users" => Ok(Self::ManageUsers),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::RoleName;

    use super::Permission;

    #[test]
    fn permission_roundtrip_storage_value() {
        for permission in Permission::all() {
            let restored = Permission::from_str(permission.as_str());
            assert!(restored.is_ok());
            assert_eq!(restored.unwrap_or(Permission::CreateIncident), *permission);
        }
    }

    #[test]
    fn unknown_permission_is_rejected() {
        let parsed = Permission::from_str("export_reports");
        assert!(parsed.is_err());
    }

    #[test]
    fn admin_defaults_cover_the_whole_catalog() {
        assert_eq!(
            Permission::defaults_for(RoleName::Admin).len(),
            Permission::all().len()
        );
    }

    #[test]
    fn survivor_defaults_do_not_grant_case_management() {
        let defaults = Permission::defaults_for(RoleName::Survivor);
        assert!(!defaults.contains(&Permission::CreateCase));
        assert!(!defaults.contains(&Permission::ViewAllCases));
    }
}
