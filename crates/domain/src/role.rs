use std::fmt::{Display, Formatter};
use std::str::FromStr;

use safehaven_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Closed role vocabulary. Role names are compared case-insensitively and
/// anything outside this list fails construction with `InvalidRole`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleName {
    /// Full administrative access; the last Admin holder is protected.
    Admin,
    /// A reporting party managing their own incidents.
    Survivor,
    /// Manages cases promoted from incidents.
    Caseworker,
    /// Read access granted to partner agencies.
    LawEnforcement,
    /// Internal automation identity.
    System,
}

impl RoleName {
    /// Returns the canonical storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Survivor => "survivor",
            Self::Caseworker => "caseworker",
            Self::LawEnforcement => "law-enforcement",
            Self::System => "system",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[RoleName] = &[
            RoleName::Admin,
            RoleName::Survivor,
            RoleName::Caseworker,
            RoleName::LawEnforcement,
            RoleName::System,
        ];

        ALL
    }

    /// Parses a transport value into a role name.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for RoleName {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "survivor" => Ok(Self::Survivor),
            "caseworker" => Ok(Self::Caseworker),
            "law-enforcement" => Ok(Self::LawEnforcement),
            "system" => Ok(Self::System),
            _ => Err(AppError::InvalidRole(format!(
                "unknown role name '{value}'"
            ))),
        }
    }
}

impl Display for RoleName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Role reference data provisioned once at seed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: RoleName,
}

impl Role {
    /// Creates a role record.
    #[must_use]
    pub fn new(id: RoleId, name: RoleName) -> Self {
        Self { id, name }
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> RoleName {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::RoleName;

    #[test]
    fn role_roundtrip_storage_value() {
        for role in RoleName::all() {
            let restored = RoleName::from_str(role.as_str());
            assert!(restored.is_ok());
            assert_eq!(restored.unwrap_or(RoleName::Survivor), *role);
        }
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        let parsed = RoleName::from_str("CaseWorker");
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap_or(RoleName::Survivor), RoleName::Caseworker);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let parsed = RoleName::from_str("supervisor");
        assert!(matches!(
            parsed,
            Err(safehaven_core::AppError::InvalidRole(_))
        ));
    }
}
