use safehaven_core::UserId;

/// Read scope for incident queries, computed from the caller's permission
/// set before any repository call. Repositories apply the scope and the
/// soft-delete predicate ahead of pagination or further filtering, so a
/// search term can never widen what a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentScope {
    /// No restriction; caller holds `view_all_incidents`.
    All,
    /// Restricted to incidents reported by this survivor.
    SurvivorOnly(UserId),
}

impl IncidentScope {
    /// Whether the scope admits this survivor reference.
    #[must_use]
    pub fn admits(&self, survivor_id: Option<UserId>) -> bool {
        match self {
            Self::All => true,
            Self::SurvivorOnly(viewer) => survivor_id == Some(*viewer),
        }
    }
}

/// Read scope for case queries. The restricted form follows the case's
/// incident back to its survivor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseScope {
    /// No restriction; caller holds `view_all_cases`.
    All,
    /// Restricted to cases whose incident was reported by this survivor.
    SurvivorOnly(UserId),
}

impl CaseScope {
    /// Whether the scope admits a case whose incident carries this
    /// survivor reference.
    #[must_use]
    pub fn admits(&self, survivor_id: Option<UserId>) -> bool {
        match self {
            Self::All => true,
            Self::SurvivorOnly(viewer) => survivor_id == Some(*viewer),
        }
    }
}

/// Offset pagination applied after scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped.
    pub offset: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}
