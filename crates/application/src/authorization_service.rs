use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use safehaven_core::{AppError, AppResult, UserId, UserIdentity};
use safehaven_domain::{Permission, RoleName};

/// Repository port for role membership and permission lookups.
///
/// Permissions are never stored on a user directly; the effective set is
/// always derived from role membership at lookup time.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists roles held by a user.
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleName>>;

    /// Lists permissions granted through every role held by a user.
    /// May contain duplicates when roles share grants.
    async fn list_permissions_for_user(&self, user_id: UserId) -> AppResult<Vec<Permission>>;

    /// Attaches a role to a user. Returns `false` when the pair already
    /// existed; a duplicate attach is never an error at this level.
    async fn attach_role(&self, user_id: UserId, role: RoleName) -> AppResult<bool>;

    /// Detaches a role from a user. The last-admin guard and the detach
    /// execute as one atomic unit: removing Admin from the sole remaining
    /// Admin holder fails with `ProtectedRoleRemoval` and changes nothing.
    /// Detaching a role the user does not hold fails with `NotFound`.
    async fn detach_role(&self, user_id: UserId, role: RoleName) -> AppResult<()>;
}

/// Application service answering capability checks and managing role
/// membership.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Whether the user holds the given role.
    pub async fn has_role(&self, user_id: UserId, role: RoleName) -> AppResult<bool> {
        let roles = self.repository.list_roles_for_user(user_id).await?;
        Ok(roles.contains(&role))
    }

    /// Returns the user's effective permission set: the deduplicated union
    /// of grants across every held role. Recomputed on every call; callers
    /// may hold the returned set for at most one request.
    pub async fn permissions(&self, user_id: UserId) -> AppResult<BTreeSet<Permission>> {
        let granted = self.repository.list_permissions_for_user(user_id).await?;
        Ok(granted.into_iter().collect())
    }

    /// Whether the user currently holds the permission.
    pub async fn has_permission(
        &self,
        user_id: UserId,
        permission: Permission,
    ) -> AppResult<bool> {
        Ok(self.permissions(user_id).await?.contains(&permission))
    }

    /// Ensures the caller holds the required permission.
    pub async fn require_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<()> {
        if self.has_permission(actor.user_id(), permission).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' is missing permission '{}'",
            actor.user_id(),
            permission.as_str()
        )))
    }

    /// Assigns a single role. Unlike the bulk path, a duplicate attach is
    /// surfaced as a conflict rather than silently succeeding.
    pub async fn assign_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role: RoleName,
    ) -> AppResult<()> {
        self.require_permission(actor, Permission::ManageRoles)
            .await?;

        if self.repository.attach_role(user_id, role).await? {
            return Ok(());
        }

        Err(AppError::Conflict(format!(
            "user '{user_id}' already holds role '{role}'"
        )))
    }

    /// Assigns a set of roles, skipping pairs that already exist. Returns
    /// the number of newly attached roles.
    pub async fn assign_roles(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        roles: &[RoleName],
    ) -> AppResult<usize> {
        self.require_permission(actor, Permission::ManageRoles)
            .await?;

        let mut attached = 0;
        for role in roles {
            if self.repository.attach_role(user_id, *role).await? {
                attached += 1;
            }
        }

        Ok(attached)
    }

    /// Removes a role from a user. The repository enforces the last-admin
    /// guard atomically with the detach.
    pub async fn remove_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role: RoleName,
    ) -> AppResult<()> {
        self.require_permission(actor, Permission::ManageRoles)
            .await?;

        self.repository.detach_role(user_id, role).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use safehaven_core::{AppError, AppResult, UserId, UserIdentity};
    use safehaven_domain::{Permission, RoleName};
    use tokio::sync::Mutex;

    use super::{AuthorizationRepository, AuthorizationService};

    #[derive(Default)]
    struct FakeAuthorizationRepository {
        roles: Mutex<HashMap<UserId, Vec<RoleName>>>,
    }

    impl FakeAuthorizationRepository {
        fn with_roles(entries: &[(UserId, &[RoleName])]) -> Self {
            let mut roles = HashMap::new();
            for (user_id, held) in entries {
                roles.insert(*user_id, held.to_vec());
            }
            Self {
                roles: Mutex::new(roles),
            }
        }
    }

    #[async_trait]
    impl AuthorizationRepository for FakeAuthorizationRepository {
        async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleName>> {
            Ok(self
                .roles
                .lock()
                .await
                .get(&user_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn list_permissions_for_user(&self, user_id: UserId) -> AppResult<Vec<Permission>> {
            Ok(self
                .roles
                .lock()
                .await
                .get(&user_id)
                .map(|held| {
                    held.iter()
                        .flat_map(|role| Permission::defaults_for(*role).iter().copied())
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn attach_role(&self, user_id: UserId, role: RoleName) -> AppResult<bool> {
            let mut roles = self.roles.lock().await;
            let held = roles.entry(user_id).or_default();
            if held.contains(&role) {
                return Ok(false);
            }
            held.push(role);
            Ok(true)
        }

        async fn detach_role(&self, user_id: UserId, role: RoleName) -> AppResult<()> {
            let mut roles = self.roles.lock().await;

            if !roles
                .get(&user_id)
                .is_some_and(|held| held.contains(&role))
            {
                return Err(AppError::NotFound(format!(
                    "user '{user_id}' does not hold role '{role}'"
                )));
            }

            if role == RoleName::Admin {
                let admin_holders = roles
                    .values()
                    .filter(|held| held.contains(&RoleName::Admin))
                    .count();
                if admin_holders <= 1 {
                    return Err(AppError::ProtectedRoleRemoval(
                        "removal would leave no admin holder".to_owned(),
                    ));
                }
            }

            if let Some(held) = roles.get_mut(&user_id) {
                held.retain(|existing| existing != &role);
            }
            Ok(())
        }
    }

    fn admin_actor() -> (UserIdentity, UserId) {
        let user_id = UserId::new();
        (UserIdentity::new(user_id, "admin"), user_id)
    }

    #[tokio::test]
    async fn permissions_deduplicate_across_roles() {
        let user_id = UserId::new();
        let repository = FakeAuthorizationRepository::with_roles(&[(
            user_id,
            &[RoleName::Caseworker, RoleName::LawEnforcement],
        )]);
        let service = AuthorizationService::new(Arc::new(repository));

        let permissions = service.permissions(user_id).await;
        assert!(permissions.is_ok());

        let permissions = permissions.unwrap_or_default();
        // Both roles grant view_all_incidents and view_all_cases; the
        // union must not double-count them.
        let expected = Permission::defaults_for(RoleName::Caseworker)
            .iter()
            .chain(Permission::defaults_for(RoleName::LawEnforcement))
            .copied()
            .collect::<std::collections::BTreeSet<_>>();
        assert_eq!(permissions, expected);
    }

    #[tokio::test]
    async fn has_role_is_a_membership_test() {
        let user_id = UserId::new();
        let repository =
            FakeAuthorizationRepository::with_roles(&[(user_id, &[RoleName::Survivor])]);
        let service = AuthorizationService::new(Arc::new(repository));

        assert!(service.has_role(user_id, RoleName::Survivor).await.unwrap_or(false));
        assert!(!service.has_role(user_id, RoleName::Admin).await.unwrap_or(true));
    }

    #[tokio::test]
    async fn single_assign_rejects_duplicate_attach() {
        let (actor, actor_id) = admin_actor();
        let repository = FakeAuthorizationRepository::with_roles(&[(actor_id, &[RoleName::Admin])]);
        let service = AuthorizationService::new(Arc::new(repository));

        let target = UserId::new();
        let first = service.assign_role(&actor, target, RoleName::Caseworker).await;
        assert!(first.is_ok());

        let second = service.assign_role(&actor, target, RoleName::Caseworker).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn bulk_assign_skips_duplicates_silently() {
        let (actor, actor_id) = admin_actor();
        let repository = FakeAuthorizationRepository::with_roles(&[(actor_id, &[RoleName::Admin])]);
        let service = AuthorizationService::new(Arc::new(repository));

        let target = UserId::new();
        let first = service
            .assign_roles(&actor, target, &[RoleName::Caseworker])
            .await;
        assert_eq!(first.unwrap_or(0), 1);

        let second = service
            .assign_roles(&actor, target, &[RoleName::Caseworker, RoleName::Survivor])
            .await;
        assert_eq!(second.unwrap_or(0), 1);
    }

    #[tokio::test]
    async fn removing_last_admin_is_rejected() {
        let (actor, actor_id) = admin_actor();
        let repository = FakeAuthorizationRepository::with_roles(&[(actor_id, &[RoleName::Admin])]);
        let service = AuthorizationService::new(Arc::new(repository));

        let result = service.remove_role(&actor, actor_id, RoleName::Admin).await;
        assert!(matches!(result, Err(AppError::ProtectedRoleRemoval(_))));
    }

    #[tokio::test]
    async fn removing_admin_succeeds_with_two_holders() {
        let (actor, actor_id) = admin_actor();
        let other_admin = UserId::new();
        let repository = FakeAuthorizationRepository::with_roles(&[
            (actor_id, &[RoleName::Admin]),
            (other_admin, &[RoleName::Admin]),
        ]);
        let service = AuthorizationService::new(Arc::new(repository));

        let result = service.remove_role(&actor, other_admin, RoleName::Admin).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn removing_system_from_its_sole_holder_succeeds() {
        let (actor, actor_id) = admin_actor();
        let automation = UserId::new();
        let repository = FakeAuthorizationRepository::with_roles(&[
            (actor_id, &[RoleName::Admin]),
            (automation, &[RoleName::System]),
        ]);
        let service = AuthorizationService::new(Arc::new(repository));

        // Only the last Admin holder is guarded; System carries no such
        // restriction.
        let result = service.remove_role(&actor, automation, RoleName::System).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn removing_admin_from_a_non_holder_is_not_found() {
        let (actor, actor_id) = admin_actor();
        let bystander = UserId::new();
        let repository = FakeAuthorizationRepository::with_roles(&[
            (actor_id, &[RoleName::Admin]),
            (bystander, &[RoleName::Survivor]),
        ]);
        let service = AuthorizationService::new(Arc::new(repository));

        let result = service.remove_role(&actor, bystander, RoleName::Admin).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn role_management_requires_manage_roles() {
        let actor_id = UserId::new();
        let actor = UserIdentity::new(actor_id, "worker");
        let repository =
            FakeAuthorizationRepository::with_roles(&[(actor_id, &[RoleName::Caseworker])]);
        let service = AuthorizationService::new(Arc::new(repository));

        let result = service
            .assign_role(&actor, UserId::new(), RoleName::Survivor)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
