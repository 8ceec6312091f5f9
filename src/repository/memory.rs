use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::{
    NewPermission, NewRole, NewUser, Permission, Role, RolePermission, User, UserRole,
};

use super::{AccessRepository, StoreError, StoreResult, UserRepository};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    roles: BTreeMap<i64, Role>,
    permissions: BTreeMap<i64, Permission>,
    user_roles: BTreeSet<UserRole>,
    role_permissions: BTreeSet<RolePermission>,
    next_user_id: i64,
    next_role_id: i64,
    next_permission_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// In-process entity store. Ids are assigned from 1 upwards per table, and
/// every operation runs under a single lock so deletes are atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored user/role pairs.
    pub async fn user_role_count(&self) -> usize {
        self.tables.read().await.user_roles.len()
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate {
                entity: "user",
                value: user.email,
            });
        }

        let now = Utc::now();
        let id = next_id(&mut tables.next_user_id);
        let user = User {
            id,
            name: user.name,
            email: user.email,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.remove(&id) else {
            return Ok(None);
        };
        tables.user_roles.retain(|pair| pair.user_id != id);
        Ok(Some(user))
    }
}

#[async_trait]
impl AccessRepository for MemoryRepository {
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        Ok(self.tables.read().await.roles.values().cloned().collect())
    }

    async fn find_role(&self, id: i64) -> StoreResult<Option<Role>> {
        Ok(self.tables.read().await.roles.get(&id).cloned())
    }

    async fn create_role(&self, role: NewRole) -> StoreResult<Role> {
        let mut tables = self.tables.write().await;
        if tables.roles.values().any(|r| r.name == role.name) {
            return Err(StoreError::Duplicate {
                entity: "role",
                value: role.name,
            });
        }

        let now = Utc::now();
        let id = next_id(&mut tables.next_role_id);
        let role = Role {
            id,
            name: role.name,
            created_at: now,
            updated_at: now,
        };
        tables.roles.insert(id, role.clone());
        Ok(role)
    }

    async fn list_permissions(&self) -> StoreResult<Vec<Permission>> {
        Ok(self.tables.read().await.permissions.values().cloned().collect())
    }

    async fn create_permission(&self, permission: NewPermission) -> StoreResult<Permission> {
        let mut tables = self.tables.write().await;
        if tables.permissions.values().any(|p| p.name == permission.name) {
            return Err(StoreError::Duplicate {
                entity: "permission",
                value: permission.name,
            });
        }

        let now = Utc::now();
        let id = next_id(&mut tables.next_permission_id);
        let permission = Permission {
            id,
            name: permission.name,
            created_at: now,
            updated_at: now,
        };
        tables.permissions.insert(id, permission.clone());
        Ok(permission)
    }

    async fn assign_role(&self, user_id: i64, role_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::MissingReference { entity: "user", id: user_id });
        }
        if !tables.roles.contains_key(&role_id) {
            return Err(StoreError::MissingReference { entity: "role", id: role_id });
        }
        Ok(tables.user_roles.insert(UserRole { user_id, role_id }))
    }

    async fn revoke_role(&self, user_id: i64, role_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.user_roles.remove(&UserRole { user_id, role_id }))
    }

    async fn grant_permission(&self, role_id: i64, permission_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.roles.contains_key(&role_id) {
            return Err(StoreError::MissingReference { entity: "role", id: role_id });
        }
        if !tables.permissions.contains_key(&permission_id) {
            return Err(StoreError::MissingReference {
                entity: "permission",
                id: permission_id,
            });
        }
        Ok(tables.role_permissions.insert(RolePermission { role_id, permission_id }))
    }

    async fn roles_of_user(&self, user_id: i64) -> StoreResult<Vec<Role>> {
        let tables = self.tables.read().await;
        let roles = tables
            .user_roles
            .iter()
            .filter(|pair| pair.user_id == user_id)
            .filter_map(|pair| tables.roles.get(&pair.role_id).cloned())
            .collect::<Vec<_>>();
        Ok(sorted_by_id(roles, |r| r.id))
    }

    async fn permissions_of_role(&self, role_id: i64) -> StoreResult<Vec<Permission>> {
        let tables = self.tables.read().await;
        let permissions = tables
            .role_permissions
            .iter()
            .filter(|pair| pair.role_id == role_id)
            .filter_map(|pair| tables.permissions.get(&pair.permission_id).cloned())
            .collect::<Vec<_>>();
        Ok(sorted_by_id(permissions, |p| p.id))
    }

    async fn permissions_of_user(&self, user_id: i64) -> StoreResult<Vec<Permission>> {
        let tables = self.tables.read().await;
        let role_ids: BTreeSet<i64> = tables
            .user_roles
            .iter()
            .filter(|pair| pair.user_id == user_id)
            .map(|pair| pair.role_id)
            .collect();

        let permission_ids: BTreeSet<i64> = tables
            .role_permissions
            .iter()
            .filter(|pair| role_ids.contains(&pair.role_id))
            .map(|pair| pair.permission_id)
            .collect();

        Ok(permission_ids
            .iter()
            .filter_map(|id| tables.permissions.get(id).cloned())
            .collect())
    }
}

fn sorted_by_id<T>(mut rows: Vec<T>, key: impl Fn(&T) -> i64) -> Vec<T> {
    rows.sort_by_key(|row| key(row));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn alice_and_bob(repo: &MemoryRepository) -> (User, User) {
        let alice = repo.create_user(NewUser::new("Alice", "a@x.com")).await.unwrap();
        let bob = repo.create_user(NewUser::new("Bob", "b@x.com")).await.unwrap();
        (alice, bob)
    }

    #[tokio::test]
    async fn users_are_listed_in_id_order() {
        let repo = MemoryRepository::new();
        let (alice, bob) = alice_and_bob(&repo).await;

        let users = repo.list_users().await.unwrap();
        assert_eq!(users, vec![alice.clone(), bob]);
        assert_eq!(alice.id, 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = MemoryRepository::new();
        alice_and_bob(&repo).await;

        let err = repo
            .create_user(NewUser::new("Other Alice", "a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { entity: "user", .. }));
        assert_eq!(repo.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn assigning_the_same_role_twice_keeps_one_pair() {
        let repo = MemoryRepository::new();
        let (alice, _) = alice_and_bob(&repo).await;
        repo.create_role(NewRole::new("viewer")).await.unwrap();
        let admin = repo.create_role(NewRole::new("admin")).await.unwrap();

        assert!(repo.assign_role(alice.id, admin.id).await.unwrap());
        assert!(!repo.assign_role(alice.id, admin.id).await.unwrap());

        assert_eq!(repo.user_role_count().await, 1);
        assert_eq!(repo.roles_of_user(alice.id).await.unwrap(), vec![admin]);
    }

    #[tokio::test]
    async fn granting_the_same_permission_twice_keeps_one_pair() {
        let repo = MemoryRepository::new();
        let admin = repo.create_role(NewRole::new("admin")).await.unwrap();
        let delete = repo.create_permission(NewPermission::new("users.delete")).await.unwrap();

        assert!(repo.grant_permission(admin.id, delete.id).await.unwrap());
        assert!(!repo.grant_permission(admin.id, delete.id).await.unwrap());

        assert_eq!(repo.permissions_of_role(admin.id).await.unwrap(), vec![delete]);
    }

    #[tokio::test]
    async fn granting_a_missing_permission_fails() {
        let repo = MemoryRepository::new();
        let admin = repo.create_role(NewRole::new("admin")).await.unwrap();

        let err = repo.grant_permission(admin.id, 5).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference { entity: "permission", id: 5 }));
        assert!(repo.permissions_of_role(admin.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn assigning_to_a_missing_user_fails() {
        let repo = MemoryRepository::new();
        let role = repo.create_role(NewRole::new("admin")).await.unwrap();

        let err = repo.assign_role(42, role.id).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference { entity: "user", id: 42 }));
    }

    #[tokio::test]
    async fn delete_removes_role_pairs_but_not_roles() {
        let repo = MemoryRepository::new();
        let (alice, bob) = alice_and_bob(&repo).await;
        let admin = repo.create_role(NewRole::new("admin")).await.unwrap();
        repo.assign_role(alice.id, admin.id).await.unwrap();
        repo.assign_role(bob.id, admin.id).await.unwrap();

        let deleted = repo.delete_user(alice.id).await.unwrap();
        assert_eq!(deleted, Some(alice.clone()));

        assert_eq!(repo.user_role_count().await, 1);
        assert!(repo.roles_of_user(alice.id).await.unwrap().is_empty());
        assert_eq!(repo.roles_of_user(bob.id).await.unwrap(), vec![admin.clone()]);
        assert_eq!(repo.list_roles().await.unwrap(), vec![admin]);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_changes_nothing() {
        let repo = MemoryRepository::new();
        alice_and_bob(&repo).await;

        assert_eq!(repo.delete_user(99).await.unwrap(), None);
        assert_eq!(repo.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn user_permissions_are_distinct_across_roles() {
        let repo = MemoryRepository::new();
        let (alice, _) = alice_and_bob(&repo).await;
        let admin = repo.create_role(NewRole::new("admin")).await.unwrap();
        let viewer = repo.create_role(NewRole::new("viewer")).await.unwrap();
        let view = repo.create_permission(NewPermission::new("users.view")).await.unwrap();
        let delete = repo.create_permission(NewPermission::new("users.delete")).await.unwrap();

        repo.grant_permission(admin.id, view.id).await.unwrap();
        repo.grant_permission(admin.id, delete.id).await.unwrap();
        repo.grant_permission(viewer.id, view.id).await.unwrap();
        repo.assign_role(alice.id, admin.id).await.unwrap();
        repo.assign_role(alice.id, viewer.id).await.unwrap();

        let permissions = repo.permissions_of_user(alice.id).await.unwrap();
        assert_eq!(permissions, vec![view.clone(), delete]);
        assert_eq!(repo.permissions_of_role(viewer.id).await.unwrap(), vec![view]);
    }

    #[tokio::test]
    async fn revoke_reports_whether_a_pair_existed() {
        let repo = MemoryRepository::new();
        let (alice, _) = alice_and_bob(&repo).await;
        let admin = repo.create_role(NewRole::new("admin")).await.unwrap();
        repo.assign_role(alice.id, admin.id).await.unwrap();

        assert!(repo.revoke_role(alice.id, admin.id).await.unwrap());
        assert!(!repo.revoke_role(alice.id, admin.id).await.unwrap());
    }
}
