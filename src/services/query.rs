use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{User, UserDisplay},
    repository::{AccessRepository, UserRepository},
};

/// Read side of the dashboard.
#[derive(Clone)]
pub struct UserQueryService {
    users: Arc<dyn UserRepository>,
    access: Arc<dyn AccessRepository>,
}

impl UserQueryService {
    pub fn new(users: Arc<dyn UserRepository>, access: Arc<dyn AccessRepository>) -> Self {
        Self { users, access }
    }

    /// Every user, in primary-key order.
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        Ok(self.users.list_users().await?)
    }

    /// Users paired with the names of their roles, for the table view.
    pub async fn list_users_with_roles(&self) -> AppResult<Vec<UserDisplay>> {
        let users = self.list_users().await?;

        let mut rows = Vec::with_capacity(users.len());
        for user in users {
            let roles = self
                .access
                .roles_of_user(user.id)
                .await?
                .into_iter()
                .map(|role| role.name)
                .collect();
            rows.push(UserDisplay::new(user, roles));
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewRole, NewUser};
    use crate::repository::MemoryRepository;

    #[tokio::test]
    async fn lists_every_stored_user() {
        let repo = Arc::new(MemoryRepository::new());
        repo.create_user(NewUser::new("Alice", "a@x.com")).await.unwrap();
        repo.create_user(NewUser::new("Bob", "b@x.com")).await.unwrap();
        let service = UserQueryService::new(repo.clone(), repo.clone());

        let users = service.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        let rows: Vec<(i64, &str, &str)> = users
            .iter()
            .map(|u| (u.id, u.name.as_str(), u.email.as_str()))
            .collect();
        assert_eq!(rows, vec![(1, "Alice", "a@x.com"), (2, "Bob", "b@x.com")]);
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let repo = Arc::new(MemoryRepository::new());
        let service = UserQueryService::new(repo.clone(), repo);

        assert!(service.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn display_rows_carry_role_names() {
        let repo = Arc::new(MemoryRepository::new());
        let alice = repo.create_user(NewUser::new("Alice", "a@x.com")).await.unwrap();
        repo.create_user(NewUser::new("Bob", "b@x.com")).await.unwrap();
        let admin = repo.create_role(NewRole::new("admin")).await.unwrap();
        repo.assign_role(alice.id, admin.id).await.unwrap();
        let service = UserQueryService::new(repo.clone(), repo);

        let rows = service.list_users_with_roles().await.unwrap();
        assert_eq!(rows[0].roles, vec!["admin".to_string()]);
        assert!(rows[1].roles.is_empty());
    }
}
