use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    repository::UserRepository,
};

pub const USER_DELETED: &str = "User deleted successfully.";

/// Success payload returned to the caller after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub success: String,
}

impl Acknowledgement {
    pub fn new<T: Into<String>>(message: T) -> Self {
        Self {
            success: message.into(),
        }
    }
}

#[derive(Clone)]
pub struct UserMutationService {
    users: Arc<dyn UserRepository>,
}

impl UserMutationService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Permanently removes the user and its role assignments. Unknown ids
    /// fail with `NotFound` before anything is deleted.
    pub async fn delete_user(&self, id: i64) -> AppResult<Acknowledgement> {
        let user = self
            .users
            .delete_user(id)
            .await?
            .ok_or(AppError::not_found("user", id))?;

        log::info!("Deleted user {} <{}>", user.id, user.email);

        Ok(Acknowledgement::new(USER_DELETED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewRole, NewUser};
    use crate::repository::{AccessRepository, MemoryRepository};

    async fn seeded() -> Arc<MemoryRepository> {
        let repo = Arc::new(MemoryRepository::new());
        repo.create_user(NewUser::new("Alice", "a@x.com")).await.unwrap();
        repo.create_user(NewUser::new("Bob", "b@x.com")).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn delete_removes_only_the_target() {
        let repo = seeded().await;
        let service = UserMutationService::new(repo.clone());

        let ack = service.delete_user(1).await.unwrap();
        assert_eq!(ack, Acknowledgement::new(USER_DELETED));

        let remaining = repo.list_users().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Bob");
    }

    #[tokio::test]
    async fn delete_of_missing_user_is_not_found() {
        let repo = seeded().await;
        let service = UserMutationService::new(repo.clone());

        let err = service.delete_user(3).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { resource: "user", id: 3 }));
        assert_eq!(repo.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let repo = seeded().await;
        let service = UserMutationService::new(repo);

        service.delete_user(2).await.unwrap();
        let err = service.delete_user(2).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_clears_role_assignments() {
        let repo = seeded().await;
        let admin = repo.create_role(NewRole::new("admin")).await.unwrap();
        repo.assign_role(1, admin.id).await.unwrap();
        let service = UserMutationService::new(repo.clone());

        service.delete_user(1).await.unwrap();

        assert_eq!(repo.user_role_count().await, 0);
        assert_eq!(repo.list_roles().await.unwrap(), vec![admin]);
    }
}
