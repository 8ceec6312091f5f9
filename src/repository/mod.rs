//! Entity store. Repositories are constructed with an explicit storage
//! handle and handed to the services that need them.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewPermission, NewRole, NewUser, Permission, Role, User};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("{entity} {id} does not exist")]
    MissingReference { entity: &'static str, id: i64 },

    #[error("{entity} '{value}' already exists")]
    Duplicate { entity: &'static str, value: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users in primary-key order.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;

    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Removes the user and its role assignments atomically.
    /// Returns `None` without touching anything when the id is unknown.
    async fn delete_user(&self, id: i64) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait AccessRepository: Send + Sync {
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;

    async fn find_role(&self, id: i64) -> StoreResult<Option<Role>>;

    async fn create_role(&self, role: NewRole) -> StoreResult<Role>;

    async fn list_permissions(&self) -> StoreResult<Vec<Permission>>;

    async fn create_permission(&self, permission: NewPermission) -> StoreResult<Permission>;

    /// Returns `true` when a new pair was stored, `false` when it already existed.
    async fn assign_role(&self, user_id: i64, role_id: i64) -> StoreResult<bool>;

    async fn revoke_role(&self, user_id: i64, role_id: i64) -> StoreResult<bool>;

    /// Returns `true` when a new pair was stored, `false` when it already existed.
    async fn grant_permission(&self, role_id: i64, permission_id: i64) -> StoreResult<bool>;

    async fn roles_of_user(&self, user_id: i64) -> StoreResult<Vec<Role>>;

    async fn permissions_of_role(&self, role_id: i64) -> StoreResult<Vec<Permission>>;

    /// Distinct permissions granted through any of the user's roles.
    async fn permissions_of_user(&self, user_id: i64) -> StoreResult<Vec<Permission>>;
}
