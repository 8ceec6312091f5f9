pub mod rbac;
pub mod user;

pub use rbac::{
    has_permission, NewPermission, NewRole, Permission, Role, RolePermission, UserRole,
    DELETE_USERS, VIEW_USERS,
};
pub use user::{NewUser, User, UserDisplay};
