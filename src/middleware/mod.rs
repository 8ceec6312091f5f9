pub mod csrf;
pub mod permission;

pub use permission::{authorize_user_delete, get_current_user, CurrentUser, AUTH_COOKIE};
