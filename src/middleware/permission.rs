use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    error::{AppError, AppResult},
    models::{has_permission, Permission, User, DELETE_USERS},
    state::AppState,
    utils::verify_token,
};

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub permissions: Vec<String>,
    // Helper property for templates
    pub can_delete_users: bool,
}

impl CurrentUser {
    pub fn from_user_and_permissions(user: User, permissions: Vec<Permission>) -> Self {
        let can_delete_users = has_permission(&permissions, DELETE_USERS);

        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            permissions: permissions.into_iter().map(|p| p.name).collect(),
            can_delete_users,
        }
    }
}

/// Resolves the caller from the `auth_token` cookie.
///
/// Returns `Ok(None)` when authorization is disabled. With a configured
/// secret a missing or invalid token, or a token for a user that no longer
/// exists, is `Unauthorized`.
pub async fn get_current_user(
    cookies: &Cookies,
    state: &AppState,
) -> AppResult<Option<CurrentUser>> {
    let Some(secret) = state.config.jwt_secret.as_deref() else {
        return Ok(None);
    };

    let token = cookies
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    let user_id = verify_token(&token, secret)
        .ok()
        .and_then(|claims| claims.user_id())
        .ok_or(AppError::Unauthorized)?;

    let user = state
        .users
        .find_user(user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let permissions = state.access.permissions_of_user(user.id).await?;

    Ok(Some(CurrentUser::from_user_and_permissions(user, permissions)))
}

/// Checks that `actor` may delete `target_id`. An absent actor means
/// authorization is disabled.
pub fn authorize_user_delete(actor: Option<&CurrentUser>, target_id: i64) -> AppResult<()> {
    let Some(actor) = actor else {
        return Ok(());
    };

    if !actor.can_delete_users {
        return Err(AppError::forbidden("You do not have permission to delete users"));
    }

    // Prevent users from deleting themselves
    if actor.id == target_id {
        return Err(AppError::bad_request("You cannot delete your own account"));
    }

    Ok(())
}
