use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::Json,
};
use tower_cookies::Cookies;

use crate::{
    error::{AppError, AppResult},
    handlers::path_id,
    middleware::get_current_user,
    models::{Permission, Role, User},
    state::AppState,
};

pub async fn list_users(
    cookies: Cookies,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<User>>> {
    get_current_user(&cookies, &state).await?;

    Ok(Json(state.queries.list_users().await?))
}

pub async fn user_roles(
    cookies: Cookies,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Vec<Role>>> {
    let user_id = path_id(path)?;
    get_current_user(&cookies, &state).await?;

    state
        .users
        .find_user(user_id)
        .await?
        .ok_or(AppError::not_found("user", user_id))?;

    Ok(Json(state.access.roles_of_user(user_id).await?))
}

pub async fn role_permissions(
    cookies: Cookies,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Vec<Permission>>> {
    let role_id = path_id(path)?;
    get_current_user(&cookies, &state).await?;

    state
        .access
        .find_role(role_id)
        .await?
        .ok_or(AppError::not_found("role", role_id))?;

    Ok(Json(state.access.permissions_of_role(role_id).await?))
}
