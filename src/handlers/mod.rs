pub mod api;
pub mod users;

use askama::Template;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::Html,
};
use tower_cookies::Cookies;

use crate::{
    error::{AppError, AppResult},
    filters,
    middleware::{csrf, get_current_user, CurrentUser},
    models::UserDisplay,
    state::AppState,
};

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    users: Vec<UserDisplay>,
    csrf_token: String,
    viewer: Option<CurrentUser>,
    can_delete: bool,
}

/// Unwraps a numeric `:id` segment, turning axum's plain-text rejection
/// into a JSON `400`.
pub(crate) fn path_id(path: Result<Path<i64>, PathRejection>) -> AppResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

pub async fn dashboard(
    cookies: Cookies,
    State(state): State<AppState>,
) -> AppResult<Html<String>> {
    let viewer = get_current_user(&cookies, &state).await?;
    let can_delete = viewer.as_ref().map_or(true, |v| v.can_delete_users);

    let users = state.queries.list_users_with_roles().await?;
    let csrf_token = csrf::issue_token(&cookies);

    let template = DashboardTemplate {
        users,
        csrf_token,
        viewer,
        can_delete,
    };

    Ok(Html(template.render()?))
}
