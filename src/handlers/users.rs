use axum::{
    extract::{rejection::PathRejection, Form, Path, State},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::{
    error::AppResult,
    handlers::path_id,
    middleware::{authorize_user_delete, csrf, get_current_user},
    services::Acknowledgement,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(rename = "_token")]
    token: Option<String>,
}

pub async fn delete_user(
    cookies: Cookies,
    headers: HeaderMap,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    form: Option<Form<DeleteForm>>,
) -> AppResult<Json<Acknowledgement>> {
    let user_id = path_id(path)?;
    let form_token = form.as_ref().and_then(|Form(f)| f.token.as_deref());
    csrf::verify_token(&cookies, &headers, form_token)?;

    let current_user = get_current_user(&cookies, &state).await?;
    authorize_user_delete(current_user.as_ref(), user_id)?;

    let ack = state.mutations.delete_user(user_id).await?;
    Ok(Json(ack))
}
