use axum::http::HeaderMap;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Returns the caller's CSRF token, minting and setting a cookie if none
/// is present yet.
pub fn issue_token(cookies: &Cookies) -> String {
    if let Some(existing) = cookies.get(CSRF_COOKIE) {
        if !existing.value().is_empty() {
            return existing.value().to_string();
        }
    }

    let token = Uuid::new_v4().simple().to_string();
    let mut cookie = Cookie::new(CSRF_COOKIE, token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookies.add(cookie);

    token
}

/// Double-submit check: the token sent in the header (or the `_token`
/// form field) must equal the cookie value.
pub fn verify_token(
    cookies: &Cookies,
    headers: &HeaderMap,
    form_token: Option<&str>,
) -> AppResult<()> {
    let expected = cookies
        .get(CSRF_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(AppError::CsrfMismatch)?;

    let supplied = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .or(form_token)
        .ok_or(AppError::CsrfMismatch)?;

    if constant_time_eq(expected.as_bytes(), supplied.as_bytes()) {
        Ok(())
    } else {
        Err(AppError::CsrfMismatch)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
