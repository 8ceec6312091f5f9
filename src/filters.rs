use askama::Result;
use chrono::{DateTime, Utc};

// Custom filters for the dashboard templates.

/// `{{ user.created_at|short_date }}` renders as `2024-01-31`.
pub fn short_date(value: &DateTime<Utc>) -> Result<String> {
    Ok(value.format("%Y-%m-%d").to_string())
}

/// `{{ user.roles|role_list }}` joins role names, or shows a dash.
pub fn role_list(roles: &[String]) -> Result<String> {
    if roles.is_empty() {
        Ok("-".to_string())
    } else {
        Ok(roles.join(", "))
    }
}
