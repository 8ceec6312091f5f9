pub mod config;
pub mod database;
pub mod error;
pub mod filters;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod seed;
pub mod services;
pub mod state;
pub mod utils;

use axum::{
    response::Redirect,
    routing::{delete, get},
    Router,
};
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/dashboard") }))
        .route("/dashboard", get(handlers::dashboard))
        .route("/users/:id", delete(handlers::users::delete_user))

        // API routes
        .route("/api/users", get(handlers::api::list_users))
        .route("/api/users/:id/roles", get(handlers::api::user_roles))
        .route("/api/roles/:id/permissions", get(handlers::api::role_permissions))

        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
        )
        .with_state(state)
}
