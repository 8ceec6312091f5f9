use std::sync::Arc;

use crate::{
    config::Config,
    repository::{AccessRepository, UserRepository},
    services::{UserMutationService, UserQueryService},
};

/// Shared handler state. Cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserRepository>,
    pub access: Arc<dyn AccessRepository>,
    pub queries: UserQueryService,
    pub mutations: UserMutationService,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserRepository>,
        access: Arc<dyn AccessRepository>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            queries: UserQueryService::new(users.clone(), access.clone()),
            mutations: UserMutationService::new(users.clone()),
            users,
            access,
        }
    }
}
