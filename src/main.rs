use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;

use userdesk::{
    config::{Config, StoreConfig},
    create_router,
    database::{create_database_pool, run_migrations},
    repository::{AccessRepository, MemoryRepository, PgRepository, UserRepository},
    seed::seed_demo,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let config = Config::from_env().context("invalid configuration")?;

    let (users, access) = match &config.store {
        StoreConfig::Postgres { url, run_migrations: migrate } => {
            let db = create_database_pool(url)
                .await
                .context("failed to connect to database")?;
            if *migrate {
                run_migrations(&db).await.context("failed to run migrations")?;
            }
            let repo = Arc::new(PgRepository::new(db));
            (repo.clone() as Arc<dyn UserRepository>, repo as Arc<dyn AccessRepository>)
        }
        StoreConfig::Memory => {
            log::warn!("DATABASE_URL not set; using in-memory store");
            let repo = Arc::new(MemoryRepository::new());
            (repo.clone() as Arc<dyn UserRepository>, repo as Arc<dyn AccessRepository>)
        }
    };

    if config.seed_demo {
        seed_demo(users.as_ref(), access.as_ref())
            .await
            .context("failed to seed demo data")?;
    }

    if config.auth_enabled() {
        log::info!("Authorization enabled; deleting users requires the users.delete permission");
    } else {
        log::warn!("JWT_SECRET not set; any caller may delete users");
    }

    let addr = config.addr();
    let app = create_router(AppState::new(config, users, access));

    log::info!("Userdesk listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", e);
    }
    log::info!("Shutting down");
}
