use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod calculator;
mod config;
mod error;
mod jwt;
mod lifecycle;
mod middleware;
mod models;
mod password;
mod reconciler;
mod repositories;
mod routes;
mod services;
mod state;
mod status;
mod validation;

#[cfg(test)]
mod test_support;

use common::database::{health_check, init_pool};
use tokio::net::TcpListener;

use crate::{
    config::AppConfig,
    jwt::JwtService,
    password::PasswordHasher,
    repositories::{PgStore, postgres::run_migrations},
    services::Services,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting invoicing service");

    let config = AppConfig::from_env()?;

    // Initialize database connection pool
    let pool = init_pool(&config.database()).await?;

    if health_check(&pool).await {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    if config.skip_migrate {
        info!("Skipping database migrations");
    } else {
        run_migrations(&pool).await?;
        info!("Database migrations applied");
    }

    let store = PgStore::new(pool);
    let app_state = AppState {
        store: store.clone(),
        services: Services::new(store, PasswordHasher::default()),
        jwt_service: JwtService::new(config.jwt()),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Invoicing service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
