use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use supportdesk::config::AppConfig;
use supportdesk::server::run_server;
use supportdesk::shared::state::AppState;
use supportdesk::shared::utils::{create_conn, run_migrations};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let pool = create_conn(&config.database_url).map_err(|e| {
        error!("Failed to create database pool: {}", e);
        std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            format!("Database pool creation failed: {}", e),
        )
    })?;

    if let Err(e) = run_migrations(&pool) {
        error!("Failed to run migrations: {}", e);
        return Err(std::io::Error::other(format!("Migration failed: {}", e)));
    }
    info!("Database ready");

    let app_state = Arc::new(AppState::new(pool, config));
    run_server(app_state).await
}
