//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, checker wiring, and Axum server lifecycle.

use crate::application::services::{CheckController, CheckSettings};
use crate::config::Config;
use crate::infrastructure::http::{HttpLinkValidator, HttpValidatorConfig};
use crate::infrastructure::persistence::{PgCheckResultRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for draining an active run on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Opens the PostgreSQL pool and applies pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    Ok(pool)
}

/// Wires repositories and the HTTP validator into a check controller.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn build_controller(
    pool: PgPool,
    settings: CheckSettings,
    validator_config: HttpValidatorConfig,
) -> Result<CheckController> {
    let pool = Arc::new(pool);
    let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
    let result_repository = Arc::new(PgCheckResultRepository::new(pool));
    let validator = Arc::new(HttpLinkValidator::new(validator_config)?);

    Ok(CheckController::new(
        link_repository,
        result_repository,
        validator,
        settings,
    ))
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - HTTP link validator and check controller
/// - Axum HTTP server
///
/// On Ctrl-C or SIGTERM the server stops accepting requests and the active
/// run, if any, is stopped and drained.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;

    let controller = Arc::new(build_controller(
        pool,
        config.check_settings(),
        config.validator_config(),
    )?);
    tracing::info!("Check controller ready");

    let state = AppState::new(controller.clone());
    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    controller.shutdown(SHUTDOWN_GRACE).await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
