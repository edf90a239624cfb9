//! Şeffaf Bağış API server

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::domains::auth::JwtService;
use server_core::kernel::{scheduled_tasks, ServerDeps, SimulatedPaymentGateway, TokenPolicy};
use server_core::server::build_app;
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Şeffaf Bağış API");

    let config = Config::from_env().context("Failed to load configuration")?;

    // Database setup
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));
    let token_policy = TokenPolicy {
        access_token_ttl: chrono::Duration::minutes(config.access_token_ttl_minutes),
        refresh_token_ttl: chrono::Duration::days(config.refresh_token_ttl_days),
    };
    let deps = Arc::new(ServerDeps::new(
        pool,
        jwt_service,
        Arc::new(SimulatedPaymentGateway::new()),
        token_policy,
        config.admin_emails.clone(),
    ));

    // Keep the scheduler handle alive for the lifetime of the server
    let _scheduler = if config.scheduler_enabled {
        Some(
            scheduled_tasks::start_scheduler(deps.clone())
                .await
                .context("Failed to start scheduler")?,
        )
    } else {
        tracing::info!("Scheduler disabled (SCHEDULER_ENABLED=false)");
        None
    };

    let app = build_app(deps, &config.allowed_origins)?;

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
