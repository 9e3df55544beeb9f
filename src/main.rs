use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use insureinfra_core::cli::{Cli, Commands, DbCommands, SettleCommands, TokenCommands, UserCommands};
use insureinfra_core::config::{Config, LogFormat};
use insureinfra_core::health::{DependencyChecker, PostgresChecker};
use insureinfra_core::middleware::auth::AuthKeys;
use insureinfra_core::middleware::request_logger::RequestLogConfig;
use insureinfra_core::ports::Repositories;
use insureinfra_core::services::SettlementService;
use insureinfra_core::{cli, create_app, db, startup, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Config => cli::handle_config_validate(&config).await,
        Commands::Settle(SettleCommands::Run) => cli::handle_settle_run(&config).await,
        Commands::User(UserCommands::Add { email, role }) => {
            cli::handle_user_add(&config, &email, role).await
        }
        Commands::Token(TokenCommands::Issue { sub, role, ttl_hours }) => {
            cli::handle_token_issue(&config, sub, role, ttl_hours)
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;

    let report = startup::validate_environment(&config, &pool).await?;
    if !report.is_valid() {
        report.print();
        anyhow::bail!("Startup validation failed");
    }

    let repos = Repositories::postgres(pool.clone());

    if let Some(interval) = config.settlement_interval {
        SettlementService::new(repos.clone()).start(interval);
        tracing::info!("Settlement worker started (every {}s)", interval.as_secs());
    }

    let checks: Vec<Arc<dyn DependencyChecker>> = vec![Arc::new(PostgresChecker::new(pool))];
    let state = AppState::new(
        repos,
        AuthKeys::new(&config.session_secret, &config.api_key_pepper),
    )
    .with_health_checks(checks)
    .with_request_log(RequestLogConfig {
        log_body: config.log_request_body,
    });

    let app = create_app(state).layer(cors_layer(&config.cors_allowed_origins));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
