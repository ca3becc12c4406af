//! Application entry point.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::SecretString;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use restaurant_directory::api::create_router;
use restaurant_directory::app::{AppState, PoolMonitorConfig, spawn_pool_monitor};
use restaurant_directory::infra::database::DEFAULT_EMAIL_CONSTRAINT;
use restaurant_directory::infra::{
    Database, ErrorTranslator, PgRestaurantRepository, PgUserRepository, PostgresConfig,
};

/// Application configuration
struct Config {
    database_url: SecretString,
    host: String,
    port: u16,
    request_timeout: Duration,
    email_constraint: String,
    pool_monitor: PoolMonitorConfig,
    json_logs: bool,
}

impl Config {
    fn from_env() -> Result<Self> {
        let database_url = Self::database_url()?;
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(Duration::from_secs(30), Duration::from_secs);
        let email_constraint = env::var("EMAIL_UNIQUE_CONSTRAINT")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_EMAIL_CONSTRAINT.to_string());

        let enable_pool_monitor = env::var("ENABLE_POOL_MONITOR")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);
        let pool_monitor_interval = env::var("POOL_MONITOR_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);
        let pool_monitor = PoolMonitorConfig {
            interval: Duration::from_secs(pool_monitor_interval.max(1)),
            enabled: enable_pool_monitor,
            ..Default::default()
        };

        let json_logs = env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            database_url,
            host,
            port,
            request_timeout,
            email_constraint,
            pool_monitor,
            json_logs,
        })
    }

    /// `DATABASE_URL`, or assembled from `DB_HOST`, `DB_PORT`, `DB_USER`,
    /// `DB_PASSWORD` and `DB_NAME`.
    fn database_url() -> Result<SecretString> {
        if let Ok(url) = env::var("DATABASE_URL") {
            return Ok(SecretString::from(url));
        }

        let host = env::var("DB_HOST").context("DATABASE_URL or DB_HOST must be set")?;
        let port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let user = env::var("DB_USER").context("DB_USER not set")?;
        let password = env::var("DB_PASSWORD").unwrap_or_default();
        let name = env::var("DB_NAME").context("DB_NAME not set")?;
        Ok(SecretString::from(format!(
            "postgres://{user}:{password}@{host}:{port}/{name}"
        )))
    }
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(config.json_logs);

    info!("Restaurant Directory v{}", env!("CARGO_PKG_VERSION"));

    // Initialize database
    let db_config = PostgresConfig::from_env()?;
    let translator = ErrorTranslator::new(config.email_constraint.as_str());
    let db = Database::new(&config.database_url, db_config, translator)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.run_migrations()
        .await
        .context("Failed to apply bootstrap schema")?;
    let db = Arc::new(db);
    info!("   ✓ Database connected and schema applied");

    let app_state = AppState::new(
        Arc::clone(&db),
        Arc::new(PgUserRepository::new()),
        Arc::new(PgRestaurantRepository::new()),
    )
    .with_request_timeout(config.request_timeout);
    let app_state = Arc::new(app_state);

    let monitor_shutdown_tx = if config.pool_monitor.enabled {
        let (_monitor_handle, shutdown_tx) =
            spawn_pool_monitor(Arc::clone(&db), config.pool_monitor.clone());
        info!("   ✓ Pool monitor started");
        Some(shutdown_tx)
    } else {
        info!("   ○ Pool monitor disabled");
        None
    };

    let router = create_router(app_state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server starting on http://{}", addr);
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(tx) = monitor_shutdown_tx {
        let _ = tx.send(true);
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}
