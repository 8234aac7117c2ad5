//! Application entry point for the `airquality-sensorflow` service.
//!
//! This binary orchestrates the full startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Opening the measurement store (PostgreSQL, or in-memory when no
//!   `DATABASE_URL` is given) and creating the schema if needed
//! - Optionally ingesting a seed file
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving until Ctrl-C
//!
//! # Environment Variables
//! See [`airquality_sensorflow::config::load_from_env`] for the configuration
//! keys, plus:
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//! - `FORCE_COLOR` (optional) – force coloured output on or off
use std::{env, fs::File, io::IsTerminal, path::Path, sync::Arc};

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use airquality_sensorflow::routes::{self, AppState};
use airquality_sensorflow::store::{MeasurementStore, MemoryStore, PgStore};
use airquality_sensorflow::{config, AirQualityService};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let pg = match &cfg.db_url {
        Some(url) => {
            tracing::info!("Connecting to database");
            let pg = PgStore::connect(url, cfg.db_pool_max)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Successfully connected to database");
            Some(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data will not outlive the process");
            None
        }
    };

    let store: Arc<dyn MeasurementStore> = match &pg {
        Some(pg) => Arc::new(pg.clone()),
        None => Arc::new(MemoryStore::new()),
    };
    let service = Arc::new(AirQualityService::new(store, cfg.listing_limits()));

    if let Some(path) = &cfg.seed_csv {
        seed(&service, path).await?;
    }

    let app = routes::router(AppState { service }, cfg.max_upload_bytes);

    tracing::info!("Listening on {}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pg) = pg {
        pg.close().await;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Ingest the startup seed file, replacing whatever the store holds.
async fn seed(service: &AirQualityService, path: &Path) -> Result<()> {
    // ---
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let report = service
        .ingest_csv(file)
        .await
        .with_context(|| format!("Failed to ingest {}", path.display()))?;

    tracing::info!(
        committed = report.committed,
        skipped = report.skipped,
        "Seeded store from {}",
        path.display()
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// - Colour: `FORCE_COLOR=1|true|yes` forces it on, `0|false|no` off,
///   otherwise TTY detection decides
/// - Span events from `AXUM_SPAN_EVENTS`: `full`, `enter_exit`, or CLOSE only
/// - Level from `RUST_LOG` when set, else `AXUM_LOG_LEVEL` (default `debug`)
///
/// Call once, before any tracing macro fires.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("AXUM_LOG_LEVEL").ok().as_deref() {
            Some(l @ ("trace" | "debug" | "info" | "warn" | "error")) => l.to_string(),
            _ => "debug".to_string(),
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
