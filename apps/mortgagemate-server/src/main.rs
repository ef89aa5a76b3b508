//! MortgageMate Server
//!
//! Serves the underwriting wizard over HTTP:
//!
//! - Landing page and page navigation
//! - Underwriting form with document uploads
//! - Summary PDF download
//!
//! All underwriting runs in `spawn_blocking`; the only shared state is the
//! immutable policy.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use underwriting_core::{Underwriter, UnderwritingPolicy};

mod api;
mod error;
mod pages;

use api::{handle_form, handle_health, handle_navigate, handle_underwrite};

/// Command-line arguments for the MortgageMate server
#[derive(Parser, Debug)]
#[command(name = "mortgagemate-server")]
#[command(about = "MortgageMate underwriting server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8501", env = "MORTGAGEMATE_PORT")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Underwriting policy file (TOML)
    #[arg(short, long, env = "MORTGAGEMATE_CONFIG")]
    config: Option<PathBuf>,

    /// Largest accepted request body, in megabytes
    #[arg(long, default_value = "25", value_parser = clap::value_parser!(u64).range(1..=MAX_UPLOAD_MB))]
    max_upload_mb: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Ceiling for `--max-upload-mb`
const MAX_UPLOAD_MB: u64 = 4096;

/// Body limit in bytes for a megabyte setting, saturating on narrow targets
fn upload_limit_bytes(megabytes: u64) -> usize {
    usize::try_from(megabytes.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub underwriter: Arc<Underwriter>,
}

impl AppState {
    pub fn new(policy: UnderwritingPolicy) -> Self {
        Self {
            underwriter: Arc::new(Underwriter::new(policy)),
        }
    }
}

/// Build the router with all routes and middleware
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // Pages
        .route("/", get(handle_navigate))
        .route("/underwriting", get(handle_form))
        // API endpoints
        .route("/api/underwrite", post(handle_underwrite))
        // Apply middleware
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let policy = match &args.config {
        Some(path) => {
            info!("Loading underwriting policy from {}", path.display());
            UnderwritingPolicy::from_file(path)?
        }
        None => UnderwritingPolicy::default(),
    };

    info!("Starting MortgageMate server on {}:{}", args.host, args.port);

    let app = router(AppState::new(policy), upload_limit_bytes(args.max_upload_mb));

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Upload limit: {} MB", args.max_upload_mb);

    axum::serve(listener, app).await?;

    Ok(())
}
