use anyhow::Result;
use axum::Router;
use clap::Parser;
use fuzzy_core::IndexConfig;
use fuzzy_server::{build_app, AppConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Catalogue file (TSV, first line is a header)
    #[arg(long)]
    catalogue: PathBuf,
    /// Length of the q-grams
    #[arg(long, default_value_t = 3)]
    q: usize,
    /// Also index and match entity synonyms
    #[arg(long, default_value_t = false)]
    with_synonyms: bool,
    /// Directory with static files served for unmatched paths
    #[arg(long)]
    static_dir: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = AppConfig {
        catalogue: args.catalogue,
        index: IndexConfig { q: args.q, with_synonyms: args.with_synonyms },
        static_dir: args.static_dir,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
        cors_origins: std::env::var("CORS_ALLOW_ORIGIN")
            .map(|v| AppConfig::parse_origins(&v))
            .unwrap_or_default(),
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
