//! Main application entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use bd_core::CoordinatorSettings;
use bd_data::{ClientConfig, DataAccess, HttpSource};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod demo;

use app::App;

/// Browse uploaded CSV files: insights, raw rows and column annotations
#[derive(Parser, Debug)]
#[command(name = "breakdown", version, about)]
struct Args {
    /// Base URL of the breakdown API
    #[arg(long)]
    api_url: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rows per explorer page
    #[arg(long)]
    page_size: Option<usize>,

    /// Use generated in-memory files instead of the API
    #[arg(long)]
    demo: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = ClientConfig::load(args.config.as_deref())?;
    if let Some(url) = args.api_url {
        config.api_url = url;
    }
    if let Some(size) = args.page_size {
        config.page_size = size;
    }
    config.validate()?;

    let access: Arc<dyn DataAccess> = if args.demo {
        Arc::new(demo::demo_source()?)
    } else {
        Arc::new(HttpSource::new(&config)?)
    };
    info!("Starting breakdown against {}", access.source_name());

    let mut app = App::new(access, CoordinatorSettings::from(&config));
    app.run().await
}
