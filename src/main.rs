use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber;

use crptgate::api::{CrptClient, Document};
use crptgate::config::ClientConfig;
use crptgate::ratelimit::TimeWindow;

/// Submit a document to the CRPT registration API through the rate-limited
/// gateway.
#[derive(Parser, Debug)]
#[command(name = "crptgate", version, about)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Path to a JSON file containing the document to submit
    #[arg(long)]
    document: PathBuf,

    /// Detached signature for the document
    #[arg(long)]
    signature: String,

    /// Override the configured request limit per window
    #[arg(long)]
    request_limit: Option<u32>,

    /// Override the configured window duration, in seconds
    #[arg(long)]
    window_secs: Option<u64>,
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut ClientConfig, args: &Args) {
    if let Some(limit) = args.request_limit {
        config.rate_limit.request_limit = limit;
    }
    if let Some(secs) = args.window_secs {
        config.rate_limit.window = TimeWindow::Second;
        config.rate_limit.window_amount = secs as u32;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let args = Args::parse();

    info!("Starting Crptgate document submission");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    apply_overrides(&mut config, &args);
    info!(
        endpoint = %config.endpoint,
        request_limit = config.rate_limit.request_limit,
        "Configuration loaded"
    );

    // Load the document payload
    let contents = std::fs::read_to_string(&args.document)?;
    let document: Document = serde_json::from_str(&contents)?;
    info!(oms_id = %document.oms_id, product = %document.product, "Document loaded");

    // Submit through the rate-limited client
    let client = CrptClient::new(&config)?;
    client.create_document(&document, &args.signature).await?;
    info!("Document submitted successfully");

    client.shutdown();
    Ok(())
}
