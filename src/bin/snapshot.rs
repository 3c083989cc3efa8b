use chenda_signal::{Config, KrakenRestClient, SnapshotEngine};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

/// Compute one whale-bias snapshot over the configured universe and print
/// it as JSON. Thin glue around the engine - the serving layer proper is
/// expected to do exactly this per request.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path (TOML); default: CHENDA_CONFIG or built-in defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Comma-separated universe override, e.g. "BTC,ETH,SOL"
    #[arg(long)]
    symbols: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(symbols) = &args.symbols {
        config.universe = symbols
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }

    chenda_signal::utils::init_from_config(&config.logging);

    let provider = Arc::new(KrakenRestClient::new(config.exchange.api_endpoint.clone()));
    let engine = SnapshotEngine::new(config, provider)?;

    info!("computing snapshot");
    let snapshot = engine.compute_snapshot().await;

    let json = if args.pretty {
        serde_json::to_string_pretty(&*snapshot)?
    } else {
        serde_json::to_string(&*snapshot)?
    };
    println!("{}", json);

    Ok(())
}
