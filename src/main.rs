//! addrbatch API server
//!
//! Run modes:
//!   cargo run                    - Start REST API on the configured port
//!   cargo run -- serve --port N  - Start REST API on port N
//!   cargo run -- help            - Show usage

use addrbatch::api;
use addrbatch::common::{init_from_config, BatchConfig, ConfigError, Result};
use addrbatch::BatchService;
use std::env;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        None | Some("serve") => run_api_server(args.get(2..).unwrap_or_default()).await,
        Some("help") | Some("--help") | Some("-h") => print_usage(),
        Some(arg) if arg.starts_with("--") => run_api_server(&args[1..]).await,
        Some(_) => print_usage(),
    }
}

fn print_usage() {
    println!("addrbatch - batch address queries over an Esplora indexer");
    println!();
    println!("Usage:");
    println!("  addrbatch-api [serve] [--port <port>]   Start REST API server (default: 3001)");
    println!("  addrbatch-api help                      Show this message");
    println!();
    println!("Environment Variables:");
    println!("  ADDRBATCH_NETWORK              mainnet | testnet | signet (default: testnet)");
    println!("  ADDRBATCH_ESPLORA_URL          Indexer base URL (default: per network)");
    println!("  ADDRBATCH_PORT                 REST API port (default: 3001)");
    println!("  ADDRBATCH_FANOUT_TIMEOUT_MS    Deadline for one fan-out (default: 10000)");
    println!("  ADDRBATCH_UPSTREAM_TIMEOUT_MS  Per-call indexer timeout (default: 8000)");
    println!("  ADDRBATCH_MAX_CONCURRENCY      In-flight calls per fan-out, 0 = unbounded (default: 32)");
    println!("  ADDRBATCH_MAX_ADDRESSES        Largest accepted address list (default: 1000)");
    println!("  ADDRBATCH_LOG_LEVEL            trace | debug | info | warn | error");
    println!("  ADDRBATCH_LOG_JSON             1 for JSON logs (default: on for mainnet)");
}

/// Start REST API server
async fn run_api_server(args: &[String]) {
    if let Err(e) = serve(args).await {
        eprintln!("Error [{}]: {}", e.error_code(), e);
        std::process::exit(1);
    }
}

async fn serve(args: &[String]) -> Result<()> {
    dotenv::dotenv().ok();

    let mut config = BatchConfig::from_env()?;

    // Parse arguments
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port = args[i + 1].parse().map_err(|_| {
                    ConfigError::InvalidValue("--port".to_string(), args[i + 1].clone())
                })?;
                i += 2;
            }
            _ => i += 1,
        }
    }

    init_from_config(&config)?;
    config.print_summary();

    let service = BatchService::from_config(&config)?;
    api::start_server(service, config.port).await?;
    Ok(())
}
