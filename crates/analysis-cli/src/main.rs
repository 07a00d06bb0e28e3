//! analysis-cli: value and score companies from local JSON data.
//!
//! Reads `<data-dir>/<SYMBOL>.json` for each symbol (plus `macro.json` when
//! present), runs the full analysis and prints the results as JSON.
//!
//! Usage:
//!   cargo run -p analysis-cli -- --symbols AAPL MSFT
//!   cargo run -p analysis-cli -- --data-dir ./data --peer-pe 18 --symbols KO
//!   cargo run -p analysis-cli -- --config engine.json --pretty --symbols JPM

mod file_source;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use analysis_core::EngineConfig;
use analysis_orchestrator::AnalysisOrchestrator;
use file_source::{JsonFileMacroSource, JsonFileProvider};
use serde_json::json;
use tokio::sync::Semaphore;

const DEFAULT_DATA_DIR: &str = "data";
/// Max symbols analyzed at once
const DEFAULT_CONCURRENCY: usize = 8;

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  analysis-cli --symbols AAPL MSFT ...   Symbols to analyze");
    eprintln!("");
    eprintln!("Options:");
    eprintln!("  --data-dir DIR     Directory with <SYMBOL>.json files (default: $VALUATION_DATA_DIR or {})", DEFAULT_DATA_DIR);
    eprintln!("  --peer-pe N        Peer P/E multiple for the relative valuation");
    eprintln!("  --config FILE      JSON engine config (default: VALUATION_* env vars)");
    eprintln!("  --concurrency N    Max parallel symbols (default: {})", DEFAULT_CONCURRENCY);
    eprintln!("  --pretty           Pretty-print the JSON output");
}

async fn load_config(path: Option<&str>) -> anyhow::Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let bytes = tokio::fs::read(path).await?;
            serde_json::from_slice(&bytes)?
        }
        None => EngineConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "analysis_cli=info,analysis_orchestrator=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let pretty = args.iter().any(|a| a == "--pretty");

    let symbols: Vec<String> = match args.iter().position(|a| a == "--symbols") {
        Some(idx) => args[idx + 1..]
            .iter()
            .take_while(|a| !a.starts_with("--"))
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect(),
        None => Vec::new(),
    };
    if symbols.is_empty() {
        print_usage();
        std::process::exit(1);
    }

    let data_dir = arg_value(&args, "--data-dir")
        .map(PathBuf::from)
        .or_else(|| std::env::var("VALUATION_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let peer_multiple = match arg_value(&args, "--peer-pe") {
        Some(v) => Some(
            v.parse::<f64>()
                .map_err(|e| anyhow::anyhow!("invalid --peer-pe {}: {}", v, e))?,
        ),
        None => None,
    };

    let concurrency: usize = arg_value(&args, "--concurrency")
        .and_then(|v| v.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_CONCURRENCY);

    let config = load_config(arg_value(&args, "--config")).await?;

    let mut orchestrator =
        AnalysisOrchestrator::new(Arc::new(JsonFileProvider::new(&data_dir))).with_config(config)?;
    match JsonFileMacroSource::load(&data_dir).await {
        Ok(Some(source)) => {
            tracing::info!("Using macro indicators from {}", data_dir.join(file_source::MACRO_FILE).display());
            orchestrator = orchestrator.with_macro_source(Arc::new(source));
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("Ignoring unreadable macro data: {}", e),
    }

    let total_symbols = symbols.len();
    tracing::info!(
        "analysis-cli: {} symbols, data_dir={}, concurrency={}",
        total_symbols,
        data_dir.display(),
        concurrency
    );

    let orchestrator = Arc::new(orchestrator);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let failed = Arc::new(AtomicU64::new(0));
    let mut handles = Vec::with_capacity(total_symbols);

    for symbol in symbols {
        let orchestrator = Arc::clone(&orchestrator);
        let semaphore = Arc::clone(&semaphore);
        let failed = Arc::clone(&failed);

        let handle = tokio::spawn(async move {
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(e) => return json!({ "symbol": symbol, "error": e.to_string() }),
            };

            match orchestrator.analyze(&symbol, peer_multiple).await {
                Ok(analysis) => serde_json::to_value(&analysis)
                    .unwrap_or_else(|e| json!({ "symbol": symbol, "error": e.to_string() })),
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("{} failed: {}", symbol, e);
                    json!({ "symbol": symbol, "error": e.to_string() })
                }
            }
        });
        handles.push(handle);
    }

    let mut results = Vec::with_capacity(total_symbols);
    for handle in handles {
        results.push(handle.await?);
    }

    let output = if pretty {
        serde_json::to_string_pretty(&results)?
    } else {
        serde_json::to_string(&results)?
    };
    println!("{}", output);

    let fails = failed.load(Ordering::Relaxed);
    tracing::info!("Done! {} symbols ({} failed)", total_symbols, fails);
    if fails as usize == total_symbols {
        anyhow::bail!("every symbol failed");
    }
    Ok(())
}
