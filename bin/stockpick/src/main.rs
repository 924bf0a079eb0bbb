use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{ConceptSource, Config, Symbol};
use pipeline::Pipeline;
use pool::{PoolCache, PoolResolver, ResolverSettings};
use providers::{EastmoneyClient, TushareClient};
use store::CsvStore;
use strategy::{load_selector_configs, SelectorRegistry, StrategyRunner};

#[derive(Parser, Debug)]
#[command(name = "stockpick", about = "Run stock selectors and filter picks by concept and industry")]
struct Cli {
    /// Directory holding one `<symbol>.csv` quote file per instrument.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Selector configuration file (JSON or TOML).
    #[arg(long, default_value = "./configs.json")]
    config: PathBuf,

    /// Trading date (YYYY-MM-DD). Defaults to the latest date in the data.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// `all`, or a comma-separated list of symbols.
    #[arg(long, default_value = "all")]
    tickers: String,

    /// Delete cached concept pools before running so they are fetched again.
    #[arg(long, default_value_t = false)]
    refresh_pools: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("loading configuration")?;
    let configs = load_selector_configs(&cli.config)
        .with_context(|| format!("loading selectors from {}", cli.config.display()))?;

    // ── Market data ───────────────────────────────────────────────────────────
    let store = CsvStore::open(&cli.data_dir)?;
    let symbols = parse_tickers(&cli.tickers, &store)?;
    if symbols.is_empty() {
        bail!("no symbols to process in {}", cli.data_dir.display());
    }
    let series = store.load_series(&symbols);
    if series.is_empty() {
        bail!("no quote history could be loaded from {}", cli.data_dir.display());
    }
    info!(requested = symbols.len(), loaded = series.len(), "Quote history loaded");

    // ── Providers ─────────────────────────────────────────────────────────────
    let tushare = Arc::new(TushareClient::from_config(&cfg)?);
    let eastmoney = Arc::new(EastmoneyClient::from_config(&cfg)?);
    let pools: Vec<Arc<dyn ConceptSource>> =
        vec![tushare.clone() as Arc<dyn ConceptSource>, eastmoney];

    let cache = PoolCache::new(&cfg.cache_dir);
    if cli.refresh_pools {
        for source in &pools {
            if cache.invalidate(source.name())? {
                info!(provider = source.name(), "Cached concept pool removed");
            }
        }
    }

    // ── Pipeline ──────────────────────────────────────────────────────────────
    let resolver = PoolResolver::new(
        cache,
        pools,
        tushare.clone(),
        tushare,
        ResolverSettings::from_config(&cfg),
    );
    let runner = StrategyRunner::new(SelectorRegistry::with_builtins());
    let pipeline = Pipeline::new(runner, resolver, &cfg.universe_path);

    let reports = pipeline.run(&configs, cli.date, &series).await?;
    info!(selectors = reports.len(), "Selection pass complete");
    Ok(())
}

/// 2 for configuration or missing-data errors, 1 for anything else.
fn exit_status(e: &anyhow::Error) -> u8 {
    let fatal = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<common::Error>())
        .is_some_and(common::Error::is_fatal);
    if fatal {
        2
    } else {
        1
    }
}

fn parse_tickers(tickers: &str, store: &CsvStore) -> anyhow::Result<Vec<Symbol>> {
    if tickers.trim().eq_ignore_ascii_case("all") {
        return Ok(store.list_symbols()?);
    }
    Ok(tickers
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(Symbol::from)
        .collect())
}
