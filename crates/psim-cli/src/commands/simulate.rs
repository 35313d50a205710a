use std::sync::Arc;

use anyhow::{bail, Context, Result};
use psim_config::{LoadedConfig, SimConfig, UnusedKeyPolicy};
use psim_engine::{SimulationRequest, Simulator, SymbolCatalog};
use psim_md::{QuoteService, RandomSource, SplitMix64, YahooChartProvider};
use psim_portfolio::aggregate;
use psim_schemas::{PortfolioSummary, PositionResult};
use serde::Serialize;
use tracing::{info, warn};

use super::{parse_allocations, parse_date, parse_symbols};

pub struct SimulateArgs {
    pub symbols: String,
    pub start: String,
    pub end: String,
    pub allocs: Vec<String>,
    pub config_paths: Vec<String>,
    pub catalog: Option<String>,
    pub seed: Option<u64>,
    pub json: bool,
}

#[derive(Serialize)]
struct SimulateOutput<'a> {
    config_hash: &'a str,
    positions: &'a [PositionResult],
    summary: &'a PortfolioSummary,
}

pub(crate) fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    let loaded = if paths.is_empty() {
        LoadedConfig::empty()?
    } else {
        let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        psim_config::load_layered_yaml(&refs)?
    };

    let report = psim_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "config has keys nothing reads");
    }
    Ok(loaded)
}

fn build_request(args: &SimulateArgs) -> Result<SimulationRequest> {
    let symbols = parse_symbols(&args.symbols);
    let start = parse_date("start", &args.start)?;
    let end = parse_date("end", &args.end)?;
    let allocations = parse_allocations(&args.allocs)?;

    if let Some(extra) = allocations.keys().find(|k| !symbols.contains(*k)) {
        bail!("--alloc given for {extra}, which is not in --symbols");
    }

    let req = SimulationRequest {
        symbols,
        start_date: start,
        end_date: end,
        allocations,
    };
    req.validate().context("invalid simulation request")?;
    Ok(req)
}

pub async fn run(args: SimulateArgs) -> Result<()> {
    let req = build_request(&args)?;

    let loaded = load_config(&args.config_paths)?;
    let cfg: SimConfig = loaded.sim_config()?;

    let catalog = match args.catalog.as_deref().or(cfg.catalog.path.as_deref()) {
        Some(path) => SymbolCatalog::load(path)?,
        None => SymbolCatalog::empty(),
    };

    let provider = YahooChartProvider::new(cfg.yahoo_settings())?;
    let rng: Arc<dyn RandomSource> = match args.seed.or(cfg.engine.seed) {
        Some(seed) => Arc::new(SplitMix64::seeded(seed)),
        None => Arc::new(SplitMix64::from_entropy()),
    };
    let quotes = QuoteService::with_policy(Arc::new(provider), rng, cfg.fallback);
    let simulator =
        Simulator::new(quotes, Arc::new(catalog)).with_concurrency(cfg.engine.concurrency);

    info!(config_hash = %loaded.config_hash, "config loaded");

    let positions = simulator.run(&req).await;
    let summary = aggregate(&positions);

    if args.json {
        let out = SimulateOutput {
            config_hash: &loaded.config_hash,
            positions: &positions,
            summary: &summary,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", render_table(&positions, &summary));
    }
    Ok(())
}

fn money(m: psim_schemas::Micros) -> String {
    m.to_decimal_string(2)
}

pub fn render_table(positions: &[PositionResult], summary: &PortfolioSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:<24} {:>12} {:>8} {:>10} {:>10} {:>12} {:>12} {:>9}  {}\n",
        "symbol", "name", "invested", "shares", "open", "close", "dividends", "profit", "profit%",
        "source"
    ));
    for p in positions {
        out.push_str(&format!(
            "{:<10} {:<24} {:>12} {:>8} {:>10} {:>10} {:>12} {:>12} {:>9.2}  {}\n",
            p.symbol,
            p.display_name,
            money(p.invested_micros),
            p.shares_held,
            money(p.open_price_micros),
            money(p.close_price_micros),
            money(p.dividend_value_micros),
            money(p.total_profit_micros),
            p.profit_percent,
            if p.is_fallback { "synthetic" } else { "history" }
        ));
    }
    out.push_str(&format!(
        "TOTAL invested={} open_value={} close_value={} dividends={} profit={} profit_pct={:.2}% fallbacks={}\n",
        money(summary.total_invested_micros),
        money(summary.total_open_value_micros),
        money(summary.total_close_value_micros),
        money(summary.total_dividend_value_micros),
        money(summary.total_profit_micros),
        summary.total_profit_percent,
        summary.fallback_count
    ));
    out
}
