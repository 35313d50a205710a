use anyhow::{Context, Result};
use psim_engine::SymbolCatalog;

use super::simulate::load_config;

pub fn search(
    query: &str,
    catalog_path: Option<&str>,
    config_paths: &[String],
    limit: usize,
) -> Result<()> {
    let path = match catalog_path {
        Some(p) => p.to_string(),
        None => load_config(config_paths)?
            .sim_config()?
            .catalog
            .path
            .context("no catalog: pass --catalog or set catalog.path")?,
    };

    let catalog = SymbolCatalog::load(&path)?;
    let hits = catalog.search(query, limit);
    if hits.is_empty() {
        println!("no matches for '{}'", query.trim());
        return Ok(());
    }
    for e in hits {
        println!("{}\t{}", e.symbol, catalog.display_name(&e.symbol));
    }
    Ok(())
}
