//! Typed view of the effective config.
//!
//! Every key has a default, so `{}` is a complete config.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use psim_md::yahoo::{DEFAULT_BASE_URL, DEFAULT_MARKET_SUFFIX, DEFAULT_USER_AGENT};
use psim_md::{FallbackPolicy, YahooSettings};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub base_url: String,
    pub market_suffix: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            market_suffix: DEFAULT_MARKET_SUFFIX.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub concurrency: usize,
    /// Fixed seed for the dividend/fallback draws. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub provider: ProviderSection,
    pub engine: EngineSection,
    pub fallback: FallbackPolicy,
    pub catalog: CatalogSection,
}

impl SimConfig {
    /// Deserialize and validate. Unknown keys are ignored here; use
    /// `report_unused_keys` to surface them.
    pub fn from_json(v: &Value) -> Result<Self> {
        let cfg: SimConfig =
            serde_json::from_value(v.clone()).context("config does not match expected types")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.base_url.trim().is_empty() {
            bail!("CONFIG_INVALID provider.base_url must not be empty");
        }
        if self.provider.timeout_secs == 0 {
            bail!("CONFIG_INVALID provider.timeout_secs must be > 0");
        }
        if self.engine.concurrency == 0 {
            bail!("CONFIG_INVALID engine.concurrency must be >= 1");
        }
        if let Err(msg) = self.fallback.validate() {
            bail!("CONFIG_INVALID {msg}");
        }
        Ok(())
    }

    pub fn yahoo_settings(&self) -> YahooSettings {
        YahooSettings {
            base_url: self.provider.base_url.clone(),
            market_suffix: self.provider.market_suffix.clone(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
            user_agent: self.provider.user_agent.clone(),
        }
    }
}
