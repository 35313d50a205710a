//! Symbol catalog: static symbol -> display name lookup.
//!
//! Loaded once from JSON shaped `{"stocks":[{"stock":"PETR4","name":"PETROBRAS PN"}]}`
//! (`symbol` / `displayName` are accepted as well), read-only afterwards.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "stock", alias = "symbol")]
    pub symbol: String,
    #[serde(rename = "name", alias = "displayName", default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    stocks: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Io { path: String, message: String },
    Parse(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Io { path, message } => {
                write!(f, "catalog read failed path={path}: {message}")
            }
            CatalogError::Parse(msg) => write!(f, "catalog parse failed: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Clone, Default)]
pub struct SymbolCatalog {
    entries: Vec<CatalogEntry>,
    // uppercased symbol -> first entry index
    by_symbol: HashMap<String, usize>,
}

impl SymbolCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut by_symbol = HashMap::with_capacity(entries.len());
        for (i, e) in entries.iter().enumerate() {
            by_symbol
                .entry(e.symbol.trim().to_ascii_uppercase())
                .or_insert(i);
        }
        Self { entries, by_symbol }
    }

    pub fn from_json_str(s: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            serde_json::from_str(s).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(Self::from_entries(file.stocks))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, symbol: &str) -> Option<&CatalogEntry> {
        self.by_symbol
            .get(&symbol.trim().to_ascii_uppercase())
            .map(|&i| &self.entries[i])
    }

    /// Display name for `symbol`, or the symbol itself when unknown or unnamed.
    pub fn display_name(&self, symbol: &str) -> String {
        self.get(symbol)
            .and_then(|e| e.display_name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(symbol)
            .to_string()
    }

    /// Autocomplete lookup.
    ///
    /// An exact (case-insensitive) symbol match comes first, then entries
    /// whose name contains `query`, in catalog order, at most `limit` in total.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&CatalogEntry> {
        let q = query.trim();
        if q.is_empty() || limit == 0 {
            return Vec::new();
        }
        let q_lower = q.to_lowercase();

        let exact = self.by_symbol.get(&q.to_ascii_uppercase()).copied();
        let mut out: Vec<&CatalogEntry> = Vec::new();
        if let Some(i) = exact {
            out.push(&self.entries[i]);
        }

        for (i, e) in self.entries.iter().enumerate() {
            if out.len() >= limit {
                break;
            }
            if Some(i) == exact {
                continue;
            }
            let name_hit = e
                .display_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&q_lower));
            if name_hit {
                out.push(e);
            }
        }
        out.truncate(limit);
        out
    }
}
