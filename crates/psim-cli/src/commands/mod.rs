//! Command handler modules for psim.
//!
//! Argument parsing shared by several commands lives here.

pub mod catalog;
pub mod simulate;

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use psim_schemas::Micros;

/// Split `--symbols A,b, C` into trimmed, uppercased, non-empty tickers.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_ascii_uppercase())
        .collect()
}

pub fn parse_date(flag: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid --{flag} date: {raw} (expected YYYY-MM-DD)"))
}

/// Parse repeated `--alloc SYMBOL=AMOUNT` values.
pub fn parse_allocations(raw: &[String]) -> Result<BTreeMap<String, Micros>> {
    let mut out = BTreeMap::new();
    for item in raw {
        let Some((sym, amount)) = item.split_once('=') else {
            bail!("invalid --alloc '{item}': expected SYMBOL=AMOUNT");
        };
        let sym = sym.trim().to_ascii_uppercase();
        if sym.is_empty() {
            bail!("invalid --alloc '{item}': empty symbol");
        }
        let amount = Micros::parse_decimal(amount)
            .with_context(|| format!("invalid --alloc amount for {sym}"))?;
        if out.insert(sym.clone(), amount).is_some() {
            bail!("--alloc given more than once for {sym}");
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_trimmed_and_uppercased() {
        assert_eq!(parse_symbols(" petr4, VALE3,,itub4 "), vec!["PETR4", "VALE3", "ITUB4"]);
        assert!(parse_symbols(" , ").is_empty());
    }

    #[test]
    fn dates_parse_iso_only() {
        assert_eq!(
            parse_date("start", "2024-01-02").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        let err = parse_date("start", "02/01/2024").unwrap_err();
        assert!(err.to_string().contains("--start"));
    }

    #[test]
    fn allocations_parse_decimals() {
        let m = parse_allocations(&["petr4=1000".to_string(), "VALE3=250.50".to_string()])
            .unwrap();
        assert_eq!(m["PETR4"], Micros::from_units(1000));
        assert_eq!(m["VALE3"], Micros::new(250_500_000));
    }

    #[test]
    fn allocations_reject_garbage() {
        assert!(parse_allocations(&["PETR4".to_string()]).is_err());
        assert!(parse_allocations(&["=10".to_string()]).is_err());
        assert!(parse_allocations(&["PETR4=abc".to_string()]).is_err());
        assert!(parse_allocations(&["A=1".to_string(), "a=2".to_string()]).is_err());
    }
}
