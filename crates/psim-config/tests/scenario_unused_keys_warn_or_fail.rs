use psim_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

const YAML: &str = r#"
provider:
  base_url: "http://localhost:9000"
  retries: 3
engine:
  seed: 11
legacy:
  theme: dark
  columns: [symbol, profit]
"#;

#[test]
fn warn_reports_without_error() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn).unwrap();

    assert!(!report.is_clean());
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/legacy/columns/0".to_string(),
            "/legacy/columns/1".to_string(),
            "/legacy/theme".to_string(),
            "/provider/retries".to_string(),
        ]
    );
}

#[test]
fn fail_policy_errors_on_unused_keys() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let err = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_UNUSED_KEYS"), "{msg}");
    assert!(msg.contains("4 unused"), "{msg}");
}

#[test]
fn fully_consumed_config_is_clean_under_fail() {
    let yaml = r#"
provider:
  base_url: "http://localhost:9000"
  market_suffix: ".SA"
  timeout_secs: 5
  user_agent: "psim-test"
engine:
  concurrency: 2
  seed: 1
fallback:
  open_min: 20
  open_max: 100
  return_min: -0.1
  return_max: 0.4
  dividend_yield_max: 0.05
catalog:
  path: "data/symbols.json"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
    assert!(report.consumed_prefixes.windows(2).all(|w| w[0] < w[1]));

    let cfg = loaded.sim_config().unwrap();
    assert_eq!(cfg.engine.concurrency, 2);
    assert_eq!(cfg.catalog.path.as_deref(), Some("data/symbols.json"));
}
