use std::fs;

use assert_cmd::prelude::*;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const PETR4_CHART: &str = r#"{"chart":{"result":[{
  "timestamp":[1704204000,1704290400,1704376800],
  "indicators":{"quote":[{"close":[10.0,null,12.0]}]}}],"error":null}}"#;

const CATALOG: &str = r#"{"stocks":[
  {"stock":"PETR4","name":"PETROBRAS PN"},
  {"stock":"PETR3","name":"PETROBRAS ON"},
  {"stock":"VALE3","name":"VALE ON"}]}"#;

fn psim() -> Command {
    let mut cmd = Command::cargo_bin("psim").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn scenario_simulate_json_end_to_end_with_partial_failure() -> anyhow::Result<()> {
    let server = MockServer::start();
    let petr = server.mock(|when, then| {
        when.method(GET)
            .path("/v8/finance/chart/PETR4.SA")
            .query_param("interval", "1d");
        then.status(200)
            .header("content-type", "application/json")
            .body(PETR4_CHART);
    });
    let missing = server.mock(|when, then| {
        when.method(GET).path("/v8/finance/chart/ZZZZ3.SA");
        then.status(404).body("{}");
    });

    let dir = tempfile::tempdir()?;
    let cfg_path = dir.path().join("psim.yaml");
    fs::write(
        &cfg_path,
        format!("provider:\n  base_url: \"{}\"\n  timeout_secs: 5\n", server.base_url()),
    )?;
    let catalog_path = dir.path().join("symbols.json");
    fs::write(&catalog_path, CATALOG)?;

    let out = psim()
        .args([
            "simulate",
            "--symbols",
            "PETR4,ZZZZ3",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
            "--alloc",
            "PETR4=1000",
            "--alloc",
            "ZZZZ3=500",
            "--seed",
            "42",
            "--json",
        ])
        .arg("--config")
        .arg(&cfg_path)
        .arg("--catalog")
        .arg(&catalog_path)
        .output()?;

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    petr.assert();
    missing.assert();

    let v: serde_json::Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(v["config_hash"].as_str().map(str::len), Some(64));

    let positions = v["positions"].as_array().unwrap();
    assert_eq!(positions.len(), 2);

    assert_eq!(positions[0]["symbol"], "PETR4");
    assert_eq!(positions[0]["display_name"], "PETROBRAS PN");
    assert_eq!(positions[0]["is_fallback"], false);
    assert_eq!(positions[0]["shares_held"], 100);
    assert_eq!(positions[0]["open_value_micros"], 1_000_000_000_i64);
    assert_eq!(positions[0]["close_value_micros"], 1_200_000_000_i64);
    assert_eq!(positions[0]["series"].as_array().unwrap().len(), 2);

    assert_eq!(positions[1]["symbol"], "ZZZZ3");
    assert_eq!(positions[1]["display_name"], "ZZZZ3");
    assert_eq!(positions[1]["is_fallback"], true);
    let open = positions[1]["open_price_micros"].as_i64().unwrap();
    assert!((20_000_000..=100_000_000).contains(&open));

    assert_eq!(v["summary"]["position_count"], 2);
    assert_eq!(v["summary"]["fallback_count"], 1);
    Ok(())
}

#[test]
fn scenario_simulate_table_output() -> anyhow::Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v8/finance/chart/PETR4.SA");
        then.status(200).body(PETR4_CHART);
    });

    let dir = tempfile::tempdir()?;
    let cfg_path = dir.path().join("psim.yaml");
    fs::write(
        &cfg_path,
        format!(
            "provider:\n  base_url: \"{}\"\nfallback:\n  dividend_yield_max: 0.0\n",
            server.base_url()
        ),
    )?;

    psim()
        .args([
            "simulate",
            "--symbols",
            "petr4",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
            "--alloc",
            "petr4=1000",
        ])
        .arg("--config")
        .arg(&cfg_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("PETR4"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains(
            "TOTAL invested=1000.00 open_value=1000.00 close_value=1200.00 dividends=0.00 profit=200.00 profit_pct=20.00%",
        ));
    Ok(())
}

#[test]
fn scenario_invalid_request_is_rejected_before_fetching() {
    psim()
        .args([
            "simulate",
            "--symbols",
            "PETR4",
            "--start",
            "2024-02-01",
            "--end",
            "2024-01-01",
            "--alloc",
            "PETR4=100",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be before end date"));

    psim()
        .args([
            "simulate",
            "--symbols",
            "PETR4",
            "--start",
            "2024-01-01",
            "--end",
            "2024-02-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("total allocation"));
}

#[test]
fn scenario_catalog_search() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let catalog_path = dir.path().join("symbols.json");
    fs::write(&catalog_path, CATALOG)?;

    psim()
        .args(["catalog", "search", "petrobras", "--limit", "5"])
        .arg("--catalog")
        .arg(&catalog_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("PETR4\tPETROBRAS PN"))
        .stdout(predicate::str::contains("PETR3\tPETROBRAS ON"))
        .stdout(predicate::str::contains("VALE3").not());
    Ok(())
}

#[test]
fn scenario_config_hash_is_stable() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let a = dir.path().join("a.yaml");
    let b = dir.path().join("b.yaml");
    fs::write(&a, "engine:\n  concurrency: 2\nprovider:\n  market_suffix: \".SA\"\n")?;
    fs::write(&b, "provider:\n  market_suffix: \".SA\"\nengine:\n  concurrency: 2\n")?;

    let first = psim().arg("config-hash").arg(&a).output()?;
    let second = psim().arg("config-hash").arg(&b).output()?;
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    assert!(String::from_utf8_lossy(&first.stdout).starts_with("config_hash="));
    Ok(())
}

#[test]
fn scenario_catalog_search_uses_config_path_when_flag_absent() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let catalog_path = dir.path().join("symbols.json");
    fs::write(&catalog_path, CATALOG)?;
    let cfg_path = dir.path().join("psim.yaml");
    fs::write(
        &cfg_path,
        format!("catalog:\n  path: \"{}\"\n", catalog_path.display()),
    )?;

    psim()
        .args(["catalog", "search", "vale3"])
        .arg("--config")
        .arg(&cfg_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("VALE3\tVALE ON"));

    psim()
        .args(["catalog", "search", "vale3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no catalog"));
    Ok(())
}
