use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const STATEMENT: &str = include_str!("../../../demos/generic_statement.txt");

fn stmtx() -> Command {
    let mut cmd = Command::cargo_bin("stmtx").unwrap();
    // Keep the user's own config file out of the tests
    cmd.env("XDG_CONFIG_HOME", "/nonexistent/stmtx-tests");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn extract_text_statement_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "statement.txt", STATEMENT);

    let output = stmtx().arg("extract").arg(&input).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["template"], "generic_bank_template");
    assert_eq!(json["status"]["status"], "complete");
    let isin = json["fields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "isin")
        .unwrap();
    assert_eq!(isin["raw"], "US0378331005");
    assert_eq!(isin["valid"], true);
}

#[test]
fn extract_with_holdings() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "statement.txt", STATEMENT);

    stmtx()
        .args(["extract", "--holdings", "--format", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Holdings ("))
        .stdout(predicate::str::contains("US5949181045 Microsoft Corp."));
}

#[test]
fn extract_csv_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "statement.txt", STATEMENT);
    let out = dir.path().join("out.csv");

    stmtx()
        .args(["extract", "--format", "csv", "--output"])
        .arg(&out)
        .arg(&input)
        .assert()
        .success();

    let csv = fs::read_to_string(out).unwrap();
    assert!(csv.starts_with("field,value,raw,valid,confidence,source,errors"));
    assert!(csv.contains("quantity,100,100,true"));
}

#[test]
fn extract_without_matching_template_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "receipt.txt", "Grocery receipt\nMilk 1.99\n");

    stmtx()
        .arg("extract")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no template matched"));
}

#[test]
fn extract_fail_incomplete() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "partial.txt", "Securities Statement\nSecurity: Apple Inc.\n");

    stmtx().arg("extract").arg(&input).assert().success();

    stmtx()
        .args(["extract", "--fail-incomplete"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("isin"));
}

#[test]
fn extract_with_templates_dir_and_explicit_template() {
    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("templates");
    fs::create_dir(&templates).unwrap();
    write(
        &templates,
        "acme.yaml",
        "name: acme\ninstitution: Acme Bank\nfields:\n  - name: reference\n    required: true\n    patterns: ['Ref: (\\w+)']\n",
    );
    let input = write(dir.path(), "acme.txt", "Ref: ABC123\n");

    stmtx()
        .args(["extract", "--template", "acme", "--templates-dir"])
        .arg(&templates)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("ABC123"));

    stmtx()
        .args(["extract", "--template", "missing"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown template"));
}

#[test]
fn templates_list_and_check() {
    stmtx()
        .args(["templates", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("generic_bank_template"));

    let dir = tempfile::tempdir().unwrap();
    let good = write(dir.path(), "good.yaml", "name: good\nfields:\n  - name: a\n    patterns: ['a']\n");
    let bad = write(dir.path(), "bad.yaml", "name: bad\nfields:\n  - name: a\n    patterns: ['(']\n");

    stmtx().args(["templates", "check"]).arg(&good).assert().success();
    stmtx()
        .args(["templates", "check"])
        .arg(&good)
        .arg(&bad)
        .assert()
        .failure()
        .stdout(predicate::str::contains("bad.yaml"));
}

#[test]
fn templates_rank_marks_selection() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "statement.txt", STATEMENT);

    stmtx()
        .args(["templates", "rank"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("3/3   generic_bank_template"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.txt", STATEMENT);
    write(dir.path(), "b.txt", "Grocery receipt\n");
    let out = dir.path().join("out");
    let pattern = dir.path().join("*.txt");

    stmtx()
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .arg("--output-dir")
        .arg(&out)
        .args(["--summary", "--continue-on-error"])
        .assert()
        .success();

    assert!(out.join("a.txt.json").exists());
    assert!(!out.join("b.txt.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("file,status,template,missing_fields,confidence,processing_time_ms,error"));
    assert!(summary.contains("a.txt,complete,generic_bank_template"));
    assert!(summary.contains("b.txt,error"));
}

#[test]
fn batch_stops_on_error_by_default() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "b.txt", "Grocery receipt\n");
    let pattern = dir.path().join("*.txt");

    stmtx()
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .assert()
        .failure();
}

#[test]
fn config_init_set_get() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");

    stmtx().arg("-c").arg(&config).args(["config", "init"]).assert().success();
    assert!(config.exists());

    stmtx()
        .arg("-c")
        .arg(&config)
        .args(["config", "set", "holdings.price_tolerance", "0.1"])
        .assert()
        .success();

    stmtx()
        .arg("-c")
        .arg(&config)
        .args(["config", "get", "holdings.price_tolerance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));

    stmtx()
        .arg("-c")
        .arg(&config)
        .args(["config", "set", "holdings.unknown", "1"])
        .assert()
        .failure();
}

#[test]
fn batch_keeps_outputs_for_same_stem() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.txt", STATEMENT);
    write(dir.path(), "a.text", STATEMENT);
    let out = dir.path().join("out");
    let pattern = dir.path().join("a.*");

    stmtx()
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("a.txt.json").exists());
    assert!(out.join("a.text.json").exists());
}

#[test]
fn default_config_file_is_used() {
    let home = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "statement.txt", STATEMENT);

    let run = |args: &[&str]| {
        let mut cmd = Command::cargo_bin("stmtx").unwrap();
        cmd.env("XDG_CONFIG_HOME", home.path()).args(args);
        cmd
    };

    run(&["config", "init"]).assert().success();
    assert!(home.path().join("stmtx").join("config.json").exists());

    run(&["config", "set", "templates.include_builtin", "false"])
        .assert()
        .success();

    run(&["extract"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No templates available"));
}
