//! Integration tests for the `canopy` command-line interface.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

fn canopy(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_canopy"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn write_source(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn languages_lists_python() {
    let output = canopy(&["languages"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|line| line == "python"));
    assert!(stdout.lines().any(|line| line == "rust"));
}

#[test]
fn parse_prints_sexp() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "add.py", "1 + 2");

    let output = canopy(&["parse", file.to_str().unwrap(), "-l", "python"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        "(module (expression_statement (binary_operator left: (integer) right: (integer))))"
    );
}

#[test]
fn parse_stats() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "add.py", "1 + 2");

    let output = canopy(&["parse", file.to_str().unwrap(), "-l", "python", "--stats"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    // module, expression_statement, binary_operator, 1, +, 2
    assert!(stdout.contains("nodes: 6"));
    assert!(stdout.contains("errors: no"));
}

#[test]
fn walk_prints_fields() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "add.py", "1 + 2");

    let output = canopy(&["walk", file.to_str().unwrap(), "-l", "python"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("module"));
    assert!(lines[3].trim_start().starts_with("left: integer"));
    assert!(lines[4].contains("operator: \"+\""));
}

#[test]
fn query_with_inline_pattern() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "calls.py", "foo(x)\nlen(y)\n");

    let output = canopy(&[
        "query",
        file.to_str().unwrap(),
        "-l",
        "python",
        "-p",
        "(call function: (identifier) @callee)",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("@callee identifier 0:0 foo"));
    assert!(stdout.contains("@callee identifier 1:0 len"));
}

#[test]
fn query_json_from_config() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "add.py", "1 + 2\n");
    let config = write_source(
        &dir,
        "queries.toml",
        r#"
language = "python"

[[queries]]
name = "operands"
pattern = "(binary_operator left: (_) @left right: (_) @right)"
"#,
    );

    let output = canopy(&[
        "query",
        file.to_str().unwrap(),
        "-c",
        config.to_str().unwrap(),
        "--json",
        "--matches",
    ]);
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let matches = &report[0]["matches"];
    assert_eq!(report[0]["query"], "operands");
    assert_eq!(matches.as_array().unwrap().len(), 1);
    assert_eq!(matches[0]["captures"][0]["name"], "left");
    assert_eq!(matches[0]["captures"][0]["text"], "1");
    assert_eq!(matches[0]["captures"][1]["start"], serde_json::json!([0, 4]));
}

#[test]
fn unknown_node_type_fails() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "a.py", "a");

    let output = canopy(&[
        "query",
        file.to_str().unwrap(),
        "-l",
        "python",
        "-p",
        "(made_up) @m",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("made_up"));
}

#[test]
fn unknown_language_fails() {
    let dir = TempDir::new().unwrap();
    let file = write_source(&dir, "a.txt", "a");

    let output = canopy(&["parse", file.to_str().unwrap(), "-l", "klingon"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("klingon"));
}
