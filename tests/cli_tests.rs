//! CLI integration tests: exercise the binary end to end with assert_cmd.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("docfill").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("docfill"))
        .stdout(predicate::str::contains("fill"))
        .stdout(predicate::str::contains("scan"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("docfill").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("docfill"));
}

#[test]
fn test_scan_lists_placeholders() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("letter.txt");
    fs::write(
        &template,
        "Dear {{INPUT!text!Name!Jane}}, total {{XL!CELL!B2}} from {{grand_total}}.",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("docfill").unwrap();
    cmd.args(["scan", template.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("[INPUT]"))
        .stdout(predicate::str::contains("[XL]"))
        .stdout(predicate::str::contains("[NAMED RANGE]"))
        .stdout(predicate::str::contains("3 placeholder(s)"));
}

#[test]
fn test_scan_plain_file() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("plain.txt");
    fs::write(&template, "nothing here").unwrap();

    let mut cmd = Command::cargo_bin("docfill").unwrap();
    cmd.args(["scan", template.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No placeholders found"));
}

#[test]
fn test_fill_with_defaults_to_stdout() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("letter.txt");
    fs::write(&template, "Dear {{INPUT!text!Name!Jane}}.").unwrap();

    let mut cmd = Command::cargo_bin("docfill").unwrap();
    cmd.args(["fill", template.to_str().unwrap(), "--defaults"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dear Jane."));
}

#[test]
fn test_fill_with_answers_file_to_output() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("letter.txt");
    let answers = dir.path().join("answers.json");
    let out = dir.path().join("merged.txt");
    fs::write(&template, "Dear {{INPUT!text!Name!Jane}}.").unwrap();
    fs::write(&answers, r#"{"Name": "Ada"}"#).unwrap();

    let mut cmd = Command::cargo_bin("docfill").unwrap();
    cmd.args([
        "fill",
        template.to_str().unwrap(),
        "-a",
        answers.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ])
    .assert()
    .success()
    .stderr(predicate::str::contains("Resolved 1 placeholders"));

    assert_eq!(fs::read_to_string(&out).unwrap(), "Dear Ada.");
}

#[test]
fn test_fill_prompts_on_stdin() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("letter.txt");
    fs::write(&template, "Hello {{INPUT!text!Name!Jane}}!").unwrap();

    let mut cmd = Command::cargo_bin("docfill").unwrap();
    cmd.args(["fill", template.to_str().unwrap()])
        .write_stdin("Grace\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello Grace!"));
}

#[test]
fn test_fill_legacy_separator() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("legacy.txt");
    fs::write(&template, "Hello {{INPUT:text:Name:Bob}}!").unwrap();

    let mut cmd = Command::cargo_bin("docfill").unwrap();
    cmd.args([
        "fill",
        template.to_str().unwrap(),
        "--defaults",
        "--separator",
        ":",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("Hello Bob!"));
}

#[test]
fn test_fill_without_workbook_yields_diagnostic() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("letter.txt");
    fs::write(&template, "Total: {{XL!CELL!B2}}").unwrap();

    let mut cmd = Command::cargo_bin("docfill").unwrap();
    cmd.args(["fill", template.to_str().unwrap(), "--defaults"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Excel workbook not loaded]"));
}

#[test]
fn test_fill_missing_template_fails() {
    let mut cmd = Command::cargo_bin("docfill").unwrap();
    cmd.args(["fill", "/no/such/template.txt", "--defaults"])
        .assert()
        .failure();
}

#[test]
fn test_sheets_missing_workbook_fails() {
    let mut cmd = Command::cargo_bin("docfill").unwrap();
    cmd.args(["sheets", "/no/such/book.xlsx"]).assert().failure();
}
