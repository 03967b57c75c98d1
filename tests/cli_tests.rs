//! CLI integration tests
//!
//! These tests verify the CLI commands work correctly by running the binary.

#![cfg(feature = "cli")]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn xmljson_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_xmljson"))
}

fn run(args: &[&str]) -> Output {
    Command::new(xmljson_bin())
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ============================================================================
// xml2json Command Tests
// ============================================================================

#[test]
fn test_cli_xml2json_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.xml", "<e>\n  <a>1</a>\n  <a>2</a>\n</e>\n");

    let output = run(&["xml2json", arg(&input)]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "xml2json should succeed");
    assert_eq!(stdout.trim_end(), r#"{"e":{"a":["1","2"]}}"#);
}

#[test]
fn test_cli_xml2json_raw_keeps_whitespace() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.xml", "<e> x </e>");

    let output = run(&["xml2json", "--raw", arg(&input)]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert_eq!(stdout.trim_end(), r#"{"e":" x "}"#);
}

#[test]
fn test_cli_xml2json_output_file() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.xml", r#"<e name="v">text</e>"#);
    let out = dir.path().join("out.json");

    let output = run(&["xml2json", arg(&input), "-o", arg(&out)]);

    assert!(output.status.success(), "xml2json -o should succeed");
    assert!(output.stdout.is_empty(), "nothing should go to stdout");
    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(written, r##"{"e":{"@name":"v","#text":"text"}}"##);
}

#[test]
fn test_cli_xml2json_pretty() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.xml", "<e><a>1</a></e>");

    let output = run(&["xml2json", "--pretty", arg(&input)]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(json, serde_json::json!({"e": {"a": "1"}}));
    assert!(stdout.lines().count() > 1, "pretty output spans lines");
}

#[test]
fn test_cli_xml2json_default_namespace() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.xml", r#"<Report xmlns="urn:api"><Name>x</Name></Report>"#);

    let output = run(&["xml2json", "-n", "urn:api", arg(&input)]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert_eq!(stdout.trim_end(), r#"{"Report":{"Name":"x"}}"#);
}

#[test]
fn test_cli_xml2json_malformed_input() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "bad.xml", "<a><b></a>");

    let output = run(&["xml2json", arg(&input)]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "malformed XML should fail");
    assert!(stderr.contains("Error:"), "should print an error");
}

// ============================================================================
// json2xml Command Tests
// ============================================================================

#[test]
fn test_cli_json2xml_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.json", r#"{"e": {"a": ["1", "2"], "@id": "x"}}"#);

    let output = run(&["json2xml", arg(&input)]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "json2xml should succeed");
    assert_eq!(stdout.trim_end(), r#"<e id="x"><a>1</a><a>2</a></e>"#);
}

#[test]
fn test_cli_json2xml_declaration_and_prefix() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.json", r#"{"ex:root": {"ex:item": "1"}}"#);
    let out = dir.path().join("out.xml");

    let output = run(&[
        "json2xml",
        "--declaration",
        "-P",
        "ex=urn:example",
        arg(&input),
        "--output",
        arg(&out),
    ]);

    assert!(output.status.success(), "json2xml with prefix should succeed");
    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(
        written,
        r#"<?xml version="1.0" encoding="UTF-8"?><root xmlns="urn:example"><item>1</item></root>"#
    );
}

#[test]
fn test_cli_json2xml_unknown_prefix() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.json", r#"{"ex:root": null}"#);

    let output = run(&["json2xml", arg(&input)]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("namespace error"), "stderr was: {stderr}");
}

#[test]
fn test_cli_reserved_prefix_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.json", r#"{"e": null}"#);

    let output = run(&["json2xml", "-P", "ns1=urn:x", arg(&input)]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("reserved"), "stderr was: {stderr}");
}

#[test]
fn test_cli_round_trip_through_files() {
    let dir = TempDir::new().unwrap();
    let xml = r#"<library><book id="1"><title>A</title></book><book id="2"><title>B</title></book></library>"#;
    let input = write_fixture(&dir, "in.xml", xml);
    let json_path = dir.path().join("mid.json");
    let xml_path = dir.path().join("out.xml");

    assert!(run(&["xml2json", arg(&input), "-o", arg(&json_path)]).status.success());
    assert!(run(&["json2xml", arg(&json_path), "-o", arg(&xml_path)]).status.success());

    assert_eq!(fs::read_to_string(&xml_path).unwrap(), xml);
}

#[test]
fn test_cli_missing_file() {
    let output = run(&["xml2json", "/nonexistent/input.xml"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "missing input should fail");
    assert!(stderr.contains("I/O error"), "stderr was: {stderr}");
}

#[test]
fn test_cli_malformed_prefix_binding() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.json", r#"{"e": null}"#);

    let output = run(&["json2xml", "-P", "ex", arg(&input)]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Invalid prefix binding: 'ex' (expected PREFIX=URI)"), "stderr was: {stderr}");
}
