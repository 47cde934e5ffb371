//! Unit tests for CLI module
//!
//! Tests argument parsing helpers, formatting, and a full run against a
//! temporary document.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::fs;

use clap::Parser;
use tempfile::TempDir;

use crate::{
    Key, PathSelector, Value,
    cli::{
        Cli, CliError, OutputFormat,
        formatting::{format_change, format_value},
        parse_assignment, parse_literal, run,
    },
    store::{StoreChange, StoreError, Version},
};

fn write_document(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("doc.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn parse_literal_understands_toml_scalars() {
    assert_eq!(parse_literal("42"), Value::Integer(42));
    assert_eq!(parse_literal("true"), Value::Bool(true));
    assert_eq!(parse_literal("\"quoted\""), Value::from("quoted"));
    assert_eq!(
        parse_literal("[1, 2]"),
        Value::Sequence(vec![Value::from(1), Value::from(2)])
    );
}

#[test]
fn parse_literal_falls_back_to_plain_string() {
    assert_eq!(parse_literal("Bea"), Value::from("Bea"));
    assert_eq!(parse_literal("two words"), Value::from("two words"));
}

#[test]
fn parse_assignment_splits_on_first_equals() {
    let (selector, value) = parse_assignment("user.name = a=b").unwrap();

    assert_eq!(selector.keys(), &[Key::from("user"), Key::from("name")]);
    assert_eq!(value, Value::from("a=b"));
}

#[test]
fn parse_assignment_requires_equals() {
    let err = parse_assignment("user.name").unwrap_err();
    assert!(matches!(err, CliError::InvalidArguments(_)));

    let err = parse_assignment("user..name=1").unwrap_err();
    assert!(matches!(
        err,
        CliError::Store(StoreError::InvalidPathSyntax { .. })
    ));
}

#[test]
fn format_value_summarizes_containers() {
    assert_eq!(format_value(&Value::Null), "null");
    assert_eq!(format_value(&Value::from(-3)), "-3");
    assert_eq!(format_value(&Value::from("hi")), "\"hi\"");
    assert_eq!(format_value(&Value::mapping()), "{0}");
}

#[test]
fn format_change_names_watcher_and_path() {
    let watched = PathSelector::parse("user").unwrap();
    let change = StoreChange::written(
        PathSelector::parse("user.name").unwrap(),
        Value::from("Bea"),
        Version::default(),
    );

    assert_eq!(
        format_change(&watched, &change),
        "user <- user.name = \"Bea\" (v0)"
    );
}

#[test]
fn cli_arguments_parse() {
    let cli = Cli::parse_from([
        "treewatch", "--file", "doc.toml", "-w", "user", "-w", "theme", "-s", "theme=light",
        "--format", "toml",
    ]);

    assert_eq!(cli.watch, vec!["user", "theme"]);
    assert_eq!(cli.set, vec!["theme=light"]);
    assert_eq!(cli.format, OutputFormat::Toml);
}

#[test]
fn run_reports_watchers_and_final_root() {
    let dir = TempDir::new().unwrap();
    let file = write_document(
        &dir,
        r#"
theme = "dark"

[user]
name = "Ann"
age = 30
"#,
    );

    let cli = Cli {
        file: Some(file),
        watch: vec!["user".to_string(), "theme".to_string()],
        set: vec!["user.name=Bea".to_string(), "user.age=31".to_string()],
        format: OutputFormat::Toml,
        ..Cli::default()
    };

    let output = run(&cli).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines[0], "user <- user.name = \"Bea\" (v1)");
    assert_eq!(lines[1], "user <- user.age = 31 (v2)");
    assert!(!output.contains("theme <-"));
    assert!(output.contains("name = \"Bea\""));
    assert!(output.ends_with("version: v2"));
}

#[test]
fn run_surfaces_broken_paths() {
    let dir = TempDir::new().unwrap();
    let file = write_document(&dir, "theme = \"dark\"\n");

    let cli = Cli {
        file: Some(file),
        set: vec!["settings.volume=3".to_string()],
        ..Cli::default()
    };

    let err = run(&cli).unwrap_err();
    assert!(matches!(err, CliError::Store(StoreError::BrokenPath { .. })));
}

#[test]
fn run_reports_missing_document() {
    let dir = TempDir::new().unwrap();

    let cli = Cli {
        file: Some(dir.path().join("missing.toml")),
        ..Cli::default()
    };

    let err = run(&cli).unwrap_err();
    assert!(matches!(err, CliError::Document { .. }));
}
