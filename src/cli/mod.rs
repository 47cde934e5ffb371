//! Command-line demo around the store.
//!
//! Loads a TOML document as the store root, registers printing watchers,
//! applies scoped writes in order, and reports what each watcher saw
//! followed by the final root.

pub mod formatting;

#[cfg(test)]
mod tests;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    config::StoreConfig,
    selector::PathSelector,
    store::{Store, StoreError},
    value::Value,
};

use formatting::format_change;

/// Arguments of the `treewatch` binary.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "treewatch")]
#[command(about = "Watch paths in a TOML document while applying scoped writes")]
pub struct Cli {
    /// TOML document used as the initial root
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Store configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dotted path to watch; repeatable
    #[arg(short, long = "watch")]
    pub watch: Vec<String>,

    /// Scoped write as `path=value`; value is a TOML literal or a bare string
    #[arg(short, long = "set")]
    pub set: Vec<String>,

    /// Output format for the final root
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// How the final root is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// TOML; the root must be a mapping without nulls
    Toml,
}

/// Errors that can occur while running the CLI.
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid arguments were provided.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The input document could not be read or parsed.
    #[error("failed to load document '{path}': {details}")]
    Document {
        /// Path of the document
        path: PathBuf,
        /// Error details
        details: String,
    },

    /// The final root could not be rendered.
    #[error("failed to render output: {0}")]
    Render(String),
}

/// Runs the CLI and returns the text to print.
///
/// # Errors
/// Returns `CliError` if an input cannot be loaded, a path or assignment is
/// malformed, a write fails, or the root cannot be rendered.
#[instrument(skip_all)]
pub fn run(cli: &Cli) -> Result<String, CliError> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };

    if let Some(path) = &cli.file {
        config.initial = Some(load_document(path)?);
    }

    let store = Store::with_config(config);
    let seen = Arc::new(Mutex::new(Vec::new()));

    for raw in &cli.watch {
        let selector = PathSelector::parse(raw)?;
        let log = Arc::clone(&seen);
        let watched = selector.clone();

        store.subscribe(&selector, move |change| {
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format_change(&watched, change));
        });
    }

    for raw in &cli.set {
        let (selector, value) = parse_assignment(raw)?;
        let report = store.write_at(&selector, value)?;
        debug!(path = %selector, invoked = report.invoked(), "applied assignment");
    }

    let mut lines = std::mem::take(&mut *seen.lock().unwrap_or_else(PoisonError::into_inner));
    lines.push(render(&store.current(), cli.format)?);
    lines.push(format!("version: {}", store.version()));

    Ok(lines.join("\n"))
}

/// Splits `path=value` into a selector and a parsed value.
///
/// # Errors
/// * `CliError::InvalidArguments` - If there is no `=`
/// * `CliError::Store` - If the path is malformed
pub fn parse_assignment(raw: &str) -> Result<(PathSelector, Value), CliError> {
    let (path, literal) = raw.split_once('=').ok_or_else(|| {
        CliError::InvalidArguments(format!("expected path=value, got '{raw}'"))
    })?;

    let selector = PathSelector::parse(path.trim())?;
    Ok((selector, parse_literal(literal.trim())))
}

/// Parses a TOML literal (`42`, `true`, `"text"`, `[1, 2]`, `{ a = 1 }`),
/// falling back to the raw text as a string.
pub fn parse_literal(raw: &str) -> Value {
    #[derive(Deserialize)]
    struct Literal {
        value: Value,
    }

    toml::from_str::<Literal>(&format!("value = {raw}"))
        .map(|literal| literal.value)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn load_document(path: &Path) -> Result<Value, CliError> {
    let document_error = |details: String| CliError::Document {
        path: path.to_path_buf(),
        details,
    };

    let content = fs::read_to_string(path).map_err(|e| document_error(e.to_string()))?;
    let table: toml::Table = toml::from_str(&content).map_err(|e| document_error(e.to_string()))?;

    Ok(Value::from(toml::Value::Table(table)))
}

fn render(root: &Value, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(root).map_err(|e| CliError::Render(e.to_string()))
        }
        OutputFormat::Toml => toml::to_string(root).map_err(|e| CliError::Render(e.to_string())),
    }
}
