//! Shared helper functions for CLI commands

use clap::ValueEnum;
use miette::Result;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, Project};
use crate::engine::Value;

/// Parse a `KEY=VALUE` customer input
///
/// Values are numbers or `true`/`false`.
pub fn parse_input(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() || !is_identifier(key) {
        return Err(format!("'{}' is not a valid input name", key));
    }
    let value = value.trim().parse::<Value>()?;
    Ok((key.to_string(), value))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Open the project named by `--project` or found from the working directory
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    Project::open(global.project.as_deref()).map_err(|e| miette::miette!("{}", e))
}

/// Resolve `auto` to the configured default format, falling back to a table
pub fn effective_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    config
        .default_format
        .as_deref()
        .and_then(|f| OutputFormat::from_str(f, true).ok())
        .filter(|f| *f != OutputFormat::Auto)
        .unwrap_or(OutputFormat::Table)
}

/// Format a currency amount
pub fn format_money(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Format a quantity, trimming trailing zeros
pub fn format_qty(qty: f64) -> String {
    let s = format!("{:.3}", qty);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
