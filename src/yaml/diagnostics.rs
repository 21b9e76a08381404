//! YAML error diagnostics for master-data files

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

/// YAML syntax or shape error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("Invalid YAML: {message}")]
#[diagnostic(code(fabest::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("error here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    /// The underlying error message
    message: String,
}

impl YamlSyntaxError {
    /// Create a syntax error from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = generate_help(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors reading or writing a YAML record
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error on {path}: {source}")]
    #[diagnostic(code(fabest::yaml::io))]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize {path}: {message}")]
    #[diagnostic(code(fabest::yaml::serialize))]
    Serialize { path: String, message: String },
}

/// Parse YAML text, reporting errors against the named source
pub fn parse<T: DeserializeOwned + 'static>(source: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(source)
        .map_err(|e| YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, source, filename)))
}

/// Read and parse a YAML file
pub fn read_file<T: DeserializeOwned + 'static>(path: &Path) -> Result<T, YamlError> {
    let source = std::fs::read_to_string(path).map_err(|e| YamlError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&source, &path.display().to_string())
}

/// Serialize a record and write it to a file
pub fn write_file<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), YamlError> {
    let text = serde_yml::to_string(value).map_err(|e| YamlError::Serialize {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| YamlError::Io {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    std::fs::write(path, text).map_err(|e| YamlError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Convert line/column to byte offset
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let mut current_line = 1;
    let mut line_start = 0;

    for (i, ch) in source.char_indices() {
        if current_line == line {
            break;
        }
        if ch == '\n' {
            current_line += 1;
            line_start = i + 1;
        }
    }
    if current_line < line {
        return source.len().saturating_sub(1);
    }

    let line_text = &source[line_start..];
    let line_len = line_text.find('\n').unwrap_or(line_text.len());
    line_start + column.saturating_sub(1).min(line_len)
}

/// Generate helpful suggestions based on error message
fn generate_help(message: &str) -> Option<String> {
    let msg_lower = message.to_lowercase();

    if msg_lower.contains("cannot start any token") || msg_lower.contains("unknown anchor") {
        return Some(
            "Formulas starting with '*', '&', '!' or '%' must be quoted: \"*2\"".to_string(),
        );
    }

    if msg_lower.contains("tab") {
        return Some(
            "YAML requires spaces for indentation, not tabs. Replace tabs with spaces.".to_string(),
        );
    }

    if msg_lower.contains("duplicate key") || msg_lower.contains("duplicate field") {
        return Some("Each key can only appear once. Remove or rename the duplicate key.".to_string());
    }

    if msg_lower.contains("unknown variant") {
        return Some(
            "material_source must be one of: sheet, round_pipe, rectangle_pipe, angle, flat, square_rod, washer"
                .to_string(),
        );
    }

    if msg_lower.contains("missing field") {
        return Some("Add the required field shown above to the record.".to_string());
    }

    if msg_lower.contains("invalid type") && msg_lower.contains("expected a string") {
        return Some("Quote numeric formulas so they stay text: quantity_formula: \"4\"".to_string());
    }

    if msg_lower.contains("mapping values are not allowed") {
        return Some("You may be missing a space after ':' or have incorrect indentation.".to_string());
    }

    None
}
