//! Input file parsing.
//!
//! Two formats are accepted, detected from the first non-blank character:
//! line-delimited text (one item per non-empty line) and a JSON array whose
//! elements become items as-is.

use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading an input file.
#[derive(Debug, Error)]
pub enum InputError {
    /// The file does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The file could not be read.
    #[error("Failed to read file {path}: {reason}")]
    Read {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        reason: String,
    },

    /// The file holds no items.
    #[error("No items found in {0}")]
    Empty(String),

    /// The file looks like JSON but does not parse.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// The JSON document is not an array.
    #[error("JSON root must be an array")]
    NotAnArray,
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// One item per line.
    LineDelimited,
    /// A JSON array of items.
    JsonArray,
}

/// Detects the input format from file content.
pub fn detect_format(content: &str) -> InputFormat {
    if content.trim_start().starts_with('[') {
        InputFormat::JsonArray
    } else {
        InputFormat::LineDelimited
    }
}

/// Loads every item of an input file, in file order.
pub fn parse_input_file(path: &Path) -> Result<Vec<Value>, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| InputError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let items = match detect_format(&content) {
        InputFormat::LineDelimited => parse_line_delimited(&content),
        InputFormat::JsonArray => parse_json_array(&content)?,
    };

    if items.is_empty() {
        return Err(InputError::Empty(path.display().to_string()));
    }
    Ok(items)
}

fn parse_line_delimited(content: &str) -> Vec<Value> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Value::String(line.to_string()))
        .collect()
}

fn parse_json_array(content: &str) -> Result<Vec<Value>, InputError> {
    let json: Value = serde_json::from_str(content)
        .map_err(|e| InputError::InvalidJson(format!("{} (line {})", e, e.line())))?;

    match json {
        Value::Array(items) => Ok(items),
        _ => Err(InputError::NotAnArray),
    }
}
