//! Per-track source document
//!
//! A source document is a JSON export of the provider's hierarchical container:
//! `group → table → field → [values]`. The value of a field is the first
//! element of its array, e.g. `metadata/songs/title[0]`.
//!
//! Opening a document is the only per-file I/O. The file handle lives inside
//! [`TrackDocument::open`] and is released when that function returns, whether
//! parsing succeeded or not.
//!
//! Invalid UTF-8 does not make a document unusable: offending bytes become
//! U+FFFD and the text fields containing them fail to decode on their own.

use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Errors that make a whole document unusable
#[derive(Debug, Error)]
pub enum ExtractError {
    /// File could not be opened or read
    #[error("Cannot read {0}: {1}")]
    Unreadable(PathBuf, #[source] std::io::Error),

    /// File is not valid JSON (or is empty)
    #[error("Invalid document {0}: {1}")]
    InvalidDocument(PathBuf, #[source] serde_json::Error),

    /// Top-level value is not a group map
    #[error("Malformed container {0}: top level is not an object")]
    MalformedContainer(PathBuf),
}

/// Per-field extraction failure
///
/// All variants are absorbed by the fallback policy; they are kept distinct so
/// the run summary can report why fallbacks were used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Group, table or field is absent (or the value is null)
    #[error("missing path {0}")]
    MissingPath(String),

    /// Value present but not decodable into the field's type or domain
    #[error("cannot decode {0}: {1}")]
    DecodeError(String, String),

    /// Value present but not shaped as a non-empty array under a table map
    #[error("malformed shape at {0}: {1}")]
    MalformedShape(String, String),
}

/// Location of a field inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath {
    pub group: &'static str,
    pub table: &'static str,
    pub field: &'static str,
}

impl FieldPath {
    pub const fn new(group: &'static str, table: &'static str, field: &'static str) -> Self {
        Self { group, table, field }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.group, self.table, self.field)
    }
}

/// Parsed source document
#[derive(Debug, Clone)]
pub struct TrackDocument {
    groups: Map<String, Value>,
}

impl TrackDocument {
    /// Open and parse a document from disk
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let bytes = fs::read(path).map_err(|e| ExtractError::Unreadable(path.to_path_buf(), e))?;
        let text = String::from_utf8_lossy(&bytes);
        let body = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&text);

        let value: Value = serde_json::from_str(body)
            .map_err(|e| ExtractError::InvalidDocument(path.to_path_buf(), e))?;

        Self::from_value(value).ok_or_else(|| ExtractError::MalformedContainer(path.to_path_buf()))
    }

    /// Wrap an already-parsed value; `None` unless it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(groups) => Some(Self { groups }),
            _ => None,
        }
    }

    /// First element of the field array at `path`
    pub fn cell(&self, path: &FieldPath) -> Result<&Value, FieldError> {
        let table = self.table(path.group, path.table).map_err(|e| match e {
            FieldError::MissingPath(_) => FieldError::MissingPath(path.to_string()),
            FieldError::MalformedShape(_, why) => FieldError::MalformedShape(path.to_string(), why),
            other => other,
        })?;

        let values = table
            .get(path.field)
            .ok_or_else(|| FieldError::MissingPath(path.to_string()))?;

        let first = match values {
            Value::Null => return Err(FieldError::MissingPath(path.to_string())),
            Value::Array(items) => items.first().ok_or_else(|| {
                FieldError::MalformedShape(path.to_string(), "empty array".to_string())
            })?,
            other => {
                return Err(FieldError::MalformedShape(
                    path.to_string(),
                    format!("expected array, found {}", kind_of(other)),
                ))
            }
        };

        if first.is_null() {
            return Err(FieldError::MissingPath(path.to_string()));
        }
        Ok(first)
    }

    /// Non-empty text value (surrounding whitespace removed)
    pub fn text(&self, path: &FieldPath) -> Result<String, FieldError> {
        match self.cell(path)? {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Err(FieldError::DecodeError(path.to_string(), "empty string".to_string()))
                } else if trimmed.contains(char::REPLACEMENT_CHARACTER) {
                    Err(FieldError::DecodeError(path.to_string(), "invalid UTF-8".to_string()))
                } else {
                    Ok(trimmed.to_string())
                }
            }
            other => Err(FieldError::DecodeError(
                path.to_string(),
                format!("expected string, found {}", kind_of(other)),
            )),
        }
    }

    /// Finite floating point value
    pub fn float(&self, path: &FieldPath) -> Result<f64, FieldError> {
        let value = self.cell(path)?;
        let number = value.as_f64().ok_or_else(|| {
            FieldError::DecodeError(
                path.to_string(),
                format!("expected number, found {}", kind_of(value)),
            )
        })?;

        if number.is_finite() {
            Ok(number)
        } else {
            Err(FieldError::DecodeError(path.to_string(), "non-finite number".to_string()))
        }
    }

    /// Integer value; integral-valued floats are truncated
    pub fn integer(&self, path: &FieldPath) -> Result<i64, FieldError> {
        let value = self.cell(path)?;
        if let Some(n) = value.as_i64() {
            return Ok(n);
        }

        match value.as_f64() {
            Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(f.trunc() as i64),
            Some(_) => Err(FieldError::DecodeError(
                path.to_string(),
                "number out of integer range".to_string(),
            )),
            None => Err(FieldError::DecodeError(
                path.to_string(),
                format!("expected integer, found {}", kind_of(value)),
            )),
        }
    }

    /// Group → table → field names, in key order
    pub fn layout(&self) -> Vec<(String, Vec<(String, Vec<String>)>)> {
        self.groups
            .iter()
            .map(|(group, tables)| {
                let tables = match tables {
                    Value::Object(map) => map
                        .iter()
                        .map(|(table, fields)| {
                            let fields = match fields {
                                Value::Object(f) => f.keys().cloned().collect(),
                                _ => Vec::new(),
                            };
                            (table.clone(), fields)
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                (group.clone(), tables)
            })
            .collect()
    }

    fn table(&self, group: &str, table: &str) -> Result<&Map<String, Value>, FieldError> {
        let tables = match self.groups.get(group) {
            None | Some(Value::Null) => return Err(FieldError::MissingPath(group.to_string())),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(FieldError::MalformedShape(
                    group.to_string(),
                    format!("group is {}", kind_of(other)),
                ))
            }
        };

        match tables.get(table) {
            None | Some(Value::Null) => Err(FieldError::MissingPath(table.to_string())),
            Some(Value::Object(map)) => Ok(map),
            Some(other) => Err(FieldError::MalformedShape(
                table.to_string(),
                format!("table is {}", kind_of(other)),
            )),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
