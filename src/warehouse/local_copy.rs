//! Local execution of bulk-copy commands for the SQLite warehouse.
//!
//! Mirrors what Redshift does for `COPY ... JSON`: every file under the
//! source location is read as a stream of JSON records, each record becomes
//! one staging row, and fields are mapped to columns either through a
//! JSONPaths file or by matching object keys to column names.

use crate::error::WarehouseError;
use crate::schema::{SqlType, Table};
use crate::statements::{CopyCommand, JsonFormat};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// One step of a JSONPaths expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

/// A parsed JSONPaths expression such as `$['userId']` or `$.song.title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath(Vec<PathSegment>);

impl JsonPath {
    pub fn lookup<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(record, |value, segment| match segment {
            PathSegment::Key(key) => value.get(key.as_str()),
            PathSegment::Index(index) => value.get(*index),
        })
    }
}

pub fn parse_json_path(expression: &str) -> Result<JsonPath, String> {
    let mut chars = expression.trim().chars().peekable();
    if chars.next() != Some('$') {
        return Err(format!("'{}' does not start with $", expression));
    }

    let mut segments = Vec::new();
    while let Some(c) = chars.next() {
        match c {
            '.' => {
                let mut key = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '.' || next == '[' {
                        break;
                    }
                    key.push(next);
                    chars.next();
                }
                if key.is_empty() {
                    return Err(format!("empty key in '{}'", expression));
                }
                segments.push(PathSegment::Key(key));
            }
            '[' => match chars.next() {
                Some(quote @ ('\'' | '"')) => {
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some(c) if c == quote => break,
                            Some(c) => key.push(c),
                            None => return Err(format!("unterminated key in '{}'", expression)),
                        }
                    }
                    if chars.next() != Some(']') {
                        return Err(format!("expected ] in '{}'", expression));
                    }
                    segments.push(PathSegment::Key(key));
                }
                Some(digit) if digit.is_ascii_digit() => {
                    let mut index = digit.to_string();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) if c.is_ascii_digit() => index.push(c),
                            _ => return Err(format!("bad array index in '{}'", expression)),
                        }
                    }
                    let index = index
                        .parse()
                        .map_err(|_| format!("bad array index in '{}'", expression))?;
                    segments.push(PathSegment::Index(index));
                }
                _ => return Err(format!("unexpected [ in '{}'", expression)),
            },
            other => return Err(format!("unexpected '{}' in '{}'", other, expression)),
        }
    }
    Ok(JsonPath(segments))
}

fn local_path(location: &str) -> Result<&str, WarehouseError> {
    if location.contains("://") && !location.starts_with("file://") {
        return Err(WarehouseError::UnsupportedLocation(location.to_string()));
    }
    Ok(location.trim_start_matches("file://"))
}

fn files_under(dir: &Path) -> Result<Vec<PathBuf>, WarehouseError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Expand a source location into the files it covers: the file itself, every
/// file beneath a directory, or every file whose path starts with the prefix.
pub fn resolve_location(location: &str) -> Result<Vec<PathBuf>, WarehouseError> {
    let prefix = local_path(location)?;
    let path = Path::new(prefix);

    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else if path.is_dir() {
        files_under(path)?
    } else {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        match path.file_name() {
            Some(name) if parent.is_dir() => {
                let name = name.to_string_lossy();
                // Compared relative to `parent`, which may be an implicit "."
                files_under(parent)?
                    .into_iter()
                    .filter(|file| {
                        file.strip_prefix(parent)
                            .map(|relative| relative.to_string_lossy().starts_with(&*name))
                            .unwrap_or(false)
                    })
                    .collect()
            }
            _ => Vec::new(),
        }
    };

    if files.is_empty() {
        return Err(WarehouseError::NoSourceFiles(location.to_string()));
    }
    Ok(files)
}

fn load_jsonpaths(location: &str, table: &Table) -> Result<Vec<JsonPath>, WarehouseError> {
    let invalid = |reason: String| WarehouseError::JsonPaths {
        path: location.to_string(),
        reason,
    };

    let content = fs::read_to_string(local_path(location)?)?;
    let document: Value =
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    let expressions = document
        .get("jsonpaths")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("missing \"jsonpaths\" array".to_string()))?;

    if expressions.len() != table.columns.len() {
        return Err(invalid(format!(
            "{} paths for {} columns of {}",
            expressions.len(),
            table.columns.len(),
            table.name
        )));
    }

    expressions
        .iter()
        .map(|expression| {
            expression
                .as_str()
                .ok_or_else(|| invalid(format!("{} is not a string", expression)))
                .and_then(|s| parse_json_path(s).map_err(invalid))
        })
        .collect()
}

fn coerce(value: Option<&Value>, sql_type: &SqlType) -> Result<SqlValue, String> {
    let value = match value {
        None | Some(Value::Null) => return Ok(SqlValue::Null),
        Some(value) => value,
    };

    match sql_type {
        SqlType::Integer | SqlType::BigInt => {
            let number = match value {
                Value::Number(n) => match n.as_i64() {
                    Some(i) => i,
                    None => match n.as_f64() {
                        Some(f) if f.fract() == 0.0 => f as i64,
                        _ => return Err(format!("{} is not an integer", n)),
                    },
                },
                Value::String(s) if s.trim().is_empty() => return Ok(SqlValue::Null),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| format!("'{}' is not an integer", s))?,
                other => return Err(format!("{} is not an integer", other)),
            };
            if *sql_type == SqlType::Integer && i32::try_from(number).is_err() {
                return Err(format!("{} is out of range for INTEGER", number));
            }
            Ok(SqlValue::Integer(number))
        }
        SqlType::Float => match value {
            Value::Number(n) => n
                .as_f64()
                .map(SqlValue::Real)
                .ok_or_else(|| format!("{} is not a number", n)),
            Value::String(s) if s.trim().is_empty() => Ok(SqlValue::Null),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(SqlValue::Real)
                .map_err(|_| format!("'{}' is not a number", s)),
            other => Err(format!("{} is not a number", other)),
        },
        SqlType::Varchar | SqlType::Text | SqlType::Timestamp => match value {
            Value::String(s) => Ok(SqlValue::Text(s.clone())),
            other => Ok(SqlValue::Text(other.to_string())),
        },
    }
}

enum FieldMapping {
    Paths(Vec<JsonPath>),
    Auto,
}

impl FieldMapping {
    fn row(&self, table: &Table, record: &Value) -> Result<Vec<SqlValue>, String> {
        if let FieldMapping::Auto = self {
            if !record.is_object() {
                return Err("record is not a JSON object".to_string());
            }
        }
        table
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let field = match self {
                    FieldMapping::Paths(paths) => paths[index].lookup(record),
                    FieldMapping::Auto => record.get(column.name),
                };
                coerce(field, column.sql_type).map_err(|e| format!("column {}: {}", column.name, e))
            })
            .collect()
    }
}

/// Execute `command` against a local SQLite connection. All rows are
/// inserted in one transaction; the first bad record aborts the load.
pub fn copy_into(conn: &mut Connection, command: &CopyCommand) -> Result<u64, WarehouseError> {
    let table = command.table;
    let mapping = match &command.format {
        JsonFormat::JsonPaths(location) => FieldMapping::Paths(load_jsonpaths(location, table)?),
        JsonFormat::Auto => FieldMapping::Auto,
    };
    let files = resolve_location(&command.location)?;
    debug!("Loading {} files into {}", files.len(), table.name);

    let column_names: Vec<&str> = table.columns.iter().map(|c| c.name).collect();
    let placeholders: Vec<String> = (1..=column_names.len()).map(|i| format!("?{}", i)).collect();
    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name,
        column_names.join(", "),
        placeholders.join(", ")
    );

    let tx = conn.transaction()?;
    let mut loaded: u64 = 0;
    {
        let mut stmt = tx.prepare(&insert_sql)?;
        for file in &files {
            let content = fs::read_to_string(file)?;
            let records = serde_json::Deserializer::from_str(&content).into_iter::<Value>();
            for (index, record) in records.enumerate() {
                let load_error = |reason: String| WarehouseError::Load {
                    path: file.display().to_string(),
                    record: index + 1,
                    reason,
                };
                let record = record.map_err(|e| load_error(e.to_string()))?;
                let row = mapping.row(table, &record).map_err(load_error)?;
                stmt.execute(params_from_iter(row.iter()))?;
                loaded += 1;
            }
        }
    }
    tx.commit()?;

    info!(
        "Loaded {} rows into {} from {} files",
        loaded,
        table.name,
        files.len()
    );
    Ok(loaded)
}
