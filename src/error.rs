use thiserror::Error;

/// Problems with the settings file, detected before any statement is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing required setting [{section}] {key}")]
    Missing {
        section: &'static str,
        key: &'static str,
    },

    #[error("Invalid setting [{section}] {key}: {reason}")]
    Invalid {
        section: &'static str,
        key: &'static str,
        reason: String,
    },
}

/// Failures reported by (or on behalf of) the warehouse.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bulk load failed at {path} record {record}: {reason}")]
    Load {
        path: String,
        record: usize,
        reason: String,
    },

    #[error("Invalid JSONPaths file {path}: {reason}")]
    JsonPaths { path: String, reason: String },

    #[error("Source location not supported by this warehouse: {0}")]
    UnsupportedLocation(String),

    #[error("No source files found for {0}")]
    NoSourceFiles(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Statement '{label}' failed: {source}")]
    Statement {
        label: String,
        #[source]
        source: WarehouseError,
    },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}
