//! Pezzottify Warehouse Library
//!
//! Builds and runs the ELT pipeline that loads listening logs and song
//! metadata into the analytics warehouse and reshapes them into a star schema.

pub mod config;
pub mod dialect;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod statements;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use config::{CliConfig, FileConfig, PipelineConfig};
pub use dialect::Dialect;
pub use error::{ConfigError, PipelineError, WarehouseError};
pub use pipeline::{Pipeline, RunSummary};
pub use statements::{StatementSet, WriteMode};
pub use warehouse::{SqliteWarehouse, Warehouse};
