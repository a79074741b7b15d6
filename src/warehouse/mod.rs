//! Warehouse backends the pipeline submits statements to.

mod local_copy;
mod redshift;
mod sqlite;

pub use local_copy::{parse_json_path, resolve_location, JsonPath};
pub use redshift::RedshiftWarehouse;
pub use sqlite::SqliteWarehouse;

use crate::config::WarehouseSettings;
use crate::error::WarehouseError;
use crate::schema::LiveColumn;
use crate::statements::CopyCommand;

/// A single, exclusively owned warehouse connection. Every call runs to
/// completion before returning.
pub trait Warehouse {
    /// Short backend name for logging.
    fn name(&self) -> &'static str;

    /// Execute one statement, returning the number of rows it affected.
    fn execute(&mut self, sql: &str) -> Result<u64, WarehouseError>;

    /// Run a bulk-copy command, returning the number of rows loaded.
    fn copy(&mut self, command: &CopyCommand) -> Result<u64, WarehouseError>;

    /// Columns of `table` in declaration order; empty if the table does not exist.
    fn describe_table(&mut self, table: &str) -> Result<Vec<LiveColumn>, WarehouseError>;
}

pub fn open(settings: &WarehouseSettings) -> Result<Box<dyn Warehouse>, WarehouseError> {
    match settings {
        WarehouseSettings::Redshift(redshift) => {
            Ok(Box::new(RedshiftWarehouse::connect(redshift)?))
        }
        WarehouseSettings::Sqlite { path } => Ok(Box::new(SqliteWarehouse::open(path)?)),
    }
}
