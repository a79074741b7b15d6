//! Local SQLite warehouse used for development runs and tests.

use super::local_copy::copy_into;
use super::Warehouse;
use crate::error::WarehouseError;
use crate::schema::LiveColumn;
use crate::statements::CopyCommand;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

pub struct SqliteWarehouse {
    conn: Connection,
}

impl SqliteWarehouse {
    pub fn open(path: &Path) -> Result<Self, WarehouseError> {
        info!("Opening SQLite warehouse at {:?}...", path);
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Warehouse for SqliteWarehouse {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn execute(&mut self, sql: &str) -> Result<u64, WarehouseError> {
        let changed = self.conn.execute(sql, params![])?;
        Ok(changed as u64)
    }

    fn copy(&mut self, command: &CopyCommand) -> Result<u64, WarehouseError> {
        copy_into(&mut self.conn, command)
    }

    fn describe_table(&mut self, table: &str) -> Result<Vec<LiveColumn>, WarehouseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type, \"notnull\" FROM pragma_table_info(?1)")?;
        let columns = stmt
            .query_map(params![table], |row| {
                Ok(LiveColumn {
                    name: row.get(0)?,
                    type_name: row.get::<_, String>(1)?.to_lowercase(),
                    non_null: row.get::<_, i32>(2)? == 1,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}
