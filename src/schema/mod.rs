//! Schema management: declarative table definitions and the DDL built from them.

mod table;
mod tables;

pub use table::{Column, ForeignKey, LiveColumn, SqlType, Table, TableKind};
pub use tables::*;

use crate::dialect::Dialect;
use crate::error::PipelineError;
use crate::statements::Statement;
use crate::warehouse::Warehouse;
use tracing::{debug, info};

pub fn table(name: &str) -> Option<&'static Table> {
    CREATE_ORDER.iter().copied().find(|t| t.name == name)
}

fn is_referenced(table: &Table) -> bool {
    CREATE_ORDER.iter().any(|other| other.references(table))
}

/// One unconditional `DROP TABLE IF EXISTS` per table. Tables that are
/// foreign-key targets cascade where the dialect allows it.
pub fn drop_table_queries(dialect: Dialect) -> Vec<Statement> {
    DROP_ORDER
        .iter()
        .map(|table| {
            Statement::new(
                format!("drop {}", table.name),
                table.drop_sql(dialect, is_referenced(table)),
            )
        })
        .collect()
}

/// One idempotent `CREATE TABLE IF NOT EXISTS` per table, in dependency order.
pub fn create_table_queries(dialect: Dialect) -> Vec<Statement> {
    CREATE_ORDER
        .iter()
        .map(|table| {
            Statement::new(
                format!("create {}", table.name),
                table.create_sql(dialect),
            )
        })
        .collect()
}

/// Drop and re-create statements for the staging tables only, in that order.
pub fn staging_refresh_queries(dialect: Dialect) -> Vec<Statement> {
    let staging = || DROP_ORDER.iter().filter(|t| t.kind == TableKind::Staging);
    let drops = staging().map(|table| {
        Statement::new(
            format!("drop {}", table.name),
            table.drop_sql(dialect, is_referenced(table)),
        )
    });
    let creates = staging().map(|table| {
        Statement::new(
            format!("create {}", table.name),
            table.create_sql(dialect),
        )
    });
    drops.chain(creates).collect()
}

/// Check every declared table against what the warehouse reports.
pub fn verify_schema(warehouse: &mut dyn Warehouse, dialect: Dialect) -> Result<(), PipelineError> {
    for table in CREATE_ORDER {
        let live_columns = warehouse
            .describe_table(table.name)
            .map_err(|source| PipelineError::Statement {
                label: format!("describe {}", table.name),
                source,
            })?;
        if live_columns.is_empty() {
            return Err(PipelineError::SchemaMismatch(format!(
                "Table {} does not exist",
                table.name
            )));
        }
        if let Some(difference) = table.diff(dialect, &live_columns) {
            return Err(PipelineError::SchemaMismatch(difference));
        }
        debug!("Table {} matches its declaration", table.name);
    }
    info!("All {} tables match their declarations", CREATE_ORDER.len());
    Ok(())
}
