//! Redshift backend, speaking the Postgres wire protocol through `sqlx`.
//!
//! The pipeline is strictly sequential, so the backend owns one connection
//! and a current-thread runtime that blocks on each statement.

use super::Warehouse;
use crate::config::RedshiftSettings;
use crate::error::WarehouseError;
use crate::schema::LiveColumn;
use crate::statements::CopyCommand;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tokio::runtime::{Builder, Runtime};
use tracing::{info, trace};

pub struct RedshiftWarehouse {
    runtime: Runtime,
    conn: PgConnection,
}

impl RedshiftWarehouse {
    pub fn connect(settings: &RedshiftSettings) -> Result<Self, WarehouseError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .database(&settings.db_name)
            .username(&settings.db_user)
            .password(&settings.db_password);

        info!(
            "Connecting to Redshift at {}:{}/{} as {}...",
            settings.host, settings.port, settings.db_name, settings.db_user
        );
        let conn = runtime.block_on(PgConnection::connect_with(&options))?;
        Ok(Self { runtime, conn })
    }
}

impl Warehouse for RedshiftWarehouse {
    fn name(&self) -> &'static str {
        "redshift"
    }

    fn execute(&mut self, sql: &str) -> Result<u64, WarehouseError> {
        trace!("Submitting statement to Redshift");
        let result = self
            .runtime
            .block_on(sqlx::raw_sql(sql).execute(&mut self.conn))?;
        Ok(result.rows_affected())
    }

    fn copy(&mut self, command: &CopyCommand) -> Result<u64, WarehouseError> {
        // Redshift reads the objects itself; the command text is all it needs.
        self.execute(&command.to_sql())
    }

    fn describe_table(&mut self, table: &str) -> Result<Vec<LiveColumn>, WarehouseError> {
        let rows: Vec<(String, String, String)> = self.runtime.block_on(
            sqlx::query_as(
                "SELECT column_name::varchar, data_type::varchar, is_nullable::varchar \
                 FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = $1 \
                 ORDER BY ordinal_position",
            )
            .bind(table)
            .fetch_all(&mut self.conn),
        )?;
        Ok(rows
            .into_iter()
            .map(|(name, type_name, is_nullable)| LiveColumn {
                name,
                type_name: type_name.to_lowercase(),
                non_null: is_nullable.eq_ignore_ascii_case("NO"),
            })
            .collect())
    }
}
