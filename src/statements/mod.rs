//! The complete, fully substituted statement lists of one pipeline run.

mod copy;
mod quote;
mod transform;

pub use copy::{copy_table_queries, CopyCommand, JsonFormat};
pub use quote::{literals_balanced, quote_literal};
pub use transform::{insert_table_queries, WriteMode};

use crate::config::PipelineConfig;
use crate::dialect::Dialect;
use crate::schema::{create_table_queries, drop_table_queries, staging_refresh_queries};

/// A directly executable statement and the short label it is logged under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub label: String,
    pub sql: String,
}

impl Statement {
    pub fn new(label: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            sql: sql.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatementSet {
    pub dialect: Dialect,
    pub drop_tables: Vec<Statement>,
    pub create_tables: Vec<Statement>,
    pub refresh_staging: Vec<Statement>,
    pub copy_tables: Vec<CopyCommand>,
    pub insert_tables: Vec<Statement>,
}

impl StatementSet {
    pub fn build(config: &PipelineConfig, dialect: Dialect) -> Self {
        Self {
            dialect,
            drop_tables: drop_table_queries(dialect),
            create_tables: create_table_queries(dialect),
            refresh_staging: staging_refresh_queries(dialect),
            copy_tables: copy_table_queries(config),
            insert_tables: insert_table_queries(dialect, config.write_mode),
        }
    }

    /// Every statement in execution order of a full run, copies rendered as SQL.
    pub fn all(&self) -> Vec<Statement> {
        self.drop_tables
            .iter()
            .chain(self.create_tables.iter())
            .cloned()
            .chain(
                self.copy_tables
                    .iter()
                    .map(|copy| Statement::new(copy.label(), copy.to_sql())),
            )
            .chain(self.insert_tables.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_config;

    #[test]
    fn test_full_run_statement_counts() {
        let set = StatementSet::build(&sample_config(), Dialect::Redshift);
        assert_eq!(set.drop_tables.len(), 7);
        assert_eq!(set.create_tables.len(), 7);
        assert_eq!(set.copy_tables.len(), 2);
        assert_eq!(set.insert_tables.len(), 5);
        assert_eq!(set.all().len(), 21);
    }

    #[test]
    fn test_no_unresolved_placeholders() {
        for dialect in [Dialect::Redshift, Dialect::Sqlite] {
            for statement in StatementSet::build(&sample_config(), dialect).all() {
                assert!(!statement.sql.trim().is_empty(), "{}", statement.label);
                for placeholder in ["{}", "{0}", "%s", "${"] {
                    assert!(
                        !statement.sql.contains(placeholder),
                        "{} contains {placeholder}",
                        statement.label
                    );
                }
                assert!(literals_balanced(&statement.sql), "{}", statement.label);
                assert_eq!(
                    statement.sql.matches('(').count(),
                    statement.sql.matches(')').count(),
                    "{}",
                    statement.label
                );
            }
        }
    }

    #[test]
    fn test_sqlite_statements_parse() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let set = StatementSet::build(&sample_config(), Dialect::Sqlite);
        for statement in set.create_tables.iter() {
            conn.execute(&statement.sql, []).unwrap();
        }
        for statement in set.insert_tables.iter().chain(set.drop_tables.iter()) {
            conn.prepare(&statement.sql)
                .unwrap_or_else(|e| panic!("{}: {e}", statement.label));
        }
    }
}
