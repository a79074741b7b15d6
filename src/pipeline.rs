//! Runs the statement lists against a warehouse, one statement at a time.
//!
//! There is no retry and no rollback across statements: the first failure
//! aborts the run and leaves the tables as they were after the last
//! successful step.

use crate::error::PipelineError;
use crate::schema::verify_schema;
use crate::statements::{CopyCommand, Statement, StatementSet};
use crate::warehouse::Warehouse;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub label: String,
    pub rows_affected: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepOutcome>,
}

impl RunSummary {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            steps: Vec::new(),
        }
    }

    pub fn rows_for(&self, label: &str) -> Option<u64> {
        self.steps
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.rows_affected)
    }

    pub fn total_elapsed(&self) -> Duration {
        self.steps.iter().map(|s| s.elapsed).sum()
    }

    pub fn log(&self) {
        info!("");
        info!("Run Summary (started {})", self.started_at.to_rfc3339());
        info!("===========");
        for step in &self.steps {
            info!(
                "  {:<24} {:>10} rows  {:.2?}",
                step.label, step.rows_affected, step.elapsed
            );
        }
        info!(
            "{} statements in {:.2?}",
            self.steps.len(),
            self.total_elapsed()
        );
    }
}

pub struct Pipeline<'a> {
    statements: StatementSet,
    warehouse: &'a mut dyn Warehouse,
}

fn run_step<F>(summary: &mut RunSummary, label: &str, action: F) -> Result<(), PipelineError>
where
    F: FnOnce() -> Result<u64, crate::error::WarehouseError>,
{
    info!("Running {}...", label);
    let started = Instant::now();
    match action() {
        Ok(rows_affected) => {
            let elapsed = started.elapsed();
            debug!("{} affected {} rows in {:?}", label, rows_affected, elapsed);
            summary.steps.push(StepOutcome {
                label: label.to_string(),
                rows_affected,
                elapsed,
            });
            Ok(())
        }
        Err(source) => {
            error!("{} failed: {}", label, source);
            Err(PipelineError::Statement {
                label: label.to_string(),
                source,
            })
        }
    }
}

fn execute_all(
    warehouse: &mut dyn Warehouse,
    statements: &[Statement],
    summary: &mut RunSummary,
) -> Result<(), PipelineError> {
    for statement in statements {
        debug!("{}:\n{}", statement.label, statement.sql);
        run_step(summary, &statement.label, || warehouse.execute(&statement.sql))?;
    }
    Ok(())
}

fn copy_all(
    warehouse: &mut dyn Warehouse,
    commands: &[CopyCommand],
    summary: &mut RunSummary,
) -> Result<(), PipelineError> {
    for command in commands {
        debug!("{}:\n{}", command.label(), command.to_sql());
        run_step(summary, &command.label(), || warehouse.copy(command))?;
    }
    Ok(())
}

impl<'a> Pipeline<'a> {
    pub fn new(statements: StatementSet, warehouse: &'a mut dyn Warehouse) -> Self {
        Self {
            statements,
            warehouse,
        }
    }

    /// Drop every table and create the full schema again. Destroys all data
    /// in the warehouse tables.
    pub fn create_tables(&mut self) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::start();
        self.reset_tables(&mut summary)?;
        summary.log();
        Ok(summary)
    }

    /// Load new source data and append it to the star schema. Dimension and
    /// fact tables are created if missing and otherwise left intact; staging
    /// tables are replaced.
    pub fn etl(&mut self) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::start();
        info!("Ensuring all tables exist...");
        execute_all(self.warehouse, &self.statements.create_tables, &mut summary)?;
        info!("Replacing staging tables...");
        execute_all(self.warehouse, &self.statements.refresh_staging, &mut summary)?;
        self.load_and_transform(&mut summary)?;
        summary.log();
        Ok(summary)
    }

    /// Full reset followed by load and transform.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::start();
        self.reset_tables(&mut summary)?;
        self.load_and_transform(&mut summary)?;
        summary.log();
        Ok(summary)
    }

    pub fn verify(&mut self) -> Result<(), PipelineError> {
        verify_schema(self.warehouse, self.statements.dialect)
    }

    fn reset_tables(&mut self, summary: &mut RunSummary) -> Result<(), PipelineError> {
        warn!(
            "Dropping all warehouse tables on {}...",
            self.warehouse.name()
        );
        execute_all(self.warehouse, &self.statements.drop_tables, summary)?;
        info!("Creating tables...");
        execute_all(self.warehouse, &self.statements.create_tables, summary)
    }

    fn load_and_transform(&mut self, summary: &mut RunSummary) -> Result<(), PipelineError> {
        info!("Loading staging tables...");
        copy_all(self.warehouse, &self.statements.copy_tables, summary)?;
        info!("Transforming into the star schema...");
        execute_all(self.warehouse, &self.statements.insert_tables, summary)
    }
}
