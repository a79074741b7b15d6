use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pezzottify_warehouse::config::{CliConfig, FileConfig, PipelineConfig};
use pezzottify_warehouse::statements::{Statement, StatementSet, WriteMode};
use pezzottify_warehouse::{warehouse, Dialect, Pipeline, PipelineError};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "warehouse-etl")]
#[command(about = "Load listening logs and song metadata into the analytics warehouse")]
struct CliArgs {
    /// Path to the TOML settings file.
    #[clap(short, long, default_value = "warehouse.toml", value_parser = parse_path)]
    pub config: PathBuf,

    /// Use a local SQLite database file as the warehouse.
    #[clap(long, value_parser = parse_path)]
    pub sqlite_db: Option<PathBuf>,

    /// How transforms treat rows already present in the target tables.
    #[clap(long, value_enum)]
    pub write_mode: Option<WriteMode>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop and re-create every table. Destroys all warehouse data.
    CreateTables,
    /// Load the source files and append them to the star schema.
    Etl,
    /// Drop and re-create every table, then load and transform.
    Run,
    /// Print the statements without connecting to the warehouse. Connection
    /// settings are not required.
    Print {
        /// Render for this dialect instead of the configured backend's.
        #[arg(long, value_enum)]
        dialect: Option<Dialect>,

        #[arg(long, value_enum, default_value_t = Section::All)]
        section: Section,
    },
    /// Check the live tables against their declarations.
    Verify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Section {
    Drop,
    Create,
    Copy,
    Insert,
    All,
}

fn print_statements(statements: &StatementSet, section: Section) {
    let copies = || {
        statements
            .copy_tables
            .iter()
            .map(|c| Statement::new(c.label(), c.to_sql()))
            .collect::<Vec<_>>()
    };
    let selected = match section {
        Section::Drop => statements.drop_tables.clone(),
        Section::Create => statements.create_tables.clone(),
        Section::Copy => copies(),
        Section::Insert => statements.insert_tables.clone(),
        Section::All => statements.all(),
    };
    for statement in selected {
        println!("-- {}", statement.label);
        println!("{};\n", statement.sql.trim_end_matches(';'));
    }
}

/// Open the configured warehouse and run `action` against it.
fn with_pipeline<F>(config: &PipelineConfig, action: F) -> Result<()>
where
    F: FnOnce(&mut Pipeline<'_>) -> Result<(), PipelineError>,
{
    let settings = config
        .warehouse
        .as_ref()
        .context("No warehouse connection settings")?;
    info!(
        "Using {} warehouse, write mode {:?}",
        config.dialect(),
        config.write_mode
    );
    let mut warehouse = warehouse::open(settings).context("Failed to open warehouse")?;
    let mut pipeline = Pipeline::new(
        StatementSet::build(config, config.dialect()),
        warehouse.as_mut(),
    );
    action(&mut pipeline)?;
    info!("Done.");
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = FileConfig::load(&cli_args.config)?;
    let cli_config = CliConfig {
        sqlite_db: cli_args.sqlite_db.clone(),
        write_mode: cli_args.write_mode,
        statements_only: matches!(cli_args.command, Command::Print { .. }),
    };
    let config = PipelineConfig::resolve(&cli_config, Some(file_config))
        .with_context(|| format!("Invalid configuration in {:?}", cli_args.config))?;

    match cli_args.command {
        Command::Print { dialect, section } => {
            let statements = StatementSet::build(&config, dialect.unwrap_or(config.dialect()));
            print_statements(&statements, section);
            Ok(())
        }
        Command::CreateTables => with_pipeline(&config, |p| p.create_tables().map(|_| ())),
        Command::Etl => with_pipeline(&config, |p| p.etl().map(|_| ())),
        Command::Run => with_pipeline(&config, |p| p.run().map(|_| ())),
        Command::Verify => with_pipeline(&config, |p| {
            p.verify()?;
            info!("Schema verified.");
            Ok(())
        }),
    }
}
