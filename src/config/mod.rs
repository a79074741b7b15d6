mod file_config;

pub use file_config::{
    ClusterConfig, FileConfig, IamRoleConfig, PipelineFileConfig, S3Config, WarehouseConfig,
};

use crate::dialect::Dialect;
use crate::error::ConfigError;
use crate::statements::WriteMode;
use clap::ValueEnum;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::PathBuf;

const DEFAULT_REDSHIFT_PORT: u16 = 5439;

lazy_static! {
    static ref IAM_ROLE_ARN: Regex =
        Regex::new(r"^arn:aws[a-z-]*:iam::\d{12}:role/[\w+=,.@/-]+$")
            .expect("Failed to compile IAM role ARN pattern");
    static ref AWS_REGION: Regex =
        Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d+$").expect("Failed to compile region pattern");
}

/// CLI arguments that can be used for config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub sqlite_db: Option<PathBuf>,
    pub write_mode: Option<WriteMode>,
    /// Only statements will be rendered; connection settings are not required.
    pub statements_only: bool,
}

/// Locations of the raw source files.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
}

#[derive(Debug, Clone)]
pub struct RedshiftSettings {
    pub host: String,
    pub port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
}

#[derive(Debug, Clone)]
pub enum WarehouseSettings {
    Redshift(RedshiftSettings),
    Sqlite { path: PathBuf },
}

/// Validated pipeline configuration, built once at start-up and passed to
/// whatever needs it.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sources: SourceSettings,
    pub iam_role_arn: String,
    pub region: String,
    pub backend: Dialect,
    /// Absent when resolved with `statements_only`.
    pub warehouse: Option<WarehouseSettings>,
    pub write_mode: WriteMode,
}

fn required(
    value: Option<String>,
    section: &'static str,
    key: &'static str,
) -> Result<String, ConfigError> {
    let value = value.ok_or(ConfigError::Missing { section, key })?;
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid {
            section,
            key,
            reason: "value is empty".to_string(),
        });
    }
    if value.chars().any(char::is_control) {
        return Err(ConfigError::Invalid {
            section,
            key,
            reason: "value contains control characters".to_string(),
        });
    }
    Ok(value)
}

fn require_s3_location(value: &str, key: &'static str) -> Result<(), ConfigError> {
    if !value.starts_with("s3://") {
        return Err(ConfigError::Invalid {
            section: "s3",
            key,
            reason: format!("expected an s3:// location, got '{}'", value),
        });
    }
    Ok(())
}

fn parse_write_mode(value: &str) -> Result<WriteMode, ConfigError> {
    WriteMode::from_str(&value.replace('_', "-"), true).map_err(|_| ConfigError::Invalid {
        section: "pipeline",
        key: "write_mode",
        reason: format!("unknown write mode '{}', expected append or skip_existing", value),
    })
}

impl PipelineConfig {
    /// Resolve configuration from CLI arguments and the settings file.
    /// File values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self, ConfigError> {
        let file = file_config.unwrap_or_default();
        let s3 = file.s3.unwrap_or_default();
        let iam_role = file.iam_role.unwrap_or_default();
        let cluster = file.cluster.unwrap_or_default();
        let warehouse = file.warehouse.unwrap_or_default();
        let pipeline = file.pipeline.unwrap_or_default();

        let sources = SourceSettings {
            log_data: required(s3.log_data, "s3", "log_data")?,
            log_jsonpath: required(s3.log_jsonpath, "s3", "log_jsonpath")?,
            song_data: required(s3.song_data, "s3", "song_data")?,
        };

        let iam_role_arn = required(iam_role.arn, "iam_role", "arn")?;
        if !IAM_ROLE_ARN.is_match(&iam_role_arn) {
            return Err(ConfigError::Invalid {
                section: "iam_role",
                key: "arn",
                reason: format!("'{}' is not an IAM role ARN", iam_role_arn),
            });
        }

        let region = required(cluster.region.clone(), "cluster", "region")?;
        if !AWS_REGION.is_match(&region) {
            return Err(ConfigError::Invalid {
                section: "cluster",
                key: "region",
                reason: format!("'{}' is not a region name", region),
            });
        }

        let sqlite_path = warehouse
            .sqlite_path
            .map(PathBuf::from)
            .or_else(|| cli.sqlite_db.clone());
        let backend = match warehouse.backend.as_deref() {
            Some(name) => Dialect::from_str(name, true).map_err(|_| ConfigError::Invalid {
                section: "warehouse",
                key: "backend",
                reason: format!("unknown backend '{}', expected redshift or sqlite", name),
            })?,
            None if sqlite_path.is_some() => Dialect::Sqlite,
            None => Dialect::Redshift,
        };

        if backend == Dialect::Redshift {
            require_s3_location(&sources.log_data, "log_data")?;
            require_s3_location(&sources.log_jsonpath, "log_jsonpath")?;
            require_s3_location(&sources.song_data, "song_data")?;
        }

        let warehouse = match backend {
            _ if cli.statements_only => None,
            Dialect::Sqlite => Some(WarehouseSettings::Sqlite {
                path: sqlite_path.ok_or(ConfigError::Missing {
                    section: "warehouse",
                    key: "sqlite_path",
                })?,
            }),
            Dialect::Redshift => Some(WarehouseSettings::Redshift(RedshiftSettings {
                host: required(cluster.host, "cluster", "host")?,
                port: cluster.port.unwrap_or(DEFAULT_REDSHIFT_PORT),
                db_name: required(cluster.db_name, "cluster", "db_name")?,
                db_user: required(cluster.db_user, "cluster", "db_user")?,
                db_password: required(cluster.db_password, "cluster", "db_password")?,
            })),
        };

        let write_mode = match pipeline.write_mode {
            Some(value) => parse_write_mode(&value)?,
            None => cli.write_mode.unwrap_or_default(),
        };

        Ok(Self {
            sources,
            iam_role_arn,
            region,
            backend,
            warehouse,
            write_mode,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.backend
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::Path;

    const SAMPLE_TOML: &str = r#"
[s3]
log_data = "s3://udacity-dend/log_data"
log_jsonpath = "s3://udacity-dend/log_json_path.json"
song_data = "s3://udacity-dend/song_data"

[iam_role]
arn = "arn:aws:iam::123456789012:role/dwhRole"

[cluster]
region = "us-west-2"
host = "dwh.abc123.us-west-2.redshift.amazonaws.com"
db_name = "dwh"
db_user = "dwhuser"
db_password = "Passw0rd"
"#;

    fn parse(toml: &str) -> FileConfig {
        FileConfig::parse(toml, Path::new("test.toml")).unwrap()
    }

    pub(crate) fn sample_config() -> PipelineConfig {
        PipelineConfig::resolve(&CliConfig::default(), Some(parse(SAMPLE_TOML))).unwrap()
    }

    #[test]
    fn test_resolves_redshift_settings() {
        let config = sample_config();
        assert_eq!(config.dialect(), Dialect::Redshift);
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.write_mode, WriteMode::Append);
        match config.warehouse {
            Some(WarehouseSettings::Redshift(settings)) => {
                assert_eq!(settings.port, 5439);
                assert_eq!(settings.db_name, "dwh");
            }
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn test_missing_key_is_reported_with_section() {
        let toml = SAMPLE_TOML.replace("song_data = \"s3://udacity-dend/song_data\"\n", "");
        let err = PipelineConfig::resolve(&CliConfig::default(), Some(parse(&toml))).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                section: "s3",
                key: "song_data"
            }
        ));
    }

    #[test]
    fn test_empty_location_is_rejected() {
        let toml = SAMPLE_TOML.replace("s3://udacity-dend/log_data", "  ");
        let err = PipelineConfig::resolve(&CliConfig::default(), Some(parse(&toml))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "log_data", .. }));
    }

    #[test]
    fn test_malformed_arn_and_region_are_rejected() {
        let toml = SAMPLE_TOML.replace("arn:aws:iam::123456789012:role/dwhRole", "dwhRole");
        let err = PipelineConfig::resolve(&CliConfig::default(), Some(parse(&toml))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "arn", .. }));

        let toml = SAMPLE_TOML.replace("us-west-2\"", "us west 2\"");
        let err = PipelineConfig::resolve(&CliConfig::default(), Some(parse(&toml))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "region", .. }));
    }

    #[test]
    fn test_redshift_requires_s3_locations() {
        let toml = SAMPLE_TOML.replace("s3://udacity-dend/song_data", "/tmp/song_data");
        let err = PipelineConfig::resolve(&CliConfig::default(), Some(parse(&toml))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "song_data", .. }));
    }

    #[test]
    fn test_cli_sqlite_path_selects_local_backend() {
        let toml = SAMPLE_TOML.replace("s3://udacity-dend/song_data", "/tmp/song_data");
        let cli = CliConfig {
            sqlite_db: Some(PathBuf::from("/tmp/dwh.db")),
            write_mode: Some(WriteMode::SkipExisting),
            ..CliConfig::default()
        };
        let config = PipelineConfig::resolve(&cli, Some(parse(&toml))).unwrap();
        assert_eq!(config.dialect(), Dialect::Sqlite);
        assert_eq!(config.write_mode, WriteMode::SkipExisting);
    }

    #[test]
    fn test_file_write_mode_overrides_cli() {
        let toml = format!("{SAMPLE_TOML}\n[pipeline]\nwrite_mode = \"skip_existing\"\n");
        let cli = CliConfig {
            sqlite_db: None,
            write_mode: Some(WriteMode::Append),
            ..CliConfig::default()
        };
        let config = PipelineConfig::resolve(&cli, Some(parse(&toml))).unwrap();
        assert_eq!(config.write_mode, WriteMode::SkipExisting);

        let toml = format!("{SAMPLE_TOML}\n[pipeline]\nwrite_mode = \"upsert\"\n");
        let err = PipelineConfig::resolve(&cli, Some(parse(&toml))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "write_mode", .. }));
    }

    #[test]
    fn test_statements_only_skips_connection_settings() {
        let toml = SAMPLE_TOML
            .lines()
            .filter(|line| !line.starts_with("host") && !line.starts_with("db_"))
            .collect::<Vec<_>>()
            .join("\n");
        let err = PipelineConfig::resolve(&CliConfig::default(), Some(parse(&toml))).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "host", .. }));

        let cli = CliConfig {
            statements_only: true,
            ..CliConfig::default()
        };
        let config = PipelineConfig::resolve(&cli, Some(parse(&toml))).unwrap();
        assert_eq!(config.dialect(), Dialect::Redshift);
        assert!(config.warehouse.is_none());

        // Statement content is still validated.
        let toml = toml.replace("s3://udacity-dend/song_data", "/tmp/song_data");
        let err = PipelineConfig::resolve(&cli, Some(parse(&toml))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "song_data", .. }));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let toml = format!("{SAMPLE_TOML}\n[warehouse]\nbackend = \"bigquery\"\n");
        let err = PipelineConfig::resolve(&CliConfig::default(), Some(parse(&toml))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "backend", .. }));
    }

    #[test]
    fn test_explicit_sqlite_backend_requires_a_path() {
        let toml = format!("{SAMPLE_TOML}\n[warehouse]\nbackend = \"sqlite\"\n");
        let err = PipelineConfig::resolve(&CliConfig::default(), Some(parse(&toml))).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                section: "warehouse",
                key: "sqlite_path"
            }
        ));
    }
}
