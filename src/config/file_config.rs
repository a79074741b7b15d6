use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// Settings file model. Every key is optional here; required keys are
/// enforced when the file is resolved into a `PipelineConfig`.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub s3: Option<S3Config>,
    pub iam_role: Option<IamRoleConfig>,
    pub cluster: Option<ClusterConfig>,
    pub warehouse: Option<WarehouseConfig>,
    pub pipeline: Option<PipelineFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct S3Config {
    pub log_data: Option<String>,
    pub log_jsonpath: Option<String>,
    pub song_data: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct IamRoleConfig {
    pub arn: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ClusterConfig {
    pub region: Option<String>,
    // Connection settings, only read by the redshift backend
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct WarehouseConfig {
    /// "redshift" or "sqlite"
    pub backend: Option<String>,
    pub sqlite_path: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PipelineFileConfig {
    /// "append" or "skip_existing"
    pub write_mode: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
