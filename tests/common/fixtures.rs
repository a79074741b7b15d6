//! Test fixtures: source files on disk plus a SQLite warehouse

#![allow(dead_code)]

use super::constants::*;
use pezzottify_warehouse::config::{CliConfig, FileConfig, PipelineConfig, WarehouseSettings};
use pezzottify_warehouse::{
    Dialect, Pipeline, PipelineError, RunSummary, SqliteWarehouse, StatementSet,
};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A user-activity record with the field names of the raw log files.
pub fn event(user_id: i64, page: &str, ts: i64) -> Value {
    json!({
        "artist": null,
        "auth": "Logged In",
        "firstName": "Jo",
        "gender": "F",
        "itemInSession": 0,
        "lastName": "Doe",
        "length": null,
        "level": "free",
        "location": "LA",
        "method": "PUT",
        "page": page,
        "registration": 1540919166796.0,
        "sessionId": 5,
        "song": null,
        "status": 200,
        "ts": ts,
        "userAgent": "UA1",
        "userId": user_id.to_string(),
    })
}

/// A song-catalog record with the field names of the raw song files.
pub fn song(song_id: &str, title: &str, artist_id: &str, artist_name: &str) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": 40.7,
        "artist_longitude": -74.0,
        "artist_location": "NYC",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": 180.5,
        "year": 2001,
    })
}

/// A throwaway warehouse configured through a real settings file.
///
/// Source files go under `log_data/` and `song_data/` inside a temporary
/// directory that also holds the JSONPaths file and the database.
pub struct TestWarehouse {
    pub dir: TempDir,
    pub config_path: PathBuf,
    pub config: PipelineConfig,
    pub warehouse: SqliteWarehouse,
}

impl TestWarehouse {
    pub fn new() -> Self {
        Self::with_write_mode("append")
    }

    pub fn with_write_mode(write_mode: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path();
        fs::create_dir_all(root.join("log_data")).expect("Failed to create log_data");
        fs::create_dir_all(root.join("song_data")).expect("Failed to create song_data");

        let jsonpaths = json!({ "jsonpaths": EVENT_JSONPATHS });
        fs::write(root.join("log_json_path.json"), jsonpaths.to_string())
            .expect("Failed to write jsonpaths file");

        let config_path = root.join("warehouse.toml");
        let settings = format!(
            r#"
[s3]
log_data = "{root}/log_data"
log_jsonpath = "file://{root}/log_json_path.json"
song_data = "{root}/song_data"

[iam_role]
arn = "{TEST_IAM_ROLE_ARN}"

[cluster]
region = "{TEST_REGION}"

[warehouse]
backend = "sqlite"
sqlite_path = "{root}/warehouse.db"

[pipeline]
write_mode = "{write_mode}"
"#,
            root = root.display(),
        );
        fs::write(&config_path, settings).expect("Failed to write settings file");

        let file_config = FileConfig::load(&config_path).expect("Failed to load settings");
        let config = PipelineConfig::resolve(&CliConfig::default(), Some(file_config))
            .expect("Failed to resolve settings");
        let warehouse = match &config.warehouse {
            Some(WarehouseSettings::Sqlite { path }) => {
                SqliteWarehouse::open(path).expect("Failed to open warehouse")
            }
            other => panic!("expected a sqlite warehouse, got {:?}", other),
        };

        Self {
            dir,
            config_path,
            config,
            warehouse,
        }
    }

    /// Write one newline-delimited log file under `log_data/`.
    pub fn write_events(&self, file_name: &str, events: &[Value]) {
        let content: Vec<String> = events.iter().map(Value::to_string).collect();
        let path = self.dir.path().join("log_data").join(file_name);
        fs::write(path, content.join("\n")).expect("Failed to write events");
    }

    /// Write one song file under `song_data/`.
    pub fn write_song(&self, file_name: &str, song: Value) {
        let path = self.dir.path().join("song_data").join(file_name);
        fs::write(path, song.to_string()).expect("Failed to write song");
    }

    pub fn remove_source_files(&self) {
        for dir in ["log_data", "song_data"] {
            let path = self.dir.path().join(dir);
            fs::remove_dir_all(&path).expect("Failed to clear source dir");
            fs::create_dir_all(&path).expect("Failed to recreate source dir");
        }
    }

    pub fn pipeline(&mut self) -> Pipeline<'_> {
        Pipeline::new(
            StatementSet::build(&self.config, Dialect::Sqlite),
            &mut self.warehouse,
        )
    }

    pub fn create_tables(&mut self) -> Result<RunSummary, PipelineError> {
        self.pipeline().create_tables()
    }

    pub fn etl(&mut self) -> Result<RunSummary, PipelineError> {
        self.pipeline().etl()
    }

    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        self.pipeline().run()
    }

    pub fn verify(&mut self) -> Result<(), PipelineError> {
        self.pipeline().verify()
    }

    pub fn connection(&self) -> &Connection {
        self.warehouse.connection()
    }

    pub fn count(&self, table: &str) -> i64 {
        self.connection()
            .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| {
                row.get(0)
            })
            .expect("Failed to count rows")
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut stmt = self
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .expect("Failed to list tables");
        stmt.query_map([], |row| row.get(0))
            .expect("Failed to list tables")
            .collect::<Result<Vec<String>, _>>()
            .expect("Failed to read table names")
    }
}
