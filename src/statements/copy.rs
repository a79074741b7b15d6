//! Bulk-copy commands streaming source files into the staging tables.

use super::quote::quote_literal;
use crate::config::PipelineConfig;
use crate::schema::{Table, STAGING_EVENTS_TABLE, STAGING_SONGS_TABLE};

/// How JSON fields map onto the staging columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
    /// A JSONPaths file listing one path per column, in column order.
    JsonPaths(String),
    /// Object keys matched to column names.
    Auto,
}

#[derive(Debug, Clone)]
pub struct CopyCommand {
    pub table: &'static Table,
    /// Source file, directory or key prefix.
    pub location: String,
    pub iam_role_arn: String,
    pub region: String,
    pub format: JsonFormat,
}

impl CopyCommand {
    pub fn label(&self) -> String {
        format!("copy {}", self.table.name)
    }

    pub fn to_sql(&self) -> String {
        let format = match &self.format {
            JsonFormat::JsonPaths(path) => quote_literal(path),
            JsonFormat::Auto => quote_literal("auto"),
        };
        format!(
            "COPY {} FROM {}\nCREDENTIALS {}\nJSON {}\nREGION {};",
            self.table.name,
            quote_literal(&self.location),
            quote_literal(&format!("aws_iam_role={}", self.iam_role_arn)),
            format,
            quote_literal(&self.region)
        )
    }
}

/// The event-log load followed by the song-catalog load.
pub fn copy_table_queries(config: &PipelineConfig) -> Vec<CopyCommand> {
    vec![
        CopyCommand {
            table: &STAGING_EVENTS_TABLE,
            location: config.sources.log_data.clone(),
            iam_role_arn: config.iam_role_arn.clone(),
            region: config.region.clone(),
            format: JsonFormat::JsonPaths(config.sources.log_jsonpath.clone()),
        },
        CopyCommand {
            table: &STAGING_SONGS_TABLE,
            location: config.sources.song_data.clone(),
            iam_role_arn: config.iam_role_arn.clone(),
            region: config.region.clone(),
            format: JsonFormat::Auto,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_config;

    #[test]
    fn test_event_copy_uses_jsonpaths_file() {
        let copies = copy_table_queries(&sample_config());
        assert_eq!(copies.len(), 2);
        assert_eq!(
            copies[0].to_sql(),
            "COPY staging_events FROM 's3://udacity-dend/log_data'\n\
             CREDENTIALS 'aws_iam_role=arn:aws:iam::123456789012:role/dwhRole'\n\
             JSON 's3://udacity-dend/log_json_path.json'\n\
             REGION 'us-west-2';"
        );
        assert_eq!(copies[0].label(), "copy staging_events");
    }

    #[test]
    fn test_song_copy_uses_auto_mapping() {
        let copies = copy_table_queries(&sample_config());
        let sql = copies[1].to_sql();
        assert!(sql.starts_with("COPY staging_songs FROM 's3://udacity-dend/song_data'"));
        assert!(sql.contains("\nJSON 'auto'\n"));
        assert_eq!(copies[1].format, JsonFormat::Auto);
    }

    #[test]
    fn test_configuration_values_cannot_escape_their_literal() {
        let mut config = sample_config();
        config.sources.song_data = "s3://bucket/x'; DROP TABLE users; --".to_string();
        let sql = copy_table_queries(&config)[1].to_sql();
        assert!(sql.contains("FROM 's3://bucket/x''; DROP TABLE users; --'"));
        assert!(super::super::quote::literals_balanced(&sql));
    }
}
