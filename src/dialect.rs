//! SQL dialect differences between the Redshift cluster and the local SQLite warehouse.
//!
//! Statements are built once per dialect; everything that cannot be written
//! portably (epoch conversion, date parts, identity columns, cascading drops)
//! is rendered here.

use clap::ValueEnum;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dialect {
    Redshift,
    Sqlite,
}

/// Calendar components extracted from an event timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Hour,
    Day,
    /// ISO-8601 week number.
    Week,
    Month,
    Year,
    /// Day of week, Sunday = 0 through Saturday = 6.
    Weekday,
}

impl Dialect {
    /// Expression converting a millisecond epoch column into a timestamp,
    /// truncated to whole seconds.
    pub fn epoch_millis_to_timestamp(&self, column: &str) -> String {
        match self {
            Dialect::Redshift => {
                format!("(TIMESTAMP 'epoch' + {column} / 1000 * INTERVAL '1 second')")
            }
            Dialect::Sqlite => format!("datetime({column} / 1000, 'unixepoch')"),
        }
    }

    /// Expression extracting `part` from a timestamp expression as an integer.
    pub fn date_part(&self, part: DatePart, timestamp: &str) -> String {
        match self {
            Dialect::Redshift => {
                let name = match part {
                    DatePart::Hour => "hour",
                    DatePart::Day => "day",
                    DatePart::Week => "week",
                    DatePart::Month => "month",
                    DatePart::Year => "year",
                    DatePart::Weekday => "dow",
                };
                format!("DATE_PART('{name}', {timestamp})")
            }
            Dialect::Sqlite => match part {
                DatePart::Hour => format!("CAST(strftime('%H', {timestamp}) AS INTEGER)"),
                DatePart::Day => format!("CAST(strftime('%d', {timestamp}) AS INTEGER)"),
                // The ISO week is the week containing that week's Thursday.
                DatePart::Week => format!(
                    "((CAST(strftime('%j', date({timestamp}, '-3 days', 'weekday 4')) AS INTEGER) - 1) / 7 + 1)"
                ),
                DatePart::Month => format!("CAST(strftime('%m', {timestamp}) AS INTEGER)"),
                DatePart::Year => format!("CAST(strftime('%Y', {timestamp}) AS INTEGER)"),
                DatePart::Weekday => format!("CAST(strftime('%w', {timestamp}) AS INTEGER)"),
            },
        }
    }

    /// Column definition for a warehouse-generated surrogate key.
    pub fn identity_column(&self, name: &str) -> String {
        match self {
            Dialect::Redshift => format!("{name} INTEGER IDENTITY(0,1) PRIMARY KEY"),
            Dialect::Sqlite => format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT"),
        }
    }

    pub fn supports_drop_cascade(&self) -> bool {
        matches!(self, Dialect::Redshift)
    }

    /// Whether PRIMARY KEY and REFERENCES clauses are declared. Redshift
    /// records them without enforcing them; SQLite would enforce them and
    /// reject rows Redshift loads, so they are left out there.
    pub fn declares_key_constraints(&self) -> bool {
        matches!(self, Dialect::Redshift)
    }

    /// Lower-cased type name the warehouse reports back for a declared type.
    pub fn reported_type_name(&self, sql_type: &crate::schema::SqlType) -> &'static str {
        use crate::schema::SqlType;
        match self {
            Dialect::Redshift => match sql_type {
                SqlType::Varchar | SqlType::Text => "character varying",
                SqlType::Integer => "integer",
                SqlType::BigInt => "bigint",
                SqlType::Float => "double precision",
                SqlType::Timestamp => "timestamp without time zone",
            },
            Dialect::Sqlite => match sql_type {
                SqlType::Varchar => "varchar",
                SqlType::Text => "text",
                SqlType::Integer => "integer",
                SqlType::BigInt => "bigint",
                SqlType::Float => "float",
                SqlType::Timestamp => "timestamp",
            },
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Redshift => write!(f, "redshift"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}
