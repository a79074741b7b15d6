//! Table definitions for the listening-history warehouse.
//!
//! Two staging tables mirror the raw source files; the star schema is four
//! dimensions (`users`, `songs`, `artists`, `time`) and one fact table
//! (`songplays`).

use super::table::{Column, ForeignKey, SqlType, Table, TableKind};
use crate::warehouse_column;

// =============================================================================
// Staging Tables
// =============================================================================

/// Raw user-activity log records, one per event.
pub const STAGING_EVENTS_TABLE: Table = Table {
    name: "staging_events",
    kind: TableKind::Staging,
    columns: &[
        warehouse_column!("artist", &SqlType::Varchar),
        warehouse_column!("auth", &SqlType::Varchar),
        warehouse_column!("first_name", &SqlType::Varchar),
        warehouse_column!("gender", &SqlType::Varchar),
        warehouse_column!("item_in_session", &SqlType::Integer),
        warehouse_column!("last_name", &SqlType::Varchar),
        warehouse_column!("length", &SqlType::Float),
        warehouse_column!("level", &SqlType::Varchar),
        warehouse_column!("location", &SqlType::Varchar),
        warehouse_column!("method", &SqlType::Varchar),
        warehouse_column!("page", &SqlType::Varchar), // 'NextSong' marks a song play
        warehouse_column!("registration", &SqlType::Float),
        warehouse_column!("session_id", &SqlType::Integer),
        warehouse_column!("song", &SqlType::Varchar),
        warehouse_column!("status", &SqlType::Integer),
        warehouse_column!("ts", &SqlType::BigInt), // milliseconds since epoch
        warehouse_column!("user_agent", &SqlType::Varchar),
        warehouse_column!("user_id", &SqlType::Integer),
    ],
};

/// Raw song catalog records.
pub const STAGING_SONGS_TABLE: Table = Table {
    name: "staging_songs",
    kind: TableKind::Staging,
    columns: &[
        warehouse_column!("num_songs", &SqlType::Integer),
        warehouse_column!("artist_id", &SqlType::Varchar),
        warehouse_column!("artist_latitude", &SqlType::Float),
        warehouse_column!("artist_longitude", &SqlType::Float),
        warehouse_column!("artist_location", &SqlType::Varchar),
        warehouse_column!("artist_name", &SqlType::Varchar),
        warehouse_column!("song_id", &SqlType::Varchar),
        warehouse_column!("title", &SqlType::Varchar),
        warehouse_column!("duration", &SqlType::Float),
        warehouse_column!("year", &SqlType::Integer),
    ],
};

// =============================================================================
// Dimension Tables
// =============================================================================

pub const USERS_TABLE: Table = Table {
    name: "users",
    kind: TableKind::Dimension,
    columns: &[
        warehouse_column!("user_id", &SqlType::Integer, is_primary_key = true),
        warehouse_column!("first_name", &SqlType::Text),
        warehouse_column!("last_name", &SqlType::Text),
        warehouse_column!("gender", &SqlType::Text),
        warehouse_column!("level", &SqlType::Text), // 'free' or 'paid'
    ],
};

pub const SONGS_TABLE: Table = Table {
    name: "songs",
    kind: TableKind::Dimension,
    columns: &[
        warehouse_column!("song_id", &SqlType::Text, is_primary_key = true),
        warehouse_column!("title", &SqlType::Text, non_null = true),
        warehouse_column!("artist_id", &SqlType::Text),
        warehouse_column!("year", &SqlType::Integer),
        warehouse_column!("duration", &SqlType::Float, non_null = true),
    ],
};

pub const ARTISTS_TABLE: Table = Table {
    name: "artists",
    kind: TableKind::Dimension,
    columns: &[
        warehouse_column!("artist_id", &SqlType::Text, is_primary_key = true),
        warehouse_column!("name", &SqlType::Text, non_null = true),
        warehouse_column!("location", &SqlType::Text),
        warehouse_column!("latitude", &SqlType::Float),
        warehouse_column!("longitude", &SqlType::Float),
    ],
};

/// One row per distinct song-play instant.
pub const TIME_TABLE: Table = Table {
    name: "time",
    kind: TableKind::Dimension,
    columns: &[
        warehouse_column!("start_time", &SqlType::Timestamp, is_primary_key = true),
        warehouse_column!("hour", &SqlType::Integer),
        warehouse_column!("day", &SqlType::Integer),
        warehouse_column!("week", &SqlType::Integer),
        warehouse_column!("month", &SqlType::Integer),
        warehouse_column!("year", &SqlType::Integer),
        warehouse_column!("weekday", &SqlType::Integer), // Sunday = 0
    ],
};

// =============================================================================
// Fact Table
// =============================================================================

pub const SONGPLAYS_TABLE: Table = Table {
    name: "songplays",
    kind: TableKind::Fact,
    columns: &[
        warehouse_column!("songplay_id", &SqlType::Integer, is_identity = true),
        warehouse_column!(
            "start_time",
            &SqlType::Timestamp,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "time",
                foreign_column: "start_time",
            })
        ),
        warehouse_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "users",
                foreign_column: "user_id",
            })
        ),
        warehouse_column!("level", &SqlType::Text),
        warehouse_column!(
            "song_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "songs",
                foreign_column: "song_id",
            })
        ),
        warehouse_column!(
            "artist_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "artist_id",
            })
        ),
        warehouse_column!("session_id", &SqlType::Integer),
        warehouse_column!("location", &SqlType::Text),
        warehouse_column!("user_agent", &SqlType::Text),
    ],
};

/// Foreign-key targets come before the tables referencing them.
pub const CREATE_ORDER: &[&Table] = &[
    &STAGING_EVENTS_TABLE,
    &STAGING_SONGS_TABLE,
    &USERS_TABLE,
    &SONGS_TABLE,
    &ARTISTS_TABLE,
    &TIME_TABLE,
    &SONGPLAYS_TABLE,
];

/// Referencing tables come before their foreign-key targets.
pub const DROP_ORDER: &[&Table] = &[
    &STAGING_EVENTS_TABLE,
    &STAGING_SONGS_TABLE,
    &SONGPLAYS_TABLE,
    &USERS_TABLE,
    &SONGS_TABLE,
    &ARTISTS_TABLE,
    &TIME_TABLE,
];
