//! INSERT ... SELECT statements reshaping the staging tables into the star schema.
//!
//! Each statement reads only the staging tables (plus, in
//! [`WriteMode::SkipExisting`], its own target) and appends to one table.
//! Only `page = 'NextSong'` events describe song plays; every event-derived
//! transform applies that filter.

use super::Statement;
use crate::dialect::{DatePart, Dialect};
use clap::ValueEnum;

const SONG_PLAYED_PAGE: &str = "NextSong";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WriteMode {
    /// Plain appends; rerunning over the same staging data duplicates rows.
    #[default]
    Append,
    /// Skip rows whose key already exists in the target table.
    SkipExisting,
}

fn users_insert(mode: WriteMode) -> String {
    let skip_existing = match mode {
        WriteMode::Append => "",
        WriteMode::SkipExisting => {
            "\n  AND NOT EXISTS (SELECT 1 FROM users AS u WHERE u.user_id = ranked.user_id)"
        }
    };
    // Most recent play wins; equal timestamps fall back to the later session,
    // then the later item within the session.
    format!(
        "INSERT INTO users (user_id, first_name, last_name, gender, level)
SELECT user_id, first_name, last_name, gender, level
FROM (
    SELECT user_id, first_name, last_name, gender, level,
           ROW_NUMBER() OVER (
               PARTITION BY user_id
               ORDER BY ts DESC NULLS LAST, session_id DESC NULLS LAST, item_in_session DESC NULLS LAST
           ) AS recency_rank
    FROM staging_events
    WHERE page = '{SONG_PLAYED_PAGE}' AND user_id IS NOT NULL
) AS ranked
WHERE recency_rank = 1{skip_existing}"
    )
}

fn songs_insert(mode: WriteMode) -> String {
    let skip_existing = match mode {
        WriteMode::Append => "",
        WriteMode::SkipExisting => {
            "\nWHERE NOT EXISTS (SELECT 1 FROM songs AS s WHERE s.song_id = ss.song_id)"
        }
    };
    format!(
        "INSERT INTO songs (song_id, title, artist_id, year, duration)
SELECT song_id, title, artist_id, year, duration
FROM staging_songs AS ss{skip_existing}"
    )
}

fn artists_insert(mode: WriteMode) -> String {
    let skip_existing = match mode {
        WriteMode::Append => "",
        WriteMode::SkipExisting => {
            "\nWHERE NOT EXISTS (SELECT 1 FROM artists AS a WHERE a.artist_id = ss.artist_id)"
        }
    };
    format!(
        "INSERT INTO artists (artist_id, name, location, latitude, longitude)
SELECT DISTINCT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM staging_songs AS ss{skip_existing}"
    )
}

fn time_insert(dialect: Dialect, mode: WriteMode) -> String {
    let start_time = dialect.epoch_millis_to_timestamp("ts");
    let parts = [
        (DatePart::Hour, "hour"),
        (DatePart::Day, "day"),
        (DatePart::Week, "week"),
        (DatePart::Month, "month"),
        (DatePart::Year, "year"),
        (DatePart::Weekday, "weekday"),
    ]
    .iter()
    .map(|(part, alias)| format!("       {} AS {alias}", dialect.date_part(*part, "start_time")))
    .collect::<Vec<_>>()
    .join(",\n");
    let skip_existing = match mode {
        WriteMode::Append => "",
        WriteMode::SkipExisting => {
            "\nWHERE NOT EXISTS (SELECT 1 FROM time AS t WHERE t.start_time = plays.start_time)"
        }
    };
    format!(
        "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
SELECT start_time,
{parts}
FROM (
    SELECT DISTINCT {start_time} AS start_time
    FROM staging_events
    WHERE page = '{SONG_PLAYED_PAGE}'
) AS plays{skip_existing}"
    )
}

fn songplays_insert(dialect: Dialect, mode: WriteMode) -> String {
    let start_time = dialect.epoch_millis_to_timestamp("se.ts");
    let skip_existing = match mode {
        WriteMode::Append => String::new(),
        WriteMode::SkipExisting => format!(
            "\n  AND NOT EXISTS (
      SELECT 1 FROM songplays AS sp
      WHERE sp.start_time = {start_time}
        AND sp.user_id = se.user_id
        AND sp.session_id = se.session_id
  )"
        ),
    };
    // A title/artist pair may appear under several song ids; the lowest id is
    // used so that every play yields exactly one fact.
    format!(
        "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT {start_time} AS start_time,
       se.user_id,
       se.level,
       ss.song_id,
       ss.artist_id,
       se.session_id,
       se.location,
       se.user_agent
FROM staging_events AS se
LEFT JOIN (
    SELECT title, artist_name, song_id, artist_id,
           ROW_NUMBER() OVER (PARTITION BY title, artist_name ORDER BY song_id) AS match_rank
    FROM staging_songs
) AS ss ON se.song = ss.title
       AND se.artist = ss.artist_name
       AND ss.match_rank = 1
WHERE se.page = '{SONG_PLAYED_PAGE}'{skip_existing}"
    )
}

/// The five transforms, dimensions first so the fact rows find their keys.
pub fn insert_table_queries(dialect: Dialect, mode: WriteMode) -> Vec<Statement> {
    vec![
        Statement::new("insert users", users_insert(mode)),
        Statement::new("insert songs", songs_insert(mode)),
        Statement::new("insert artists", artists_insert(mode)),
        Statement::new("insert time", time_insert(dialect, mode)),
        Statement::new("insert songplays", songplays_insert(dialect, mode)),
    ]
}
