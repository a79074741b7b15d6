//! Shared test data

#![allow(dead_code)]

pub const TEST_IAM_ROLE_ARN: &str = "arn:aws:iam::123456789012:role/dwhRole";
pub const TEST_REGION: &str = "us-west-2";

pub const SONG_1_ID: &str = "S1";
pub const SONG_1_TITLE: &str = "Song A";
pub const ARTIST_1_ID: &str = "AR1";
pub const ARTIST_1_NAME: &str = "Artist A";

pub const USER_1_ID: i64 = 7;

/// 2001-09-09 01:46:40 UTC
pub const PLAY_1_TS: i64 = 1_000_000_000_000;

/// Column order of the staging_events table, as source-file field names.
pub const EVENT_JSONPATHS: &[&str] = &[
    "$['artist']",
    "$['auth']",
    "$['firstName']",
    "$['gender']",
    "$['itemInSession']",
    "$['lastName']",
    "$['length']",
    "$['level']",
    "$['location']",
    "$['method']",
    "$['page']",
    "$['registration']",
    "$['sessionId']",
    "$['song']",
    "$['status']",
    "$['ts']",
    "$['userAgent']",
    "$['userId']",
];
