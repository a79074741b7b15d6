//! Common test infrastructure
//!
//! Builds a throwaway local warehouse plus source files on disk, wired
//! through the same configuration path the binary uses.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{event, TestWarehouse};
//!
//! #[test]
//! fn test_loads_events() {
//!     let mut test = TestWarehouse::new();
//!     test.write_events("events.json", &[event(7, "NextSong", 1_000)]);
//!     test.run().unwrap();
//!     assert_eq!(test.count("songplays"), 1);
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::{event, song, TestWarehouse};
