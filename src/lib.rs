//! # tagsift
//!
//! Real-time filtering and tagging for a music library.
//!
//! - [`dsl`] - search query language: tokenizer, filter builders, evaluator
//! - [`tags`] - the `comment && tag1; tag2` overlay codec and tag commands
//! - [`library`] - in-memory track records, the store seam, and
//!   [`library::EditHistory`] undo/redo for hosts that keep a library open
//!   across edits (the CLI applies one edit per run and does not use it)
//! - [`config`] - host settings
//! - [`sinks`] - JSON output for matched tracks
//! - [`app`] - command line front end
//!
//! ```
//! use tagsift::dsl::{evaluate_query, parse_query};
//! use tagsift::library::Track;
//!
//! let track = Track {
//!     id: 1,
//!     artist: Some("Prince".into()),
//!     comment_raw: Some("live && Funk; Classic".into()),
//!     bpm: Some(124),
//!     ..Track::default()
//! };
//!
//! assert!(evaluate_query(&parse_query("artist:prince tag:funk bpm:120-130"), &track));
//! assert!(!evaluate_query(&parse_query("-tag:classic"), &track));
//! ```

pub mod app;
pub mod config;
pub mod dsl;
pub mod library;
pub mod sinks;
pub mod tags;
