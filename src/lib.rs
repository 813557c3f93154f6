// src/lib.rs
//! GPS Collector Library
//!
//! Parses NMEA-0183 sentences, tracks the latest GGA position fix and
//! appends it to a line-oriented log that is uploaded when collection stops.

pub mod collector;
pub mod config;
pub mod display;
pub mod error;
pub mod gps;
pub mod simulation;
pub mod sink;
pub mod source;
pub mod tracker;
pub mod upload;

// Re-export main types for convenience
pub use collector::{run_session, CollectionSummary, GpsCollector};
pub use error::{GpsError, Result};
pub use gps::{Fix, FixState, ParseError, Sentence, SentenceKind};
pub use sink::FixLog;
pub use source::{BatchSource, GpsSource};
pub use tracker::{BatchSummary, FixTracker};
