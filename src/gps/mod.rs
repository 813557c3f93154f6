// src/gps/mod.rs
//! NMEA sentence handling and position fixes

pub mod data;
pub mod sentence;

pub use data::{Fix, FixState};
pub use sentence::{parse, parse_with, ChecksumPolicy, ParseError, Sentence, SentenceKind};
