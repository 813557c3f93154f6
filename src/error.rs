// src/error.rs
//! Error types for the GPS collector

use std::{fmt, path::PathBuf};

pub type Result<T> = std::result::Result<T, GpsError>;

#[derive(Debug)]
pub enum GpsError {
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Json(serde_json::Error),
    Connection(String),
    /// The fix log could not be opened, written or read.
    SinkUnavailable { path: PathBuf, source: std::io::Error },
    Upload(String),
    Config(String),
    Other(String),
}

impl fmt::Display for GpsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpsError::Io(e) => write!(f, "IO error: {}", e),
            GpsError::Serial(e) => write!(f, "Serial error: {}", e),
            GpsError::Json(e) => write!(f, "JSON error: {}", e),
            GpsError::Connection(msg) => write!(f, "Connection error: {}", msg),
            GpsError::SinkUnavailable { path, source } => {
                write!(f, "Fix log {} unavailable: {}", path.display(), source)
            }
            GpsError::Upload(msg) => write!(f, "Upload error: {}", msg),
            GpsError::Config(msg) => write!(f, "Config error: {}", msg),
            GpsError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for GpsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpsError::Io(e) => Some(e),
            GpsError::Serial(e) => Some(e),
            GpsError::Json(e) => Some(e),
            GpsError::SinkUnavailable { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GpsError {
    fn from(error: std::io::Error) -> Self {
        GpsError::Io(error)
    }
}

impl From<tokio_serial::Error> for GpsError {
    fn from(error: tokio_serial::Error) -> Self {
        GpsError::Serial(error)
    }
}

impl From<serde_json::Error> for GpsError {
    fn from(error: serde_json::Error) -> Self {
        GpsError::Json(error)
    }
}
