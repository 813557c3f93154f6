// src/sink.rs
//! Append-only fix log
//!
//! Every record is one line, `"<latitude>, <longitude>\n"`, or
//! `"None, None\n"` when no fix was available at the time of the call.

use crate::{
    error::{GpsError, Result},
    gps::FixState,
};
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Text written for a record taken before any fix was seen.
pub const NO_FIX_RECORD: &str = "None, None";

/// Default file name of the fix log.
pub const DEFAULT_LOG_FILE: &str = "gps_data.txt";

#[derive(Debug, Clone)]
pub struct FixLog {
    path: PathBuf,
}

impl FixLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record for `state`.
    ///
    /// The file is opened, written, flushed and closed within this call.
    pub fn append(&self, state: &FixState) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.unavailable(e))?;

        writeln!(file, "{}", format_record(state)).map_err(|e| self.unavailable(e))?;
        file.flush().map_err(|e| self.unavailable(e))?;

        Ok(())
    }

    /// Read the whole log back, verbatim.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| self.unavailable(e))
    }

    /// Read the log back as coordinates; `None` entries are sentinel records.
    pub fn read_records(&self) -> Result<Vec<Option<(f64, f64)>>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| self.unavailable(e))?;

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| parse_record(line).map_err(GpsError::Other))
            .collect()
    }

    /// Truncate the log, for sessions that should not inherit old records.
    pub fn reset(&self) -> Result<()> {
        File::create(&self.path).map_err(|e| self.unavailable(e))?;
        Ok(())
    }

    fn unavailable(&self, source: std::io::Error) -> GpsError {
        GpsError::SinkUnavailable {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for FixLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FILE)
    }
}

/// Render one record without the trailing newline.
pub fn format_record(state: &FixState) -> String {
    match state.coordinates() {
        Some((lat, lon)) => format!("{}, {}", lat, lon),
        None => NO_FIX_RECORD.to_string(),
    }
}

/// Parse one record line back into coordinates.
pub fn parse_record(line: &str) -> std::result::Result<Option<(f64, f64)>, String> {
    let line = line.trim();
    if line == NO_FIX_RECORD {
        return Ok(None);
    }

    let (lat, lon) = line
        .split_once(", ")
        .ok_or_else(|| format!("malformed fix record '{}'", line))?;

    let lat = lat
        .parse::<f64>()
        .map_err(|_| format!("malformed latitude in record '{}'", line))?;
    let lon = lon
        .parse::<f64>()
        .map_err(|_| format!("malformed longitude in record '{}'", line))?;

    Ok(Some((lat, lon)))
}
