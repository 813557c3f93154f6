// src/gps/data.rs
//! Position fix structures and utilities

use chrono::NaiveTime;

/// A single position reading taken from a GGA sentence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fix {
    pub latitude: f64,             // decimal degrees, north positive
    pub longitude: f64,            // decimal degrees, east positive
    pub time: Option<NaiveTime>,   // UTC time of fix
    pub quality: Option<u8>,
    pub satellites: Option<u8>,
    pub hdop: Option<f64>,
    pub altitude: Option<f64>,     // meters above mean sea level
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Self::default()
        }
    }

    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Get fix type description
    pub fn quality_description(&self) -> String {
        match self.quality {
            Some(0) => "No fix".to_string(),
            Some(1) => "GPS".to_string(),
            Some(2) => "DGPS".to_string(),
            Some(3) => "PPS".to_string(),
            Some(4) => "RTK".to_string(),
            Some(5) => "Float RTK".to_string(),
            Some(6) => "Estimated".to_string(),
            Some(7) => "Manual".to_string(),
            Some(8) => "Simulation".to_string(),
            Some(q) => format!("Unknown ({})", q),
            None => "Unknown".to_string(),
        }
    }
}

/// What the tracker currently knows about the receiver's position.
///
/// There is no way back to `NoFixYet` once a fix has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FixState {
    #[default]
    NoFixYet,
    HasFix(Fix),
}

impl FixState {
    pub fn has_fix(&self) -> bool {
        matches!(self, FixState::HasFix(_))
    }

    pub fn fix(&self) -> Option<&Fix> {
        match self {
            FixState::HasFix(fix) => Some(fix),
            FixState::NoFixYet => None,
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.fix().map(Fix::coordinates)
    }
}
