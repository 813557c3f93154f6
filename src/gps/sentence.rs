// src/gps/sentence.rs
//! NMEA-0183 sentence parsing
//!
//! A sentence looks like `$GPGGA,123519,4807.038,N,...,*47`: a start marker,
//! a talker+type identifier, comma separated fields and an optional `*HH`
//! checksum. Only GGA sentences carry a [`Fix`]; the other recognized types
//! are validated and handed back without one.

use super::data::Fix;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// How strictly the `*HH` suffix is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Verify the checksum when present, accept sentences without one.
    #[default]
    Lenient,
    /// Require a checksum and verify it.
    Strict,
    /// Never look at the checksum.
    Ignore,
}

impl fmt::Display for ChecksumPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChecksumPolicy::Lenient => "lenient",
            ChecksumPolicy::Strict => "strict",
            ChecksumPolicy::Ignore => "ignore",
        };
        f.write_str(name)
    }
}

impl FromStr for ChecksumPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(ChecksumPolicy::Lenient),
            "strict" => Ok(ChecksumPolicy::Strict),
            "ignore" => Ok(ChecksumPolicy::Ignore),
            other => Err(format!("unknown checksum policy '{}'", other)),
        }
    }
}

/// Sentence types this crate knows the layout of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    Gga,
    Rmc,
    Vtg,
    Gll,
    Gsa,
    Gsv,
    Unrecognized,
}

impl SentenceKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "GGA" => SentenceKind::Gga,
            "RMC" => SentenceKind::Rmc,
            "VTG" => SentenceKind::Vtg,
            "GLL" => SentenceKind::Gll,
            "GSA" => SentenceKind::Gsa,
            "GSV" => SentenceKind::Gsv,
            _ => SentenceKind::Unrecognized,
        }
    }

    /// Minimum number of data fields after the identifier.
    fn min_fields(&self) -> Option<usize> {
        match self {
            SentenceKind::Gga => Some(14),
            SentenceKind::Rmc => Some(11),
            SentenceKind::Vtg => Some(8),
            SentenceKind::Gll => Some(6),
            SentenceKind::Gsa => Some(17),
            SentenceKind::Gsv => Some(3),
            SentenceKind::Unrecognized => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SentenceKind::Gga => "Global Positioning System Fix Data",
            SentenceKind::Rmc => "Recommended Minimum Navigation Information",
            SentenceKind::Vtg => "Track Made Good and Ground Speed",
            SentenceKind::Gll => "Geographic Position - Latitude/Longitude",
            SentenceKind::Gsa => "DOP and Active Satellites",
            SentenceKind::Gsv => "Satellites in View",
            SentenceKind::Unrecognized => "Unrecognized",
        }
    }
}

/// Reasons a single line was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Empty,
    MissingStartMarker,
    InvalidIdentifier(String),
    MissingChecksum,
    InvalidChecksum(String),
    ChecksumMismatch { expected: u8, computed: u8 },
    FieldCount {
        sentence_type: String,
        expected: usize,
        found: usize,
    },
    InvalidField { field: &'static str, value: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty line"),
            ParseError::MissingStartMarker => write!(f, "sentence does not start with '$' or '!'"),
            ParseError::InvalidIdentifier(id) => write!(f, "invalid talker/type identifier '{}'", id),
            ParseError::MissingChecksum => write!(f, "checksum required but missing"),
            ParseError::InvalidChecksum(text) => write!(f, "malformed checksum '{}'", text),
            ParseError::ChecksumMismatch { expected, computed } => write!(
                f,
                "checksum mismatch: sentence says {:02X}, computed {:02X}",
                expected, computed
            ),
            ParseError::FieldCount {
                sentence_type,
                expected,
                found,
            } => write!(
                f,
                "{} needs at least {} fields, found {}",
                sentence_type, expected, found
            ),
            ParseError::InvalidField { field, value } => {
                write!(f, "invalid {} field '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// One syntactically valid sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub talker: String,
    pub sentence_type: String,
    pub kind: SentenceKind,
    pub fields: Vec<String>,
    pub checksum: Option<u8>,
    /// Set only for GGA sentences that report a position.
    pub fix: Option<Fix>,
}

impl Sentence {
    pub fn identifier(&self) -> String {
        format!("{}{}", self.talker, self.sentence_type)
    }

    pub fn is_recognized(&self) -> bool {
        self.kind != SentenceKind::Unrecognized
    }
}

/// Parse one line with the default [`ChecksumPolicy`].
pub fn parse(line: &str) -> Result<Sentence, ParseError> {
    parse_with(line, ChecksumPolicy::default())
}

/// Parse one line of NMEA text.
pub fn parse_with(line: &str, policy: ChecksumPolicy) -> Result<Sentence, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let body = line
        .strip_prefix('$')
        .or_else(|| line.strip_prefix('!'))
        .ok_or(ParseError::MissingStartMarker)?;

    let (payload, checksum_text) = match body.split_once('*') {
        Some((payload, checksum)) => (payload, Some(checksum)),
        None => (body, None),
    };

    let checksum = match (checksum_text, policy) {
        (Some(text), ChecksumPolicy::Ignore) => parse_checksum(text).ok(),
        (Some(text), _) => Some(parse_checksum(text)?),
        (None, _) => None,
    };

    match (checksum, policy) {
        (_, ChecksumPolicy::Ignore) => {}
        (Some(expected), _) => {
            let computed = compute_checksum(payload);
            if computed != expected {
                return Err(ParseError::ChecksumMismatch { expected, computed });
            }
        }
        (None, ChecksumPolicy::Strict) => return Err(ParseError::MissingChecksum),
        (None, ChecksumPolicy::Lenient) => {}
    }

    let mut parts = payload.split(',');
    let identifier = parts.next().unwrap_or_default();
    if identifier.len() < 3 || !identifier.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ParseError::InvalidIdentifier(identifier.to_string()));
    }
    let (talker, sentence_type) = identifier.split_at(identifier.len() - 3);
    let kind = SentenceKind::from_code(sentence_type);

    let fields: Vec<&str> = parts.collect();
    if let Some(expected) = kind.min_fields() {
        if fields.len() < expected {
            return Err(ParseError::FieldCount {
                sentence_type: sentence_type.to_string(),
                expected,
                found: fields.len(),
            });
        }
    }

    let fix = match kind {
        SentenceKind::Gga => parse_gga(&fields)?,
        _ => None,
    };

    Ok(Sentence {
        talker: talker.to_string(),
        sentence_type: sentence_type.to_string(),
        kind,
        fields: fields.into_iter().map(str::to_string).collect(),
        checksum,
        fix,
    })
}

/// XOR of every byte between the start marker and `*`.
pub fn compute_checksum(payload: &str) -> u8 {
    payload.bytes().fold(0, |acc, b| acc ^ b)
}

fn parse_checksum(text: &str) -> Result<u8, ParseError> {
    // from_str_radix alone would take a sign, e.g. "+E"
    if text.len() != 2 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseError::InvalidChecksum(text.to_string()));
    }
    u8::from_str_radix(text, 16).map_err(|_| ParseError::InvalidChecksum(text.to_string()))
}

/// Parse GGA (Global Positioning System Fix Data) fields
fn parse_gga(fields: &[&str]) -> Result<Option<Fix>, ParseError> {
    // Latitude (fields 1 and 2), longitude (fields 3 and 4)
    let latitude = parse_coordinate(fields[1], fields[2], ('N', 'S'), 90.0, "latitude")?;
    let longitude = parse_coordinate(fields[3], fields[4], ('E', 'W'), 180.0, "longitude")?;

    let (latitude, longitude) = match (latitude, longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        // Receiver is up but has no position yet
        (None, None) => return Ok(None),
        _ => {
            return Err(ParseError::InvalidField {
                field: "position",
                value: fields[1..5].join(","),
            })
        }
    };

    let time = if fields[0].is_empty() {
        None
    } else {
        Some(
            NaiveTime::parse_from_str(fields[0], "%H%M%S%.f").map_err(|_| {
                ParseError::InvalidField {
                    field: "time",
                    value: fields[0].to_string(),
                }
            })?,
        )
    };

    Ok(Some(Fix {
        latitude,
        longitude,
        time,
        quality: optional(fields[5], "fix quality")?,
        satellites: optional(fields[6], "satellites")?,
        hdop: optional(fields[7], "hdop")?,
        altitude: optional(fields[8], "altitude")?,
    }))
}

/// Convert `ddmm.mmmm` text plus hemisphere letter into signed decimal degrees.
fn parse_coordinate(
    value: &str,
    hemisphere: &str,
    (positive, negative): (char, char),
    limit: f64,
    field: &'static str,
) -> Result<Option<f64>, ParseError> {
    if value.is_empty() && hemisphere.is_empty() {
        return Ok(None);
    }

    let invalid = || ParseError::InvalidField {
        field,
        value: format!("{},{}", value, hemisphere),
    };

    let raw: f64 = value.parse().map_err(|_| invalid())?;
    if !raw.is_finite() || raw < 0.0 {
        return Err(invalid());
    }

    let minutes = raw % 100.0;
    if minutes >= 60.0 {
        return Err(invalid());
    }

    let degrees = (raw / 100.0).floor() + minutes / 60.0;
    if degrees > limit {
        return Err(invalid());
    }

    let mut letters = hemisphere.chars();
    match (letters.next(), letters.next()) {
        (Some(c), None) if c == positive => Ok(Some(degrees)),
        (Some(c), None) if c == negative => Ok(Some(-degrees)),
        _ => Err(invalid()),
    }
}

fn optional<T: FromStr>(value: &str, field: &'static str) -> Result<Option<T>, ParseError> {
    if value.is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| ParseError::InvalidField {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GGA: &str = "$GPGGA,123456.00,3712.4058,N,12644.0063,E,1,08,1.0,100.0,M,50.0,M,,*68";

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_gga_parsing() {
        let sentence = parse(GGA).unwrap();

        assert_eq!(sentence.talker, "GP");
        assert_eq!(sentence.sentence_type, "GGA");
        assert_eq!(sentence.kind, SentenceKind::Gga);
        assert_eq!(sentence.checksum, Some(0x68));
        assert_eq!(sentence.fields.len(), 14);

        let fix = sentence.fix.unwrap();
        assert!(approx(fix.latitude, 37.20676));
        assert!(approx(fix.longitude, 126.73344));
        assert_eq!(fix.quality, Some(1));
        assert_eq!(fix.satellites, Some(8));
        assert_eq!(fix.hdop, Some(1.0));
        assert_eq!(fix.altitude, Some(100.0));
        assert_eq!(fix.time, NaiveTime::from_hms_opt(12, 34, 56));
    }

    #[test]
    fn test_gga_time_without_fraction() {
        let sentence = parse("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47").unwrap();
        let fix = sentence.fix.unwrap();

        assert_eq!(fix.time, NaiveTime::from_hms_opt(12, 35, 19));
        assert!(approx(fix.latitude, 48.1173));
        assert!(approx(fix.longitude, 11.516667));
    }

    #[test]
    fn test_southern_and_western_hemispheres() {
        let payload = "GPGGA,123456.00,3351.7800,S,15112.6000,W,1,08,1.0,10.0,M,0.0,M,,";
        let line = format!("${}*{:02X}", payload, compute_checksum(payload));

        let fix = parse(&line).unwrap().fix.unwrap();
        assert!(approx(fix.latitude, -33.863));
        assert!(approx(fix.longitude, -151.21));
    }

    #[test]
    fn test_other_types_recognized_without_fix() {
        let lines = [
            "$GPRMC,123456.00,A,3734.0160,N,12643.3440,E,0.0,0.0,180923,,*30",
            "$GPVTG,0.0,T,0.0,M,0.0,N,0.0,K*4E",
            "$GPGLL,3734.0160,N,12643.3440,E,123456.00,A*06",
        ];
        let kinds = [SentenceKind::Rmc, SentenceKind::Vtg, SentenceKind::Gll];

        for (line, kind) in lines.iter().zip(kinds) {
            let sentence = parse(line).unwrap();
            assert_eq!(sentence.kind, kind);
            assert!(sentence.is_recognized());
            assert!(sentence.fix.is_none());
        }
    }

    #[test]
    fn test_unrecognized_type_is_not_an_error() {
        let payload = "GPZDA,201530.00,04,07,2002,00,00";
        let line = format!("${}*{:02X}", payload, compute_checksum(payload));

        let sentence = parse(&line).unwrap();
        assert_eq!(sentence.kind, SentenceKind::Unrecognized);
        assert_eq!(sentence.identifier(), "GPZDA");
        assert!(!sentence.is_recognized());
    }

    #[test]
    fn test_checksum_mismatch() {
        let bad = GGA.replace("*68", "*69");
        assert_eq!(
            parse(&bad),
            Err(ParseError::ChecksumMismatch {
                expected: 0x69,
                computed: 0x68
            })
        );
        assert!(parse_with(&bad, ChecksumPolicy::Ignore).is_ok());
    }

    #[test]
    fn test_missing_checksum_policies() {
        let bare = GGA.trim_end_matches("*68");

        assert!(parse(bare).unwrap().fix.is_some());
        assert_eq!(
            parse_with(bare, ChecksumPolicy::Strict),
            Err(ParseError::MissingChecksum)
        );
        assert!(parse_with(GGA, ChecksumPolicy::Strict).is_ok());
    }

    #[test]
    fn test_malformed_checksum() {
        let bad = GGA.replace("*68", "*ZZ");
        assert_eq!(parse(&bad), Err(ParseError::InvalidChecksum("ZZ".to_string())));
    }

    #[test]
    fn test_signed_checksum_is_malformed() {
        let bad = GGA.replace("*68", "*+E");
        assert_eq!(parse(&bad), Err(ParseError::InvalidChecksum("+E".to_string())));
        assert_eq!(parse_with(&bad, ChecksumPolicy::Ignore).unwrap().checksum, None);
    }

    #[test]
    fn test_trailing_whitespace_is_trimmed() {
        let line = format!("{}\r\n", GGA);
        assert!(parse(&line).unwrap().fix.is_some());
    }

    #[test]
    fn test_missing_start_marker() {
        assert_eq!(parse("GPGGA,1,2,3"), Err(ParseError::MissingStartMarker));
        assert_eq!(parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_short_gga_is_field_count_error() {
        let err = parse("$GPGGA,123456.00,3712.4058,N").unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldCount {
                sentence_type: "GGA".to_string(),
                expected: 14,
                found: 3
            }
        );
        assert_eq!(err.to_string(), "GGA needs at least 14 fields, found 3");
    }

    #[test]
    fn test_non_numeric_coordinate() {
        let line = "$GPGGA,123456.00,37AB.4058,N,12644.0063,E,1,08,1.0,100.0,M,50.0,M,,";
        assert!(matches!(
            parse(line),
            Err(ParseError::InvalidField { field: "latitude", .. })
        ));
    }

    #[test]
    fn test_minutes_out_of_range() {
        let line = "$GPGGA,123456.00,3799.0000,N,12644.0063,E,1,08,1.0,100.0,M,50.0,M,,";
        assert_eq!(
            parse(line),
            Err(ParseError::InvalidField {
                field: "latitude",
                value: "3799.0000,N".to_string()
            })
        );

        let line = "$GPGGA,123456.00,3712.4058,N,12660.0000,E,1,08,1.0,100.0,M,50.0,M,,";
        assert!(matches!(
            parse(line),
            Err(ParseError::InvalidField { field: "longitude", .. })
        ));

        let edge = "$GPGGA,123456.00,3759.9999,N,12644.0063,E,1,08,1.0,100.0,M,50.0,M,,";
        assert!(parse(edge).unwrap().fix.is_some());
    }

    #[test]
    fn test_bad_hemisphere() {
        let line = "$GPGGA,123456.00,3712.4058,E,12644.0063,E,1,08,1.0,100.0,M,50.0,M,,";
        assert!(matches!(
            parse(line),
            Err(ParseError::InvalidField { field: "latitude", .. })
        ));
    }

    #[test]
    fn test_gga_without_position() {
        let line = "$GPGGA,123456.00,,,,,0,00,99.9,,M,,M,,";
        let sentence = parse(line).unwrap();
        assert_eq!(sentence.kind, SentenceKind::Gga);
        assert!(sentence.fix.is_none());
    }

    #[test]
    fn test_gga_half_position() {
        let line = "$GPGGA,123456.00,3712.4058,N,,,1,08,1.0,100.0,M,50.0,M,,";
        assert!(matches!(
            parse(line),
            Err(ParseError::InvalidField { field: "position", .. })
        ));
    }

    #[test]
    fn test_checksum_policy_from_str() {
        assert_eq!("STRICT".parse::<ChecksumPolicy>(), Ok(ChecksumPolicy::Strict));
        assert!("sometimes".parse::<ChecksumPolicy>().is_err());
        assert_eq!(ChecksumPolicy::Ignore.to_string(), "ignore");
    }
}
