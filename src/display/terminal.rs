// src/display/terminal.rs
//! Terminal-based display implementation

use super::FixDisplay;
use crate::{
    error::{GpsError, Result},
    gps::FixState,
    tracker::BatchSummary,
};
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};

pub struct TerminalDisplay<W: Write = io::Stdout> {
    out: W,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print the collection banner
    pub fn header(&mut self, source: &str) -> Result<()> {
        execute!(
            self.out,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print(format!("GPS Collector - {}\n", source)),
            Print("Press Ctrl+C to stop collecting\n"),
            Print("=".repeat(60)),
            Print("\n"),
            ResetColor
        )
        .map_err(GpsError::Io)
    }

    fn render_fix(&mut self, batch: usize, state: &FixState, summary: &BatchSummary) -> Result<()> {
        let (lat, lon) = match state.coordinates() {
            Some((lat, lon)) => (lat.to_string(), lon.to_string()),
            None => ("None".to_string(), "None".to_string()),
        };

        execute!(
            self.out,
            SetForegroundColor(Color::Yellow),
            Print(format!("[{:>4}] ", batch)),
            ResetColor,
            Print(format!("Latitude: {}, Longitude: {}", lat, lon))
        )
        .map_err(GpsError::Io)?;

        if let Some(fix) = state.fix() {
            execute!(
                self.out,
                SetForegroundColor(Color::Cyan),
                Print(format!("  ({}", fix.quality_description())),
                Print(match fix.satellites {
                    Some(sats) => format!(", {} sats)", sats),
                    None => ")".to_string(),
                }),
                ResetColor
            )
            .map_err(GpsError::Io)?;
        }

        if summary.failures > 0 {
            execute!(
                self.out,
                SetForegroundColor(Color::Red),
                Print(format!("  {} bad line(s)", summary.failures)),
                ResetColor
            )
            .map_err(GpsError::Io)?;
        }

        execute!(self.out, Print("\n")).map_err(GpsError::Io)?;
        self.out.flush().map_err(GpsError::Io)
    }
}

impl<W: Write> FixDisplay for TerminalDisplay<W> {
    type Error = GpsError;

    fn show_fix(&mut self, batch: usize, state: &FixState, summary: &BatchSummary) -> Result<()> {
        self.render_fix(batch, state, summary)
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::Fix;

    fn rendered(state: FixState, summary: BatchSummary) -> String {
        let mut display = TerminalDisplay::with_writer(Vec::new());
        display.show_fix(1, &state, &summary).unwrap();
        String::from_utf8(display.into_inner()).unwrap()
    }

    #[test]
    fn test_shows_coordinates() {
        let mut fix = Fix::new(37.5, 126.75);
        fix.quality = Some(1);
        fix.satellites = Some(8);

        let text = rendered(FixState::HasFix(fix), BatchSummary::default());
        assert!(text.contains("Latitude: 37.5, Longitude: 126.75"));
        assert!(text.contains("GPS, 8 sats"));
        assert!(!text.contains("bad line"));
    }

    #[test]
    fn test_shows_sentinel_and_failures() {
        let summary = BatchSummary {
            failures: 2,
            ..BatchSummary::default()
        };

        let text = rendered(FixState::NoFixYet, summary);
        assert!(text.contains("Latitude: None, Longitude: None"));
        assert!(text.contains("2 bad line(s)"));
    }
}
