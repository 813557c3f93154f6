// src/tracker.rs
//! Tracks the latest position fix across batches of NMEA text

use crate::{
    error::Result,
    gps::{sentence, ChecksumPolicy, FixState, SentenceKind},
    sink::FixLog,
};
use log::{debug, trace, warn};

/// Counts gathered while processing one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub lines: usize,
    pub parsed: usize,
    pub fixes: usize,
    pub unrecognized: usize,
    pub failures: usize,
}

/// Holds the most recent fix and the log it is written to.
///
/// A tracker is meant to be owned by a single collection loop; it is not
/// synchronised for concurrent batches.
#[derive(Debug)]
pub struct FixTracker {
    state: FixState,
    log: FixLog,
    policy: ChecksumPolicy,
}

impl FixTracker {
    pub fn new(log: FixLog) -> Self {
        Self::with_policy(log, ChecksumPolicy::default())
    }

    pub fn with_policy(log: FixLog, policy: ChecksumPolicy) -> Self {
        Self {
            state: FixState::NoFixYet,
            log,
            policy,
        }
    }

    /// Parse every line of `text`, keeping the last GGA fix.
    ///
    /// Bad lines are logged and skipped; they never touch the current fix.
    pub fn process_batch(&mut self, text: &str) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            summary.lines += 1;

            match sentence::parse_with(line, self.policy) {
                Ok(sentence) => {
                    summary.parsed += 1;
                    if sentence.kind == SentenceKind::Unrecognized {
                        summary.unrecognized += 1;
                        trace!("Skipping unrecognized sentence {}", sentence.identifier());
                        continue;
                    }
                    trace!("{} ({})", sentence.identifier(), sentence.kind.description());
                    if let Some(fix) = sentence.fix {
                        debug!("Parsed fix from {}: {:?}", sentence.identifier(), fix);
                        self.state = FixState::HasFix(fix);
                        summary.fixes += 1;
                    }
                }
                Err(e) => {
                    summary.failures += 1;
                    warn!("Could not parse NMEA sentence {:?}: {}", line.trim(), e);
                }
            }
        }

        summary
    }

    /// Append the current state to the log, then return it.
    ///
    /// Every call writes a record, including repeated calls with no new fix
    /// and calls made before the first fix.
    pub fn get_coordinates(&self) -> Result<FixState> {
        self.log.append(&self.state)?;
        Ok(self.state)
    }

    /// Current state, without writing to the log.
    pub fn state(&self) -> FixState {
        self.state
    }

    pub fn log(&self) -> &FixLog {
        &self.log
    }
}
