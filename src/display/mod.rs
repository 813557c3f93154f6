// src/display/mod.rs
//! Display modules for retrieved fixes

pub mod terminal;

use crate::{gps::FixState, tracker::BatchSummary};

/// Anything that can present a fix after each batch
pub trait FixDisplay {
    type Error;

    /// Show the state returned by one coordinate retrieval
    fn show_fix(
        &mut self,
        batch: usize,
        state: &FixState,
        summary: &BatchSummary,
    ) -> Result<(), Self::Error>;
}
