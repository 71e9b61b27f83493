//! Runtime layer for the earnings report.
//!
//! Re-runs the analysis pipeline in the background whenever a watched input
//! file changes.

pub mod watcher;

pub use earnings_core as core;
pub use earnings_data as data;
