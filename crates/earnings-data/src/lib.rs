//! Data pipeline for the earnings report.
//!
//! Reads pasted export text, splits it into logical rows, parses each row
//! into a transaction, aggregates transactions into hourly buckets and runs
//! the top-level analysis.

pub mod aggregator;
pub mod analysis;
pub mod parser;
pub mod reader;
pub mod row;

pub use earnings_core as core;
