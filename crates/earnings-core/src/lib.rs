//! Core types for the earnings report.
//!
//! Holds the transaction model, error types, the export date/time parser, the
//! description classifier, money and time formatting, and CLI settings.

pub mod classifier;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
