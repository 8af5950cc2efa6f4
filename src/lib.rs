//! MLBX — matchup scoring and derived betting metrics.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod model;
pub mod sheet;
pub mod pipeline;
pub mod export;
pub mod dashboard;
