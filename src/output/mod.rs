//! Output module for run reporting
//!
//! This module handles:
//! - Counting record outcomes during a run
//! - Logging the completion summary

pub mod stats;

pub use stats::RunStatistics;
