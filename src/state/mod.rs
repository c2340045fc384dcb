//! State module for tracking enrichment progress
//!
//! # Components
//!
//! - `RowState`: Tracks the state of individual records (skipped, cached, queried, written, etc.)

mod row_state;

// Re-export main types
pub use row_state::RowState;
