//! Audit log for the zonetrack pipeline.
//!
//! Tracks how many records were loaded, featurized and labelled so a run
//! can be audited after the fact.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log_with_persistence, ProcessingLog, ProcessingStats, SharedProcessingLog,
};
