//! Trajectory table input and output.
//!
//! This module contains:
//! - Trajectory record types and time-of-day parsing
//! - CSV loading sliced to the `hash..=y_exit` column range
//! - CSV writing of extracted and labelled features
//! - Label and score column readers for checking recorded predictions

pub mod loader;
pub mod types;

// Re-export commonly used types
pub use loader::{
    read_column, read_data, read_labels, read_records, write_features, write_labeled, DataError,
    Mode,
};
pub use types::{parse_time_of_day, TrajectoryRecord};
