//! Core feature engineering.
//!
//! This module contains:
//! - Zone geometry and the compass bearing formula
//! - Feature extraction from trajectory records
//! - Label building from last trajectories
//! - Column summaries of extracted features

pub mod features;
pub mod geo;
pub mod labels;
pub mod summary;

// Re-export commonly used types
pub use features::{extract, FeatureError, FeatureRow, TripFeatures};
pub use geo::{
    compass_bearing, compass_bearing_from_slices, GeoError, Point, ZoneRegion, ZONE_CENTER,
};
pub use labels::{make_label, LabeledRow};
pub use summary::{summarize, ColumnSummary, FeatureSummary};
