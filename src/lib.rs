//! zonetrack - zone-relative trajectory features for destination prediction.
//!
//! Given trajectory segments (entry/exit points and times in a projected
//! planar coordinate system), this library derives features describing each
//! segment relative to a fixed rectangular target zone, builds binary
//! "ends inside the zone" labels, and provides early-stopping monitors for
//! the classifier trained on them.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                         zonetrack                          │
//! ├────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Loader    │──▶│  Features   │──▶│   Labels    │       │
//! │  │  (CSV in)   │   │ (zone geo)  │   │ (last exit) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                                    │             │
//! │         ▼                                    ▼             │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │  Audit log  │                     │  Training   │       │
//! │  │ (counters)  │                     │  monitors   │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use zonetrack::data::{read_data, Mode};
//!
//! let records = read_data("data", Mode::Train).expect("failed to read");
//! let rows = zonetrack::extract(&records, false).expect("exit points required");
//! println!("{} rows", rows.len());
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod data;
pub mod training;

// Re-export key types at crate root for convenience
pub use audit::{ProcessingLog, ProcessingStats, SharedProcessingLog};
pub use config::{Config, ConfigError};
pub use crate::core::{extract, make_label, summarize, FeatureError, FeatureRow, LabeledRow, Point};
pub use data::{DataError, Mode, TrajectoryRecord};
pub use training::{
    check_scores, fit, AccuracyStopper, EpochLogs, F1Stopper, MonitorError, Predictor,
    Trainable, TrainingCallback, TrainingControl, ValidationSet,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Description of the target zone, for display.
pub fn zone_description() -> String {
    use crate::core::geo::{ZONE_CENTER, ZONE_X_MAX, ZONE_X_MIN, ZONE_Y_MAX, ZONE_Y_MIN};
    format!(
        "Target zone (inclusive bounds):\n\
         - x: [{ZONE_X_MIN}, {ZONE_X_MAX}]\n\
         - y: [{ZONE_Y_MIN}, {ZONE_Y_MAX}]\n\
         - centroid: ({}, {})",
        ZONE_CENTER.x, ZONE_CENTER.y
    )
}
