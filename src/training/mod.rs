//! Training-loop monitoring for the zone classifier.
//!
//! This module contains:
//! - Binary classification metrics
//! - Early-stopping callbacks on accuracy and validation F1
//! - A minimal epoch loop that drives the callbacks

pub mod callbacks;
pub mod host;
pub mod metrics;

// Re-export commonly used types
pub use callbacks::{
    AccuracyStopper, EpochLogs, F1History, F1Stopper, MonitorError, Predictor, TrainingCallback,
    TrainingControl, ValidationSet, DEFAULT_ACCURACY_THRESHOLD, DEFAULT_F1_THRESHOLD,
};
pub use host::{check_scores, fit, EpochCheck, RecordedScores, Trainable, TrainingSummary};
