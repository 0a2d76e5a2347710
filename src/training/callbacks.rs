//! Early-stopping monitors for a binary classifier's training loop.
//!
//! Monitors are driven by the host loop through two hooks: `on_train_begin`
//! once per run and `on_epoch_end` once per completed epoch. A monitor
//! requests termination by setting [`TrainingControl::stop_training`]; the
//! host stops after the current epoch.

use crate::config::Config;
use crate::training::metrics::{f1_score, precision, recall, round_predictions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accuracy at which [`AccuracyStopper`] ends training.
pub const DEFAULT_ACCURACY_THRESHOLD: f64 = 0.98;

/// Validation F1 at which [`F1Stopper`] ends training.
pub const DEFAULT_F1_THRESHOLD: f64 = 0.892;

/// Metrics reported by the host at the end of an epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpochLogs(BTreeMap<String, f64>);

impl EpochLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric, builder style.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }
}

/// Training-loop state a monitor may act on.
#[derive(Debug, Clone, Default)]
pub struct TrainingControl {
    /// Honored by the host after the current epoch
    pub stop_training: bool,
}

/// The host's model, as seen by monitors that re-evaluate it.
pub trait Predictor {
    /// Score each feature vector; scores round to the predicted class.
    fn predict(&self, features: &[Vec<f64>]) -> Vec<f64>;
}

/// Lifecycle hooks invoked by a training loop.
pub trait TrainingCallback {
    fn on_train_begin(&mut self, _logs: &EpochLogs) {}

    fn on_epoch_end(
        &mut self,
        epoch: usize,
        logs: &EpochLogs,
        model: &dyn Predictor,
        control: &mut TrainingControl,
    ) -> Result<(), MonitorError>;
}

/// Monitor errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// The epoch logs lack a metric the monitor reads
    MissingMetric(String),
    /// Model output or labels do not line up with the validation features
    ShapeMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for MonitorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorError::MissingMetric(name) => write!(f, "epoch logs have no '{name}' metric"),
            MonitorError::ShapeMismatch { expected, actual } => {
                write!(f, "expected {expected} values, got {actual}")
            }
        }
    }
}

impl std::error::Error for MonitorError {}

/// Stops training once the reported `acc` reaches the threshold.
#[derive(Debug, Clone)]
pub struct AccuracyStopper {
    threshold: f64,
}

impl AccuracyStopper {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_ACCURACY_THRESHOLD,
        }
    }

    /// Stopper using the configured accuracy threshold.
    pub fn from_config(config: &Config) -> Self {
        Self::new().with_threshold(config.accuracy_threshold)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for AccuracyStopper {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingCallback for AccuracyStopper {
    fn on_epoch_end(
        &mut self,
        epoch: usize,
        logs: &EpochLogs,
        _model: &dyn Predictor,
        control: &mut TrainingControl,
    ) -> Result<(), MonitorError> {
        let acc = logs
            .get("acc")
            .ok_or_else(|| MonitorError::MissingMetric("acc".to_string()))?;

        if acc >= self.threshold {
            tracing::info!(
                epoch,
                acc,
                "reached {:.0}% accuracy, cancelling training",
                self.threshold * 100.0
            );
            control.stop_training = true;
        }
        Ok(())
    }
}

/// Fixed validation data held for one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSet {
    features: Vec<Vec<f64>>,
    labels: Vec<u8>,
}

impl ValidationSet {
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<u8>) -> Result<Self, MonitorError> {
        if features.len() != labels.len() {
            return Err(MonitorError::ShapeMismatch {
                expected: features.len(),
                actual: labels.len(),
            });
        }
        Ok(Self { features, labels })
    }

    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Validation scores recorded at the end of each epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct F1History {
    pub f1s: Vec<f64>,
    pub precisions: Vec<f64>,
    pub recalls: Vec<f64>,
}

impl F1History {
    fn clear(&mut self) {
        self.f1s.clear();
        self.precisions.clear();
        self.recalls.clear();
    }

    pub fn len(&self) -> usize {
        self.f1s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.f1s.is_empty()
    }
}

/// Re-scores the model on a validation set every epoch and stops once F1
/// reaches the threshold.
#[derive(Debug, Clone)]
pub struct F1Stopper {
    validation: ValidationSet,
    threshold: f64,
    history: F1History,
}

impl F1Stopper {
    pub fn new(validation: ValidationSet) -> Self {
        Self {
            validation,
            threshold: DEFAULT_F1_THRESHOLD,
            history: F1History::default(),
        }
    }

    /// Stopper using the configured F1 threshold.
    pub fn from_config(validation: ValidationSet, config: &Config) -> Self {
        Self::new(validation).with_threshold(config.f1_threshold)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scores recorded so far in the current run.
    pub fn history(&self) -> &F1History {
        &self.history
    }
}

impl TrainingCallback for F1Stopper {
    fn on_train_begin(&mut self, _logs: &EpochLogs) {
        self.history.clear();
    }

    fn on_epoch_end(
        &mut self,
        epoch: usize,
        _logs: &EpochLogs,
        model: &dyn Predictor,
        control: &mut TrainingControl,
    ) -> Result<(), MonitorError> {
        let scores = model.predict(self.validation.features());
        if scores.len() != self.validation.len() {
            return Err(MonitorError::ShapeMismatch {
                expected: self.validation.len(),
                actual: scores.len(),
            });
        }

        let predicted = round_predictions(&scores);
        let actual = self.validation.labels();
        let val_f1 = f1_score(actual, &predicted);
        let val_precision = precision(actual, &predicted);
        let val_recall = recall(actual, &predicted);

        self.history.f1s.push(val_f1);
        self.history.precisions.push(val_precision);
        self.history.recalls.push(val_recall);

        tracing::info!(
            epoch,
            "val_f1: {val_f1:.6} val_precision: {val_precision:.6} val_recall: {val_recall:.6}"
        );

        if val_f1 >= self.threshold {
            tracing::info!(epoch, val_f1, "F1 reached {:.1}, stopping", self.threshold * 100.0);
            control.stop_training = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a fixed score vector regardless of input.
    struct FixedModel(Vec<f64>);

    impl Predictor for FixedModel {
        fn predict(&self, _features: &[Vec<f64>]) -> Vec<f64> {
            self.0.clone()
        }
    }

    fn validation(labels: Vec<u8>) -> ValidationSet {
        let features = labels.iter().map(|&l| vec![f64::from(l)]).collect();
        ValidationSet::new(features, labels).unwrap()
    }

    #[test]
    fn test_accuracy_stopper_threshold() {
        let mut stopper = AccuracyStopper::new();
        let model = FixedModel(vec![]);
        let mut control = TrainingControl::default();

        stopper
            .on_epoch_end(0, &EpochLogs::new().with("acc", 0.97), &model, &mut control)
            .unwrap();
        assert!(!control.stop_training);

        stopper
            .on_epoch_end(1, &EpochLogs::new().with("acc", 0.98), &model, &mut control)
            .unwrap();
        assert!(control.stop_training);
    }

    #[test]
    fn test_accuracy_stopper_missing_metric() {
        let mut stopper = AccuracyStopper::new();
        let mut control = TrainingControl::default();
        let result = stopper.on_epoch_end(
            0,
            &EpochLogs::new().with("loss", 0.1),
            &FixedModel(vec![]),
            &mut control,
        );
        assert_eq!(result, Err(MonitorError::MissingMetric("acc".to_string())));
        assert!(!control.stop_training);
    }

    #[test]
    fn test_f1_stopper_records_history() {
        let mut stopper = F1Stopper::new(validation(vec![1, 1, 0, 0]));
        let mut control = TrainingControl::default();
        stopper.on_train_begin(&EpochLogs::new());

        // one false negative: precision 1, recall 0.5
        let model = FixedModel(vec![0.9, 0.2, 0.1, 0.3]);
        stopper
            .on_epoch_end(0, &EpochLogs::new(), &model, &mut control)
            .unwrap();

        let history = stopper.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history.precisions[0], 1.0);
        assert_eq!(history.recalls[0], 0.5);
        assert!((history.f1s[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!(!control.stop_training);

        let perfect = FixedModel(vec![0.9, 0.8, 0.1, 0.3]);
        stopper
            .on_epoch_end(1, &EpochLogs::new(), &perfect, &mut control)
            .unwrap();
        assert_eq!(stopper.history().f1s, vec![2.0 / 3.0, 1.0]);
        assert!(control.stop_training);
    }

    #[test]
    fn test_f1_stopper_resets_on_train_begin() {
        let mut stopper = F1Stopper::new(validation(vec![1, 0]));
        let mut control = TrainingControl::default();
        let model = FixedModel(vec![1.0, 0.0]);

        stopper.on_train_begin(&EpochLogs::new());
        stopper
            .on_epoch_end(0, &EpochLogs::new(), &model, &mut control)
            .unwrap();
        assert_eq!(stopper.history().len(), 1);

        stopper.on_train_begin(&EpochLogs::new());
        assert!(stopper.history().is_empty());
    }

    #[test]
    fn test_f1_stopper_rejects_wrong_prediction_count() {
        let mut stopper = F1Stopper::new(validation(vec![1, 0, 1]));
        let mut control = TrainingControl::default();
        let result = stopper.on_epoch_end(
            0,
            &EpochLogs::new(),
            &FixedModel(vec![1.0]),
            &mut control,
        );
        assert_eq!(
            result,
            Err(MonitorError::ShapeMismatch {
                expected: 3,
                actual: 1
            })
        );
        assert!(stopper.history().is_empty());
    }

    #[test]
    fn test_stoppers_take_thresholds_from_config() {
        let config = Config {
            accuracy_threshold: 0.9,
            f1_threshold: 0.5,
            ..Config::default()
        };
        let model = FixedModel(vec![1.0, 0.0, 0.0]);

        let mut acc_stopper = AccuracyStopper::from_config(&config);
        assert_eq!(acc_stopper.threshold(), 0.9);
        let mut control = TrainingControl::default();
        acc_stopper
            .on_epoch_end(0, &EpochLogs::new().with("acc", 0.95), &model, &mut control)
            .unwrap();
        assert!(control.stop_training);

        // one of two positives found: F1 = 2/3, below the default but above 0.5
        let mut f1_stopper = F1Stopper::from_config(validation(vec![1, 1, 0]), &config);
        assert_eq!(f1_stopper.threshold(), 0.5);
        let mut control = TrainingControl::default();
        f1_stopper
            .on_epoch_end(0, &EpochLogs::new(), &model, &mut control)
            .unwrap();
        assert!(control.stop_training);

        let defaults = Config::default();
        assert_eq!(
            AccuracyStopper::from_config(&defaults).threshold(),
            DEFAULT_ACCURACY_THRESHOLD
        );
    }

    #[test]
    fn test_validation_set_shape() {
        assert!(ValidationSet::new(vec![vec![0.0]], vec![1, 0]).is_err());
        assert_eq!(validation(vec![1, 0]).len(), 2);
    }
}
