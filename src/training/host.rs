//! Minimal epoch loop that drives training callbacks.
//!
//! The model itself is supplied by the caller; this loop only sequences
//! epochs, hands each epoch's logs to every callback, and honors the stop
//! flag after the epoch in which it was set.

use crate::config::Config;
use crate::training::callbacks::{
    AccuracyStopper, EpochLogs, F1Stopper, MonitorError, Predictor, TrainingCallback,
    TrainingControl, ValidationSet,
};
use crate::training::metrics::{accuracy, round_predictions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A model that can be trained one epoch at a time.
pub trait Trainable: Predictor {
    /// Run one epoch and report its metrics.
    fn train_epoch(&mut self, epoch: usize) -> EpochLogs;
}

/// Outcome of a call to [`fit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of completed epochs
    pub epochs_run: usize,
    /// Whether a callback ended the run before `max_epochs`
    pub stopped_early: bool,
    /// Logs of every completed epoch, in order
    pub history: Vec<EpochLogs>,
}

/// Train for up to `max_epochs`, invoking the callbacks at each lifecycle point.
pub fn fit<M: Trainable>(
    model: &mut M,
    max_epochs: usize,
    callbacks: &mut [&mut dyn TrainingCallback],
) -> Result<TrainingSummary, MonitorError> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let mut control = TrainingControl::default();
    let mut history = Vec::new();

    tracing::debug!(%run_id, max_epochs, callbacks = callbacks.len(), "training started");

    let begin_logs = EpochLogs::new();
    for callback in callbacks.iter_mut() {
        callback.on_train_begin(&begin_logs);
    }

    for epoch in 0..max_epochs {
        let logs = model.train_epoch(epoch);
        for callback in callbacks.iter_mut() {
            callback.on_epoch_end(epoch, &logs, &*model, &mut control)?;
        }
        history.push(logs);

        if control.stop_training {
            tracing::info!(%run_id, epoch, "training stopped by callback");
            break;
        }
    }

    Ok(TrainingSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        epochs_run: history.len(),
        stopped_early: control.stop_training,
        history,
    })
}

/// Scores produced elsewhere, replayed as a model's predictions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedScores(pub Vec<f64>);

impl Predictor for RecordedScores {
    fn predict(&self, _features: &[Vec<f64>]) -> Vec<f64> {
        self.0.clone()
    }
}

/// Monitor decisions for one epoch of recorded validation scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochCheck {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Whether the accuracy monitor would end training
    pub accuracy_stop: bool,
    /// Whether the F1 monitor would end training
    pub f1_stop: bool,
}

/// Run both monitors, with the configured thresholds, over one epoch of
/// recorded validation scores.
pub fn check_scores(
    labels: &[u8],
    scores: Vec<f64>,
    config: &Config,
) -> Result<EpochCheck, MonitorError> {
    if scores.len() != labels.len() {
        return Err(MonitorError::ShapeMismatch {
            expected: labels.len(),
            actual: scores.len(),
        });
    }

    let acc = accuracy(labels, &round_predictions(&scores));
    let logs = EpochLogs::new().with("acc", acc);
    let model = RecordedScores(scores);

    let validation = ValidationSet::new(vec![Vec::new(); labels.len()], labels.to_vec())?;
    let mut f1_stopper = F1Stopper::from_config(validation, config);
    let mut f1_control = TrainingControl::default();
    f1_stopper.on_train_begin(&EpochLogs::new());
    f1_stopper.on_epoch_end(0, &logs, &model, &mut f1_control)?;

    let mut acc_stopper = AccuracyStopper::from_config(config);
    let mut acc_control = TrainingControl::default();
    acc_stopper.on_epoch_end(0, &logs, &model, &mut acc_control)?;

    let history = f1_stopper.history();
    Ok(EpochCheck {
        accuracy: acc,
        precision: history.precisions[0],
        recall: history.recalls[0],
        f1: history.f1s[0],
        accuracy_stop: acc_control.stop_training,
        f1_stop: f1_control.stop_training,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::callbacks::AccuracyStopper;

    /// Accuracy climbs by a fixed step each epoch.
    struct Climber {
        acc: f64,
        step: f64,
    }

    impl Predictor for Climber {
        fn predict(&self, features: &[Vec<f64>]) -> Vec<f64> {
            vec![0.0; features.len()]
        }
    }

    impl Trainable for Climber {
        fn train_epoch(&mut self, _epoch: usize) -> EpochLogs {
            self.acc += self.step;
            EpochLogs::new().with("acc", self.acc)
        }
    }

    /// Records the epoch indices it sees.
    #[derive(Default)]
    struct Recorder {
        began: usize,
        epochs: Vec<usize>,
    }

    impl TrainingCallback for Recorder {
        fn on_train_begin(&mut self, _logs: &EpochLogs) {
            self.began += 1;
        }

        fn on_epoch_end(
            &mut self,
            epoch: usize,
            _logs: &EpochLogs,
            _model: &dyn Predictor,
            _control: &mut TrainingControl,
        ) -> Result<(), MonitorError> {
            self.epochs.push(epoch);
            Ok(())
        }
    }

    #[test]
    fn test_fit_runs_all_epochs_without_stop() {
        let mut model = Climber {
            acc: 0.0,
            step: 0.01,
        };
        let mut recorder = Recorder::default();
        let summary = fit(&mut model, 5, &mut [&mut recorder]).unwrap();

        assert_eq!(summary.epochs_run, 5);
        assert!(!summary.stopped_early);
        assert_eq!(recorder.began, 1);
        assert_eq!(recorder.epochs, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_fit_stops_after_flagged_epoch() {
        let mut model = Climber {
            acc: 0.90,
            step: 0.03,
        };
        let mut stopper = AccuracyStopper::new();
        let mut recorder = Recorder::default();
        let summary = fit(&mut model, 10, &mut [&mut stopper, &mut recorder]).unwrap();

        // 0.93, 0.96, 0.99 -> stop after the third epoch
        assert_eq!(summary.epochs_run, 3);
        assert!(summary.stopped_early);
        assert_eq!(recorder.epochs, vec![0, 1, 2]);
    }

    #[test]
    fn test_fit_propagates_callback_errors() {
        struct Silent;
        impl Predictor for Silent {
            fn predict(&self, _features: &[Vec<f64>]) -> Vec<f64> {
                Vec::new()
            }
        }
        impl Trainable for Silent {
            fn train_epoch(&mut self, _epoch: usize) -> EpochLogs {
                EpochLogs::new()
            }
        }

        let mut stopper = AccuracyStopper::new();
        let result = fit(&mut Silent, 3, &mut [&mut stopper]);
        assert!(matches!(result, Err(MonitorError::MissingMetric(_))));
    }

    #[test]
    fn test_check_scores_uses_configured_thresholds() {
        let labels = [1, 1, 1, 0];
        // 0.5 rounds to 0, so one positive is missed
        let scores = vec![0.9, 0.7, 0.5, 0.1];

        let check = check_scores(&labels, scores.clone(), &Config::default()).unwrap();
        assert_eq!(check.accuracy, 0.75);
        assert_eq!(check.precision, 1.0);
        assert!((check.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((check.f1 - 0.8).abs() < 1e-12);
        assert!(!check.accuracy_stop);
        assert!(!check.f1_stop);

        let lenient = Config {
            accuracy_threshold: 0.75,
            f1_threshold: 0.8,
            ..Config::default()
        };
        let check = check_scores(&labels, scores, &lenient).unwrap();
        assert!(check.accuracy_stop);
        assert!(check.f1_stop);
    }

    #[test]
    fn test_check_scores_rejects_length_mismatch() {
        let result = check_scores(&[1, 0], vec![1.0], &Config::default());
        assert_eq!(
            result,
            Err(MonitorError::ShapeMismatch {
                expected: 2,
                actual: 1
            })
        );
    }
}
