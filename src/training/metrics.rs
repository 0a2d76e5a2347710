//! Binary classification metrics.
//!
//! Labels and predictions are 0/1 values. Undefined ratios (no predicted
//! positives, no actual positives) evaluate to zero.

use serde::{Deserialize, Serialize};

/// Confusion counts for a binary classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl ConfusionCounts {
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }
}

/// Count outcomes of `predicted` against `actual`, pairing by position.
pub fn confusion_counts(actual: &[u8], predicted: &[u8]) -> ConfusionCounts {
    let mut counts = ConfusionCounts::default();
    for (&truth, &guess) in actual.iter().zip(predicted) {
        match (truth == 1, guess == 1) {
            (true, true) => counts.true_positives += 1,
            (false, true) => counts.false_positives += 1,
            (true, false) => counts.false_negatives += 1,
            (false, false) => counts.true_negatives += 1,
        }
    }
    counts
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Fraction of correct predictions.
pub fn accuracy(actual: &[u8], predicted: &[u8]) -> f64 {
    let c = confusion_counts(actual, predicted);
    ratio(c.true_positives + c.true_negatives, c.total())
}

/// TP / (TP + FP)
pub fn precision(actual: &[u8], predicted: &[u8]) -> f64 {
    let c = confusion_counts(actual, predicted);
    ratio(c.true_positives, c.true_positives + c.false_positives)
}

/// TP / (TP + FN)
pub fn recall(actual: &[u8], predicted: &[u8]) -> f64 {
    let c = confusion_counts(actual, predicted);
    ratio(c.true_positives, c.true_positives + c.false_negatives)
}

/// Harmonic mean of precision and recall.
pub fn f1_score(actual: &[u8], predicted: &[u8]) -> f64 {
    let c = confusion_counts(actual, predicted);
    ratio(
        2 * c.true_positives,
        2 * c.true_positives + c.false_positives + c.false_negatives,
    )
}

/// Round model scores to binary predictions, ties to even.
pub fn round_predictions(scores: &[f64]) -> Vec<u8> {
    scores
        .iter()
        .map(|s| u8::from(s.round_ties_even() >= 1.0))
        .collect()
}
