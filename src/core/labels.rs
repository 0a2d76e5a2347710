//! Training labels from the last trajectory of each device.

use crate::core::features::{FeatureError, FeatureRow};
use crate::core::geo::in_zone;
use crate::data::types::TrajectoryRecord;
use serde::{Deserialize, Serialize};

/// A feature row with its training label attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub features: FeatureRow,
    /// 1 when the last trajectory ends inside the zone
    pub train_label: u8,
}

/// Label each row by whether the matching last trajectory exits inside the zone.
///
/// `last_trajectories` is aligned with `rows` by position; there is no join key.
pub fn make_label(
    rows: Vec<FeatureRow>,
    last_trajectories: &[TrajectoryRecord],
) -> Result<(Vec<LabeledRow>, Vec<u8>), FeatureError> {
    if rows.len() != last_trajectories.len() {
        return Err(FeatureError::LengthMismatch {
            rows: rows.len(),
            labels: last_trajectories.len(),
        });
    }

    let labels = last_trajectories
        .iter()
        .enumerate()
        .map(|(row, last)| {
            last.exit()
                .map(|exit| u8::from(in_zone(exit)))
                .ok_or(FeatureError::MissingExit { row })
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let labeled = rows
        .into_iter()
        .zip(&labels)
        .map(|(features, &train_label)| LabeledRow {
            features,
            train_label,
        })
        .collect();

    tracing::debug!(
        rows = labels.len(),
        positive = labels.iter().filter(|&&l| l == 1).count(),
        "built training labels"
    );

    Ok((labeled, labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::extract;
    use crate::core::geo::{Point, ZONE_CENTER, ZONE_X_MAX, ZONE_Y_MIN};

    fn trip(entry: Point, exit: Option<Point>) -> TrajectoryRecord {
        TrajectoryRecord::new("device", "12:00:00", "12:01:00", entry, exit)
    }

    #[test]
    fn test_labels_follow_last_exit() {
        let outside = Point::new(ZONE_X_MAX + 100.0, ZONE_Y_MIN - 100.0);
        let records = vec![trip(outside, None), trip(outside, None)];
        let last = vec![
            trip(outside, Some(ZONE_CENTER)),
            trip(ZONE_CENTER, Some(outside)),
        ];

        let rows = extract(&records, true).unwrap();
        let (labeled, labels) = make_label(rows, &last).unwrap();

        assert_eq!(labels, vec![1, 0]);
        assert_eq!(labeled[0].train_label, 1);
        assert_eq!(labeled[1].train_label, 0);
        assert_eq!(labeled[0].features.record, records[0]);
    }

    #[test]
    fn test_boundary_exit_is_inside() {
        let records = vec![trip(ZONE_CENTER, None)];
        let last = vec![trip(ZONE_CENTER, Some(Point::new(ZONE_X_MAX, ZONE_Y_MIN)))];

        let (_, labels) = make_label(extract(&records, true).unwrap(), &last).unwrap();
        assert_eq!(labels, vec![1]);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let records = vec![trip(ZONE_CENTER, None), trip(ZONE_CENTER, None)];
        let last = vec![trip(ZONE_CENTER, Some(ZONE_CENTER))];

        let result = make_label(extract(&records, true).unwrap(), &last);
        assert_eq!(
            result,
            Err(FeatureError::LengthMismatch { rows: 2, labels: 1 })
        );
    }

    #[test]
    fn test_missing_last_exit_is_rejected() {
        let records = vec![trip(ZONE_CENTER, None)];
        let last = vec![trip(ZONE_CENTER, None)];

        let result = make_label(extract(&records, true).unwrap(), &last);
        assert_eq!(result, Err(FeatureError::MissingExit { row: 0 }));
    }
}
