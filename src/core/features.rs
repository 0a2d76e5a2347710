//! Feature computation from trajectory records.
//!
//! Every feature is computed per record from its entry/exit points and
//! timestamps relative to the fixed target zone. Extraction is pure: the
//! same records always produce the same rows.

use crate::core::geo::{
    compass_bearing, distance_to_center, distance_to_zone, in_zone, wrap_bearing_diff, ZONE_CENTER,
};
use crate::data::types::TrajectoryRecord;
use serde::{Deserialize, Serialize};

/// Features that need a known exit point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TripFeatures {
    /// Bearing from entry to exit
    pub bearing: f64,
    /// `bearing_center - bearing`, wrapped into [-180, 180]
    pub bearing_diff: f64,
    /// Straight-line displacement over elapsed time
    pub vmean: Option<f64>,
    /// Straight-line entry to exit distance
    pub travelled_dist: f64,
}

/// A record together with its derived features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub record: TrajectoryRecord,
    /// Elapsed seconds between entry and exit
    pub total_time: Option<f64>,
    /// 1 when the entry point lies in the zone
    pub entry_inside: u8,
    /// Distance from the entry point to the zone centroid
    pub distance_from_center: f64,
    /// Distance from the entry point to the nearest zone edge or corner
    pub distance_2: f64,
    /// Bearing from the entry point to the zone centroid
    pub bearing_center: f64,
    /// Present unless extracted in single-point mode
    pub trip: Option<TripFeatures>,
}

/// Feature extraction errors.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureError {
    /// Full-trip extraction needs exit coordinates
    MissingExit { row: usize },
    /// Positionally aligned tables differ in length
    LengthMismatch { rows: usize, labels: usize },
}

impl std::fmt::Display for FeatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureError::MissingExit { row } => {
                write!(f, "row {row} has no exit coordinates")
            }
            FeatureError::LengthMismatch { rows, labels } => {
                write!(
                    f,
                    "table has {rows} rows but last-trajectory table has {labels}"
                )
            }
        }
    }
}

impl std::error::Error for FeatureError {}

/// Compute features for every record.
///
/// With `single` set only the entry point is used, which is what is known
/// at prediction time. Otherwise every record must carry exit coordinates.
pub fn extract(records: &[TrajectoryRecord], single: bool) -> Result<Vec<FeatureRow>, FeatureError> {
    let rows = records
        .iter()
        .enumerate()
        .map(|(row, record)| extract_row(row, record, single))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        rows = rows.len(),
        single,
        inside = rows.iter().filter(|r| r.entry_inside == 1).count(),
        "extracted trajectory features"
    );

    Ok(rows)
}

fn extract_row(
    row: usize,
    record: &TrajectoryRecord,
    single: bool,
) -> Result<FeatureRow, FeatureError> {
    let entry = record.entry();

    let total_time = match (record.time_entry_seconds, record.time_exit_seconds) {
        (Some(start), Some(end)) => Some(end - start),
        _ => None,
    };
    let bearing_center = compass_bearing(entry, ZONE_CENTER);

    let trip = if single {
        None
    } else {
        let exit = record.exit().ok_or(FeatureError::MissingExit { row })?;
        let bearing = compass_bearing(entry, exit);
        let travelled_dist = entry.distance_to(exit);
        Some(TripFeatures {
            bearing,
            bearing_diff: wrap_bearing_diff(bearing_center - bearing),
            vmean: mean_velocity(travelled_dist, total_time),
            travelled_dist,
        })
    };

    Ok(FeatureRow {
        record: record.clone(),
        total_time,
        entry_inside: u8::from(in_zone(entry)),
        distance_from_center: distance_to_center(entry),
        distance_2: distance_to_zone(entry),
        bearing_center,
        trip,
    })
}

/// Displacement over time; zero elapsed time gives zero velocity.
///
/// Negative or unknown elapsed time leaves the velocity undefined.
fn mean_velocity(distance: f64, total_time: Option<f64>) -> Option<f64> {
    match total_time {
        Some(t) if t == 0.0 => Some(0.0),
        Some(t) if t > 0.0 => Some(distance / t),
        _ => None,
    }
}
