//! Descriptive statistics over extracted feature columns.

use crate::core::features::FeatureRow;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Statistics for one numeric feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    /// Number of defined values
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation, zero with fewer than two values
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Statistics for a whole feature table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub rows: usize,
    pub entries_inside: usize,
    pub columns: Vec<ColumnSummary>,
}

/// Summarize every numeric feature column, skipping undefined values.
pub fn summarize(rows: &[FeatureRow]) -> FeatureSummary {
    let columns: [(&str, fn(&FeatureRow) -> Option<f64>); 8] = [
        ("total_time", |r| r.total_time),
        ("distance_from_center", |r| Some(r.distance_from_center)),
        ("distance_2", |r| Some(r.distance_2)),
        ("bearing_center", |r| Some(r.bearing_center)),
        ("bearing", |r| r.trip.map(|t| t.bearing)),
        ("bearing_diff", |r| r.trip.map(|t| t.bearing_diff)),
        ("vmean", |r| r.trip.and_then(|t| t.vmean)),
        ("travelled-dist", |r| r.trip.map(|t| t.travelled_dist)),
    ];

    FeatureSummary {
        rows: rows.len(),
        entries_inside: rows.iter().filter(|r| r.entry_inside == 1).count(),
        columns: columns
            .iter()
            .filter_map(|(name, get)| {
                let values: Vec<f64> = rows
                    .iter()
                    .filter_map(*get)
                    .filter(|v| v.is_finite())
                    .collect();
                summarize_column(name, &values)
            })
            .collect(),
    }
}

fn summarize_column(name: &str, values: &[f64]) -> Option<ColumnSummary> {
    if values.is_empty() {
        return None;
    }

    let std_dev = if values.len() < 2 {
        0.0
    } else {
        Statistics::std_dev(values)
    };

    Some(ColumnSummary {
        name: name.to_string(),
        count: values.len(),
        mean: Statistics::mean(values),
        std_dev,
        min: Statistics::min(values),
        max: Statistics::max(values),
    })
}

impl FeatureSummary {
    /// Render as an aligned text table.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Rows: {} ({} entering inside the zone)\n\n{:<22} {:>8} {:>16} {:>16} {:>16} {:>16}\n",
            self.rows, self.entries_inside, "column", "count", "mean", "std", "min", "max"
        );
        for c in &self.columns {
            out.push_str(&format!(
                "{:<22} {:>8} {:>16.4} {:>16.4} {:>16.4} {:>16.4}\n",
                c.name, c.count, c.mean, c.std_dev, c.min, c.max
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::extract;
    use crate::core::geo::{Point, ZONE_CENTER};
    use crate::data::types::TrajectoryRecord;

    #[test]
    fn test_summary_single_mode_skips_trip_columns() {
        let records = vec![
            TrajectoryRecord::new("a", "10:00:00", "10:00:10", ZONE_CENTER, None),
            TrajectoryRecord::new("b", "10:00:00", "10:00:30", Point::new(0.0, 0.0), None),
        ];
        let summary = summarize(&extract(&records, true).unwrap());

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.entries_inside, 1);
        assert!(summary.columns.iter().all(|c| c.name != "bearing"));

        let total_time = summary
            .columns
            .iter()
            .find(|c| c.name == "total_time")
            .unwrap();
        assert_eq!(total_time.count, 2);
        assert!((total_time.mean - 20.0).abs() < 1e-9);
        assert_eq!(total_time.min, 10.0);
        assert_eq!(total_time.max, 30.0);
    }

    #[test]
    fn test_render_lists_columns() {
        let records = vec![TrajectoryRecord::new(
            "a",
            "10:00:00",
            "10:00:10",
            ZONE_CENTER,
            Some(ZONE_CENTER),
        )];
        let text = summarize(&extract(&records, false).unwrap()).render();
        assert!(text.contains("travelled-dist"));
        assert!(text.contains("distance_2"));
    }
}
