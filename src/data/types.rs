//! Trajectory record types.

use crate::core::geo::Point;
use serde::{Deserialize, Serialize};

/// One trajectory segment as read from the input table.
///
/// Time strings keep the empty-string sentinel for missing values. Exit
/// coordinates are absent for the segment whose destination is being
/// predicted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    /// Device identifier
    pub hash: String,
    /// Segment identifier, when the input carries one
    #[serde(default)]
    pub trajectory_id: Option<String>,
    /// Entry time of day (`HH:MM:SS`)
    pub time_entry: String,
    /// Exit time of day (`HH:MM:SS`)
    pub time_exit: String,
    pub x_entry: f64,
    pub y_entry: f64,
    pub x_exit: Option<f64>,
    pub y_exit: Option<f64>,
    /// Seconds since midnight of `time_entry`
    pub time_entry_seconds: Option<f64>,
    /// Seconds since midnight of `time_exit`
    pub time_exit_seconds: Option<f64>,
    /// Other input columns in the retained range, as `(name, value)` in
    /// input order
    #[serde(default)]
    pub extra: Vec<(String, String)>,
}

impl TrajectoryRecord {
    /// Build a record from its raw fields, deriving the time-of-day seconds.
    pub fn new(
        hash: impl Into<String>,
        time_entry: impl Into<String>,
        time_exit: impl Into<String>,
        entry: Point,
        exit: Option<Point>,
    ) -> Self {
        let time_entry = time_entry.into();
        let time_exit = time_exit.into();
        Self {
            hash: hash.into(),
            trajectory_id: None,
            time_entry_seconds: parse_time_of_day(&time_entry),
            time_exit_seconds: parse_time_of_day(&time_exit),
            time_entry,
            time_exit,
            x_entry: entry.x,
            y_entry: entry.y,
            x_exit: exit.map(|p| p.x),
            y_exit: exit.map(|p| p.y),
            extra: Vec::new(),
        }
    }

    pub fn with_trajectory_id(mut self, trajectory_id: impl Into<String>) -> Self {
        self.trajectory_id = Some(trajectory_id.into());
        self
    }

    /// Attach a passthrough column, kept after any already attached.
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((name.into(), value.into()));
        self
    }

    pub fn entry(&self) -> Point {
        Point::new(self.x_entry, self.y_entry)
    }

    /// Exit point, when both exit coordinates are known.
    pub fn exit(&self) -> Option<Point> {
        match (self.x_exit, self.y_exit) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

/// Parse a time-of-day duration into total seconds.
///
/// Accepts `HH:MM:SS`, `HH:MM:SS.fff` and an optional `N days ` prefix.
/// Days, hours and minutes are integers; seconds must be finite. Returns
/// `None` for the empty sentinel or anything unparseable.
pub fn parse_time_of_day(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let (days, clock) = match value.split_once(" day") {
        Some((days, rest)) => {
            let days: i64 = days.trim().parse().ok()?;
            let rest = rest.trim_start_matches('s').trim();
            (days, rest)
        }
        None => (0, value),
    };

    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.trim().parse().ok()?;
    let minutes: i64 = parts.next()?.trim().parse().ok()?;
    let seconds: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || !seconds.is_finite() {
        return None;
    }

    Some(days as f64 * 86_400.0 + hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}
