//! CSV input and output for trajectory tables.
//!
//! Input tables are sliced to the contiguous column range `hash..=y_exit`;
//! anything outside it (index columns, label columns) is ignored. Columns in
//! the range that a record does not model are carried through verbatim and
//! written back after `time_exit`. Missing cells read as the empty string.

use crate::core::features::FeatureRow;
use crate::core::labels::LabeledRow;
use crate::data::types::{parse_time_of_day, TrajectoryRecord};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// First column of the retained range.
pub const FIRST_COLUMN: &str = "hash";
/// Last column of the retained range.
pub const LAST_COLUMN: &str = "y_exit";

/// Columns that must be present within the retained range.
const REQUIRED_COLUMNS: [&str; 7] = [
    "hash",
    "time_entry",
    "time_exit",
    "x_entry",
    "y_entry",
    "x_exit",
    "y_exit",
];

/// Optional identifier column, written only when the input had it.
pub const TRAJECTORY_ID_COLUMN: &str = "trajectory_id";

/// Record columns written after any passthrough columns.
pub const POSITION_COLUMNS: [&str; 6] = [
    "x_entry",
    "y_entry",
    "x_exit",
    "y_exit",
    "time_entry_seconds",
    "time_exit_seconds",
];

/// Output columns derived by the feature extractor.
pub const FEATURE_COLUMNS: [&str; 9] = [
    "total_time",
    "entry_inside",
    "distance_from_center",
    "distance_2",
    "bearing_center",
    "bearing",
    "bearing_diff",
    "vmean",
    "travelled-dist",
];

/// Name of the label column in labelled output.
pub const LABEL_COLUMN: &str = "train_label";

/// Which input table to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Test,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Test => "test",
        }
    }

    /// File name of the table for this mode.
    pub fn file_name(&self) -> String {
        format!("data_{}.csv", self.as_str())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "train" => Ok(Mode::Train),
            "test" => Ok(Mode::Test),
            other => Err(format!("unknown mode '{other}' (expected train or test)")),
        }
    }
}

/// Data loading errors.
#[derive(Debug)]
pub enum DataError {
    IoError(String),
    CsvError(String),
    MissingColumn(String),
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::IoError(e) => write!(f, "IO error: {e}"),
            DataError::CsvError(e) => write!(f, "CSV error: {e}"),
            DataError::MissingColumn(c) => write!(f, "missing column '{c}'"),
            DataError::InvalidValue { row, column, value } => {
                write!(f, "row {row}: invalid {column} value '{value}'")
            }
        }
    }
}

impl std::error::Error for DataError {}

impl From<csv::Error> for DataError {
    fn from(e: csv::Error) -> Self {
        DataError::CsvError(e.to_string())
    }
}

impl From<io::Error> for DataError {
    fn from(e: io::Error) -> Self {
        DataError::IoError(e.to_string())
    }
}

/// Path of the table for `mode` under `dir`.
pub fn data_file(dir: impl AsRef<Path>, mode: Mode) -> PathBuf {
    dir.as_ref().join(mode.file_name())
}

/// Read `data_{mode}.csv` from `dir`.
pub fn read_data(dir: impl AsRef<Path>, mode: Mode) -> Result<Vec<TrajectoryRecord>, DataError> {
    let path = data_file(dir, mode);
    let file = File::open(&path)
        .map_err(|e| DataError::IoError(format!("{}: {e}", path.display())))?;
    let records = read_records(file)?;
    tracing::info!(path = %path.display(), records = records.len(), "loaded trajectories");
    Ok(records)
}

/// Read trajectory records from any CSV source.
pub fn read_records<R: io::Read>(source: R) -> Result<Vec<TrajectoryRecord>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::resolve(&headers)?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let raw = result?;
        records.push(columns.record(row, &raw)?);
    }
    Ok(records)
}

/// Positions of the retained columns in the input header.
struct ColumnIndex {
    hash: usize,
    trajectory_id: Option<usize>,
    time_entry: usize,
    time_exit: usize,
    x_entry: usize,
    y_entry: usize,
    x_exit: usize,
    y_exit: usize,
    /// Unmodelled columns in the range, in input order
    extra: Vec<(usize, String)>,
}

/// Whether `name` is a column the loader or extractor produces itself.
fn is_modelled(name: &str) -> bool {
    name == TRAJECTORY_ID_COLUMN
        || REQUIRED_COLUMNS.contains(&name)
        || POSITION_COLUMNS.contains(&name)
        || FEATURE_COLUMNS.contains(&name)
        || name == LABEL_COLUMN
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, DataError> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let first = position(FIRST_COLUMN)
            .ok_or_else(|| DataError::MissingColumn(FIRST_COLUMN.to_string()))?;
        let last = position(LAST_COLUMN)
            .ok_or_else(|| DataError::MissingColumn(LAST_COLUMN.to_string()))?;

        let retained = |name: &str| position(name).filter(|&i| i >= first && i <= last);
        let required = |name: &str| {
            retained(name).ok_or_else(|| DataError::MissingColumn(name.to_string()))
        };

        for name in REQUIRED_COLUMNS {
            required(name)?;
        }

        // derived columns of the same name supersede the input's
        let extra = headers
            .iter()
            .enumerate()
            .take(last + 1)
            .skip(first)
            .map(|(i, h)| (i, h.trim()))
            .filter(|(_, h)| !is_modelled(h))
            .map(|(i, h)| (i, h.to_string()))
            .collect::<Vec<_>>();
        if !extra.is_empty() {
            tracing::debug!(columns = extra.len(), "carrying passthrough columns");
        }

        Ok(Self {
            hash: first,
            trajectory_id: retained("trajectory_id"),
            time_entry: required("time_entry")?,
            time_exit: required("time_exit")?,
            x_entry: required("x_entry")?,
            y_entry: required("y_entry")?,
            x_exit: required("x_exit")?,
            y_exit: last,
            extra,
        })
    }

    fn record(&self, row: usize, raw: &csv::StringRecord) -> Result<TrajectoryRecord, DataError> {
        let cell = |i: usize| raw.get(i).unwrap_or("").trim();

        let time_entry = cell(self.time_entry).to_string();
        let time_exit = cell(self.time_exit).to_string();

        Ok(TrajectoryRecord {
            hash: cell(self.hash).to_string(),
            trajectory_id: self.trajectory_id.map(|i| cell(i).to_string()),
            time_entry_seconds: parse_time_of_day(&time_entry),
            time_exit_seconds: parse_time_of_day(&time_exit),
            time_entry,
            time_exit,
            x_entry: required_number(row, "x_entry", cell(self.x_entry))?,
            y_entry: required_number(row, "y_entry", cell(self.y_entry))?,
            x_exit: optional_number(row, "x_exit", cell(self.x_exit))?,
            y_exit: optional_number(row, "y_exit", cell(self.y_exit))?,
            extra: self
                .extra
                .iter()
                .map(|(i, name)| (name.clone(), cell(*i).to_string()))
                .collect(),
        })
    }
}

/// Read one numeric column, by header name, from any CSV source.
pub fn read_column<R: io::Read>(source: R, column: &str) -> Result<Vec<f64>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source);
    let index = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| DataError::MissingColumn(column.to_string()))?;

    let mut values = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let raw = result?;
        values.push(required_number(row, column, raw.get(index).unwrap_or("").trim())?);
    }
    Ok(values)
}

/// Read the 0/1 `train_label` column of a labelled table.
pub fn read_labels<R: io::Read>(source: R) -> Result<Vec<u8>, DataError> {
    read_column(source, LABEL_COLUMN)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            v if v == 0.0 => Ok(0),
            v if v == 1.0 => Ok(1),
            v => Err(DataError::InvalidValue {
                row,
                column: LABEL_COLUMN.to_string(),
                value: v.to_string(),
            }),
        })
        .collect()
}

fn optional_number(row: usize, column: &str, value: &str) -> Result<Option<f64>, DataError> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| DataError::InvalidValue {
            row,
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn required_number(row: usize, column: &str, value: &str) -> Result<f64, DataError> {
    optional_number(row, column, value)?.ok_or_else(|| DataError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Record columns of an output table, taken from its first row.
struct OutputLayout {
    trajectory_id: bool,
    extra: Vec<String>,
}

impl OutputLayout {
    fn of(first: Option<&FeatureRow>) -> Self {
        match first {
            Some(row) => Self {
                trajectory_id: row.record.trajectory_id.is_some(),
                extra: row.record.extra.iter().map(|(name, _)| name.clone()).collect(),
            },
            None => Self {
                trajectory_id: false,
                extra: Vec::new(),
            },
        }
    }

    fn header(&self) -> Vec<String> {
        let mut header = vec![FIRST_COLUMN.to_string()];
        if self.trajectory_id {
            header.push(TRAJECTORY_ID_COLUMN.to_string());
        }
        header.extend(["time_entry", "time_exit"].map(String::from));
        header.extend(self.extra.iter().cloned());
        header.extend(POSITION_COLUMNS.map(String::from));
        header.extend(FEATURE_COLUMNS.map(String::from));
        header
    }

    fn fields(&self, row: &FeatureRow) -> Vec<String> {
        let r = &row.record;
        let trip = row.trip;

        let mut fields = vec![r.hash.clone()];
        if self.trajectory_id {
            fields.push(r.trajectory_id.clone().unwrap_or_default());
        }
        fields.push(r.time_entry.clone());
        fields.push(r.time_exit.clone());
        for name in &self.extra {
            let value = r
                .extra
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone());
            fields.push(value.unwrap_or_default());
        }
        fields.extend([
            r.x_entry.to_string(),
            r.y_entry.to_string(),
            format_optional(r.x_exit),
            format_optional(r.y_exit),
            format_optional(r.time_entry_seconds),
            format_optional(r.time_exit_seconds),
            format_optional(row.total_time),
            row.entry_inside.to_string(),
            row.distance_from_center.to_string(),
            row.distance_2.to_string(),
            row.bearing_center.to_string(),
            format_optional(trip.map(|t| t.bearing)),
            format_optional(trip.map(|t| t.bearing_diff)),
            format_optional(trip.and_then(|t| t.vmean)),
            format_optional(trip.map(|t| t.travelled_dist)),
        ]);
        fields
    }
}

/// Write extracted features as CSV.
pub fn write_features<W: io::Write>(sink: W, rows: &[FeatureRow]) -> Result<(), DataError> {
    let layout = OutputLayout::of(rows.first());
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(layout.header())?;
    for row in rows {
        writer.write_record(layout.fields(row))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write labelled features as CSV, with the label as the last column.
pub fn write_labeled<W: io::Write>(sink: W, rows: &[LabeledRow]) -> Result<(), DataError> {
    let layout = OutputLayout::of(rows.first().map(|r| &r.features));
    let mut writer = csv::Writer::from_writer(sink);

    let mut header = layout.header();
    header.push(LABEL_COLUMN.to_string());
    writer.write_record(header)?;

    for row in rows {
        let mut fields = layout.fields(&row.features);
        fields.push(row.train_label.to_string());
        writer.write_record(fields)?;
    }
    writer.flush()?;
    Ok(())
}
