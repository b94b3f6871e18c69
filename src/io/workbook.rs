//! Typed readers for the simulation's result workbooks.
//!
//! Every sheet name, header row and label column the result pipeline relies
//! on is declared here, so format drift surfaces as one `Schema` error
//! naming the file instead of a failed lookup deep inside a plot.

use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader, open_workbook_auto};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::{Result, SweepError};

pub const COST_MATRIX_SHEET: &str = "cost_matrix";
pub const SCALAR_MATRIX_SHEET: &str = "scalar_matrix";
pub const SCALARS_SHEET: &str = "scalars";
pub const ELECTRICITY_BUS_SHEET: &str = "Electricity_bus";

/// Column label of the single value column of the `scalars` sheet.
pub const SCALAR_VALUE_COLUMN: &str = "0";

/// A sheet with one header row and one label column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledSheet {
    name: String,
    columns: Vec<String>,
    labels: Vec<String>,
    cells: Vec<Vec<Data>>,
}

impl LabeledSheet {
    /// Builds a sheet from a cell range; `index_col` is the label column.
    pub fn from_range(name: &str, range: &Range<Data>, index_col: usize) -> Self {
        let mut rows = range.rows();
        let columns = rows
            .next()
            .map(|header| header.iter().map(cell_label).collect())
            .unwrap_or_default();

        let mut labels = Vec::new();
        let mut cells = Vec::new();
        for row in rows {
            labels.push(row.get(index_col).map(cell_label).unwrap_or_default());
            cells.push(row.to_vec());
        }

        Self {
            name: name.to_string(),
            columns,
            labels,
            cells,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Numeric value at (`row`, `column`); empty cells read as NaN.
    ///
    /// The first row carrying `row` wins, as with a label index.
    pub fn number(&self, row: &str, column: &str) -> Result<f64, String> {
        let c = self
            .columns
            .iter()
            .position(|label| label == column)
            .ok_or_else(|| format!("sheet `{}` has no column `{column}`", self.name))?;
        let r = self
            .labels
            .iter()
            .position(|label| label == row)
            .ok_or_else(|| format!("sheet `{}` has no row `{row}`", self.name))?;

        match self.cells[r].get(c) {
            None => Ok(f64::NAN),
            Some(cell) => cell_number(cell).ok_or_else(|| {
                format!(
                    "sheet `{}`: cell ({row}, {column}) is not numeric: {cell}",
                    self.name
                )
            }),
        }
    }
}

/// The scalar summary workbook of one simulation run.
#[derive(Debug, Clone)]
pub struct ScalarSummary {
    path: PathBuf,
    cost_matrix: LabeledSheet,
    scalar_matrix: LabeledSheet,
    scalars: LabeledSheet,
}

impl ScalarSummary {
    /// Opens a scalar summary and loads its three sheets.
    ///
    /// # Errors
    ///
    /// Returns `SweepError::Workbook` if the file cannot be opened and
    /// `SweepError::Schema` if a sheet is missing.
    pub fn open(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path).map_err(|source| SweepError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;
        let mut sheet = |name: &str, index_col: usize| -> Result<LabeledSheet> {
            let range = workbook
                .worksheet_range(name)
                .map_err(|e| SweepError::schema(path, format!("sheet `{name}`: {e}")))?;
            Ok(LabeledSheet::from_range(name, &range, index_col))
        };

        Ok(Self {
            path: path.to_path_buf(),
            cost_matrix: sheet(COST_MATRIX_SHEET, 1)?,
            scalar_matrix: sheet(SCALAR_MATRIX_SHEET, 1)?,
            scalars: sheet(SCALARS_SHEET, 0)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cost figure `column` of `asset` from the cost matrix.
    pub fn asset_cost(&self, asset: &str, column: &str) -> Result<f64> {
        self.lookup(&self.cost_matrix, asset, column)
    }

    /// Optimised added capacity of `asset`.
    pub fn asset_added_capacity(&self, asset: &str) -> Result<f64> {
        self.lookup(&self.scalar_matrix, asset, "optimizedAddCap")
    }

    /// System-wide scalar `label` from the scalar list.
    pub fn scalar(&self, label: &str) -> Result<f64> {
        self.lookup(&self.scalars, label, SCALAR_VALUE_COLUMN)
    }

    fn lookup(&self, sheet: &LabeledSheet, row: &str, column: &str) -> Result<f64> {
        sheet
            .number(row, column)
            .map_err(|message| SweepError::schema(&self.path, message))
    }
}

/// Energy flows of the electricity bus, one row per timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowSeries {
    pub columns: Vec<String>,
    pub timestamps: Vec<NaiveDateTime>,
    /// Row-major values, `values[row][column]`, NaN where the cell is empty.
    pub values: Vec<Vec<f64>>,
}

impl FlowSeries {
    /// Loads the `Electricity_bus` sheet of a time-series workbook.
    ///
    /// # Errors
    ///
    /// Returns `SweepError::Workbook` if the file cannot be opened and
    /// `SweepError::Schema` if the sheet is missing or a timestamp is unreadable.
    pub fn open(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path).map_err(|source| SweepError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;
        let range = workbook
            .worksheet_range(ELECTRICITY_BUS_SHEET)
            .map_err(|e| SweepError::schema(path, format!("sheet `{ELECTRICITY_BUS_SHEET}`: {e}")))?;
        Self::from_range(&range).map_err(|message| SweepError::schema(path, message))
    }

    /// Builds a series from a range whose first column is the timestamp index.
    pub fn from_range(range: &Range<Data>) -> Result<Self, String> {
        let mut rows = range.rows();
        let columns: Vec<String> = rows
            .next()
            .map(|header| header.iter().skip(1).map(cell_label).collect())
            .unwrap_or_default();

        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        for (i, row) in rows.enumerate() {
            let Some(first) = row.first() else { continue };
            if matches!(first, Data::Empty) {
                continue;
            }
            let ts = cell_timestamp(first)
                .ok_or_else(|| format!("row {}: unreadable timestamp {first}", i + 2))?;
            timestamps.push(ts);
            values.push(
                (0..columns.len())
                    .map(|c| row.get(c + 1).and_then(cell_number).unwrap_or(f64::NAN))
                    .collect(),
            );
        }

        Ok(Self {
            columns,
            timestamps,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Keeps only the rows whose timestamp satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&NaiveDateTime) -> bool) {
        let mut kept_ts = Vec::with_capacity(self.timestamps.len());
        let mut kept_values = Vec::with_capacity(self.values.len());
        for (ts, row) in self.timestamps.drain(..).zip(self.values.drain(..)) {
            if keep(&ts) {
                kept_ts.push(ts);
                kept_values.push(row);
            }
        }
        self.timestamps = kept_ts;
        self.values = kept_values;
    }

    /// `(timestamp, value)` pairs of one column, skipping non-finite values.
    pub fn column_points(&self, column: usize) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.timestamps
            .iter()
            .zip(&self.values)
            .filter_map(move |(ts, row)| {
                let v = *row.get(column)?;
                v.is_finite().then_some((*ts, v))
            })
    }
}

/// Text label of a header or index cell; whole numbers drop their decimals.
fn cell_label(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse().ok(),
        Data::Empty => Some(f64::NAN),
        _ => None,
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn cell_timestamp(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) => parse_timestamp(s),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64()),
        Data::Float(f) => excel_serial_to_datetime(*f),
        Data::Int(i) => excel_serial_to_datetime(*i as f64),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z").ok().map(|d| d.naive_local()))
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Converts an Excel serial date (1900 system) to a timestamp, rounded to the millisecond.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(rows: Vec<Vec<Data>>) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let mut r = Range::new((0, 0), (height.saturating_sub(1), width.saturating_sub(1)));
        for (i, row) in rows.into_iter().enumerate() {
            for (j, cell) in row.into_iter().enumerate() {
                r.set_value((i as u32, j as u32), cell);
            }
        }
        r
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn labeled_sheet_uses_index_column() {
        let r = range(vec![
            vec![Data::Empty, s("label"), s("costs_total")],
            vec![Data::Float(0.0), s("pv_plant_01"), Data::Float(1234.5)],
            vec![Data::Float(1.0), s("Electricity grid"), Data::Float(10.0)],
        ]);
        let sheet = LabeledSheet::from_range("cost_matrix", &r, 1);
        assert_eq!(sheet.number("pv_plant_01", "costs_total"), Ok(1234.5));
        assert!(sheet.number("pv_plant_02", "costs_total").is_err());
        assert!(sheet.number("pv_plant_01", "annuity_total").is_err());
    }

    #[test]
    fn numeric_header_is_labelled_without_decimals() {
        let r = range(vec![
            vec![Data::Empty, Data::Float(0.0)],
            vec![s("Degree of autonomy"), Data::Float(0.42)],
        ]);
        let sheet = LabeledSheet::from_range("scalars", &r, 0);
        assert_eq!(sheet.number("Degree of autonomy", SCALAR_VALUE_COLUMN), Ok(0.42));
    }

    #[test]
    fn text_cells_are_not_numbers() {
        let r = range(vec![
            vec![Data::Empty, s("0")],
            vec![s("Renewable_share"), s("n/a")],
        ]);
        let sheet = LabeledSheet::from_range("scalars", &r, 0);
        assert!(sheet.number("Renewable_share", "0").is_err());
    }

    #[test]
    fn flow_series_reads_text_and_serial_timestamps() {
        let r = range(vec![
            vec![Data::Empty, s("pv_plant_01"), s("Electricity demand")],
            vec![s("2014-01-01 00:00:00"), Data::Float(0.0), Data::Float(3.5)],
            vec![Data::Float(41640.5), Data::Float(2.0), Data::Empty],
        ]);
        let series = FlowSeries::from_range(&r).expect("series should parse");
        assert_eq!(series.columns, ["pv_plant_01", "Electricity demand"]);
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.timestamps[1],
            NaiveDate::from_ymd_opt(2014, 1, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .expect("valid date")
        );
        assert!(series.values[1][1].is_nan());
        assert_eq!(series.column_points(1).count(), 1);
    }

    #[test]
    fn unreadable_timestamp_is_an_error() {
        let r = range(vec![
            vec![Data::Empty, s("pv_plant_01")],
            vec![s("yesterday"), Data::Float(1.0)],
        ]);
        assert!(FlowSeries::from_range(&r).is_err());
    }

    #[test]
    fn retain_keeps_rows_aligned() {
        let r = range(vec![
            vec![Data::Empty, s("pv")],
            vec![s("2014-01-01 00:00:00"), Data::Float(1.0)],
            vec![s("2014-02-01 00:00:00"), Data::Float(2.0)],
            vec![s("2014-03-01 00:00:00"), Data::Float(3.0)],
        ]);
        let mut series = FlowSeries::from_range(&r).expect("series should parse");
        series.retain(|ts| ts.format("%m").to_string() != "02");
        assert_eq!(series.len(), 2);
        assert_eq!(series.values, vec![vec![1.0], vec![3.0]]);
    }
}
