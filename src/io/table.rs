//! Keyed CSV parameter table read and written by the sweep driver.
//!
//! The first column holds row labels (parameter names), the remaining
//! columns are `unit` plus one column per asset. Cells are kept as text so
//! that a rewrite only changes the cell that was set.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::error::{Result, SweepError};

/// Name of the column holding parameter units.
pub const UNIT_COLUMN: &str = "unit";

/// Lookup failure inside a [`ParameterTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("no row labelled `{0}`")]
    MissingRow(String),
    #[error("no column labelled `{0}`")]
    MissingColumn(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterTable {
    index_header: String,
    columns: Vec<String>,
    rows: Vec<(String, Vec<String>)>,
}

impl ParameterTable {
    /// Reads a table from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns `SweepError::Io` if the file cannot be opened and
    /// `SweepError::Csv` if it is not a rectangular CSV table.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(SweepError::io(path))?;
        Self::from_reader(file).map_err(SweepError::csv(path))
    }

    /// Reads a table from any CSV source.
    ///
    /// # Errors
    ///
    /// Returns a `csv::Error` on malformed input or ragged rows.
    pub fn from_reader(reader: impl Read) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers = rdr.headers()?.clone();
        let mut header_iter = headers.iter();
        let index_header = header_iter.next().unwrap_or_default().to_string();
        let columns: Vec<String> = header_iter.map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut cells = record.iter();
            let label = cells.next().unwrap_or_default().to_string();
            rows.push((label, cells.map(str::to_string).collect()));
        }

        Ok(Self {
            index_header,
            columns,
            rows,
        })
    }

    /// Writes the table back to `path`, replacing the file.
    ///
    /// # Errors
    ///
    /// Returns `SweepError::Io` or `SweepError::Csv` if writing fails.
    pub fn to_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(SweepError::io(path))?;
        let mut buf = io::BufWriter::new(file);
        self.write_to(&mut buf).map_err(SweepError::csv(path))?;
        buf.flush().map_err(SweepError::io(path))
    }

    /// Writes the table as CSV to any writer.
    ///
    /// # Errors
    ///
    /// Returns a `csv::Error` if writing fails.
    pub fn write_to(&self, writer: impl Write) -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new().from_writer(writer);

        wtr.write_record(std::iter::once(&self.index_header).chain(&self.columns))?;
        for (label, cells) in &self.rows {
            wtr.write_record(std::iter::once(label).chain(cells))?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Column labels, excluding the row-label column.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Asset columns: every column except [`UNIT_COLUMN`].
    pub fn asset_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| *c != UNIT_COLUMN)
    }

    pub fn row_labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(label, _)| label.as_str())
    }

    /// Returns the raw text of cell (`row`, `column`).
    pub fn get(&self, row: &str, column: &str) -> Option<&str> {
        let (r, c) = self.position(row, column).ok()?;
        self.rows[r].1.get(c).map(String::as_str)
    }

    /// Locates cell (`row`, `column`).
    ///
    /// # Errors
    ///
    /// Returns a `TableError` naming the missing row or column.
    pub fn position(&self, row: &str, column: &str) -> Result<(usize, usize), TableError> {
        let r = self
            .rows
            .iter()
            .position(|(label, _)| label == row)
            .ok_or_else(|| TableError::MissingRow(row.to_string()))?;
        let c = self
            .columns
            .iter()
            .position(|label| label == column)
            .ok_or_else(|| TableError::MissingColumn(column.to_string()))?;
        Ok((r, c))
    }

    /// Replaces cell (`row`, `column`) with `value`.
    ///
    /// # Errors
    ///
    /// Returns a `TableError` if the row or column does not exist.
    pub fn set(&mut self, row: &str, column: &str, value: impl Display) -> Result<(), TableError> {
        let (r, c) = self.position(row, column)?;
        let cells = &mut self.rows[r].1;
        if cells.len() <= c {
            cells.resize(c + 1, String::new());
        }
        cells[c] = value.to_string();
        Ok(())
    }
}
