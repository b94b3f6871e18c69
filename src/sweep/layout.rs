//! Filesystem layout of a sweep's outputs and archive.
//!
//! ```text
//! <output_root>/<scenario>/
//!     loop_outputs_<variable>/
//!         scalars/scalars_<suffix>.xlsx
//!         timeseries/timeseries_all_busses_<suffix>.xlsx
//!         plot_scalars_<variable>.png
//!     mvs_outputs_loop_<variable>_<i>/
//!         scalars.xlsx
//!         timeseries_all_busses.xlsx
//!         inputs/csv_elements/energyProduction.csv
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Result, SweepError};

/// Scalar summary written by each simulation run.
pub const SCALARS_FILE: &str = "scalars.xlsx";
/// Time-series workbook written by each simulation run.
pub const TIMESERIES_FILE: &str = "timeseries_all_busses.xlsx";
/// Parameter table listing the PV assets of a run.
pub const PV_ASSET_TABLE: &str = "energyProduction.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    output_root: PathBuf,
    scenario: String,
    variable: String,
    loop_output_override: Option<PathBuf>,
}

impl ArchiveLayout {
    pub fn new(output_root: impl Into<PathBuf>, scenario: &str, variable: &str) -> Self {
        Self {
            output_root: output_root.into(),
            scenario: scenario.to_string(),
            variable: variable.to_string(),
            loop_output_override: None,
        }
    }

    /// Reads the archive from `dir` instead of the default loop-output directory.
    pub fn with_loop_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.loop_output_override = Some(dir.into());
        self
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn scenario_dir(&self) -> PathBuf {
        self.output_root.join(&self.scenario)
    }

    pub fn loop_output_dir(&self) -> PathBuf {
        self.loop_output_override
            .clone()
            .unwrap_or_else(|| self.scenario_dir().join(format!("loop_outputs_{}", self.variable)))
    }

    pub fn scalars_dir(&self) -> PathBuf {
        self.loop_output_dir().join("scalars")
    }

    pub fn timeseries_dir(&self) -> PathBuf {
        self.loop_output_dir().join("timeseries")
    }

    /// Output directory handed to the simulation for run `value`.
    pub fn run_output_dir(&self, value: i64) -> PathBuf {
        self.scenario_dir()
            .join(format!("mvs_outputs_loop_{}_{value}", self.variable))
    }

    /// The simulation's copy of the PV asset table for run `value`.
    pub fn run_asset_table(&self, value: i64) -> PathBuf {
        self.run_output_dir(value)
            .join("inputs")
            .join("csv_elements")
            .join(PV_ASSET_TABLE)
    }

    pub fn archived_scalars(&self, suffix: &str) -> PathBuf {
        self.scalars_dir().join(format!("scalars_{suffix}.xlsx"))
    }

    pub fn archived_timeseries(&self, suffix: &str) -> PathBuf {
        self.timeseries_dir()
            .join(format!("timeseries_all_busses_{suffix}.xlsx"))
    }

    pub fn kpi_plot_path(&self) -> PathBuf {
        self.loop_output_dir()
            .join(format!("plot_scalars_{}.png", self.variable))
    }
}

/// Run id of an archived file: the last `_`-separated token of its stem.
///
/// # Errors
///
/// Returns `SweepError::RunId` if that token is not an integer.
pub fn run_id_from_path(path: &Path) -> Result<i64> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit('_').next())
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| SweepError::RunId {
            path: path.to_path_buf(),
        })
}
