//! TOML-based sweep configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::results::kpi::Kpi;

/// Top-level sweep configuration parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from TOML
/// with [`SweepConfig::from_toml_file`] or use [`SweepConfig::baseline`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Location and demographics handed to the base simulation.
    #[serde(default)]
    pub site: SiteConfig,
    /// Scenario name, swept parameter and value range.
    #[serde(default)]
    pub sweep: SweepSettings,
    /// Input and output directory roots.
    #[serde(default)]
    pub paths: PathsConfig,
    /// External simulation program and argument templates.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Flow plot period selection.
    #[serde(default)]
    pub flows: FlowsConfig,
    /// KPI plot selection.
    #[serde(default)]
    pub kpi: KpiConfig,
}

/// Location and demographics of the simulated site.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Weather year.
    pub year: i32,
    /// Number of inhabitants.
    pub population: u64,
    /// Country of the location.
    pub country: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            latitude: 52.52437,
            longitude: 13.41053,
            year: 2014,
            population: 48_000,
            country: "Germany".to_string(),
        }
    }
}

/// Scenario name, swept parameter and value range.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepSettings {
    /// Scenario name, e.g. `"Scenario_A1"`.
    pub scenario_name: String,
    /// Row label of the swept parameter in the parameter table.
    pub variable_name: String,
    /// Column (asset) of the swept parameter.
    pub variable_column: String,
    /// File name of the parameter table below `<mvs_input_directory>/csv_elements`.
    pub csv_file_variable: String,
    /// First value (inclusive, >= 0).
    pub start: i64,
    /// Last value (inclusive, >= start).
    pub stop: i64,
    /// Increment (> 0).
    pub step: i64,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            scenario_name: "Scenario_A1".to_string(),
            variable_name: "specific_costs".to_string(),
            variable_column: "pv_plant_01".to_string(),
            csv_file_variable: "energyProduction.csv".to_string(),
            start: 500,
            stop: 2000,
            step: 100,
        }
    }
}

/// Input and output directory roots.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Root under which `<scenario>/` folders are created.
    pub output_directory: PathBuf,
    /// Simulation input directory holding `csv_elements/`.
    pub mvs_input_directory: PathBuf,
    /// Default location of a single simulation's outputs (flow plots).
    pub mvs_output_directory: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("data/user_outputs"),
            mvs_input_directory: PathBuf::from("data/mvs_inputs"),
            mvs_output_directory: PathBuf::from("data/mvs_outputs"),
        }
    }
}

/// External simulation program and argument templates.
///
/// Arguments may contain `{latitude}`, `{longitude}`, `{year}`,
/// `{population}`, `{country}`, `{scenario}`, `{input_dir}` and
/// `{output_dir}` placeholders.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Executable to launch.
    pub program: String,
    /// Arguments of the base run computing the PV time series.
    pub prepare_args: Vec<String>,
    /// Arguments of one energy-system optimisation run.
    pub run_args: Vec<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            prepare_args: vec![
                "-c".to_string(),
                "import pvcompare.main as m; m.main(latitude={latitude}, longitude={longitude}, \
                 year={year}, population={population}, country='{country}')"
                    .to_string(),
            ],
            run_args: vec![
                "-c".to_string(),
                "import pvcompare.main as m; m.apply_mvs(scenario_name='{scenario}', \
                 mvs_output_directory='{output_dir}')"
                    .to_string(),
            ],
        }
    }
}

/// Flow plot period selection and source file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlowsConfig {
    /// Directory of the time-series workbook; defaults to the output directory.
    pub timeseries_directory: Option<PathBuf>,
    /// Time-series workbook file name.
    pub timeseries_name: String,
    /// Month to plot (1-12).
    pub month: Option<u32>,
    /// ISO calendar week to plot (1-53).
    pub calendar_week: Option<u32>,
    /// Day of `calendar_week` (0 = Monday … 6 = Sunday).
    pub weekday: Option<u32>,
}

impl Default for FlowsConfig {
    fn default() -> Self {
        Self {
            timeseries_directory: None,
            timeseries_name: "timeseries_all_busses.xlsx".to_string(),
            month: None,
            calendar_week: None,
            weekday: None,
        }
    }
}

/// KPI plot selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KpiConfig {
    /// KPIs to plot, one stacked subplot each.
    pub kpis: Vec<Kpi>,
    /// Archive to read; defaults to the sweep's loop-output directory.
    pub loop_output_directory: Option<PathBuf>,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            kpis: vec![
                Kpi::CostsTotalPv,
                Kpi::DegreeOfAutonomy,
                Kpi::SelfConsumption,
                Kpi::SelfSufficiency,
            ],
            loop_output_directory: None,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"sweep.step"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl SweepConfig {
    /// Returns the baseline sweep: PV specific costs from 500 to 2000 in Berlin.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline"];

    /// Loads a sweep from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a sweep from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a sweep from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Path of the parameter table the sweep mutates.
    pub fn parameter_table_path(&self) -> PathBuf {
        self.paths
            .mvs_input_directory
            .join("csv_elements")
            .join(&self.sweep.csv_file_variable)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. The flow weekday
    /// is left to the flow plotter, which logs and ignores invalid values.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: &str| {
            errors.push(ConfigError {
                field: field.into(),
                message: message.into(),
            });
        };

        let site = &self.site;
        if !(-90.0..=90.0).contains(&site.latitude) {
            push("site.latitude", "must be in [-90, 90]");
        }
        if !(-180.0..=180.0).contains(&site.longitude) {
            push("site.longitude", "must be in [-180, 180]");
        }
        if site.country.trim().is_empty() {
            push("site.country", "must not be empty");
        }

        let s = &self.sweep;
        if s.scenario_name.trim().is_empty() {
            push("sweep.scenario_name", "must not be empty");
        }
        if s.variable_name.is_empty() || s.variable_name.contains(char::is_whitespace) {
            push("sweep.variable_name", "must be non-empty and contain no whitespace");
        }
        if s.variable_column.trim().is_empty() {
            push("sweep.variable_column", "must not be empty");
        }
        if s.csv_file_variable.trim().is_empty() {
            push("sweep.csv_file_variable", "must not be empty");
        }
        if s.start < 0 {
            push("sweep.start", "must be >= 0");
        }
        if s.stop < s.start {
            push("sweep.stop", "must be >= sweep.start");
        }
        if s.step <= 0 {
            push("sweep.step", "must be > 0");
        }

        if self.simulation.program.trim().is_empty() {
            push("simulation.program", "must not be empty");
        }

        let fl = &self.flows;
        if fl.month.is_some_and(|m| !(1..=12).contains(&m)) {
            push("flows.month", "must be in 1..=12");
        }
        if fl.calendar_week.is_some_and(|w| !(1..=53).contains(&w)) {
            push("flows.calendar_week", "must be in 1..=53");
        }
        if fl.timeseries_name.trim().is_empty() {
            push("flows.timeseries_name", "must not be empty");
        }

        if self.kpi.kpis.is_empty() {
            push("kpi.kpis", "must list at least one KPI");
        }

        errors
    }
}
