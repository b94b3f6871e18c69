//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rust_xlsxwriter::Workbook;

use pv_sweep::config::{SiteConfig, SweepConfig};
use pv_sweep::error::{Result, SweepError};
use pv_sweep::io::table::ParameterTable;
use pv_sweep::sweep::Simulation;
use pv_sweep::sweep::layout::{PV_ASSET_TABLE, SCALARS_FILE, TIMESERIES_FILE};

/// Parameter table with one PV asset.
pub const ONE_ASSET_TABLE: &str = "\
,unit,pv_plant_01
age_installed,year,0
specific_costs,currency/unit,1000
file_name,str,si_180_40.csv
";

/// Parameter table with two PV assets.
pub const TWO_ASSET_TABLE: &str = "\
,unit,pv_plant_01,pv_plant_02
age_installed,year,0,0
specific_costs,currency/unit,1000,1000
file_name,str,si_180_40.csv,si_90_90.csv
";

/// Parameter table without any asset column.
pub const NO_ASSET_TABLE: &str = "\
,unit
age_installed,year
specific_costs,currency/unit
";

/// Baseline config rooted in `root`: inputs in `root/inputs`, outputs in
/// `root/out`, sweeping `specific_costs` of `pv_plant_01` over 500..=1000
/// in steps of 250.
pub fn config_in(root: &Path) -> SweepConfig {
    let mut cfg = SweepConfig::baseline();
    cfg.paths.output_directory = root.join("out");
    cfg.paths.mvs_input_directory = root.join("inputs");
    cfg.paths.mvs_output_directory = root.join("mvs_outputs");
    cfg.sweep.start = 500;
    cfg.sweep.stop = 1000;
    cfg.sweep.step = 250;
    cfg
}

/// Writes `contents` as the parameter table the config points at.
pub fn seed_parameter_table(cfg: &SweepConfig, contents: &str) -> PathBuf {
    let path = cfg.parameter_table_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).expect("create csv_elements");
    }
    fs::write(&path, contents).expect("write parameter table");
    path
}

/// KPI values the fake simulation derives from the swept value.
pub fn costs_total_for(value: f64, asset_index: usize) -> f64 {
    value * 2.0 + asset_index as f64
}

/// Writes a scalar summary with the sheets and labels the aggregator reads.
///
/// Asset `i` gets `costs_total = costs_total_for(value, i)`; system scalars
/// are fractions of `value`.
pub fn write_scalar_summary(path: &Path, assets: &[&str], value: f64) {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("cost_matrix").expect("sheet name");
    sheet.write_string(0, 1, "label").expect("write");
    sheet.write_string(0, 2, "costs_total").expect("write");
    sheet
        .write_string(0, 3, "levelized_cost_of_energy_of_asset")
        .expect("write");
    for (i, asset) in assets.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, i as f64).expect("write");
        sheet.write_string(row, 1, *asset).expect("write");
        sheet
            .write_number(row, 2, costs_total_for(value, i))
            .expect("write");
        sheet.write_number(row, 3, value / 10_000.0).expect("write");
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("scalar_matrix").expect("sheet name");
    sheet.write_string(0, 1, "label").expect("write");
    sheet.write_string(0, 2, "optimizedAddCap").expect("write");
    for (i, asset) in assets.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, i as f64).expect("write");
        sheet.write_string(row, 1, *asset).expect("write");
        sheet.write_number(row, 2, 100.0 - value / 100.0).expect("write");
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("scalars").expect("sheet name");
    sheet.write_number(0, 1, 0.0).expect("write");
    let scalars = [
        ("Total renewable energy use", value * 10.0),
        ("Renewable_share", 0.5),
        ("Onsite energy fraction", 0.6),
        ("Onsite energy matching", 0.3),
        ("Degree of autonomy", value / 4000.0),
    ];
    for (i, (label, v)) in scalars.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *label).expect("write");
        sheet.write_number(row, 1, *v).expect("write");
    }

    workbook.save(path).expect("save scalar summary");
}

/// Writes an `Electricity_bus` sheet with text timestamps.
pub fn write_timeseries(path: &Path, columns: &[&str], rows: &[(NaiveDateTime, Vec<f64>)]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Electricity_bus").expect("sheet name");
    for (j, name) in columns.iter().enumerate() {
        sheet.write_string(0, j as u16 + 1, *name).expect("write");
    }
    for (i, (ts, values)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        sheet
            .write_string(row, 0, ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .expect("write");
        for (j, v) in values.iter().enumerate() {
            sheet.write_number(row, j as u16 + 1, *v).expect("write");
        }
    }
    workbook.save(path).expect("save timeseries");
}

/// Hourly timestamps from `start` for `hours` hours.
pub fn hourly(start: NaiveDateTime, hours: i64) -> Vec<NaiveDateTime> {
    (0..hours)
        .map(|h| start + chrono::TimeDelta::hours(h))
        .collect()
}

/// Stand-in for the external simulation.
///
/// Reads the swept cell from the parameter table at call time and writes
/// result workbooks derived from it, plus the run's copy of the table.
pub struct FakeSimulation {
    pub table_path: PathBuf,
    pub variable_name: String,
    pub variable_column: String,
    pub prepared: usize,
    pub runs: Vec<(String, PathBuf)>,
}

impl FakeSimulation {
    pub fn new(cfg: &SweepConfig) -> Self {
        Self {
            table_path: cfg.parameter_table_path(),
            variable_name: cfg.sweep.variable_name.clone(),
            variable_column: cfg.sweep.variable_column.clone(),
            prepared: 0,
            runs: Vec::new(),
        }
    }
}

impl Simulation for FakeSimulation {
    fn prepare(&mut self, _site: &SiteConfig) -> Result<()> {
        self.prepared += 1;
        Ok(())
    }

    fn run(&mut self, scenario: &str, output_dir: &Path) -> Result<()> {
        let table = ParameterTable::from_path(&self.table_path)?;
        let raw = table
            .get(&self.variable_name, &self.variable_column)
            .unwrap_or_default()
            .to_string();
        let value: f64 = raw
            .parse()
            .map_err(|_| SweepError::Simulation(format!("non-numeric cell `{raw}`")))?;

        let inputs = output_dir.join("inputs").join("csv_elements");
        fs::create_dir_all(&inputs).map_err(SweepError::io(&inputs))?;
        table.to_path(&inputs.join(PV_ASSET_TABLE))?;

        let assets: Vec<&str> = table.asset_columns().collect();
        write_scalar_summary(&output_dir.join(SCALARS_FILE), &assets, value);
        let start = chrono::NaiveDate::from_ymd_opt(2014, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        let rows: Vec<(NaiveDateTime, Vec<f64>)> = hourly(start, 24)
            .into_iter()
            .map(|ts| (ts, vec![value / 1000.0, 2.0]))
            .collect();
        write_timeseries(
            &output_dir.join(TIMESERIES_FILE),
            &["pv_plant_01", "Electricity demand"],
            &rows,
        );

        self.runs.push((scenario.to_string(), output_dir.to_path_buf()));
        Ok(())
    }
}
