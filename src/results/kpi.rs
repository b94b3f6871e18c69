//! KPI extraction from archived scalar summaries, aggregation and report.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SweepError};
use crate::io::table::ParameterTable;
use crate::io::workbook::ScalarSummary;
use crate::sweep::layout::{ArchiveLayout, run_id_from_path};

use super::plot;

/// Key performance indicator read from a scalar summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum Kpi {
    #[serde(rename = "costs total PV")]
    CostsTotalPv,
    #[serde(rename = "installed capacity PV")]
    InstalledCapacityPv,
    #[serde(rename = "Total renewable energy use")]
    TotalRenewableEnergyUse,
    #[serde(rename = "Renewable share")]
    RenewableShare,
    #[serde(rename = "LCOE PV")]
    LcoePv,
    #[serde(rename = "self consumption")]
    SelfConsumption,
    #[serde(rename = "self sufficiency")]
    SelfSufficiency,
    #[serde(rename = "Degree of autonomy")]
    DegreeOfAutonomy,
}

impl Kpi {
    pub const COUNT: usize = 8;

    /// Every KPI in table column order.
    pub const ALL: [Kpi; Self::COUNT] = [
        Kpi::CostsTotalPv,
        Kpi::InstalledCapacityPv,
        Kpi::TotalRenewableEnergyUse,
        Kpi::RenewableShare,
        Kpi::LcoePv,
        Kpi::SelfConsumption,
        Kpi::SelfSufficiency,
        Kpi::DegreeOfAutonomy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Kpi::CostsTotalPv => "costs total PV",
            Kpi::InstalledCapacityPv => "installed capacity PV",
            Kpi::TotalRenewableEnergyUse => "Total renewable energy use",
            Kpi::RenewableShare => "Renewable share",
            Kpi::LcoePv => "LCOE PV",
            Kpi::SelfConsumption => "self consumption",
            Kpi::SelfSufficiency => "self sufficiency",
            Kpi::DegreeOfAutonomy => "Degree of autonomy",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Reads this KPI for `asset` from a scalar summary.
    fn read(self, summary: &ScalarSummary, asset: &str) -> Result<f64> {
        match self {
            Kpi::CostsTotalPv => summary.asset_cost(asset, "costs_total"),
            Kpi::InstalledCapacityPv => summary.asset_added_capacity(asset),
            Kpi::TotalRenewableEnergyUse => summary.scalar("Total renewable energy use"),
            Kpi::RenewableShare => summary.scalar("Renewable_share"),
            Kpi::LcoePv => summary.asset_cost(asset, "levelized_cost_of_energy_of_asset"),
            Kpi::SelfConsumption => summary.scalar("Onsite energy fraction"),
            Kpi::SelfSufficiency => summary.scalar("Onsite energy matching"),
            Kpi::DegreeOfAutonomy => summary.scalar("Degree of autonomy"),
        }
    }
}

impl fmt::Display for Kpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Kpi {
    type Err = String;

    /// Parses a KPI label, ignoring ASCII case.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Kpi::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = Kpi::ALL.iter().map(|k| k.label()).collect();
                format!("unknown KPI \"{s}\", available: {}", known.join(", "))
            })
    }
}

/// All eight KPI values of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiRow([f64; Kpi::COUNT]);

impl KpiRow {
    pub fn new(values: [f64; Kpi::COUNT]) -> Self {
        Self(values)
    }

    /// Extracts every KPI for `asset`.
    ///
    /// # Errors
    ///
    /// Returns `SweepError::Schema` if a referenced sheet cell is missing.
    pub fn extract(summary: &ScalarSummary, asset: &str) -> Result<Self> {
        let mut values = [f64::NAN; Kpi::COUNT];
        for kpi in Kpi::ALL {
            values[kpi.index()] = kpi.read(summary, asset)?;
        }
        Ok(Self(values))
    }

    pub fn get(&self, kpi: Kpi) -> f64 {
        self.0[kpi.index()]
    }
}

/// KPI rows keyed by swept value, always in ascending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiTable {
    rows: BTreeMap<i64, KpiRow>,
}

impl KpiTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row of `run`, returning the row it replaced.
    pub fn insert(&mut self, run: i64, row: KpiRow) -> Option<KpiRow> {
        self.rows.insert(run, row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, run: i64) -> Option<&KpiRow> {
        self.rows.get(&run)
    }

    /// Swept values in ascending order.
    pub fn runs(&self) -> impl Iterator<Item = i64> + '_ {
        self.rows.keys().copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = (i64, &KpiRow)> {
        self.rows.iter().map(|(run, row)| (*run, row))
    }

    /// `(run, value)` points of one KPI.
    pub fn series(&self, kpi: Kpi) -> Vec<(i64, f64)> {
        self.rows.iter().map(|(run, row)| (*run, row.get(kpi))).collect()
    }

    /// Text report of the selected KPIs, one line per run.
    pub fn report<'a>(&'a self, variable: &'a str, kpis: &'a [Kpi]) -> KpiReport<'a> {
        KpiReport {
            table: self,
            variable,
            kpis,
        }
    }
}

/// Printable view of a [`KpiTable`].
pub struct KpiReport<'a> {
    table: &'a KpiTable,
    variable: &'a str,
    kpis: &'a [Kpi],
}

impl fmt::Display for KpiReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ({}) ---", self.variable)?;
        write!(f, "{:>10}", self.variable)?;
        for kpi in self.kpis {
            write!(f, "  {:>26}", kpi.label())?;
        }
        for (run, row) in self.table.rows() {
            writeln!(f)?;
            write!(f, "{run:>10}")?;
            for kpi in self.kpis {
                write!(f, "  {:>26.4}", row.get(*kpi))?;
            }
        }
        Ok(())
    }
}

/// Builds the KPI table of an archive.
///
/// Every `*.xlsx` file in the archive's `scalars/` folder contributes one row
/// keyed by its run id, once per PV asset listed in that run's
/// `energyProduction.csv`. Several assets write the same row; the last one
/// wins. A run without any asset column contributes no row.
///
/// # Errors
///
/// Returns an error if the folder cannot be listed, a file name carries no
/// run id, or a scalar summary or asset table is missing or malformed.
pub fn aggregate_kpis(layout: &ArchiveLayout) -> Result<KpiTable> {
    let mut table = KpiTable::new();

    for path in scalar_files(&layout.scalars_dir())? {
        let run = run_id_from_path(&path)?;
        let summary = ScalarSummary::open(&path)?;
        let assets_path = layout.run_asset_table(run);
        let assets = ParameterTable::from_path(&assets_path)?;
        let columns: Vec<&str> = assets.asset_columns().collect();

        match columns.len() {
            0 => debug!(run, file = %assets_path.display(), "no PV asset listed, run skipped"),
            1 => {}
            n => warn!(
                run,
                assets = n,
                "several PV assets write the same KPI row, keeping the last"
            ),
        }

        for asset in columns {
            table.insert(run, KpiRow::extract(&summary, asset)?);
        }
    }

    info!(rows = table.len(), "aggregated KPIs");
    Ok(table)
}

/// Aggregates the archive and renders one stacked subplot per KPI.
///
/// # Errors
///
/// Returns any aggregation error, or `SweepError::Plot` if rendering fails.
pub fn plot_kpi_loop(layout: &ArchiveLayout, kpis: &[Kpi]) -> Result<(KpiTable, PathBuf)> {
    let table = aggregate_kpis(layout)?;
    let path = layout.kpi_plot_path();
    plot::render_kpis(&path, layout.variable(), &table, kpis)?;
    info!(file = %path.display(), "wrote KPI plot");
    Ok((table, path))
}

/// Workbook files of `dir` in name order, which is run order for padded ids.
fn scalar_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(SweepError::io(dir))? {
        let path = entry.map_err(SweepError::io(dir))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "xlsx") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
