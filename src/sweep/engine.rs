//! Sweep driver: mutate one parameter, re-run the simulation, archive results.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{SiteConfig, SweepConfig};
use crate::error::{Result, SweepError};
use crate::io::table::ParameterTable;

use super::layout::{ArchiveLayout, SCALARS_FILE, TIMESERIES_FILE};
use super::range::SweepRange;
use super::simulation::Simulation;

/// Everything a sweep needs, resolved from a [`SweepConfig`].
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub layout: ArchiveLayout,
    pub range: SweepRange,
    /// Parameter table mutated before every run.
    pub table_path: PathBuf,
    /// Row label of the swept cell.
    pub variable_name: String,
    /// Column label of the swept cell.
    pub variable_column: String,
    pub scenario: String,
    pub site: SiteConfig,
}

impl SweepPlan {
    pub fn from_config(config: &SweepConfig) -> Self {
        let s = &config.sweep;
        Self {
            layout: ArchiveLayout::new(
                &config.paths.output_directory,
                &s.scenario_name,
                &s.variable_name,
            ),
            range: SweepRange::new(s.start, s.stop, s.step),
            table_path: config.parameter_table_path(),
            variable_name: s.variable_name.clone(),
            variable_column: s.variable_column.clone(),
            scenario: s.scenario_name.clone(),
            site: config.site.clone(),
        }
    }
}

/// One archived run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedRun {
    pub value: i64,
    pub suffix: String,
    pub scalars: PathBuf,
    pub timeseries: PathBuf,
}

/// Outcome of a completed sweep.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub loop_output_dir: PathBuf,
    pub runs: Vec<ArchivedRun>,
}

/// Runs the whole sweep described by `plan`.
///
/// The base simulation runs once, then for every value of the range the
/// target cell is rewritten, the table persisted and the simulation invoked.
/// Both result files of each run are copied into the archive under the
/// zero-padded run id.
///
/// # Arguments
///
/// * `plan` - Resolved sweep parameters and layout
/// * `simulation` - External simulation to invoke
///
/// # Errors
///
/// Returns `SweepError::OutputExists` before any other work if the
/// loop-output directory is already present, and `SweepError::Table` before
/// the archive is created if the target cell does not exist. Any later
/// failure aborts the sweep, leaving completed runs in place.
pub fn run_sweep<S: Simulation>(plan: &SweepPlan, simulation: &mut S) -> Result<SweepReport> {
    let layout = &plan.layout;

    let scenario_dir = layout.scenario_dir();
    fs::create_dir_all(&scenario_dir).map_err(SweepError::io(&scenario_dir))?;

    let loop_dir = layout.loop_output_dir();
    if loop_dir.exists() {
        return Err(SweepError::OutputExists {
            path: loop_dir,
            scenario: plan.scenario.clone(),
        });
    }

    // The archive is only created once the target cell is known to exist.
    let mut table = ParameterTable::from_path(&plan.table_path)?;
    table
        .position(&plan.variable_name, &plan.variable_column)
        .map_err(|source| SweepError::Table {
            path: plan.table_path.clone(),
            source,
        })?;

    for dir in [layout.scalars_dir(), layout.timeseries_dir()] {
        fs::create_dir_all(&dir).map_err(SweepError::io(&dir))?;
    }

    info!(
        latitude = plan.site.latitude,
        longitude = plan.site.longitude,
        year = plan.site.year,
        "running base simulation"
    );
    simulation.prepare(&plan.site)?;

    let total = plan.range.len();
    let mut runs = Vec::with_capacity(total);
    for (n, value) in plan.range.values().enumerate() {
        info!(
            run = n + 1,
            total,
            variable = %plan.variable_name,
            value,
            "starting sweep iteration"
        );

        table
            .set(&plan.variable_name, &plan.variable_column, value)
            .map_err(|source| SweepError::Table {
                path: plan.table_path.clone(),
                source,
            })?;
        table.to_path(&plan.table_path)?;

        let run_dir = layout.run_output_dir(value);
        simulation.run(&plan.scenario, &run_dir)?;

        let suffix = plan.range.run_suffix(value);
        let scalars = layout.archived_scalars(&suffix);
        let timeseries = layout.archived_timeseries(&suffix);
        copy_artifact(&run_dir.join(SCALARS_FILE), &scalars)?;
        copy_artifact(&run_dir.join(TIMESERIES_FILE), &timeseries)?;

        runs.push(ArchivedRun {
            value,
            suffix,
            scalars,
            timeseries,
        });
    }

    info!(runs = runs.len(), dir = %loop_dir.display(), "sweep finished");
    Ok(SweepReport {
        loop_output_dir: loop_dir,
        runs,
    })
}

fn copy_artifact(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map_err(SweepError::io(from))?;
    info!(file = %to.display(), "archived");
    Ok(())
}
