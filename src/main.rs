//! pv-sweep entry point: CLI wiring and config-driven dispatch.

use anyhow::{Context, Result};
use clap::Parser;

use pv_sweep::cli::{Cli, Command};
use pv_sweep::config::SweepConfig;
use pv_sweep::error::SweepError;
use pv_sweep::io::export::export_kpi_csv;
use pv_sweep::logging::init_logging;
use pv_sweep::reporting::{print_kpi_table, print_plot_written, print_sweep_summary};
use pv_sweep::results::{FlowPlotOptions, plot_all_flows, plot_kpi_loop};
use pv_sweep::sweep::{ArchiveLayout, CommandSimulation, SweepPlan, run_sweep};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level).context("failed to initialise logging")?;

    let config = cli.load_config()?;
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(SweepError::Config(errors).into());
    }

    match &cli.command {
        Command::Loop(_) => run_loop(&config),
        Command::PlotFlows(_) => run_plot_flows(&config),
        Command::PlotKpis(args) => run_plot_kpis(&config, args.csv_out.as_deref()),
    }
}

fn run_loop(config: &SweepConfig) -> Result<()> {
    let plan = SweepPlan::from_config(config);
    let mut simulation = CommandSimulation::from_config(config);
    let report = run_sweep(&plan, &mut simulation)?;
    print_sweep_summary(&report);
    Ok(())
}

fn run_plot_flows(config: &SweepConfig) -> Result<()> {
    let options = FlowPlotOptions::from_config(config);
    let path = plot_all_flows(&options)?;
    print_plot_written("Flow", &path);
    Ok(())
}

fn run_plot_kpis(config: &SweepConfig, csv_out: Option<&std::path::Path>) -> Result<()> {
    let mut layout = ArchiveLayout::new(
        &config.paths.output_directory,
        &config.sweep.scenario_name,
        &config.sweep.variable_name,
    );
    if let Some(dir) = &config.kpi.loop_output_directory {
        layout = layout.with_loop_output_dir(dir);
    }

    let (table, path) = plot_kpi_loop(&layout, &config.kpi.kpis)?;
    print_kpi_table(&table, layout.variable(), &config.kpi.kpis);
    print_plot_written("KPI", &path);

    if let Some(out) = csv_out {
        export_kpi_csv(&table, out)
            .with_context(|| format!("failed to write CSV `{}`", out.display()))?;
        eprintln!("KPI table written to {}", out.display());
    }
    Ok(())
}
