//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ConfigError, SweepConfig};
use crate::results::kpi::Kpi;

#[derive(Parser, Debug)]
#[command(name = "pv-sweep")]
#[command(about = "Parameter sweeps over an energy-system simulation, with KPI and flow plots")]
pub struct Cli {
    /// Load configuration from a TOML file
    #[arg(short, long, global = true, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Use a built-in preset (baseline)
    #[arg(short, long, global = true)]
    pub preset: Option<String>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the parameter sweep and archive every run's results
    Loop(LoopArgs),
    /// Plot all electricity bus flows of one time-series workbook
    PlotFlows(FlowArgs),
    /// Aggregate archived scalar summaries and plot KPIs per run
    PlotKpis(KpiArgs),
}

#[derive(Args, Debug, Default)]
pub struct LoopArgs {
    /// Scenario name (output folder below the output directory)
    #[arg(long)]
    pub scenario_name: Option<String>,
    /// First value of the swept parameter
    #[arg(long)]
    pub start: Option<i64>,
    /// Last value of the swept parameter (inclusive)
    #[arg(long)]
    pub stop: Option<i64>,
    /// Increment between runs
    #[arg(long)]
    pub step: Option<i64>,
}

#[derive(Args, Debug, Default)]
pub struct FlowArgs {
    /// Month to plot (1-12)
    #[arg(long)]
    pub month: Option<u32>,
    /// ISO calendar week to plot (1-53)
    #[arg(long)]
    pub calendar_week: Option<u32>,
    /// Day of the calendar week to plot (0 = Monday ... 6 = Sunday)
    #[arg(long)]
    pub weekday: Option<u32>,
    /// Directory holding the time-series workbook
    #[arg(long)]
    pub timeseries_dir: Option<PathBuf>,
    /// File name of the time-series workbook
    #[arg(long)]
    pub timeseries_name: Option<String>,
    /// Directory the plot is written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct KpiArgs {
    /// KPI to plot; repeat for several (e.g. --kpi "LCOE PV")
    #[arg(long = "kpi")]
    pub kpis: Vec<Kpi>,
    /// Archive directory holding `scalars/`
    #[arg(long)]
    pub loop_output_dir: Option<PathBuf>,
    /// Also export the KPI table as CSV
    #[arg(long)]
    pub csv_out: Option<PathBuf>,
}

impl Cli {
    /// Loads the configuration source and applies the subcommand's overrides.
    ///
    /// `--config` takes priority over `--preset`; without either the
    /// baseline preset is used. The result is not validated yet.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be parsed or the preset is unknown.
    pub fn load_config(&self) -> Result<SweepConfig, ConfigError> {
        let mut cfg = match (&self.config, &self.preset) {
            (Some(path), _) => SweepConfig::from_toml_file(path)?,
            (None, Some(name)) => SweepConfig::from_preset(name)?,
            (None, None) => SweepConfig::baseline(),
        };
        self.command.apply(&mut cfg);
        Ok(cfg)
    }
}

impl Command {
    /// Overrides configuration values with those given on the command line.
    pub fn apply(&self, cfg: &mut SweepConfig) {
        match self {
            Command::Loop(a) => {
                if let Some(name) = &a.scenario_name {
                    cfg.sweep.scenario_name = name.clone();
                }
                override_with(&mut cfg.sweep.start, a.start);
                override_with(&mut cfg.sweep.stop, a.stop);
                override_with(&mut cfg.sweep.step, a.step);
            }
            Command::PlotFlows(a) => {
                let flows = &mut cfg.flows;
                flows.month = a.month.or(flows.month);
                flows.calendar_week = a.calendar_week.or(flows.calendar_week);
                flows.weekday = a.weekday.or(flows.weekday);
                if let Some(dir) = &a.timeseries_dir {
                    flows.timeseries_directory = Some(dir.clone());
                }
                if let Some(name) = &a.timeseries_name {
                    flows.timeseries_name = name.clone();
                }
                if let Some(dir) = &a.output_dir {
                    cfg.paths.mvs_output_directory = dir.clone();
                }
            }
            Command::PlotKpis(a) => {
                if !a.kpis.is_empty() {
                    cfg.kpi.kpis = a.kpis.clone();
                }
                if let Some(dir) = &a.loop_output_dir {
                    cfg.kpi.loop_output_directory = Some(dir.clone());
                }
            }
        }
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("pv-sweep").chain(args.iter().copied()))
    }

    #[test]
    fn loop_overrides_range() {
        let cli = parse(&["loop", "--start", "100", "--stop", "300", "--step", "50"])
            .expect("parse should succeed");
        let cfg = cli.load_config().expect("baseline loads");
        assert_eq!((cfg.sweep.start, cfg.sweep.stop, cfg.sweep.step), (100, 300, 50));
        assert_eq!(cfg.sweep.scenario_name, "Scenario_A1");
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = parse(&["plot-kpis", "--preset", "baseline", "--log-level", "debug"])
            .expect("parse should succeed");
        assert_eq!(cli.preset.as_deref(), Some("baseline"));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn config_and_preset_are_mutually_exclusive() {
        assert!(parse(&["--config", "a.toml", "--preset", "baseline", "loop"]).is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn kpis_parse_by_label() {
        let cli = parse(&["plot-kpis", "--kpi", "LCOE PV", "--kpi", "Renewable share"])
            .expect("parse should succeed");
        let cfg = cli.load_config().expect("baseline loads");
        assert_eq!(cfg.kpi.kpis, [Kpi::LcoePv, Kpi::RenewableShare]);
    }

    #[test]
    fn unknown_kpi_is_rejected() {
        assert!(parse(&["plot-kpis", "--kpi", "net present value"]).is_err());
    }

    #[test]
    fn flow_selection_overrides_config() {
        let cli = parse(&[
            "plot-flows",
            "--calendar-week",
            "12",
            "--weekday",
            "4",
            "--output-dir",
            "plots",
        ])
        .expect("parse should succeed");
        let cfg = cli.load_config().expect("baseline loads");
        assert_eq!(cfg.flows.calendar_week, Some(12));
        assert_eq!(cfg.flows.weekday, Some(4));
        assert_eq!(cfg.flows.month, None);
        assert_eq!(cfg.paths.mvs_output_directory, PathBuf::from("plots"));
    }

    #[test]
    fn unknown_preset_fails_on_load() {
        let cli = parse(&["--preset", "winter", "loop"]).expect("parse should succeed");
        assert!(cli.load_config().is_err());
    }
}
