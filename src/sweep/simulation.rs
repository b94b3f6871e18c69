//! Boundary to the external energy-system simulation.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::config::{SimulationConfig, SiteConfig, SweepConfig};
use crate::error::{Result, SweepError};

/// Lines of stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// An external simulation the sweep driver can invoke.
pub trait Simulation {
    /// Runs the base simulation once (PV time series for the site).
    fn prepare(&mut self, site: &SiteConfig) -> Result<()>;

    /// Runs one energy-system optimisation.
    ///
    /// Must leave `scalars.xlsx` and `timeseries_all_busses.xlsx` in
    /// `output_dir`. Reads the parameter table as it is on disk at call time.
    fn run(&mut self, scenario: &str, output_dir: &Path) -> Result<()>;
}

/// Launches a program per invocation, filling argument templates.
#[derive(Debug, Clone)]
pub struct CommandSimulation {
    program: String,
    prepare_args: Vec<String>,
    run_args: Vec<String>,
    input_dir: PathBuf,
}

impl CommandSimulation {
    pub fn new(config: &SimulationConfig, input_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: config.program.clone(),
            prepare_args: config.prepare_args.clone(),
            run_args: config.run_args.clone(),
            input_dir: input_dir.into(),
        }
    }

    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(&config.simulation, &config.paths.mvs_input_directory)
    }

    fn invoke(&self, templates: &[String], vars: &[(&str, String)]) -> Result<()> {
        let mut args = Vec::with_capacity(templates.len());
        for template in templates {
            let (arg, unresolved) = substitute(template, vars);
            for name in unresolved {
                warn!(placeholder = name, "unresolved placeholder in simulation arguments");
            }
            args.push(arg);
        }
        debug!(program = %self.program, ?args, "launching simulation");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| SweepError::Simulation(format!("cannot start `{}`: {e}", self.program)))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(target: "pv_sweep::simulation::stdout", "{line}");
        }

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        Err(SweepError::Simulation(format!(
            "`{}` exited with {}:\n{tail}",
            self.program, output.status
        )))
    }
}

impl Simulation for CommandSimulation {
    fn prepare(&mut self, site: &SiteConfig) -> Result<()> {
        let vars = [
            ("latitude", site.latitude.to_string()),
            ("longitude", site.longitude.to_string()),
            ("year", site.year.to_string()),
            ("population", site.population.to_string()),
            ("country", site.country.clone()),
            ("input_dir", self.input_dir.display().to_string()),
        ];
        self.invoke(&self.prepare_args, &vars)
    }

    fn run(&mut self, scenario: &str, output_dir: &Path) -> Result<()> {
        let vars = [
            ("scenario", scenario.to_string()),
            ("input_dir", self.input_dir.display().to_string()),
            ("output_dir", output_dir.display().to_string()),
        ];
        self.invoke(&self.run_args, &vars)
    }
}

/// Replaces every `{name}` in `template` with its value in a single pass.
///
/// Inserted values are never scanned again. Unknown names stay in place and
/// are returned; braces around anything but an identifier are left alone.
fn substitute<'t>(template: &'t str, vars: &[(&str, String)]) -> (String, Vec<&'t str>) {
    let mut out = String::with_capacity(template.len());
    let mut unresolved = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let name = after
            .find('}')
            .map(|close| &after[..close])
            .filter(|name| is_placeholder(name));

        let Some(name) = name else {
            out.push('{');
            rest = after;
            continue;
        };
        match vars.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
                unresolved.push(name);
            }
        }
        rest = &after[name.len() + 1..];
    }
    out.push_str(rest);
    (out, unresolved)
}

fn is_placeholder(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_fills_known_placeholders() {
        let vars = [("scenario", "Scenario_A1".to_string()), ("output_dir", "/tmp/x".to_string())];
        let (arg, unresolved) =
            substitute("m.apply_mvs('{scenario}', '{output_dir}', {other})", &vars);
        assert_eq!(arg, "m.apply_mvs('Scenario_A1', '/tmp/x', {other})");
        assert_eq!(unresolved, ["other"]);
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let vars = [
            ("input_dir", "/data/{output_dir}".to_string()),
            ("output_dir", "/tmp/run".to_string()),
        ];
        let (arg, unresolved) = substitute("{input_dir} -> {output_dir}", &vars);
        assert_eq!(arg, "/data/{output_dir} -> /tmp/run");
        assert!(unresolved.is_empty());
    }

    #[test]
    fn non_identifier_braces_are_kept_verbatim() {
        let vars = [("year", "2014".to_string())];
        let (arg, unresolved) = substitute("d = {'y': {year}}; s = {}; t = {", &vars);
        assert_eq!(arg, "d = {'y': 2014}; s = {}; t = {");
        assert!(unresolved.is_empty());
    }

    #[test]
    fn prepare_reports_run_only_placeholders() {
        let vars = [("latitude", "52.5".to_string())];
        let (arg, unresolved) = substitute("{latitude} {output_dir} {scenario}", &vars);
        assert_eq!(arg, "52.5 {output_dir} {scenario}");
        assert_eq!(unresolved, ["output_dir", "scenario"]);
    }

    #[test]
    fn default_templates_reference_site_and_run() {
        let cfg = SimulationConfig::default();
        let prepare = cfg.prepare_args.join(" ");
        assert!(prepare.contains("{latitude}"));
        assert!(prepare.contains("{country}"));
        let run = cfg.run_args.join(" ");
        assert!(run.contains("{scenario}"));
        assert!(run.contains("{output_dir}"));
    }

    #[test]
    fn missing_program_is_a_simulation_error() {
        let cfg = SimulationConfig {
            program: "pv-sweep-test-no-such-program".to_string(),
            prepare_args: Vec::new(),
            run_args: Vec::new(),
        };
        let mut sim = CommandSimulation::new(&cfg, "inputs");
        let err = sim.run("Scenario_A1", Path::new("out"));
        assert!(matches!(err, Err(SweepError::Simulation(_))));
    }
}
