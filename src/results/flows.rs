//! Flow plot of one time-series workbook over a selected period.

use std::fmt;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime};
use tracing::{error, info, warn};

use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::io::workbook::FlowSeries;

use super::plot;

/// Valid weekday numbers, Monday = 0.
pub const WEEKDAYS: RangeInclusive<u32> = 0..=6;

/// Period of a year to plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPeriod {
    Year,
    Month(u32),
    /// ISO calendar week.
    Week(u32),
    /// One day of an ISO calendar week.
    Day { calendar_week: u32, weekday: u32 },
}

impl FlowPeriod {
    /// File-name tag, e.g. `month_3` or `day_12_4`.
    pub fn tag(&self) -> String {
        match self {
            FlowPeriod::Year => "year".to_string(),
            FlowPeriod::Month(m) => format!("month_{m}"),
            FlowPeriod::Week(w) => format!("calendar_week_{w}"),
            FlowPeriod::Day {
                calendar_week,
                weekday,
            } => format!("day_{calendar_week}_{weekday}"),
        }
    }

    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        match *self {
            FlowPeriod::Year => true,
            FlowPeriod::Month(m) => ts.month() == m,
            FlowPeriod::Week(w) => ts.iso_week().week() == w,
            FlowPeriod::Day {
                calendar_week,
                weekday,
            } => {
                ts.iso_week().week() == calendar_week
                    && ts.weekday().num_days_from_monday() == weekday
            }
        }
    }
}

impl fmt::Display for FlowPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// Requested period; resolved by precedence day > week > month > year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowFilter {
    pub month: Option<u32>,
    pub calendar_week: Option<u32>,
    pub weekday: Option<u32>,
}

impl FlowFilter {
    /// Picks exactly one period.
    ///
    /// Conflicting or invalid selections are logged and the offending part
    /// dropped: a month next to a calendar week is ignored, as is a weekday
    /// outside [`WEEKDAYS`] or a weekday without a calendar week.
    pub fn resolve(&self) -> FlowPeriod {
        let weekday = match self.weekday {
            Some(d) if !WEEKDAYS.contains(&d) => {
                error!(weekday = d, "weekday must be in 0..=6 (Monday = 0), ignoring it");
                None
            }
            d => d,
        };

        if let (Some(month), Some(week)) = (self.month, self.calendar_week) {
            warn!(
                month,
                calendar_week = week,
                "month and calendar week both given, plotting the calendar week"
            );
        }

        match (self.calendar_week, weekday) {
            (Some(calendar_week), Some(weekday)) => FlowPeriod::Day {
                calendar_week,
                weekday,
            },
            (Some(w), None) => FlowPeriod::Week(w),
            (None, d) => {
                if let Some(d) = d {
                    error!(weekday = d, "weekday needs a calendar week, ignoring it");
                }
                self.month.map_or(FlowPeriod::Year, FlowPeriod::Month)
            }
        }
    }
}

/// Source workbook, destination and period of a flow plot.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPlotOptions {
    pub timeseries_dir: PathBuf,
    pub timeseries_name: String,
    pub output_dir: PathBuf,
    pub filter: FlowFilter,
}

impl FlowPlotOptions {
    /// The workbook directory falls back to the output directory, which in
    /// turn is the configured simulation output directory.
    pub fn from_config(config: &SweepConfig) -> Self {
        let output_dir = config.paths.mvs_output_directory.clone();
        let flows = &config.flows;
        Self {
            timeseries_dir: flows
                .timeseries_directory
                .clone()
                .unwrap_or_else(|| output_dir.clone()),
            timeseries_name: flows.timeseries_name.clone(),
            output_dir,
            filter: FlowFilter {
                month: flows.month,
                calendar_week: flows.calendar_week,
                weekday: flows.weekday,
            },
        }
    }

    pub fn timeseries_path(&self) -> PathBuf {
        self.timeseries_dir.join(&self.timeseries_name)
    }

    /// `plot_<workbook stem>_<period tag>.png` in the output directory.
    pub fn plot_path(&self, period: FlowPeriod) -> PathBuf {
        let stem = Path::new(&self.timeseries_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.timeseries_name.clone());
        self.output_dir
            .join(format!("plot_{stem}_{}.png", period.tag()))
    }
}

/// Loads the electricity bus flows and keeps the rows of the selected period.
///
/// # Errors
///
/// Returns an error if the workbook cannot be read.
pub fn select_flows(options: &FlowPlotOptions) -> Result<(FlowSeries, FlowPeriod)> {
    let mut series = FlowSeries::open(&options.timeseries_path())?;
    let period = options.filter.resolve();
    series.retain(|ts| period.contains(ts));
    if series.is_empty() {
        warn!(period = %period, "no time steps fall into the selected period");
    }
    Ok((series, period))
}

/// Plots every flow of the selected period and returns the image path.
///
/// # Errors
///
/// Returns an error if the workbook cannot be read, the output directory
/// cannot be created, or rendering fails.
pub fn plot_all_flows(options: &FlowPlotOptions) -> Result<PathBuf> {
    let (series, period) = select_flows(options)?;
    fs::create_dir_all(&options.output_dir).map_err(SweepError::io(&options.output_dir))?;

    let path = options.plot_path(period);
    plot::render_flows(&path, &series)?;
    info!(file = %path.display(), steps = series.len(), "wrote flow plot");
    Ok(path)
}
