//! Chart rendering for flow and KPI plots.

use std::error::Error;
use std::path::Path;

use chrono::{NaiveDateTime, TimeDelta};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::{Result, SweepError};
use crate::io::workbook::FlowSeries;

use super::kpi::{Kpi, KpiTable};

type DrawResult = std::result::Result<(), Box<dyn Error>>;

const FLOW_SIZE: (u32, u32) = (1600, 800);
const LEGEND_WIDTH: u32 = 320;
const KPI_PANEL_HEIGHT: u32 = 260;
const KPI_WIDTH: u32 = 1000;
const FOOTER_HEIGHT: u32 = 50;

/// Renders all flows of `series` as lines, legend right of the plot area.
///
/// # Errors
///
/// Returns `SweepError::Plot` if the image cannot be drawn or written.
pub fn render_flows(path: &Path, series: &FlowSeries) -> Result<()> {
    let backend = BitMapBackend::new(path, FLOW_SIZE);
    draw_flows(backend, series).map_err(|e| plot_error(path, e))
}

/// Renders one stacked subplot per KPI against the swept value.
///
/// # Errors
///
/// Returns `SweepError::Plot` if the image cannot be drawn or written.
pub fn render_kpis(path: &Path, variable: &str, table: &KpiTable, kpis: &[Kpi]) -> Result<()> {
    let panels = kpis.len().max(1) as u32;
    let size = (KPI_WIDTH, panels * KPI_PANEL_HEIGHT + FOOTER_HEIGHT);
    let backend = BitMapBackend::new(path, size);
    draw_kpis(backend, variable, table, kpis).map_err(|e| plot_error(path, e))
}

fn plot_error(path: &Path, e: Box<dyn Error>) -> SweepError {
    SweepError::Plot {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn draw_flows<DB: DrawingBackend>(backend: DB, series: &FlowSeries) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let (plot_area, legend_area) = root.split_horizontally((FLOW_SIZE.0 - LEGEND_WIDTH) as i32);

    // x is hours since the first time step; labels map back to timestamps.
    let origin = series.timestamps.first().copied().unwrap_or_default();
    let hours = |ts: &NaiveDateTime| (*ts - origin).num_seconds() as f64 / 3600.0;
    let x_max = series.timestamps.last().map(hours).unwrap_or(0.0);
    let (y_min, y_max) = padded_bounds(series.values.iter().flatten().copied());

    let label_time = |h: &f64| -> String {
        let ts = origin + TimeDelta::seconds((h * 3600.0).round() as i64);
        ts.format("%Y-%m-%d %H:%M").to_string()
    };

    let mut chart = ChartBuilder::on(&plot_area)
        .caption("All Flows", ("sans-serif", 30))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..x_max.max(1.0), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("time")
        .y_desc("kW")
        .x_labels(8)
        .x_label_formatter(&label_time)
        .draw()?;

    for (i, name) in series.columns.iter().enumerate() {
        let color = Palette99::pick(i);
        chart.draw_series(LineSeries::new(
            series.column_points(i).map(|(ts, v)| (hours(&ts), v)),
            color.stroke_width(2),
        ))?;

        let y = 60 + 22 * i as i32;
        legend_area.draw(&PathElement::new(
            vec![(10, y), (40, y)],
            Palette99::pick(i).stroke_width(3),
        ))?;
        legend_area.draw(&Text::new(name.clone(), (48, y - 8), ("sans-serif", 16).into_font()))?;
    }

    root.present()?;
    Ok(())
}

fn draw_kpis<DB: DrawingBackend>(
    backend: DB,
    variable: &str,
    table: &KpiTable,
    kpis: &[Kpi],
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let (_, height) = root.dim_in_pixel();
    let (panels, footer) = root.split_vertically(height.saturating_sub(FOOTER_HEIGHT) as i32);

    let runs: Vec<f64> = table.runs().map(|r| r as f64).collect();
    let (x_min, x_max) = match (runs.first(), runs.last()) {
        (Some(&a), Some(&b)) if a < b => {
            let pad = (b - a) * 0.03;
            (a - pad, b + pad)
        }
        (Some(&a), _) => (a - 1.0, a + 1.0),
        _ => (0.0, 1.0),
    };

    let areas = if kpis.is_empty() {
        Vec::new()
    } else {
        panels.split_evenly((kpis.len(), 1))
    };
    for (area, kpi) in areas.iter().zip(kpis) {
        let points: Vec<(f64, f64)> = table
            .series(*kpi)
            .into_iter()
            .map(|(run, v)| (run as f64, v))
            .filter(|(_, v)| v.is_finite())
            .collect();
        let (y_min, y_max) = padded_bounds(points.iter().map(|(_, v)| *v));

        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .y_desc(kpi.label())
            .x_label_formatter(&|x: &f64| format!("{x:.0}"))
            .draw()?;

        chart.draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))?;
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
        )?;
    }

    let style =
        TextStyle::from(("sans-serif", 22).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    let (width, _) = footer.dim_in_pixel();
    footer.draw_text(variable, &style, (width as i32 / 2, FOOTER_HEIGHT as i32 / 2))?;

    root.present()?;
    Ok(())
}

/// Min and max of the finite values, widened by 5 % so lines clear the frame.
fn padded_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    if span == 0.0 {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.05 };
        return (lo - pad, hi + pad);
    }
    (lo - span * 0.05, hi + span * 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_widen_by_five_percent() {
        let (lo, hi) = padded_bounds([0.0, 10.0, 5.0].into_iter());
        assert!((lo + 0.5).abs() < 1e-9);
        assert!((hi - 10.5).abs() < 1e-9);
    }

    #[test]
    fn bounds_ignore_non_finite_values() {
        let (lo, hi) = padded_bounds([f64::NAN, 2.0, f64::INFINITY, 4.0].into_iter());
        assert!(lo < 2.0 && hi > 4.0 && hi < 5.0);
    }

    #[test]
    fn bounds_of_empty_or_flat_series_are_non_degenerate() {
        assert_eq!(padded_bounds(std::iter::empty()), (0.0, 1.0));
        let (lo, hi) = padded_bounds([0.0, 0.0].into_iter());
        assert!(lo < hi);
        let (lo, hi) = padded_bounds([200.0].into_iter());
        assert!(lo < 200.0 && hi > 200.0);
    }
}
