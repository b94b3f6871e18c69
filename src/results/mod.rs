//! Post-processing of simulation results: KPI aggregation and plots.

pub mod flows;
pub mod kpi;
pub mod plot;

pub use flows::{FlowFilter, FlowPeriod, FlowPlotOptions, plot_all_flows};
pub use kpi::{Kpi, KpiRow, KpiTable, aggregate_kpis, plot_kpi_loop};
