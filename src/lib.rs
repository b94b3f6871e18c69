//! Parameter sweeps over an external PV/energy-system simulation.
//!
//! The sweep driver rewrites one cell of a CSV parameter table per run,
//! invokes the simulation and archives its result workbooks; the result
//! pipeline turns the archive into KPI tables and plots.

pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod reporting;
/// KPI aggregation and flow/KPI plots.
pub mod results;
/// Sweep range, archive layout, simulation boundary and driver.
pub mod sweep;
