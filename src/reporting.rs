use crate::results::kpi::{Kpi, KpiTable};
use crate::sweep::SweepReport;

pub fn print_sweep_summary(report: &SweepReport) {
    println!("\n--- Sweep Report ---");
    println!("Archive: {}", report.loop_output_dir.display());
    println!("Runs archived: {}", report.runs.len());
    for run in &report.runs {
        println!("  {:>10}  {}", run.value, run.scalars.display());
    }
}

pub fn print_kpi_table(table: &KpiTable, variable: &str, kpis: &[Kpi]) {
    println!("\n{}", table.report(variable, kpis));
}

pub fn print_plot_written(kind: &str, path: &std::path::Path) {
    println!("{kind} plot written to {}", path.display());
}
