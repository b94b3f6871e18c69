//! CSV export of the aggregated KPI table.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::results::kpi::{Kpi, KpiTable};

/// Exports the KPI table to a CSV file at the given path.
///
/// Writes a `run` header followed by one column per KPI label in
/// [`Kpi::ALL`] order, then one row per run in ascending order. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `table` - Aggregated KPI rows
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_kpi_csv(table: &KpiTable, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_kpi_csv(table, buf)
}

/// Writes the KPI table as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_kpi_csv(table: &KpiTable, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(std::iter::once("run").chain(Kpi::ALL.iter().map(|k| k.label())))?;

    for (run, row) in table.rows() {
        let mut record = Vec::with_capacity(Kpi::COUNT + 1);
        record.push(run.to_string());
        record.extend(Kpi::ALL.iter().map(|k| row.get(*k).to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::kpi::KpiRow;

    fn make_table(runs: &[i64]) -> KpiTable {
        let mut table = KpiTable::new();
        for &run in runs {
            table.insert(
                run,
                KpiRow::new([run as f64, 1.5, 2.0e4, 0.4, 0.08, 0.6, 0.3, 0.25]),
            );
        }
        table
    }

    #[test]
    fn header_lists_run_and_all_kpis() {
        let mut buf = Vec::new();
        write_kpi_csv(&make_table(&[500]), &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let first_line = output.as_deref().unwrap_or("").lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "run,costs total PV,installed capacity PV,Total renewable energy use,\
             Renewable share,LCOE PV,self consumption,self sufficiency,Degree of autonomy"
        );
    }

    #[test]
    fn rows_follow_run_order() {
        let mut buf = Vec::new();
        write_kpi_csv(&make_table(&[700, 500, 600]), &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let runs: Vec<&str> = output
            .as_deref()
            .unwrap_or("")
            .lines()
            .skip(1)
            .filter_map(|l| l.split(',').next())
            .collect();
        assert_eq!(runs, ["500", "600", "700"]);
    }

    #[test]
    fn deterministic_output() {
        let table = make_table(&[1, 2, 3]);
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_kpi_csv(&table, &mut buf1).ok();
        write_kpi_csv(&table, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn round_trip_parseable() {
        let mut buf = Vec::new();
        write_kpi_csv(&make_table(&[500, 600]), &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(9));

        let mut row_count = 0;
        for record in rdr.records() {
            let rec = record.ok();
            assert!(rec.is_some(), "every row should parse");
            let Some(rec) = rec else { continue };
            assert!(rec[0].parse::<i64>().is_ok(), "run column should parse as i64");
            for i in 1..9 {
                let val: Result<f64, _> = rec[i].parse();
                assert!(val.is_ok(), "column {i} should parse as f64");
            }
            row_count += 1;
        }
        assert_eq!(row_count, 2);
    }
}
