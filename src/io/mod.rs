//! File formats: the CSV parameter table, result workbooks and KPI export.

pub mod export;
pub mod table;
pub mod workbook;
