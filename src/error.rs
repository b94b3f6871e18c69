//! Error type shared by the sweep driver and the result pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::io::table::TableError;

/// Crate-wide result alias.
pub type Result<T, E = SweepError> = std::result::Result<T, E>;

/// Everything that can abort a sweep, an aggregation pass or a plot.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The loop-output directory of this scenario/variable pair already exists.
    #[error(
        "loop output directory `{}` already exists; delete it or rename scenario `{scenario}`",
        path.display()
    )]
    OutputExists { path: PathBuf, scenario: String },

    #[error("i/o error at `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("csv error in `{}`: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("parameter table `{}`: {source}", path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: TableError,
    },

    #[error("cannot open workbook `{}`: {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// A sheet, row or column the result schema expects is missing or unreadable.
    #[error("workbook `{}`: {message}", path.display())]
    Schema { path: PathBuf, message: String },

    #[error("cannot derive a run id from file name `{}`", path.display())]
    RunId { path: PathBuf },

    #[error("simulation failed: {0}")]
    Simulation(String),

    #[error("failed to render `{}`: {message}", path.display())]
    Plot { path: PathBuf, message: String },

    #[error("invalid configuration:\n{}", join_config_errors(.0))]
    Config(Vec<ConfigError>),
}

impl SweepError {
    /// Adapter for `map_err` that attaches `path` to an I/O error.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    /// Adapter for `map_err` that attaches `path` to a CSV error.
    pub fn csv(path: impl Into<PathBuf>) -> impl FnOnce(csv::Error) -> Self {
        let path = path.into();
        move |source| Self::Csv { path, source }
    }

    pub(crate) fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
