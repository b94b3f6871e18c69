//! Parameter sweep: range, archive layout, simulation boundary and driver.

pub mod engine;
pub mod layout;
pub mod range;
pub mod simulation;

pub use engine::{ArchivedRun, SweepPlan, SweepReport, run_sweep};
pub use layout::ArchiveLayout;
pub use range::SweepRange;
pub use simulation::{CommandSimulation, Simulation};
