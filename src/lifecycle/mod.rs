//! Sequencing of a backup run: workspace, archive, upload, cleanup.

/// Per-run temporary directory guard
pub mod workspace;

/// Top-level run entry points
pub mod runner;

pub use runner::{run, run_at, RunReport};
pub use workspace::TempWorkspace;
