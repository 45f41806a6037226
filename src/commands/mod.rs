//! Command-line handling
//!
//! Argument parsing and the flow of one full comparison run

pub mod parser;
pub mod run;

// Re-exports (used by main.rs)
pub use parser::Cli;
pub use run::{run_comparison, ComparisonRun};
