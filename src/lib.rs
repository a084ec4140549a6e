//! isodiff: pair up grid files from two simulation runs by name and report
//! the largest per-cell difference for each pair.
//!
//! The CLI in `main.rs` is a thin layer over [`batch::run_batch_with`] and
//! the [`report`] printers.

pub mod batch;
pub mod cli;
pub mod data;
pub mod report;
