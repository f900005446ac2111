//! High-level operations.
//!
//! This module contains the implementation of mklwrap commands.

pub mod generate;
pub mod inspect;
pub mod scan;

pub use generate::{generate, render, GenerateOptions, GenerateResult};
pub use inspect::{format_table, InspectReport, RoutineEntry};
pub use scan::{collect, scan, ScanOptions, ScanReport, SkippedRoutine};
