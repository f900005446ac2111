//! mklwrap - precision-dispatching wrappers for MKL style routines
//!
//! BLAS/LAPACK style libraries ship one C function per precision, with the
//! precision encoded as a letter in the name (`cblas_sgemm`, `cblas_dgemm`).
//! This crate parses the library header, pairs the 32-bit and 64-bit
//! variants of each requested routine, and emits a single generic interface
//! for Rust, C++ or Go that dispatches on the element type.

pub mod core;
pub mod emit;
pub mod header;
pub mod ops;
pub mod util;

pub use core::{
    FunctionDescriptor, FunctionRegistry, PatternSet, Precision, RoutinePattern, TargetLanguage,
};
pub use emit::{EmitOptions, Emitter};
