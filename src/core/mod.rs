//! Core data model.
//!
//! - [`pattern`]: routine name patterns and matching
//! - [`function`]: precision-specific function descriptors
//! - [`ctype`]: C type classification and per-language mapping
//! - [`language`]: target languages
//! - [`registry`]: pairing of 32-bit and 64-bit variants

pub mod ctype;
pub mod function;
pub mod language;
pub mod pattern;
pub mod registry;

pub use ctype::{map_return, map_type, CType, MappedType};
pub use function::{FunctionDescriptor, Parameter, Precision, Shape};
pub use language::{TargetLanguage, TargetLanguageParseError};
pub use pattern::{Convention, PatternError, PatternSet, RoutineMatch, RoutinePattern};
pub use registry::{FunctionPair, FunctionRegistry, PairSlot, RegistryError};
