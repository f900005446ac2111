//! Wrapper emitters.
//!
//! Each emitter renders a validated [`FunctionRegistry`] into source text for
//! one target language. Emitters fetch every routine through
//! [`FunctionRegistry::pair_for`], so an unpaired dispatch name fails
//! rendering instead of silently producing half a wrapper.

mod cpp;
mod go;
mod rust;

use std::fmt::{self, Write};

use thiserror::Error;

pub use cpp::CppEmitter;
pub use go::GoEmitter;
pub use rust::RustEmitter;

use crate::core::{FunctionRegistry, RegistryError, TargetLanguage};

/// Default module path providing the raw bindings to Rust wrappers.
pub const DEFAULT_PROVIDER_CRATE: &str = "crate";

/// Default name of the generated Rust trait.
pub const DEFAULT_TRAIT_NAME: &str = "MKLRoutines";

/// Default Go package name.
pub const DEFAULT_GO_PACKAGE: &str = "mklroutines";

/// Default header included by C++ and Go output.
pub const DEFAULT_INCLUDE: &str = "mkl.h";

#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to format output")]
    Fmt(#[from] fmt::Error),
}

/// Naming options for generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Rust path the raw symbols and library types are imported from
    pub provider_crate: String,

    /// Name of the Rust trait
    pub trait_name: String,

    /// Go package clause
    pub go_package: String,

    /// Header named in `#include <...>` for C++ and the cgo preamble
    pub include: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            provider_crate: DEFAULT_PROVIDER_CRATE.to_string(),
            trait_name: DEFAULT_TRAIT_NAME.to_string(),
            go_package: DEFAULT_GO_PACKAGE.to_string(),
            include: DEFAULT_INCLUDE.to_string(),
        }
    }
}

/// Everything an emitter reads.
#[derive(Debug, Clone, Copy)]
pub struct EmitInput<'a> {
    pub registry: &'a FunctionRegistry,

    /// Requested patterns as written, for the header comment
    pub patterns: &'a [String],

    pub options: &'a EmitOptions,
}

/// Renders a registry for one target language.
pub trait Emitter {
    fn language(&self) -> TargetLanguage;

    fn emit(&self, input: &EmitInput<'_>) -> Result<String, EmitError>;
}

/// The emitter for `lang`.
pub fn emitter_for(lang: TargetLanguage) -> Box<dyn Emitter> {
    match lang {
        TargetLanguage::Rust => Box::new(RustEmitter),
        TargetLanguage::Cpp => Box::new(CppEmitter),
        TargetLanguage::Go => Box::new(GoEmitter),
    }
}

/// Render `input` as `lang` source text.
pub fn emit(lang: TargetLanguage, input: &EmitInput<'_>) -> Result<String, EmitError> {
    let output = emitter_for(lang).emit(input)?;
    tracing::debug!(
        "rendered {} routines as {} ({} bytes)",
        input.registry.len(),
        lang,
        output.len()
    );
    Ok(output)
}

/// The "generated, do not edit" comment every output starts with.
fn write_banner(out: &mut String, patterns: &[String]) -> fmt::Result {
    writeln!(out, "// Code generated by mklwrap. DO NOT EDIT.")?;
    if !patterns.is_empty() {
        writeln!(out, "//")?;
        writeln!(out, "// Routines:")?;
        for pattern in patterns {
            writeln!(out, "//   {pattern}")?;
        }
    }
    writeln!(out)
}
