//! C header front end.
//!
//! Turns header text into a declaration-level syntax tree and extracts
//! function descriptors from it:
//!
//! - [`preprocess`] runs the system preprocessor or strips directives
//! - [`lexer`] tokenizes with `logos`
//! - [`parser`] builds the [`ast::TranslationUnit`]
//! - [`extract`] turns declarations into [`FunctionDescriptor`]s
//!
//! [`FunctionDescriptor`]: crate::core::FunctionDescriptor

pub mod ast;
pub mod extract;
pub mod lexer;
pub mod parser;
pub mod preprocess;

use thiserror::Error;

pub use ast::{ExternalDeclaration, TranslationUnit};
pub use extract::extract;
pub use parser::parse;
pub use preprocess::{PreprocessMode, Preprocessor};

/// Fatal header errors. Declarations the parser merely does not understand
/// are not errors; they are recorded as unrecognized and skipped.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{line}:{column}: unexpected character `{text}`")]
    UnexpectedCharacter {
        line: usize,
        column: usize,
        text: String,
    },

    #[error("{line}:{column}: unbalanced `{delimiter}`")]
    Unbalanced {
        line: usize,
        column: usize,
        delimiter: String,
    },

    #[error("{line}:{column}: `{delimiter}` is never closed")]
    Unclosed {
        line: usize,
        column: usize,
        delimiter: String,
    },

    #[error("preprocessor failed: {0}")]
    Preprocessor(String),
}
