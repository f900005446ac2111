//! Target languages for generated wrappers.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Supported output languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    /// Rust trait implemented for `f32` and `f64`
    #[default]
    #[serde(alias = "rs")]
    Rust,

    /// C++ overloaded inline functions
    #[serde(alias = "c++", alias = "cc", alias = "cxx")]
    Cpp,

    /// Go generic functions over cgo
    #[serde(alias = "golang")]
    Go,
}

impl TargetLanguage {
    /// Guess the language from an output file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "rs" => Some(TargetLanguage::Rust),
            "h" | "hh" | "hpp" | "hxx" => Some(TargetLanguage::Cpp),
            "go" => Some(TargetLanguage::Go),
            _ => None,
        }
    }
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::Rust => write!(f, "rust"),
            TargetLanguage::Cpp => write!(f, "cpp"),
            TargetLanguage::Go => write!(f, "go"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = TargetLanguageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rust" | "rs" => Ok(TargetLanguage::Rust),
            "cpp" | "c++" | "cc" | "cxx" => Ok(TargetLanguage::Cpp),
            "go" | "golang" => Ok(TargetLanguage::Go),
            _ => Err(TargetLanguageParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid target language string.
#[derive(Debug, Clone)]
pub struct TargetLanguageParseError(pub String);

impl std::fmt::Display for TargetLanguageParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid target language '{}', valid values: rust, cpp, go",
            self.0
        )
    }
}

impl std::error::Error for TargetLanguageParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language() {
        assert_eq!("rust".parse::<TargetLanguage>().unwrap(), TargetLanguage::Rust);
        assert_eq!("C++".parse::<TargetLanguage>().unwrap(), TargetLanguage::Cpp);
        assert_eq!("golang".parse::<TargetLanguage>().unwrap(), TargetLanguage::Go);
        assert!("fortran".parse::<TargetLanguage>().is_err());
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(
            TargetLanguage::from_extension(Path::new("out/mkl.rs")),
            Some(TargetLanguage::Rust)
        );
        assert_eq!(
            TargetLanguage::from_extension(Path::new("mkl_routines.hpp")),
            Some(TargetLanguage::Cpp)
        );
        assert_eq!(
            TargetLanguage::from_extension(Path::new("routines.go")),
            Some(TargetLanguage::Go)
        );
        assert_eq!(TargetLanguage::from_extension(Path::new("routines")), None);
    }
}
