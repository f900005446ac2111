//! Header preprocessing.
//!
//! Library headers are full of include guards, feature macros and calling
//! convention macros. When a C compiler is available its preprocessor
//! (`cc -E -P`) resolves them. Otherwise directive lines are blanked out and
//! the text is parsed as written.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ParseError;
use crate::util::process::{find_c_compiler, ProcessBuilder};

/// A directive line plus any `\` continuation lines.
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*#(?:[^\n]*\\\r?\n)*[^\n]*").expect("directive regex is valid")
});

/// When to run the system C preprocessor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessMode {
    /// Use the preprocessor if a C compiler is found
    #[default]
    Auto,
    /// Require the preprocessor
    Always,
    /// Strip directives without expanding macros
    Never,
}

impl fmt::Display for PreprocessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessMode::Auto => write!(f, "auto"),
            PreprocessMode::Always => write!(f, "always"),
            PreprocessMode::Never => write!(f, "never"),
        }
    }
}

impl FromStr for PreprocessMode {
    type Err = PreprocessModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(PreprocessMode::Auto),
            "always" | "yes" => Ok(PreprocessMode::Always),
            "never" | "no" | "raw" => Ok(PreprocessMode::Never),
            _ => Err(PreprocessModeParseError(s.to_string())),
        }
    }
}

/// Error parsing a preprocessing mode.
#[derive(Debug, Clone)]
pub struct PreprocessModeParseError(pub String);

impl fmt::Display for PreprocessModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown preprocessing mode '{}', expected one of: auto, always, never",
            self.0
        )
    }
}

impl std::error::Error for PreprocessModeParseError {}

/// Prepares header text for the parser.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    mode: PreprocessMode,
    compiler: Option<PathBuf>,
    include_dirs: Vec<PathBuf>,
    defines: Vec<String>,
}

impl Preprocessor {
    pub fn new(mode: PreprocessMode) -> Self {
        Preprocessor {
            mode,
            ..Self::default()
        }
    }

    /// Use a specific compiler instead of `$CC` / `PATH` lookup.
    pub fn with_compiler(mut self, compiler: Option<PathBuf>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Extra `-I` directories.
    pub fn with_include_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.include_dirs = dirs;
        self
    }

    /// Extra `-D` definitions (`NAME` or `NAME=VALUE`).
    pub fn with_defines(mut self, defines: Vec<String>) -> Self {
        self.defines = defines;
        self
    }

    /// Preprocess `source`. `path` is the header's location, if it has one;
    /// its directory is added to the include path.
    pub fn run(&self, path: Option<&Path>, source: &str) -> Result<String, ParseError> {
        if self.mode == PreprocessMode::Never {
            return Ok(strip_directives(source));
        }

        let compiler = match self.compiler.clone().or_else(find_c_compiler) {
            Some(cc) => cc,
            None if self.mode == PreprocessMode::Always => {
                return Err(ParseError::Preprocessor(
                    "no C compiler found (set CC or install cc, gcc or clang)".to_string(),
                ))
            }
            None => {
                tracing::warn!(
                    "no C compiler found, stripping directives instead; \
                     macro-wrapped declarations will not be recognized"
                );
                return Ok(strip_directives(source));
            }
        };

        let cmd = self.command(&compiler, path).stdin(source);
        tracing::debug!("preprocessing with `{}`", cmd.display_command());

        let output = cmd
            .exec()
            .map_err(|e| ParseError::Preprocessor(format!("{e:#}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ParseError::Preprocessor(format!(
                "`{}` exited with {:?}\n{}",
                cmd.display_command(),
                output.status.code(),
                stderr.trim_end()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn command(&self, compiler: &Path, path: Option<&Path>) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(compiler).args(["-E", "-P", "-x", "c"]);

        let header_dir = path
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty());
        for dir in header_dir.into_iter().chain(self.include_dirs.iter().map(PathBuf::as_path)) {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }
        for define in &self.defines {
            cmd = cmd.arg(format!("-D{define}"));
        }

        cmd.arg("-")
    }
}

/// Blank out preprocessor directives, keeping line numbers intact.
pub fn strip_directives(source: &str) -> String {
    DIRECTIVE
        .replace_all(source, |caps: &regex::Captures<'_>| {
            "\n".repeat(caps[0].matches('\n').count())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("auto".parse::<PreprocessMode>().unwrap(), PreprocessMode::Auto);
        assert_eq!("ALWAYS".parse::<PreprocessMode>().unwrap(), PreprocessMode::Always);
        assert_eq!("never".parse::<PreprocessMode>().unwrap(), PreprocessMode::Never);
        assert!("sometimes".parse::<PreprocessMode>().is_err());
        assert_eq!(PreprocessMode::Never.to_string(), "never");
    }

    #[test]
    fn test_strip_directives() {
        let src = "#ifndef MKL_H\n#define MKL_H\nint a;\n  # define X(a) \\\n    (a)\nint b;\n#endif\n";
        let out = strip_directives(src);
        assert_eq!(out, "\n\nint a;\n\n\nint b;\n\n");
        assert_eq!(out.lines().count(), src.lines().count());
    }

    #[test]
    fn test_never_does_not_spawn() {
        let pp = Preprocessor::new(PreprocessMode::Never)
            .with_compiler(Some(PathBuf::from("/nonexistent/cc")));
        let out = pp.run(None, "#include <x.h>\nvoid f(void);\n").unwrap();
        assert_eq!(out, "\nvoid f(void);\n");
    }

    #[test]
    fn test_always_reports_spawn_failure() {
        let pp = Preprocessor::new(PreprocessMode::Always)
            .with_compiler(Some(PathBuf::from("/nonexistent/cc")));
        let err = pp.run(None, "void f(void);\n").unwrap_err();
        assert!(matches!(err, ParseError::Preprocessor(_)));
    }

    #[test]
    fn test_command_line() {
        let pp = Preprocessor::new(PreprocessMode::Always)
            .with_include_dirs(vec![PathBuf::from("/opt/mkl/include")])
            .with_defines(vec!["MKL_ILP64".to_string()]);
        let cmd = pp.command(Path::new("cc"), Some(Path::new("/tmp/hdr/mkl.h")));
        assert_eq!(
            cmd.display_command(),
            "cc -E -P -x c -I/tmp/hdr -I/opt/mkl/include -DMKL_ILP64 -"
        );

        let cmd = pp.command(Path::new("cc"), Some(Path::new("mkl.h")));
        assert_eq!(
            cmd.display_command(),
            "cc -E -P -x c -I/opt/mkl/include -DMKL_ILP64 -"
        );
    }
}
