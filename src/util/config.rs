//! Configuration file support for mklwrap.
//!
//! Settings are read from up to two files:
//! - Global: `~/.mklwrap/config.toml` - user-wide defaults
//! - Project: `mklwrap.toml` in the working directory, or the file given
//!   with `--config`
//!
//! Project config takes precedence over global config, and command line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::TargetLanguage;
use crate::header::PreprocessMode;

/// File name of the project config.
pub const PROJECT_CONFIG_NAME: &str = "mklwrap.toml";

/// mklwrap configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation settings
    pub generate: GenerateConfig,
}

/// Settings for `mklwrap generate` and `mklwrap inspect`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Rust module providing the raw bindings (e.g. `crate::mkl_c`)
    pub provider_crate: Option<String>,

    /// Name of the generated Rust trait
    pub trait_name: Option<String>,

    /// Go package name
    pub go_package: Option<String>,

    /// Output language when it cannot be inferred from the output file
    pub lang: Option<TargetLanguage>,

    /// Path to the library header
    pub header: Option<PathBuf>,

    /// Header name for `#include <...>` in C++ and Go output
    pub include: Option<String>,

    /// When to run the C preprocessor (auto, always, never)
    pub cpp: Option<PreprocessMode>,

    /// Extra include directories for the preprocessor
    pub include_dirs: Vec<PathBuf>,

    /// Extra macro definitions for the preprocessor
    pub defines: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let settings = &mut self.generate;
        let other = other.generate;

        if other.provider_crate.is_some() {
            settings.provider_crate = other.provider_crate;
        }
        if other.trait_name.is_some() {
            settings.trait_name = other.trait_name;
        }
        if other.go_package.is_some() {
            settings.go_package = other.go_package;
        }
        if other.lang.is_some() {
            settings.lang = other.lang;
        }
        if other.header.is_some() {
            settings.header = other.header;
        }
        if other.include.is_some() {
            settings.include = other.include;
        }
        if other.cpp.is_some() {
            settings.cpp = other.cpp;
        }
        if !other.include_dirs.is_empty() {
            settings.include_dirs = other.include_dirs;
        }
        if !other.defines.is_empty() {
            settings.defines = other.defines;
        }
    }
}

/// Load merged configuration.
///
/// Order of precedence (highest to lowest):
/// 1. `explicit` (`--config`), which must exist, else project config
/// 2. Global config
/// 3. Defaults
pub fn load_config(
    global_path: Option<&Path>,
    project_path: &Path,
    explicit: Option<&Path>,
) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    match explicit {
        Some(path) => config.merge(Config::load(path)?),
        None => config.merge(Config::load_or_default(project_path)),
    }

    Ok(config)
}

/// Get the global mklwrap config directory (~/.mklwrap).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".mklwrap"))
}

/// Get the global config path (~/.mklwrap/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (./mklwrap.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_CONFIG_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.generate.provider_crate.is_none());
        assert!(config.generate.cpp.is_none());
        assert!(config.generate.include_dirs.is_empty());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("mklwrap.toml");

        std::fs::write(
            &config_path,
            r#"
[generate]
provider_crate = "crate::mkl_c"
trait_name = "Blas"
lang = "go"
cpp = "never"
include_dirs = ["/opt/intel/oneapi/mkl/latest/include"]
defines = ["MKL_ILP64"]
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        let settings = &config.generate;
        assert_eq!(settings.provider_crate.as_deref(), Some("crate::mkl_c"));
        assert_eq!(settings.trait_name.as_deref(), Some("Blas"));
        assert_eq!(settings.lang, Some(TargetLanguage::Go));
        assert_eq!(settings.cpp, Some(PreprocessMode::Never));
        assert_eq!(settings.defines, vec!["MKL_ILP64".to_string()]);
        assert!(settings.go_package.is_none());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.generate.trait_name = Some("Global".to_string());
        base.generate.go_package = Some("mkl".to_string());

        let mut project = Config::default();
        project.generate.trait_name = Some("Project".to_string());

        base.merge(project);
        assert_eq!(base.generate.trait_name.as_deref(), Some("Project"));
        assert_eq!(base.generate.go_package.as_deref(), Some("mkl"));
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("mklwrap.toml");
        let explicit = tmp.path().join("explicit.toml");

        std::fs::write(&global, "[generate]\ntrait_name = \"G\"\ngo_package = \"g\"\n").unwrap();
        std::fs::write(&project, "[generate]\ntrait_name = \"P\"\n").unwrap();
        std::fs::write(&explicit, "[generate]\ntrait_name = \"E\"\n").unwrap();

        let config = load_config(Some(global.as_path()), &project, None).unwrap();
        assert_eq!(config.generate.trait_name.as_deref(), Some("P"));
        assert_eq!(config.generate.go_package.as_deref(), Some("g"));

        let config = load_config(Some(global.as_path()), &project, Some(explicit.as_path())).unwrap();
        assert_eq!(config.generate.trait_name.as_deref(), Some("E"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.toml");
        let project = tmp.path().join("mklwrap.toml");

        assert!(load_config(None, &project, Some(missing.as_path())).is_err());
        assert_eq!(load_config(None, &project, None).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_project_config_falls_back() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("mklwrap.toml");
        std::fs::write(&project, "[generate\n").unwrap();

        assert_eq!(Config::load_or_default(&project), Config::default());
        assert!(Config::load(&project).is_err());
    }
}
