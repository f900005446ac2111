//! Command implementations

pub mod completions;
pub mod generate;
pub mod inspect;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::ScanArgs;
use mklwrap::ops::ScanOptions;
use mklwrap::util::config::{global_config_path, load_config, project_config_path, GenerateConfig};
use mklwrap::util::InputSource;

/// Where oneAPI installs MKL when `MKLROOT` is not set.
const DEFAULT_MKL_HEADER: &str = "/opt/intel/oneapi/mkl/latest/include/mkl.h";

/// Load global, project and `--config` settings.
pub fn load_settings(args: &ScanArgs) -> Result<GenerateConfig> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let config = load_config(
        global_config_path().as_deref(),
        &project_config_path(&cwd),
        args.config.as_deref(),
    )?;
    Ok(config.generate)
}

/// Build scan options from flags, falling back to config.
pub fn scan_options(args: &ScanArgs, settings: &GenerateConfig) -> ScanOptions {
    let header = match args.mkl_header.as_deref().or(settings.header.as_deref()) {
        Some(path) => InputSource::from_arg(path),
        None => InputSource::Path(default_header()),
    };

    let include_dirs = if args.include_dirs.is_empty() {
        settings.include_dirs.clone()
    } else {
        args.include_dirs.clone()
    };
    let defines = if args.defines.is_empty() {
        settings.defines.clone()
    } else {
        args.defines.clone()
    };

    ScanOptions {
        patterns: InputSource::from_arg(&args.input),
        header,
        preprocess: args.cpp.or(settings.cpp).unwrap_or_default(),
        include_dirs,
        defines,
    }
}

fn default_header() -> PathBuf {
    match std::env::var_os("MKLROOT") {
        Some(root) if !root.is_empty() => Path::new(&root).join("include").join("mkl.h"),
        _ => PathBuf::from(DEFAULT_MKL_HEADER),
    }
}
