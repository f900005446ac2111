//! `mklwrap generate` command

use std::path::Path;

use anyhow::Result;

use super::{load_settings, scan_options};
use crate::cli::GenerateArgs;
use mklwrap::core::TargetLanguage;
use mklwrap::emit::{
    EmitOptions, DEFAULT_GO_PACKAGE, DEFAULT_INCLUDE, DEFAULT_PROVIDER_CRATE, DEFAULT_TRAIT_NAME,
};
use mklwrap::ops::{generate, GenerateOptions};
use mklwrap::util::config::GenerateConfig;
use mklwrap::util::InputSource;

pub fn execute(args: GenerateArgs) -> Result<()> {
    let settings = load_settings(&args.scan)?;
    let scan = scan_options(&args.scan, &settings);

    let output = match InputSource::from_arg(&args.output) {
        InputSource::Stdin => None,
        InputSource::Path(path) => Some(path),
    };
    let lang = language(&args, output.as_deref(), &settings);

    // Flags > config > defaults
    let include = args
        .include
        .clone()
        .or_else(|| settings.include.clone())
        .or_else(|| {
            scan.header
                .path()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| DEFAULT_INCLUDE.to_string());

    let emit = EmitOptions {
        provider_crate: args
            .mkl_provider_crate
            .or(settings.provider_crate)
            .unwrap_or_else(|| DEFAULT_PROVIDER_CRATE.to_string()),
        trait_name: args
            .trait_name
            .or(settings.trait_name)
            .unwrap_or_else(|| DEFAULT_TRAIT_NAME.to_string()),
        go_package: args
            .gopkg
            .or(settings.go_package)
            .unwrap_or_else(|| DEFAULT_GO_PACKAGE.to_string()),
        include,
    };

    let opts = GenerateOptions {
        scan,
        output,
        lang,
        emit,
    };

    let result = generate(&opts)?;

    if let Some(path) = &result.output {
        eprintln!(
            "   Generated {} {} routines -> {}",
            result.routines,
            result.lang,
            path.display()
        );
    }

    Ok(())
}

/// Pick the output language: explicit flags, then the output extension,
/// then config, then Rust.
fn language(
    args: &GenerateArgs,
    output: Option<&Path>,
    settings: &GenerateConfig,
) -> TargetLanguage {
    if args.for_cc {
        return TargetLanguage::Cpp;
    }
    if args.for_go {
        return TargetLanguage::Go;
    }
    args.lang
        .or_else(|| output.and_then(TargetLanguage::from_extension))
        .or(settings.lang)
        .unwrap_or_default()
}
