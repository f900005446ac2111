//! Implementation of `mklwrap generate`.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::scan::{scan, ScanOptions, ScanReport};
use crate::core::TargetLanguage;
use crate::emit::{self, EmitInput, EmitOptions};
use crate::util::fs::write_atomic;

/// Options for a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub scan: ScanOptions,

    /// Output file; `None` writes to stdout
    pub output: Option<PathBuf>,

    pub lang: TargetLanguage,

    pub emit: EmitOptions,
}

/// What a generation run produced.
#[derive(Debug, Clone)]
pub struct GenerateResult {
    /// Number of generated dispatch functions
    pub routines: usize,

    pub lang: TargetLanguage,

    pub output: Option<PathBuf>,
}

/// Scan, render and write. Nothing is written unless every stage succeeds.
pub fn generate(opts: &GenerateOptions) -> Result<GenerateResult> {
    let report = scan(&opts.scan)?;
    let rendered = render(&report, opts.lang, &opts.emit)?;

    match &opts.output {
        Some(path) => {
            write_atomic(path, &rendered)?;
            tracing::info!("wrote {} routines to {}", report.registry.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write to stdout")?;
        }
    }

    Ok(GenerateResult {
        routines: report.registry.len(),
        lang: opts.lang,
        output: opts.output.clone(),
    })
}

/// Validate the scanned registry and render it as `lang`.
pub fn render(report: &ScanReport, lang: TargetLanguage, options: &EmitOptions) -> Result<String> {
    report
        .registry
        .validate()
        .context("cannot generate wrappers")?;

    let patterns = report.patterns.literals();
    emit::emit(
        lang,
        &EmitInput {
            registry: &report.registry,
            patterns: &patterns,
            options,
        },
    )
    .with_context(|| format!("failed to render {lang} wrappers"))
}
