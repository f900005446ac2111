//! Header scanning: patterns + header in, function registry out.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::core::{FunctionRegistry, PatternSet, Precision, RegistryError};
use crate::header::{self, ExternalDeclaration, PreprocessMode, Preprocessor, TranslationUnit};
use crate::util::InputSource;

/// Inputs of a scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Routine pattern list
    pub patterns: InputSource,

    /// Library header
    pub header: InputSource,

    pub preprocess: PreprocessMode,

    /// Extra `-I` directories for the preprocessor
    pub include_dirs: Vec<PathBuf>,

    /// Extra `-D` definitions for the preprocessor
    pub defines: Vec<String>,
}

/// Result of scanning a header.
#[derive(Debug)]
pub struct ScanReport {
    pub patterns: PatternSet,

    /// Matched routines, not yet validated
    pub registry: FunctionRegistry,

    /// Top-level declarations in the header
    pub declarations: usize,

    /// Declarations the parser skipped
    pub unrecognized: usize,

    /// Patterns that matched no declaration
    pub unmatched_patterns: Vec<String>,

    /// Pattern-matching names inside declarations the parser skipped
    pub skipped_routines: Vec<SkippedRoutine>,
}

/// A routine name found in a declaration the parser could not follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRoutine {
    pub line: usize,
    pub raw_name: String,
}

/// Load patterns, parse the header and collect matching routines.
pub fn scan(opts: &ScanOptions) -> Result<ScanReport> {
    if opts.patterns.is_stdin() && opts.header.is_stdin() {
        bail!("the routine list and the header cannot both be read from stdin");
    }

    let pattern_text = opts
        .patterns
        .read()
        .context("failed to read routine list")?;
    let patterns = PatternSet::parse(&pattern_text)
        .with_context(|| format!("invalid routine list {}", opts.patterns))?;
    if patterns.is_empty() {
        tracing::warn!("routine list {} is empty", opts.patterns);
    }
    tracing::debug!("loaded {} patterns from {}", patterns.len(), opts.patterns);

    let source = opts.header.read().context("failed to read header")?;
    let source = Preprocessor::new(opts.preprocess)
        .with_include_dirs(opts.include_dirs.clone())
        .with_defines(opts.defines.clone())
        .run(opts.header.path(), &source)
        .with_context(|| format!("failed to preprocess {}", opts.header))?;

    let unit = header::parse(&source).with_context(|| format!("failed to parse {}", opts.header))?;
    let unrecognized = unit.unrecognized_count();
    if unrecognized > 0 {
        tracing::warn!(
            "skipped {} declarations the parser did not recognize",
            unrecognized
        );
    }
    let skipped_routines = skipped(&unit, &patterns);
    for routine in &skipped_routines {
        tracing::warn!(
            "line {}: `{}` matches a pattern but its declaration was not recognized",
            routine.line,
            routine.raw_name
        );
    }

    let registry = collect(&unit, &patterns)
        .with_context(|| format!("conflicting declarations in {}", opts.header))?;

    let unmatched_patterns = unmatched(&patterns, &registry);
    for pattern in &unmatched_patterns {
        tracing::warn!("pattern `{}` matched no declaration", pattern);
    }

    tracing::info!(
        "matched {} routines in {} declarations",
        registry.len(),
        unit.declarations.len()
    );

    Ok(ScanReport {
        declarations: unit.declarations.len(),
        unrecognized,
        unmatched_patterns,
        skipped_routines,
        patterns,
        registry,
    })
}

/// Extract every matching declaration of `unit` into a registry.
pub fn collect(
    unit: &TranslationUnit,
    patterns: &PatternSet,
) -> Result<FunctionRegistry, RegistryError> {
    let mut registry = FunctionRegistry::new();
    for decl in &unit.declarations {
        if let Some(descriptor) = header::extract(decl, patterns) {
            tracing::trace!(
                "{} -> {} ({})",
                descriptor.raw_name,
                descriptor.dispatch_name,
                descriptor.precision
            );
            registry.add(descriptor)?;
        }
    }
    Ok(registry)
}

/// Names in unrecognized declarations that some pattern matches.
fn skipped(unit: &TranslationUnit, patterns: &PatternSet) -> Vec<SkippedRoutine> {
    let mut routines = Vec::new();
    for decl in &unit.declarations {
        let ExternalDeclaration::Unrecognized { line, names, .. } = decl else {
            continue;
        };
        for name in names {
            if patterns.find(name).is_some() {
                routines.push(SkippedRoutine {
                    line: *line,
                    raw_name: name.clone(),
                });
            }
        }
    }
    routines
}

/// Patterns that match none of the registered raw names.
fn unmatched(patterns: &PatternSet, registry: &FunctionRegistry) -> Vec<String> {
    patterns
        .iter()
        .filter(|pattern| {
            ![Precision::Single, Precision::Double].into_iter().any(|precision| {
                registry
                    .functions(precision)
                    .any(|f| pattern.matches(&f.raw_name).is_some())
            })
        })
        .map(|pattern| pattern.as_str().to_string())
        .collect()
}
