//! Implementation of `mklwrap inspect`.

use std::fmt::Write;

use serde::Serialize;

use super::scan::{ScanReport, SkippedRoutine};
use crate::core::FunctionDescriptor;

/// Serializable view of a scan.
#[derive(Debug, Serialize)]
pub struct InspectReport<'a> {
    pub patterns: Vec<String>,
    pub declarations: usize,
    pub unrecognized: usize,
    pub unmatched_patterns: &'a [String],
    pub skipped_routines: &'a [SkippedRoutine],
    pub routines: Vec<RoutineEntry<'a>>,
}

/// One dispatch name and the raw routines found for it.
#[derive(Debug, Serialize)]
pub struct RoutineEntry<'a> {
    pub dispatch_name: &'a str,
    pub complete: bool,
    pub single: Option<&'a FunctionDescriptor>,
    pub double: Option<&'a FunctionDescriptor>,
}

impl<'a> InspectReport<'a> {
    pub fn new(report: &'a ScanReport) -> Self {
        let routines = report
            .registry
            .dispatch_names()
            .filter_map(|name| {
                let slot = report.registry.slot(name)?;
                Some(RoutineEntry {
                    dispatch_name: name,
                    complete: slot.is_complete(),
                    single: slot.single.as_ref(),
                    double: slot.double.as_ref(),
                })
            })
            .collect();

        InspectReport {
            patterns: report.patterns.literals(),
            declarations: report.declarations,
            unrecognized: report.unrecognized,
            unmatched_patterns: &report.unmatched_patterns,
            skipped_routines: &report.skipped_routines,
            routines,
        }
    }
}

/// Format the dispatch table for the terminal.
pub fn format_table(report: &InspectReport<'_>) -> String {
    let mut output = String::new();

    let width = report
        .routines
        .iter()
        .map(|r| r.dispatch_name.len())
        .max()
        .unwrap_or(0);
    let raw_width = report
        .routines
        .iter()
        .flat_map(|r| r.single.into_iter().chain(r.double))
        .map(|f| f.raw_name.len())
        .max()
        .unwrap_or(0)
        .max("(missing)".len());

    for routine in &report.routines {
        let raw = |f: Option<&FunctionDescriptor>| {
            f.map_or("(missing)".to_string(), |f| f.raw_name.clone())
        };
        let arity = routine
            .single
            .or(routine.double)
            .map_or(0, |f| f.parameters.len());

        writeln!(
            output,
            "{:width$}  {:raw_width$}  {:raw_width$}  {} params",
            routine.dispatch_name,
            raw(routine.single),
            raw(routine.double),
            arity,
        )
        .unwrap();
    }

    if !report.routines.is_empty() {
        writeln!(output).unwrap();
    }
    writeln!(
        output,
        "{} routines from {} patterns, {} declarations scanned ({} unrecognized)",
        report.routines.len(),
        report.patterns.len(),
        report.declarations,
        report.unrecognized
    )
    .unwrap();

    for pattern in report.unmatched_patterns {
        writeln!(output, "warning: pattern `{}` matched no declaration", pattern).unwrap();
    }
    for routine in report.skipped_routines {
        writeln!(
            output,
            "warning: line {}: `{}` matches a pattern but its declaration was not recognized",
            routine.line, routine.raw_name
        )
        .unwrap();
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PatternSet;
    use crate::header;
    use crate::ops::scan::collect;

    fn report(src: &str, patterns: &str) -> ScanReport {
        let unit = header::parse(src).unwrap();
        let patterns = PatternSet::parse(patterns).unwrap();
        let registry = collect(&unit, &patterns).unwrap();
        ScanReport {
            declarations: unit.declarations.len(),
            unrecognized: unit.unrecognized_count(),
            unmatched_patterns: vec!["cblas_*gemm".to_string()],
            skipped_routines: vec![SkippedRoutine {
                line: 9,
                raw_name: "vsMul".to_string(),
            }],
            patterns,
            registry,
        }
    }

    const SRC: &str = "\
float cblas_sdot(const int N, const float *X, const int incX, const float *Y, const int incY);
double cblas_ddot(const int N, const double *X, const int incX, const double *Y, const int incY);
void vsAdd(const int n, const float a[], const float b[], float r[]);
";

    #[test]
    fn test_format_table() {
        let scan = report(SRC, "cblas_*dot\nv*Add\ncblas_*gemm");
        let out = format_table(&InspectReport::new(&scan));

        assert!(out.contains("cblas_dot  cblas_sdot  cblas_ddot  5 params\n"));
        assert!(out.contains("vAdd       vsAdd       (missing)   4 params\n"));
        assert!(out.contains("2 routines from 3 patterns, 3 declarations scanned (0 unrecognized)"));
        assert!(out.contains("warning: pattern `cblas_*gemm` matched no declaration"));
        assert!(out.contains(
            "warning: line 9: `vsMul` matches a pattern but its declaration was not recognized"
        ));
    }

    #[test]
    fn test_json_report() {
        let scan = report(SRC, "cblas_*dot\nv*Add");
        let json = serde_json::to_value(InspectReport::new(&scan)).unwrap();

        assert_eq!(json["routines"][0]["dispatch_name"], "cblas_dot");
        assert_eq!(json["routines"][0]["complete"], true);
        assert_eq!(json["routines"][0]["single"]["raw_name"], "cblas_sdot");
        assert_eq!(json["routines"][0]["double"]["precision"], "double");
        assert_eq!(json["routines"][1]["complete"], false);
        assert!(json["routines"][1]["double"].is_null());
        assert_eq!(json["skipped_routines"][0]["raw_name"], "vsMul");
        assert_eq!(json["routines"][1]["single"]["parameters"][1]["c_type"], "const float[]");
    }
}
