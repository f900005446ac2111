//! Rust trait emitter.
//!
//! Produces one trait with a method per dispatch name, implemented for `f32`
//! and `f64`. Each implementation forwards to the raw binding inside an
//! `unsafe` block; raw symbols and library types are imported from the
//! provider module.

use std::collections::BTreeSet;
use std::fmt::Write;

use super::{write_banner, EmitError, EmitInput, Emitter};
use crate::core::{map_return, map_type, FunctionPair, Precision, TargetLanguage};

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const PATH_KEYWORDS: &[&str] = &["crate", "self", "Self", "super"];

#[derive(Debug, Clone, Copy, Default)]
pub struct RustEmitter;

impl Emitter for RustEmitter {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Rust
    }

    fn emit(&self, input: &EmitInput<'_>) -> Result<String, EmitError> {
        let pairs = input.registry.pairs()?;
        let trait_name = &input.options.trait_name;
        let mut out = String::new();

        write_banner(&mut out, input.patterns)?;

        let uses = use_list(&pairs);
        if !uses.is_empty() {
            writeln!(
                out,
                "use {}::{{{}}};",
                input.options.provider_crate,
                uses.into_iter().collect::<Vec<_>>().join(", ")
            )?;
            writeln!(out)?;
        }

        writeln!(out, "#[allow(non_snake_case, clippy::too_many_arguments)]")?;
        writeln!(out, "pub trait {trait_name}: Sized {{")?;
        for pair in &pairs {
            writeln!(out, "    {};", signature(pair))?;
        }
        writeln!(out, "}}")?;

        for precision in [Precision::Double, Precision::Single] {
            writeln!(out)?;
            writeln!(out, "#[allow(non_snake_case, clippy::too_many_arguments)]")?;
            writeln!(out, "impl {trait_name} for {} {{", precision.rust_type())?;
            for (idx, pair) in pairs.iter().enumerate() {
                if idx > 0 {
                    writeln!(out)?;
                }
                let raw = pair.get(precision);
                writeln!(
                    out,
                    "    // for {}, or {} float point number.",
                    precision.rust_type(),
                    precision
                )?;
                writeln!(out, "    {} {{", signature(pair))?;
                writeln!(out, "        unsafe {{")?;
                writeln!(out, "            {}({})", raw.raw_name, call_args(pair))?;
                writeln!(out, "        }}")?;
                writeln!(out, "    }}")?;
            }
            writeln!(out, "}}")?;
        }

        Ok(out)
    }
}

/// Raw symbols of both precisions plus every imported library type, sorted.
fn use_list(pairs: &[FunctionPair<'_>]) -> BTreeSet<String> {
    let mut uses = BTreeSet::new();

    for pair in pairs {
        for precision in [Precision::Single, Precision::Double] {
            let f = pair.get(precision);
            uses.insert(f.raw_name.clone());

            let imports = f
                .parameters
                .iter()
                .map(|p| map_type(&p.c_type, TargetLanguage::Rust))
                .chain(map_return(&f.return_type, TargetLanguage::Rust))
                .filter_map(|m| m.import);
            uses.extend(imports);
        }
    }

    uses
}

/// `fn name(a: T, ...) -> R`, typed by the 32-bit variant.
fn signature(pair: &FunctionPair<'_>) -> String {
    let f = pair.single;
    let params = f
        .parameters
        .iter()
        .map(|p| {
            let ty = map_type(&p.c_type, TargetLanguage::Rust);
            format!("{}: {}", rust_ident(&p.name), ty.rendered)
        })
        .collect::<Vec<_>>()
        .join(", ");

    match map_return(&f.return_type, TargetLanguage::Rust) {
        Some(ret) => format!("fn {}({params}) -> {}", pair.dispatch_name, ret.rendered),
        None => format!("fn {}({params})", pair.dispatch_name),
    }
}

fn call_args(pair: &FunctionPair<'_>) -> String {
    pair.single
        .argument_names()
        .map(rust_ident)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape parameter names that collide with Rust keywords.
fn rust_ident(name: &str) -> String {
    if PATH_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FunctionRegistry;
    use crate::emit::tests::{descriptor, render, sample_registry};
    use crate::emit::EmitOptions;

    #[test]
    fn test_rust_output() {
        let out = render(TargetLanguage::Rust, &sample_registry());

        assert!(out.starts_with("// Code generated by mklwrap. DO NOT EDIT.\n"));
        assert!(out.contains("//   LAPACKE_#potrf\n//   cblas_*dot\n"));
        assert!(out.contains(
            "use crate::{LAPACKE_Dpotrf, LAPACKE_Spotrf, cblas_ddot, cblas_sdot, lapack_int};\n"
        ));
        assert!(out.contains("pub trait MKLRoutines: Sized {\n"));
        assert!(out.contains(
            "    fn LAPACKE_potrf(matrix_layout: i32, uplo: i8, n: lapack_int, a: *mut Self, lda: lapack_int) -> lapack_int;\n"
        ));
        assert!(out.contains(
            "    fn cblas_dot(n: i32, x: *const Self, incx: i32, y: *const Self, incy: i32) -> Self;\n"
        ));
        assert!(out.contains("impl MKLRoutines for f64 {\n"));
        assert!(out.contains("impl MKLRoutines for f32 {\n"));
        assert!(out.contains(
            "        unsafe {\n            LAPACKE_Dpotrf(matrix_layout, uplo, n, a, lda)\n        }\n"
        ));
        assert!(out.contains("            cblas_sdot(n, x, incx, y, incy)\n"));

        // f64 impl comes first.
        assert!(out.find("for f64").unwrap() < out.find("for f32").unwrap());
    }

    #[test]
    fn test_custom_provider_and_trait() {
        let registry = sample_registry();
        let options = EmitOptions {
            provider_crate: "crate::mkl_c".to_string(),
            trait_name: "Blas".to_string(),
            ..EmitOptions::default()
        };
        let out = RustEmitter
            .emit(&EmitInput {
                registry: &registry,
                patterns: &[],
                options: &options,
            })
            .unwrap();

        assert!(out.contains("use crate::mkl_c::{"));
        assert!(out.contains("pub trait Blas: Sized {"));
        assert!(out.contains("impl Blas for f32 {"));
    }

    #[test]
    fn test_void_routine_and_keyword_params() {
        let mut registry = FunctionRegistry::new();
        for (precision, raw, real) in [
            (Precision::Single, "vsAdd", "float"),
            (Precision::Double, "vdAdd", "double"),
        ] {
            let input = format!("const {real}[]");
            let output = format!("{real}[]");
            registry
                .add(descriptor(
                    raw,
                    "vAdd",
                    precision,
                    "void",
                    &[
                        ("n", "const int"),
                        ("type", input.as_str()),
                        ("self", input.as_str()),
                        ("r", output.as_str()),
                        ("layout", "const CBLAS_LAYOUT"),
                    ],
                ))
                .unwrap();
        }

        let out = render(TargetLanguage::Rust, &registry);
        assert!(out.contains(
            "    fn vAdd(n: i32, r#type: *const Self, self_: *const Self, r: *mut Self, layout: CBLAS_LAYOUT);\n"
        ));
        assert!(out.contains("            vdAdd(n, r#type, self_, r, layout)\n"));
        assert!(out.contains("use crate::{CBLAS_LAYOUT, vdAdd, vsAdd};\n"));
    }

    #[test]
    fn test_empty_registry() {
        let out = render(TargetLanguage::Rust, &FunctionRegistry::new());
        assert!(!out.contains("use "));
        assert!(out.contains("pub trait MKLRoutines: Sized {\n}\n"));
    }
}
