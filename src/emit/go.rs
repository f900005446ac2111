//! Go (cgo) generic function emitter.
//!
//! Every dispatch name becomes a generic function over the `Float`
//! constraint. The body switches on the type argument and calls the 32-bit
//! or 64-bit symbol through cgo, converting each argument to its C type.

use std::fmt::Write;

use super::{write_banner, EmitError, EmitInput, Emitter};
use crate::core::{CType, FunctionDescriptor, FunctionPair, Precision, TargetLanguage};

const KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

/// Names the generated bodies refer to and parameters must not shadow.
const RESERVED: &[&str] = &["C", "F", "Float", "any", "panic", "unsafe", "zero"];

#[derive(Debug, Clone, Copy, Default)]
pub struct GoEmitter;

impl Emitter for GoEmitter {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Go
    }

    fn emit(&self, input: &EmitInput<'_>) -> Result<String, EmitError> {
        let pairs = input.registry.pairs()?;

        let mut body = String::new();
        let mut uses_unsafe = false;
        for pair in &pairs {
            writeln!(body)?;
            uses_unsafe |= write_function(&mut body, pair)?;
        }

        let mut out = String::new();
        write_banner(&mut out, input.patterns)?;
        writeln!(out, "package {}", input.options.go_package)?;
        writeln!(out)?;
        writeln!(out, "/*")?;
        writeln!(out, "#include <{}>", input.options.include)?;
        writeln!(out, "*/")?;
        writeln!(out, "import \"C\"")?;
        if uses_unsafe {
            writeln!(out)?;
            writeln!(out, "import \"unsafe\"")?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "// Float is the set of floating point types the routines are generic over."
        )?;
        writeln!(out, "type Float interface {{")?;
        writeln!(out, "\tfloat32 | float64")?;
        writeln!(out, "}}")?;
        out.push_str(&body);

        Ok(out)
    }
}

/// Write one generic function; returns whether it needs `unsafe`.
fn write_function(out: &mut String, pair: &FunctionPair<'_>) -> Result<bool, std::fmt::Error> {
    let name = exported_name(pair.dispatch_name);
    let f = pair.single;
    let mut uses_unsafe = false;

    let params = f
        .parameters
        .iter()
        .map(|p| {
            let ty = CType::classify(&p.c_type).to_go();
            uses_unsafe |= ty.contains("unsafe.");
            format!("{} {}", go_ident(&p.name), ty)
        })
        .collect::<Vec<_>>()
        .join(", ");

    let ret = CType::classify(&f.return_type);
    let ret_decl = if ret.is_void() {
        String::new()
    } else {
        let ty = ret.to_go();
        uses_unsafe |= ty.contains("unsafe.");
        format!(" {ty}")
    };

    writeln!(
        out,
        "// {name} calls {} for float32 and {} for float64.",
        pair.single.raw_name, pair.double.raw_name
    )?;
    writeln!(out, "func {name}[F Float]({params}){ret_decl} {{")?;
    writeln!(out, "\tvar zero F")?;
    writeln!(out, "\tswitch any(zero).(type) {{")?;

    for precision in [Precision::Single, Precision::Double] {
        let raw = pair.get(precision);
        let (call, call_unsafe) = call_expr(f, raw, precision);
        uses_unsafe |= call_unsafe;

        writeln!(out, "\tcase {}:", precision.go_type())?;
        if ret.is_void() {
            writeln!(out, "\t\t{call}")?;
        } else {
            let (value, ret_unsafe) = convert_return(&ret, &call, precision);
            uses_unsafe |= ret_unsafe;
            writeln!(out, "\t\treturn {value}")?;
        }
    }

    writeln!(out, "\t}}")?;
    if !ret.is_void() {
        writeln!(out, "\tpanic(\"unreachable\")")?;
    }
    writeln!(out, "}}")?;

    Ok(uses_unsafe)
}

/// `C.raw(args...)` with per-argument conversions; also reports `unsafe` use.
fn call_expr(
    signature: &FunctionDescriptor,
    raw: &FunctionDescriptor,
    precision: Precision,
) -> (String, bool) {
    let mut uses_unsafe = false;
    let args = signature
        .parameters
        .iter()
        .map(|p| {
            let ty = CType::classify(&p.c_type);
            let (arg, arg_unsafe) = convert_arg(&ty, &go_ident(&p.name), precision);
            uses_unsafe |= arg_unsafe;
            arg
        })
        .collect::<Vec<_>>()
        .join(", ");

    (format!("C.{}({args})", raw.raw_name), uses_unsafe)
}

/// Convert a Go value of type `ty.to_go()` to `ty.to_cgo(precision)`.
fn convert_arg(ty: &CType, value: &str, precision: Precision) -> (String, bool) {
    let go = ty.to_go();
    let cgo = ty.to_cgo(precision);
    if go == cgo {
        (value.to_string(), go.contains("unsafe."))
    } else if matches!(ty, CType::Pointer { .. }) {
        (format!("({cgo})(unsafe.Pointer({value}))"), true)
    } else {
        (format!("{cgo}({value})"), false)
    }
}

/// Convert a cgo result of type `ty.to_cgo(precision)` back to `ty.to_go()`.
fn convert_return(ty: &CType, call: &str, precision: Precision) -> (String, bool) {
    let go = ty.to_go();
    let cgo = ty.to_cgo(precision);
    if go == cgo {
        (call.to_string(), go.contains("unsafe."))
    } else if matches!(ty, CType::Pointer { .. }) {
        (format!("({go})(unsafe.Pointer({call}))"), true)
    } else {
        (format!("{go}({call})"), false)
    }
}

/// Upper-case the first letter so the function is exported.
fn exported_name(dispatch_name: &str) -> String {
    let mut chars = dispatch_name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn go_ident(name: &str) -> String {
    if KEYWORDS.contains(&name) || RESERVED.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FunctionRegistry;
    use crate::emit::tests::{descriptor, render, sample_registry};

    #[test]
    fn test_go_output() {
        let out = render(TargetLanguage::Go, &sample_registry());

        assert!(out.contains("package mklroutines\n\n/*\n#include <mkl.h>\n*/\nimport \"C\"\n"));
        assert!(out.contains("import \"unsafe\"\n"));
        assert!(out.contains("type Float interface {\n\tfloat32 | float64\n}\n"));
        assert!(out.contains(
            "func LAPACKE_potrf[F Float](matrix_layout int32, uplo byte, n C.lapack_int, a *F, lda C.lapack_int) C.lapack_int {\n"
        ));
        assert!(out.contains(
            "\tcase float32:\n\t\treturn C.LAPACKE_Spotrf(C.int(matrix_layout), C.char(uplo), n, (*C.float)(unsafe.Pointer(a)), lda)\n"
        ));
        assert!(out.contains(
            "func Cblas_dot[F Float](n int32, x *F, incx int32, y *F, incy int32) F {\n"
        ));
        assert!(out.contains(
            "\tcase float64:\n\t\treturn F(C.cblas_ddot(C.int(n), (*C.double)(unsafe.Pointer(x)), C.int(incx), (*C.double)(unsafe.Pointer(y)), C.int(incy)))\n"
        ));
        assert!(out.contains("\t}\n\tpanic(\"unreachable\")\n}\n"));
    }

    #[test]
    fn test_unsafe_only_when_needed() {
        let mut registry = FunctionRegistry::new();
        for (precision, raw, real) in [
            (Precision::Single, "mkl_sscale", "float"),
            (Precision::Double, "mkl_dscale", "double"),
        ] {
            registry
                .add(descriptor(
                    raw,
                    "mkl_scale",
                    precision,
                    "void",
                    &[("alpha", real), ("type", "int64_t"), ("C", "size_t")],
                ))
                .unwrap();
        }

        let out = render(TargetLanguage::Go, &registry);
        assert!(!out.contains("unsafe"));
        assert!(out.contains("func Mkl_scale[F Float](alpha F, type_ int64, C_ uint64) {\n"));
        assert!(out.contains("\t\tC.mkl_sscale(C.float(alpha), C.int64_t(type_), C.size_t(C_))\n"));
        assert!(!out.contains("panic"));
    }

    #[test]
    fn test_exported_name() {
        assert_eq!(exported_name("cblas_gemm"), "Cblas_gemm");
        assert_eq!(exported_name("vAdd"), "VAdd");
        assert_eq!(exported_name("LAPACKE_potrf"), "LAPACKE_potrf");
    }
}
