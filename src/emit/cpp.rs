//! C++ overload emitter.

use std::fmt::Write;

use super::{write_banner, EmitError, EmitInput, Emitter};
use crate::core::{FunctionDescriptor, Precision, TargetLanguage};

#[derive(Debug, Clone, Copy, Default)]
pub struct CppEmitter;

impl Emitter for CppEmitter {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Cpp
    }

    fn emit(&self, input: &EmitInput<'_>) -> Result<String, EmitError> {
        let pairs = input.registry.pairs()?;
        let mut out = String::new();

        write_banner(&mut out, input.patterns)?;
        writeln!(out, "#pragma once")?;
        writeln!(out)?;
        writeln!(out, "#include <{}>", input.options.include)?;

        for pair in &pairs {
            writeln!(out)?;
            for precision in [Precision::Double, Precision::Single] {
                write_overload(&mut out, pair.dispatch_name, pair.get(precision))?;
            }
        }

        Ok(out)
    }
}

fn write_overload(
    out: &mut String,
    dispatch_name: &str,
    f: &FunctionDescriptor,
) -> std::fmt::Result {
    let call = format!(
        "{}({})",
        f.raw_name,
        f.argument_names().collect::<Vec<_>>().join(", ")
    );

    writeln!(out, "// for {}, or {} float point number.", f.precision.c_type(), f.precision)?;
    writeln!(
        out,
        "inline {} {}({}) {{",
        f.return_type,
        dispatch_name,
        f.c_params()
    )?;
    if f.returns_void() {
        writeln!(out, "    {call};")?;
    } else {
        writeln!(out, "    return {call};")?;
    }
    writeln!(out, "}}")
}
