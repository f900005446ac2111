//! Function descriptors extracted from a C header.

use std::fmt;

use serde::Serialize;

/// Floating point width a raw routine operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// 32-bit, `float`
    Single,
    /// 64-bit, `double`
    Double,
}

impl Precision {
    /// The C spelling of the floating point type.
    pub fn c_type(self) -> &'static str {
        match self {
            Precision::Single => "float",
            Precision::Double => "double",
        }
    }

    /// The Rust spelling of the floating point type.
    pub fn rust_type(self) -> &'static str {
        match self {
            Precision::Single => "f32",
            Precision::Double => "f64",
        }
    }

    /// The Go spelling of the floating point type.
    pub fn go_type(self) -> &'static str {
        match self {
            Precision::Single => "float32",
            Precision::Double => "float64",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Single => write!(f, "32-bit"),
            Precision::Double => write!(f, "64-bit"),
        }
    }
}

/// Calling-convention shape of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Scalar,
    Pointer,
    Array,
}

impl Shape {
    /// Shape of a type string as produced by the extractor.
    pub fn of(c_type: &str) -> Shape {
        let t = c_type.trim_end();
        if t.ends_with("[]") {
            Shape::Array
        } else if t.ends_with('*') {
            Shape::Pointer
        } else {
            Shape::Scalar
        }
    }
}

/// A parameter of a raw routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Declared name, or a synthesized `pN` for unnamed parameters
    pub name: String,

    /// C type, with ` *` for pointers and `[]` for arrays (`const double *`)
    pub c_type: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, c_type: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            c_type: c_type.into(),
        }
    }

    pub fn shape(&self) -> Shape {
        Shape::of(&self.c_type)
    }
}

/// One raw, precision-specific routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDescriptor {
    /// Symbol as declared in the header (`LAPACKE_dpotrf`)
    pub raw_name: String,

    /// Type-erased name of the generated wrapper (`LAPACKE_potrf`)
    pub dispatch_name: String,

    pub precision: Precision,

    /// C return type, `"void"` for procedures
    pub return_type: String,

    pub parameters: Vec<Parameter>,
}

impl FunctionDescriptor {
    pub fn returns_void(&self) -> bool {
        self.return_type == "void"
    }

    /// Parameter names in declaration order.
    pub fn argument_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }

    /// C prototype parameter list, `T *name` for pointers and `T name[]` for
    /// arrays.
    pub fn c_params(&self) -> String {
        self.parameters
            .iter()
            .map(|p| match p.c_type.strip_suffix("[]") {
                Some(base) => format!("{} {}[]", base.trim_end(), p.name),
                None if p.c_type.ends_with('*') => format!("{}{}", p.c_type, p.name),
                None => format!("{} {}", p.c_type, p.name),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potrf() -> FunctionDescriptor {
        FunctionDescriptor {
            raw_name: "LAPACKE_dpotrf".to_string(),
            dispatch_name: "LAPACKE_potrf".to_string(),
            precision: Precision::Double,
            return_type: "lapack_int".to_string(),
            parameters: vec![
                Parameter::new("matrix_layout", "int"),
                Parameter::new("uplo", "char"),
                Parameter::new("n", "lapack_int"),
                Parameter::new("a", "double *"),
                Parameter::new("lda", "lapack_int"),
            ],
        }
    }

    #[test]
    fn test_shape_of() {
        assert_eq!(Shape::of("int"), Shape::Scalar);
        assert_eq!(Shape::of("const double *"), Shape::Pointer);
        assert_eq!(Shape::of("double * *"), Shape::Pointer);
        assert_eq!(Shape::of("const float[]"), Shape::Array);
    }

    #[test]
    fn test_c_params() {
        let mut f = potrf();
        f.parameters.push(Parameter::new("ipiv", "int[]"));
        assert_eq!(
            f.c_params(),
            "int matrix_layout, char uplo, lapack_int n, double *a, lapack_int lda, int ipiv[]"
        );
    }

    #[test]
    fn test_precision_flags() {
        let f = potrf();
        assert_eq!(f.precision, Precision::Double);
        assert!(!f.returns_void());
        assert_eq!(
            f.argument_names().collect::<Vec<_>>(),
            vec!["matrix_layout", "uplo", "n", "a", "lda"]
        );
    }
}
