//! Mapping of raw C parameter and return types to target language types.
//!
//! The header vocabulary is small: a handful of integer spellings, `char`,
//! the two floating point types, pointers and arrays of those, and library
//! typedefs/enums (`lapack_int`, `CBLAS_LAYOUT`, ...). `float` and `double`
//! collapse into the generic precision type of the target (`Self` in Rust,
//! `F` in Go), keeping the const/mut distinction of pointers.
//!
//! Types outside the built-in table are treated as opaque: a leading `const`
//! is dropped and the name is passed through, flagged as an import from the
//! raw binding source.

use super::function::Precision;
use super::language::TargetLanguage;

/// A classified C type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CType {
    Void,
    /// `size_t`
    Size,
    /// `int`
    Int,
    /// `int32_t`
    Int32,
    /// `int64_t`
    Int64,
    /// `char`
    Char,
    /// `float` or `double`, the precision-generic scalar
    Real,
    /// A library typedef or enum
    Named(String),
    /// One level of pointer or array
    Pointer { pointee: Box<CType>, mutable: bool },
    /// A shape the classifier does not understand (function pointers and such)
    Unsupported(String),
}

impl CType {
    /// Classify a type string as produced by the declaration extractor
    /// (`const double *`, `float[]`, `lapack_int`).
    pub fn classify(c_type: &str) -> CType {
        let normalized = normalize(c_type);
        let s = normalized.as_str();

        let (is_const, rest) = match s.strip_prefix("const ") {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        // Peel pointer and array suffixes, outermost first.
        let mut base = rest.trim();
        let mut levels = 0usize;
        loop {
            if let Some(inner) = base.strip_suffix("[]") {
                base = inner.trim_end();
            } else if let Some(inner) = base.strip_suffix('*') {
                base = inner.trim_end();
            } else {
                break;
            }
            levels += 1;
        }
        // `double const *` spells the qualifier after the base type.
        let (is_const, base) = match base.strip_suffix(" const") {
            Some(b) => (true, b.trim_end()),
            None => (is_const, base),
        };

        if base.is_empty() || base.contains(&['(', ')', '[', ']', '*'][..]) {
            return CType::Unsupported(strip_const(c_type.trim()).to_string());
        }

        let mut ty = match base {
            "void" => CType::Void,
            "size_t" => CType::Size,
            "int" => CType::Int,
            "int32_t" => CType::Int32,
            "int64_t" => CType::Int64,
            "char" => CType::Char,
            "float" | "double" => CType::Real,
            other => CType::Named(other.to_string()),
        };

        // `const` qualifies the innermost pointee; outer levels stay mutable.
        for level in 0..levels {
            ty = CType::Pointer {
                pointee: Box::new(ty),
                mutable: level > 0 || !is_const,
            };
        }

        ty
    }

    /// Whether the type is built in for every target (needs no import).
    pub fn is_owned(&self) -> bool {
        self.import().is_none()
    }

    /// The library type this type refers to, if any.
    pub fn import(&self) -> Option<&str> {
        match self {
            CType::Named(name) => Some(name),
            CType::Pointer { pointee, .. } => pointee.import(),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, CType::Void)
    }

    /// Rust spelling, with `Self` standing for the precision type.
    pub fn to_rust(&self) -> String {
        match self {
            CType::Void => "()".to_string(),
            CType::Size => "usize".to_string(),
            CType::Int | CType::Int32 => "i32".to_string(),
            CType::Int64 => "i64".to_string(),
            CType::Char => "i8".to_string(),
            CType::Real => "Self".to_string(),
            CType::Named(name) => name.clone(),
            CType::Pointer { pointee, mutable } => {
                let inner = match **pointee {
                    CType::Void => "::std::ffi::c_void".to_string(),
                    ref other => other.to_rust(),
                };
                if *mutable {
                    format!("*mut {inner}")
                } else {
                    format!("*const {inner}")
                }
            }
            CType::Unsupported(raw) => raw.clone(),
        }
    }

    /// Go spelling, with `F` standing for the precision type.
    pub fn to_go(&self) -> String {
        match self {
            CType::Void => String::new(),
            CType::Size => "uint64".to_string(),
            CType::Int | CType::Int32 => "int32".to_string(),
            CType::Int64 => "int64".to_string(),
            CType::Char => "byte".to_string(),
            CType::Real => "F".to_string(),
            CType::Named(name) => format!("C.{name}"),
            CType::Pointer { pointee, .. } if pointee.is_void() => "unsafe.Pointer".to_string(),
            CType::Pointer { pointee, .. } => format!("*{}", pointee.to_go()),
            CType::Unsupported(raw) => format!("C.{raw}"),
        }
    }

    /// cgo spelling of the C type for one precision (`C.float`, `*C.int`).
    pub fn to_cgo(&self, precision: Precision) -> String {
        match self {
            CType::Void => "unsafe.Pointer".to_string(),
            CType::Size => "C.size_t".to_string(),
            CType::Int => "C.int".to_string(),
            CType::Int32 => "C.int32_t".to_string(),
            CType::Int64 => "C.int64_t".to_string(),
            CType::Char => "C.char".to_string(),
            CType::Real => format!("C.{}", precision.c_type()),
            CType::Named(name) => format!("C.{name}"),
            CType::Pointer { pointee, .. } if pointee.is_void() => "unsafe.Pointer".to_string(),
            CType::Pointer { pointee, .. } => format!("*{}", pointee.to_cgo(precision)),
            CType::Unsupported(raw) => format!("C.{raw}"),
        }
    }
}

/// A type rendered for one target language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    /// Target spelling (`*mut Self`, `C.lapack_int`, `const float *`)
    pub rendered: String,

    /// Library type that must be imported from the raw binding source
    pub import: Option<String>,
}

impl MappedType {
    /// True for primitives and pointers to primitives.
    pub fn is_owned(&self) -> bool {
        self.import.is_none()
    }
}

/// Map a C type string to its spelling in `lang`.
pub fn map_type(c_type: &str, lang: TargetLanguage) -> MappedType {
    let ty = CType::classify(c_type);
    let rendered = match lang {
        TargetLanguage::Rust => ty.to_rust(),
        TargetLanguage::Go => ty.to_go(),
        // C++ overloads keep the raw C spelling.
        TargetLanguage::Cpp => normalize(c_type),
    };

    MappedType {
        rendered,
        import: ty.import().map(str::to_string),
    }
}

/// Map a C return type; `None` for `void`.
pub fn map_return(c_type: &str, lang: TargetLanguage) -> Option<MappedType> {
    if CType::classify(c_type).is_void() {
        return None;
    }
    Some(map_type(c_type, lang))
}

/// Collapse whitespace runs and put a single space before `*`.
fn normalize(c_type: &str) -> String {
    let spaced = c_type.replace('*', " * ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    joined.replace(" []", "[]").replace(" [ ]", "[]")
}

fn strip_const(s: &str) -> &str {
    s.strip_prefix("const ").unwrap_or(s)
}
