//! Declaration extraction.
//!
//! Walks one external declaration and produces a [`FunctionDescriptor`] if it
//! is a plain function prototype whose name matches a routine pattern.
//! Anything else is "not applicable" and yields `None`.

use std::collections::HashSet;

use super::ast::{
    Declaration, DeclarationSpecifier, Declarator, DeclaratorSuffix, DirectDeclarator,
    ExternalDeclaration, FunctionDeclarator, ParameterDeclaration, TypeQualifier, TypeSpecifier,
};
use crate::core::{FunctionDescriptor, Parameter, PatternSet};

/// Extract a descriptor from `decl` if it declares a routine in `patterns`.
pub fn extract(decl: &ExternalDeclaration, patterns: &PatternSet) -> Option<FunctionDescriptor> {
    let ExternalDeclaration::Declaration(decl) = decl else {
        return None;
    };
    let (name, declarator, function) = prototype(decl)?;
    let routine = patterns.find(name)?;

    if function.variadic {
        tracing::warn!(
            "line {}: skipping variadic routine `{}`",
            decl.line,
            name
        );
        return None;
    }

    let mut return_type = base_type(&decl.specifiers);
    push_pointers(&mut return_type, declarator.pointers.len());

    Some(FunctionDescriptor {
        raw_name: name.to_string(),
        dispatch_name: routine.dispatch_name,
        precision: routine.precision,
        return_type,
        parameters: parameters(function),
    })
}

/// The name, declarator and parameter list of a plain function prototype.
fn prototype(decl: &Declaration) -> Option<(&str, &Declarator, &FunctionDeclarator)> {
    if decl.is_typedef() {
        return None;
    }

    let init = decl.declarators.first()?;
    if init.has_initializer {
        return None;
    }

    let declarator = &init.declarator;
    let DirectDeclarator::Identifier(name) = &declarator.direct else {
        return None;
    };
    match declarator.suffixes.as_slice() {
        [DeclaratorSuffix::Function(function)] => Some((name.as_str(), declarator, function)),
        _ => None,
    }
}

fn parameters(function: &FunctionDeclarator) -> Vec<Parameter> {
    if is_void_list(&function.parameters) {
        return Vec::new();
    }

    let declared: HashSet<&str> = function
        .parameters
        .iter()
        .filter_map(|p| p.declarator.as_ref()?.identifier())
        .collect();

    function
        .parameters
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let name = match param.declarator.as_ref().and_then(Declarator::identifier) {
                Some(name) => name.to_string(),
                None => synthesized_name(index, &declared),
            };
            Parameter::new(name, parameter_type(param))
        })
        .collect()
}

/// `p<index>`, suffixed with `_` until it does not shadow a declared name.
fn synthesized_name(index: usize, declared: &HashSet<&str>) -> String {
    let mut name = format!("p{index}");
    while declared.contains(name.as_str()) {
        name.push('_');
    }
    name
}

/// `(void)` declares no parameters.
fn is_void_list(params: &[ParameterDeclaration]) -> bool {
    let [param] = params else {
        return false;
    };
    let abstract_void = match &param.declarator {
        None => true,
        Some(d) => {
            d.pointers.is_empty()
                && d.suffixes.is_empty()
                && matches!(d.direct, DirectDeclarator::Abstract)
        }
    };
    abstract_void && base_type(&param.specifiers) == "void"
}

fn parameter_type(param: &ParameterDeclaration) -> String {
    let base = base_type(&param.specifiers);
    match &param.declarator {
        Some(declarator) => declarator_type(base, declarator),
        None => base,
    }
}

/// Render the type a declarator gives to `base`.
///
/// Pointers add ` *`, array suffixes add `[]`. Nested declarators (function
/// pointers and the like) come out as an abstract C spelling such as
/// `void (*)(int)`.
fn declarator_type(mut base: String, declarator: &Declarator) -> String {
    push_pointers(&mut base, declarator.pointers.len());

    if let DirectDeclarator::Nested(inner) = &declarator.direct {
        let mut outer = base;
        for suffix in &declarator.suffixes {
            match suffix {
                DeclaratorSuffix::Array => outer.push_str("[]"),
                DeclaratorSuffix::Function(f) => outer.push_str(&function_suffix(f)),
            }
        }
        let stars = "*".repeat(inner.pointers.len());
        return match outer.split_once('(') {
            Some((ret, rest)) => format!("{} ({stars})({rest}", ret.trim_end()),
            None => format!("{outer} ({stars})"),
        };
    }

    for suffix in &declarator.suffixes {
        match suffix {
            DeclaratorSuffix::Array => base.push_str("[]"),
            DeclaratorSuffix::Function(f) => base.push_str(&function_suffix(f)),
        }
    }
    base
}

fn function_suffix(function: &FunctionDeclarator) -> String {
    let mut params: Vec<String> = function.parameters.iter().map(parameter_type).collect();
    if function.variadic {
        params.push("...".to_string());
    }
    format!("({})", params.join(", "))
}

fn push_pointers(ty: &mut String, levels: usize) {
    for _ in 0..levels {
        ty.push_str(" *");
    }
}

/// Qualifiers and type specifiers of a specifier chain, `const int` style.
fn base_type(specifiers: &[DeclarationSpecifier]) -> String {
    let mut words: Vec<String> = Vec::new();

    for spec in specifiers {
        if let DeclarationSpecifier::TypeQualifier(q) = spec {
            if matches!(q, TypeQualifier::Const | TypeQualifier::Volatile)
                && !words.iter().any(|w| w == q.as_str())
            {
                words.push(q.as_str().to_string());
            }
        }
    }

    let qualifiers = words.len();
    for spec in specifiers {
        let DeclarationSpecifier::TypeSpecifier(ty) = spec else {
            continue;
        };
        match ty {
            TypeSpecifier::Keyword(word) | TypeSpecifier::TypedefName(word) => {
                words.push(word.clone())
            }
            TypeSpecifier::Tagged { kind, name, .. } => match name {
                Some(name) => words.push(format!("{} {}", kind.as_str(), name)),
                None => words.push(kind.as_str().to_string()),
            },
            TypeSpecifier::TypeOf => words.push("__typeof__".to_string()),
        }
    }

    // Implicit int
    if words.len() == qualifiers {
        words.push("int".to_string());
    }

    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Precision;
    use crate::header::parse;

    fn patterns(text: &str) -> PatternSet {
        PatternSet::parse(text).unwrap()
    }

    fn extract_all(src: &str, patterns: &PatternSet) -> Vec<FunctionDescriptor> {
        parse(src)
            .unwrap()
            .declarations
            .iter()
            .filter_map(|d| extract(d, patterns))
            .collect()
    }

    fn types(f: &FunctionDescriptor) -> Vec<&str> {
        f.parameters.iter().map(|p| p.c_type.as_str()).collect()
    }

    const GEMM: &str = "\
void cblas_sgemm(const CBLAS_LAYOUT Layout, const CBLAS_TRANSPOSE TransA,
                 const CBLAS_TRANSPOSE TransB, const int M, const int N,
                 const int K, const float alpha, const float *A,
                 const int lda, const float *B, const int ldb,
                 const float beta, float *C, const int ldc);
void cblas_dgemm(const CBLAS_LAYOUT Layout, const CBLAS_TRANSPOSE TransA,
                 const CBLAS_TRANSPOSE TransB, const int M, const int N,
                 const int K, const double alpha, const double *A,
                 const int lda, const double *B, const int ldb,
                 const double beta, double *C, const int ldc);
";

    #[test]
    fn test_extract_gemm_pair() {
        let funcs = extract_all(GEMM, &patterns("cblas_*gemm"));
        assert_eq!(funcs.len(), 2);

        let s = &funcs[0];
        assert_eq!(s.raw_name, "cblas_sgemm");
        assert_eq!(s.dispatch_name, "cblas_gemm");
        assert_eq!(s.precision, Precision::Single);
        assert_eq!(s.return_type, "void");
        assert_eq!(s.parameters.len(), 14);
        assert_eq!(s.parameters[0], Parameter::new("Layout", "const CBLAS_LAYOUT"));
        assert_eq!(s.parameters[7], Parameter::new("A", "const float *"));
        assert_eq!(s.parameters[12], Parameter::new("C", "float *"));

        let d = &funcs[1];
        assert_eq!(d.dispatch_name, "cblas_gemm");
        assert_eq!(d.precision, Precision::Double);
        assert_eq!(d.parameters[9], Parameter::new("B", "const double *"));
    }

    #[test]
    fn test_extract_uppercase_convention() {
        let src = "lapack_int LAPACKE_Spotrf(int matrix_layout, char uplo, lapack_int n, float* a, lapack_int lda);\n\
                   lapack_int LAPACKE_Dpotrf(int matrix_layout, char uplo, lapack_int n, double* a, lapack_int lda);";
        let funcs = extract_all(src, &patterns("LAPACKE_#potrf"));

        assert_eq!(funcs.len(), 2);
        assert_eq!(funcs[0].dispatch_name, "LAPACKE_potrf");
        assert_eq!(funcs[0].precision, Precision::Single);
        assert_eq!(funcs[1].precision, Precision::Double);
        assert_eq!(funcs[0].return_type, "lapack_int");
        assert_eq!(
            types(&funcs[1]),
            vec!["int", "char", "lapack_int", "double *", "lapack_int"]
        );
    }

    #[test]
    fn test_unnamed_parameters() {
        let funcs = extract_all("void foo_s(int);", &patterns("foo_*"));
        assert_eq!(funcs[0].parameters, vec![Parameter::new("p0", "int")]);

        let funcs = extract_all(
            "void foo_d(const double *, int n, double[]);",
            &patterns("foo_*"),
        );
        assert_eq!(
            funcs[0].parameters,
            vec![
                Parameter::new("p0", "const double *"),
                Parameter::new("n", "int"),
                Parameter::new("p2", "double[]"),
            ]
        );
    }

    #[test]
    fn test_synthesized_names_avoid_declared_names() {
        let funcs = extract_all("void foo_s(float *, int p0);", &patterns("foo_*"));
        assert_eq!(
            funcs[0].parameters,
            vec![Parameter::new("p0_", "float *"), Parameter::new("p0", "int")]
        );
    }

    #[test]
    fn test_array_parameters() {
        let funcs = extract_all(
            "void vsAdd(const int n, const float a[], const float b[], float r[]);",
            &patterns("v*Add"),
        );
        let f = &funcs[0];
        assert_eq!(f.dispatch_name, "vAdd");
        assert_eq!(
            types(f),
            vec!["const int", "const float[]", "const float[]", "float[]"]
        );
        assert_eq!(f.parameters[3].name, "r");
    }

    #[test]
    fn test_void_parameter_list() {
        let funcs = extract_all("double mkl_dsecnd(void);", &patterns("mkl_*secnd"));
        assert!(funcs[0].parameters.is_empty());
        assert_eq!(funcs[0].return_type, "double");

        // `void *` is a real parameter.
        let funcs = extract_all("void mkl_sfree(void *);", &patterns("mkl_*free"));
        assert_eq!(funcs[0].parameters, vec![Parameter::new("p0", "void *")]);
    }

    #[test]
    fn test_return_types() {
        let funcs = extract_all(
            "const int cblas_sfoo(int n);\nfloat *cblas_dfoo(int n);\nunsigned long long cblas_sbar(void);",
            &patterns("cblas_*foo\ncblas_*bar"),
        );
        assert_eq!(funcs[0].return_type, "const int");
        assert_eq!(funcs[1].return_type, "float *");
        assert_eq!(funcs[2].return_type, "unsigned long long");
    }

    #[test]
    fn test_skips_non_prototypes() {
        let src = "\
typedef void cblas_sfn(int n);
float cblas_sval = 1.0f;
float cblas_dvar;
static inline float cblas_sdef(int n) { return 0; }
void (*cblas_sptr)(int n);
struct cblas_dtag { int x; };
void cblas_sunrelated(int n);
";
        let funcs = extract_all(src, &patterns("cblas_*fn\ncblas_*val\ncblas_*var\ncblas_*def\ncblas_*ptr"));
        assert!(funcs.is_empty(), "{funcs:?}");
    }

    #[test]
    fn test_variadic_is_skipped() {
        let funcs = extract_all("int mkl_sprintf(const char *fmt, ...);", &patterns("mkl_*printf"));
        assert!(funcs.is_empty());
    }

    #[test]
    fn test_function_pointer_parameter_is_best_effort() {
        let funcs = extract_all(
            "void dfsintegrate(void (*cb)(int, double *), int n);",
            &patterns("df*integrate"),
        );
        let f = &funcs[0];
        assert_eq!(f.parameters[0], Parameter::new("cb", "void (*)(int, double *)"));
        assert_eq!(f.parameters[1], Parameter::new("n", "int"));
    }

    #[test]
    fn test_extraction_is_pure() {
        let set = patterns("cblas_*gemm");
        let first = extract_all(GEMM, &set);
        let second = extract_all(GEMM, &set);
        assert_eq!(first, second);
    }

    #[test]
    fn test_first_pattern_wins() {
        let src = "float cblas_sdsdot(const int N, const float *X, const float *Y);";
        let funcs = extract_all(src, &patterns("cblas_*dsdot\ncblas_sd*dot"));
        assert_eq!(funcs[0].dispatch_name, "cblas_dsdot");
        assert_eq!(funcs[0].precision, Precision::Single);
    }
}
