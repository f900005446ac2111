//! Declaration-level syntax tree for C headers.
//!
//! Only the parts of C that matter for prototypes are modelled: specifier
//! chains, declarators with pointer/array/function suffixes, and parameter
//! lists. Bodies, initializers and array sizes are skipped by the parser.

/// A parsed header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationUnit {
    pub declarations: Vec<ExternalDeclaration>,
}

impl TranslationUnit {
    /// Number of declarations the parser had to skip.
    pub fn unrecognized_count(&self) -> usize {
        self.declarations
            .iter()
            .filter(|d| matches!(d, ExternalDeclaration::Unrecognized { .. }))
            .count()
    }
}

/// A top-level item of a translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalDeclaration {
    /// `specifiers declarator, declarator = init;`
    Declaration(Declaration),

    /// A function with a body; the body itself is not kept.
    FunctionDefinition(Declaration),

    /// `_Static_assert(...)`
    StaticAssert { line: usize },

    /// Something the declaration grammar could not follow, with the
    /// identifiers it contained.
    Unrecognized {
        line: usize,
        reason: String,
        names: Vec<String>,
    },
}

/// A declaration or the head of a function definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub specifiers: Vec<DeclarationSpecifier>,
    pub declarators: Vec<InitDeclarator>,
    pub line: usize,
}

impl Declaration {
    /// Whether the declaration is a `typedef`.
    pub fn is_typedef(&self) -> bool {
        self.specifiers
            .iter()
            .any(|s| matches!(s, DeclarationSpecifier::StorageClass(StorageClass::Typedef)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationSpecifier {
    StorageClass(StorageClass),
    TypeQualifier(TypeQualifier),
    TypeSpecifier(TypeSpecifier),
    Function(FunctionSpecifier),
    /// `__attribute__((...))`, `__declspec(...)`
    Attribute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Typedef,
    Extern,
    Static,
    Auto,
    Register,
    ThreadLocal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeQualifier {
    Const,
    Volatile,
    Restrict,
    Atomic,
}

impl TypeQualifier {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeQualifier::Const => "const",
            TypeQualifier::Volatile => "volatile",
            TypeQualifier::Restrict => "restrict",
            TypeQualifier::Atomic => "_Atomic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionSpecifier {
    Inline,
    Noreturn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Struct,
    Union,
    Enum,
}

impl TagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TagKind::Struct => "struct",
            TagKind::Union => "union",
            TagKind::Enum => "enum",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpecifier {
    /// `void`, `int`, `unsigned`, `double`, ...
    Keyword(String),

    /// `struct tag`, `enum tag { ... }`
    Tagged {
        kind: TagKind,
        name: Option<String>,
        has_body: bool,
    },

    /// A typedef name such as `lapack_int` or `CBLAS_LAYOUT`
    TypedefName(String),

    /// `typeof(...)`, `_Atomic(...)`
    TypeOf,
}

/// A declarator with an optional initializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitDeclarator {
    pub declarator: Declarator,
    pub has_initializer: bool,
}

/// `pointers direct suffixes`, e.g. `* const name[]` or `(*cb)(int)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator {
    /// One entry per `*`, with that level's qualifiers
    pub pointers: Vec<Vec<TypeQualifier>>,
    pub direct: DirectDeclarator,
    pub suffixes: Vec<DeclaratorSuffix>,
}

impl Declarator {
    /// The declared identifier, looking through nested declarators.
    pub fn identifier(&self) -> Option<&str> {
        match &self.direct {
            DirectDeclarator::Identifier(name) => Some(name),
            DirectDeclarator::Nested(inner) => inner.identifier(),
            DirectDeclarator::Abstract => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectDeclarator {
    Identifier(String),
    Nested(Box<Declarator>),
    Abstract,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaratorSuffix {
    /// `[...]`; the size expression is not kept
    Array,
    Function(FunctionDeclarator),
}

/// The parameter list of a function declarator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionDeclarator {
    pub parameters: Vec<ParameterDeclaration>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDeclaration {
    pub specifiers: Vec<DeclarationSpecifier>,
    pub declarator: Option<Declarator>,
}
