//! Declaration-level recursive descent parser for C headers.
//!
//! The grammar covers what library headers use for prototypes. Struct, union
//! and enum bodies, function bodies, initializers and array sizes are skipped
//! by delimiter balancing. A declaration the grammar cannot follow becomes
//! [`ExternalDeclaration::Unrecognized`] and parsing resumes after it; only
//! lexing failures and unbalanced delimiters fail the whole parse.

use super::ast::{
    Declaration, DeclarationSpecifier, Declarator, DeclaratorSuffix, DirectDeclarator,
    ExternalDeclaration, FunctionDeclarator, FunctionSpecifier, InitDeclarator,
    ParameterDeclaration, StorageClass, TagKind, TranslationUnit, TypeQualifier, TypeSpecifier,
};
use super::lexer::{tokenize, SpannedToken, Token};
use super::ParseError;

/// Builtin type keywords.
const TYPE_KEYWORDS: &[&str] = &[
    "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool",
    "_Complex", "__signed__", "__signed", "__int128", "__complex__",
];

/// GNU keywords that carry no meaning for prototypes.
const IGNORED_KEYWORDS: &[&str] = &["__extension__", "__restrict_arr"];

/// Attribute-like keywords followed by a parenthesized argument list.
const ATTRIBUTE_KEYWORDS: &[&str] = &[
    "__attribute__",
    "__attribute",
    "__declspec",
    "__asm__",
    "__asm",
    "asm",
];

/// A declaration-local syntax error; the parser skips the declaration.
#[derive(Debug)]
struct SyntaxError {
    line: usize,
    message: String,
}

type PResult<T> = Result<T, SyntaxError>;

/// Parse header text into a translation unit.
pub fn parse(source: &str) -> Result<TranslationUnit, ParseError> {
    let tokens = tokenize(source)?;
    check_balanced(&tokens)?;
    Parser::new(tokens).translation_unit()
}

/// Reject unbalanced `()`, `[]` and `{}` up front so recovery never runs off
/// the end of the input.
fn check_balanced(tokens: &[SpannedToken]) -> Result<(), ParseError> {
    let mut stack: Vec<&SpannedToken> = Vec::new();

    for tok in tokens {
        let expected_open = match tok.token {
            Token::LParen | Token::LBracket | Token::LBrace => {
                stack.push(tok);
                continue;
            }
            Token::RParen => Token::LParen,
            Token::RBracket => Token::LBracket,
            Token::RBrace => Token::LBrace,
            _ => continue,
        };

        match stack.pop() {
            Some(open) if open.token == expected_open => {}
            _ => {
                return Err(ParseError::Unbalanced {
                    line: tok.line,
                    column: tok.column,
                    delimiter: tok.text.clone(),
                })
            }
        }
    }

    match stack.pop() {
        Some(open) => Err(ParseError::Unclosed {
            line: open.line,
            column: open.column,
            delimiter: open.text.clone(),
        }),
        None => Ok(()),
    }
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn translation_unit(mut self) -> Result<TranslationUnit, ParseError> {
        let mut unit = TranslationUnit::default();
        // Open `extern "C" {` blocks.
        let mut linkage_blocks = 0usize;

        while let Some(tok) = self.peek() {
            match tok.token {
                Token::Semicolon => {
                    self.pos += 1;
                    continue;
                }
                Token::RBrace if linkage_blocks > 0 => {
                    linkage_blocks -= 1;
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            if tok.is_ident("extern") && self.peek_at(1).map(|t| t.token) == Some(Token::Str) {
                self.pos += 2;
                if self.eat(Token::LBrace) {
                    linkage_blocks += 1;
                }
                continue;
            }

            let (start, start_line) = (self.pos, self.line());
            match self.external_declaration() {
                Ok(decl) => unit.declarations.push(decl),
                Err(err) => {
                    tracing::trace!("line {}: skipping declaration: {}", err.line, err.message);
                    self.pos = start;
                    let names = self.recover();
                    unit.declarations.push(ExternalDeclaration::Unrecognized {
                        line: start_line,
                        reason: err.message,
                        names,
                    });
                }
            }
        }

        Ok(unit)
    }

    /// Skip to the end of the current declaration: past the next `;` at
    /// depth zero, past a `}` closing a top-level block, or past a `)` closing
    /// a top-level group when the next token starts a new line. The last rule
    /// bounds macro invocations such as `_Mkl_Api(void,vsAdd,(...))` that
    /// have no trailing `;`. Returns the identifiers skipped over.
    fn recover(&mut self) -> Vec<String> {
        let mut depth = 0usize;
        let mut names = Vec::new();
        while let Some(tok) = self.advance() {
            let (token, line) = (tok.token, tok.line);
            if token == Token::Ident {
                names.push(tok.text.clone());
            }
            match token {
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 && self.peek().is_some_and(|next| next.line > line) {
                        break;
                    }
                }
                Token::RBracket => depth = depth.saturating_sub(1),
                Token::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.eat(Token::Semicolon);
                        break;
                    }
                }
                Token::Semicolon if depth == 0 => break,
                _ => {}
            }
        }
        names
    }

    fn external_declaration(&mut self) -> PResult<ExternalDeclaration> {
        let line = self.line();

        if let Some(tok) = self.peek() {
            if tok.is_ident("_Static_assert") || tok.is_ident("static_assert") {
                self.pos += 1;
                self.skip_balanced(Token::LParen)?;
                self.expect(Token::Semicolon)?;
                return Ok(ExternalDeclaration::StaticAssert { line });
            }
        }

        let specifiers = self.declaration_specifiers()?;
        if specifiers.is_empty() {
            return Err(self.error("expected declaration specifiers"));
        }

        let mut declarators = Vec::new();
        if self.eat(Token::Semicolon) {
            return Ok(ExternalDeclaration::Declaration(Declaration {
                specifiers,
                declarators,
                line,
            }));
        }

        loop {
            let declarator = self.declarator(false)?;
            self.skip_trailing_attributes()?;

            if declarators.is_empty() && self.check(Token::LBrace) {
                let is_function = matches!(
                    declarator.suffixes.last(),
                    Some(DeclaratorSuffix::Function(_))
                );
                if !is_function {
                    return Err(self.error("unexpected `{` after declarator"));
                }
                self.skip_balanced(Token::LBrace)?;
                return Ok(ExternalDeclaration::FunctionDefinition(Declaration {
                    specifiers,
                    declarators: vec![InitDeclarator {
                        declarator,
                        has_initializer: false,
                    }],
                    line,
                }));
            }

            let has_initializer = self.eat(Token::Assign);
            if has_initializer {
                self.skip_initializer();
            }

            declarators.push(InitDeclarator {
                declarator,
                has_initializer,
            });

            if self.eat(Token::Comma) {
                continue;
            }
            self.expect(Token::Semicolon)?;
            break;
        }

        Ok(ExternalDeclaration::Declaration(Declaration {
            specifiers,
            declarators,
            line,
        }))
    }

    fn declaration_specifiers(&mut self) -> PResult<Vec<DeclarationSpecifier>> {
        let mut specifiers = Vec::new();
        let mut has_type = false;

        while let Some(tok) = self.peek() {
            if tok.token != Token::Ident {
                break;
            }
            let word = tok.text.clone();

            if let Some(q) = qualifier(&word) {
                self.pos += 1;
                if q == TypeQualifier::Atomic && self.check(Token::LParen) {
                    self.skip_balanced(Token::LParen)?;
                    specifiers.push(DeclarationSpecifier::TypeSpecifier(TypeSpecifier::TypeOf));
                    has_type = true;
                } else {
                    specifiers.push(DeclarationSpecifier::TypeQualifier(q));
                }
                continue;
            }

            if let Some(class) = storage_class(&word) {
                self.pos += 1;
                specifiers.push(DeclarationSpecifier::StorageClass(class));
                continue;
            }

            let spec = match word.as_str() {
                "inline" | "__inline" | "__inline__" => {
                    Some(DeclarationSpecifier::Function(FunctionSpecifier::Inline))
                }
                "_Noreturn" => Some(DeclarationSpecifier::Function(FunctionSpecifier::Noreturn)),
                _ => None,
            };
            if let Some(spec) = spec {
                self.pos += 1;
                specifiers.push(spec);
                continue;
            }

            if IGNORED_KEYWORDS.contains(&word.as_str()) {
                self.pos += 1;
                continue;
            }

            if ATTRIBUTE_KEYWORDS.contains(&word.as_str()) {
                self.pos += 1;
                self.skip_balanced(Token::LParen)?;
                specifiers.push(DeclarationSpecifier::Attribute);
                continue;
            }

            if TYPE_KEYWORDS.contains(&word.as_str()) {
                self.pos += 1;
                specifiers.push(DeclarationSpecifier::TypeSpecifier(TypeSpecifier::Keyword(
                    word,
                )));
                has_type = true;
                continue;
            }

            match word.as_str() {
                "struct" | "union" | "enum" => {
                    let kind = match word.as_str() {
                        "struct" => TagKind::Struct,
                        "union" => TagKind::Union,
                        _ => TagKind::Enum,
                    };
                    self.pos += 1;
                    specifiers.push(DeclarationSpecifier::TypeSpecifier(self.tagged(kind)?));
                    has_type = true;
                }
                "typeof" | "__typeof__" | "__typeof" => {
                    self.pos += 1;
                    self.skip_balanced(Token::LParen)?;
                    specifiers.push(DeclarationSpecifier::TypeSpecifier(TypeSpecifier::TypeOf));
                    has_type = true;
                }
                // An identifier names a type only until a type has been seen;
                // after that it is the declarator.
                _ if !has_type => {
                    self.pos += 1;
                    specifiers.push(DeclarationSpecifier::TypeSpecifier(
                        TypeSpecifier::TypedefName(word),
                    ));
                    has_type = true;
                }
                _ => break,
            }
        }

        Ok(specifiers)
    }

    /// `struct tag`, `struct tag { ... }`, `enum { ... }`
    fn tagged(&mut self, kind: TagKind) -> PResult<TypeSpecifier> {
        self.skip_attributes()?;

        let name = match self.peek() {
            Some(tok) if tok.token == Token::Ident => {
                let name = tok.text.clone();
                self.pos += 1;
                Some(name)
            }
            _ => None,
        };

        let has_body = self.check(Token::LBrace);
        if has_body {
            self.skip_balanced(Token::LBrace)?;
        } else if name.is_none() {
            return Err(self.error(format!("expected name or body after `{}`", kind.as_str())));
        }
        self.skip_attributes()?;

        Ok(TypeSpecifier::Tagged {
            kind,
            name,
            has_body,
        })
    }

    fn declarator(&mut self, abstract_ok: bool) -> PResult<Declarator> {
        let mut pointers = Vec::new();
        while self.eat(Token::Star) {
            let mut quals = Vec::new();
            loop {
                let word = match self.peek() {
                    Some(tok) if tok.token == Token::Ident => tok.text.clone(),
                    _ => break,
                };
                if let Some(q) = qualifier(&word) {
                    quals.push(q);
                    self.pos += 1;
                } else if ATTRIBUTE_KEYWORDS.contains(&word.as_str()) {
                    self.pos += 1;
                    self.skip_balanced(Token::LParen)?;
                } else {
                    break;
                }
            }
            pointers.push(quals);
        }

        let direct = match self.peek().map(|t| (t.token, t.text.clone())) {
            Some((Token::Ident, name)) if !is_reserved(&name) => {
                self.pos += 1;
                DirectDeclarator::Identifier(name)
            }
            Some((Token::LParen, _)) if self.paren_starts_declarator(abstract_ok) => {
                self.pos += 1;
                self.skip_attributes()?;
                let inner = self.declarator(abstract_ok)?;
                self.expect(Token::RParen)?;
                DirectDeclarator::Nested(Box::new(inner))
            }
            _ if abstract_ok => DirectDeclarator::Abstract,
            _ => return Err(self.error("expected identifier in declarator")),
        };

        let mut suffixes = Vec::new();
        loop {
            match self.peek().map(|t| t.token) {
                Some(Token::LBracket) => {
                    self.skip_balanced(Token::LBracket)?;
                    suffixes.push(DeclaratorSuffix::Array);
                }
                Some(Token::LParen) => {
                    suffixes.push(DeclaratorSuffix::Function(self.parameter_list()?));
                }
                _ => break,
            }
        }

        Ok(Declarator {
            pointers,
            direct,
            suffixes,
        })
    }

    /// Decide whether `(` opens a nested declarator rather than a parameter list.
    fn paren_starts_declarator(&self, abstract_ok: bool) -> bool {
        match self.peek_at(1) {
            Some(tok) => match tok.token {
                Token::Star | Token::LParen | Token::LBracket => true,
                Token::Ident if ATTRIBUTE_KEYWORDS.contains(&tok.text.as_str()) => true,
                // In a parameter, `(name)` is a parameter list of one typedef.
                Token::Ident => !abstract_ok && !is_reserved(&tok.text),
                _ => false,
            },
            None => false,
        }
    }

    fn parameter_list(&mut self) -> PResult<FunctionDeclarator> {
        self.expect(Token::LParen)?;
        let mut func = FunctionDeclarator::default();

        if self.eat(Token::RParen) {
            return Ok(func);
        }

        loop {
            if self.eat(Token::Ellipsis) {
                func.variadic = true;
                self.expect(Token::RParen)?;
                break;
            }

            let specifiers = self.declaration_specifiers()?;
            if specifiers.is_empty() {
                return Err(self.error("expected parameter type"));
            }

            let declarator = match self.peek().map(|t| t.token) {
                Some(Token::Comma) | Some(Token::RParen) => None,
                _ => Some(self.declarator(true)?),
            };
            self.skip_attributes()?;

            func.parameters.push(ParameterDeclaration {
                specifiers,
                declarator,
            });

            if self.eat(Token::Comma) {
                continue;
            }
            self.expect(Token::RParen)?;
            break;
        }

        Ok(func)
    }

    /// Skip attributes, `asm` labels and empty macro identifiers between a
    /// declarator and the `;`, `,`, `=` or `{` that follows it.
    fn skip_trailing_attributes(&mut self) -> PResult<()> {
        while let Some(tok) = self.peek() {
            if tok.token != Token::Ident {
                break;
            }
            self.pos += 1;
            if self.check(Token::LParen) {
                self.skip_balanced(Token::LParen)?;
            }
        }
        Ok(())
    }

    fn skip_attributes(&mut self) -> PResult<()> {
        while let Some(tok) = self.peek() {
            if tok.token != Token::Ident || !ATTRIBUTE_KEYWORDS.contains(&tok.text.as_str()) {
                break;
            }
            self.pos += 1;
            self.skip_balanced(Token::LParen)?;
        }
        Ok(())
    }

    /// Skip an initializer up to the `,` or `;` that ends it.
    fn skip_initializer(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match tok.token {
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                Token::Comma | Token::Semicolon if depth == 0 => return,
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Skip a balanced group starting at the current `open` token.
    fn skip_balanced(&mut self, open: Token) -> PResult<()> {
        self.expect(open)?;
        let mut depth = 1usize;
        while let Some(tok) = self.advance() {
            match tok.token {
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(self.error("unterminated group"))
    }

    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&SpannedToken> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, token: Token) -> bool {
        self.peek().is_some_and(|t| t.token == token)
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> PResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            let found = self
                .peek()
                .map(|t| format!("`{}`", t.text))
                .unwrap_or_else(|| "end of input".to_string());
            Err(self.error(format!("expected {token:?}, found {found}")))
        }
    }

    fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.line)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line: self.line(),
            message: message.into(),
        }
    }
}

fn qualifier(word: &str) -> Option<TypeQualifier> {
    match word {
        "const" | "__const" | "__const__" => Some(TypeQualifier::Const),
        "volatile" | "__volatile" | "__volatile__" => Some(TypeQualifier::Volatile),
        "restrict" | "__restrict" | "__restrict__" => Some(TypeQualifier::Restrict),
        "_Atomic" => Some(TypeQualifier::Atomic),
        _ => None,
    }
}

fn storage_class(word: &str) -> Option<StorageClass> {
    match word {
        "typedef" => Some(StorageClass::Typedef),
        "extern" => Some(StorageClass::Extern),
        "static" => Some(StorageClass::Static),
        "auto" => Some(StorageClass::Auto),
        "register" => Some(StorageClass::Register),
        "_Thread_local" | "__thread" => Some(StorageClass::ThreadLocal),
        _ => None,
    }
}

/// Keywords that can never be a declarator name.
fn is_reserved(word: &str) -> bool {
    qualifier(word).is_some()
        || storage_class(word).is_some()
        || TYPE_KEYWORDS.contains(&word)
        || ATTRIBUTE_KEYWORDS.contains(&word)
        || matches!(word, "struct" | "union" | "enum")
}
