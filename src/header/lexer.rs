//! Tokenizer for C headers.

use logos::Logos;

use super::ParseError;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f\x0b]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,
    #[regex(r"[0-9][0-9A-Za-z_.]*")]
    Number,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,
    #[regex(r"'([^'\\\n]|\\.)*'")]
    CharLit,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("*")]
    Star,
    #[token("=")]
    Assign,
    #[token("...")]
    Ellipsis,

    /// Operators and stray punctuation, only meaningful inside skipped
    /// expressions.
    #[regex(r"[-+/%&|^!~<>?:.#@\\]")]
    Punct,
}

/// A token with its source text and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl SpannedToken {
    /// Whether this is the identifier `word`.
    pub fn is_ident(&self, word: &str) -> bool {
        self.token == Token::Ident && self.text == word
    }
}

/// Tokenize a (preprocessed) header.
pub fn tokenize(input: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(input.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    let position = |offset: usize| {
        let line = line_starts.partition_point(|&start| start <= offset);
        (line, offset - line_starts[line - 1] + 1)
    };

    let mut lex = Token::lexer(input);
    let mut out = Vec::new();

    while let Some(res) = lex.next() {
        let span = lex.span();
        let (line, column) = position(span.start);
        match res {
            Ok(token) => out.push(SpannedToken {
                token,
                text: lex.slice().to_string(),
                line,
                column,
            }),
            Err(()) => {
                return Err(ParseError::UnexpectedCharacter {
                    line,
                    column,
                    text: lex.slice().to_string(),
                })
            }
        }
    }

    Ok(out)
}
