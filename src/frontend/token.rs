//! Tokens of the build file language.

use std::fmt;

use miette::SourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word: `project`, `debug`, `c++20`, `-Wall`
    Ident,
    /// Double-quoted string, quotes stripped
    Str,
    /// Unsigned integer
    Number,
    Colon,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Eof,
}

/// A token with its text and position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub col: usize,
    /// Byte offset of the first character
    pub offset: usize,
    /// Length in bytes, including quotes for strings
    pub len: usize,
}

impl Token {
    pub fn span(&self) -> SourceSpan {
        (self.offset, self.len).into()
    }

    /// Whether the token can be used as a property value.
    pub fn is_value(&self) -> bool {
        matches!(self.kind, TokenKind::Ident | TokenKind::Str | TokenKind::Number)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident => write!(f, "`{}`", self.text),
            TokenKind::Str => write!(f, "string \"{}\"", self.text),
            TokenKind::Number => write!(f, "number {}", self.text),
            TokenKind::Colon => f.write_str("`:`"),
            TokenKind::LBrace => f.write_str("`{`"),
            TokenKind::RBrace => f.write_str("`}`"),
            TokenKind::LBracket => f.write_str("`[`"),
            TokenKind::RBracket => f.write_str("`]`"),
            TokenKind::Comma => f.write_str("`,`"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}
