//! Tokenizer for build files.

use crate::frontend::error::{ErrorKind, FrontendError};
use crate::frontend::token::{Token, TokenKind};

pub struct Lexer<'s> {
    name: &'s str,
    src: &'s str,
    bytes: &'s [u8],
    pos: usize,
    line: usize,
    col: usize,
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || matches!(c, b'_' | b'-' | b'=')
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'+' | b'-' | b'=')
}

impl<'s> Lexer<'s> {
    /// `name` is used when reporting errors, usually the file path.
    pub fn new(name: &'s str, src: &'s str) -> Self {
        Lexer {
            name,
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Tokenize the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, FrontendError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if c & 0xC0 != 0x80 {
            // count characters, not UTF-8 continuation bytes
            self.col += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.bump();
                }
                b'#' => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn error(&self, kind: ErrorKind, start: usize, line: usize, col: usize) -> FrontendError {
        let len = (self.pos - start).max(1).min(self.src.len().saturating_sub(start));
        FrontendError::new(kind, self.name, self.src, (start, len).into(), line, col)
    }

    fn next_token(&mut self) -> Result<Token, FrontendError> {
        self.skip_trivia();

        let start = self.pos;
        let (line, col) = (self.line, self.col);
        let make = |kind, text: &str, end: usize| Token {
            kind,
            text: text.to_string(),
            line,
            col,
            offset: start,
            len: end - start,
        };

        let Some(c) = self.bump() else {
            return Ok(make(TokenKind::Eof, "", start));
        };

        let kind = match c {
            b':' => TokenKind::Colon,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b'"' => {
                loop {
                    match self.peek() {
                        None => {
                            return Err(self.error(ErrorKind::UnterminatedString, start, line, col))
                        }
                        Some(b'"') => break,
                        Some(_) => {
                            self.bump();
                        }
                    }
                }
                self.bump();
                let text = &self.src[start + 1..self.pos - 1];
                return Ok(make(TokenKind::Str, text, self.pos));
            }
            c if c.is_ascii_digit() => {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
                TokenKind::Number
            }
            c if is_ident_start(c) => {
                while self.peek().is_some_and(is_ident_continue) {
                    self.bump();
                }
                TokenKind::Ident
            }
            _ => {
                let ch = self.src[start..].chars().next().unwrap_or('?');
                // consume the rest of a multi-byte character for the label
                self.pos = start + ch.len_utf8();
                return Err(self.error(ErrorKind::UnexpectedCharacter(ch), start, line, col));
            }
        };

        Ok(make(kind, &self.src[start..self.pos], self.pos))
    }
}
