//! Front-end errors, rendered with source spans.

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// What went wrong while reading a build file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("unexpected character `{0}`")]
    UnexpectedCharacter(char),

    #[error("unterminated string")]
    UnterminatedString,

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("invalid value for `{key}`: {message}")]
    InvalidValue { key: String, message: String },

    #[error("project `{0}` is declared more than once")]
    DuplicateProject(String),

    #[error("project `{0}` is declared inside another project")]
    NestedProject(String),

    #[error("`on: {0}` block must be inside a project")]
    HookOutsideProject(String),

    #[error("unknown hook `{0}`; expected `prebuild` or `postbuild`")]
    UnknownHook(String),

    #[error("unknown block type `{0}`")]
    UnknownBlock(String),
}

impl ErrorKind {
    fn help(&self) -> Option<String> {
        match self {
            ErrorKind::UnterminatedString => Some("add the closing `\"`".into()),
            ErrorKind::UnknownBlock(_) => Some(
                "blocks are `project`, `conf`, `platform`, `task` and `on`".into(),
            ),
            ErrorKind::DuplicateProject(_) => Some("rename one of the projects".into()),
            ErrorKind::NestedProject(_) => {
                Some("close the enclosing project block first".into())
            }
            _ => None,
        }
    }
}

/// A syntax or semantic error in a build file.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("{kind}")]
#[diagnostic(code(ymake::parse))]
pub struct FrontendError {
    pub kind: ErrorKind,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: SourceSpan,
    /// 1-based line of the error
    pub line: usize,
    /// 1-based column of the error
    pub col: usize,
    #[help]
    pub help: Option<String>,
}

impl FrontendError {
    pub fn new(
        kind: ErrorKind,
        name: &str,
        source: &str,
        span: SourceSpan,
        line: usize,
        col: usize,
    ) -> Self {
        let help = kind.help();
        FrontendError {
            kind,
            src: NamedSource::new(name, source.to_string()),
            span,
            line,
            col,
            help,
        }
    }
}
