//! Recursive-descent parser producing a [`Workspace`].
//!
//! Grammar:
//!
//! ```text
//! file      := statement*
//! statement := IDENT ':' (IDENT '{' statement* '}' | value | list)
//! value     := IDENT | STRING | NUMBER
//! list      := '[' (value (',' value)* ','?)? ']'
//! ```
//!
//! `project`, `conf`, `platform`, `task` and `on` introduce blocks; every
//! other key is a property of the innermost enclosing scope.

use std::path::PathBuf;

use crate::core::{ArtifactKind, Config, Language, Project, Task, Workspace};
use crate::frontend::error::{ErrorKind, FrontendError};
use crate::frontend::token::{Token, TokenKind};
use crate::util::Diagnostic;

/// Configuration layer that properties currently write to.
#[derive(Debug, Clone)]
enum Scope {
    Workspace,
    WorkspaceNamed(String),
    Project(usize),
    ProjectNamed(usize, String),
}

impl Scope {
    fn project(&self) -> Option<usize> {
        match self {
            Scope::Project(idx) | Scope::ProjectNamed(idx, _) => Some(*idx),
            _ => None,
        }
    }
}

enum Hook {
    PreBuild,
    PostBuild,
}

pub struct Parser<'s> {
    name: &'s str,
    src: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    ws: Workspace,
    scope: Scope,
    warnings: Vec<Diagnostic>,
}

impl<'s> Parser<'s> {
    pub fn new(name: &'s str, src: &'s str, mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                line: 0,
                col: 0,
                offset: src.len(),
                len: 0,
            });
        }
        Parser {
            name,
            src,
            tokens,
            pos: 0,
            ws: Workspace::default(),
            scope: Scope::Workspace,
            warnings: Vec::new(),
        }
    }

    /// Warnings collected so far (ignored keys).
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Parse all statements. The root of the returned workspace is `root`.
    pub fn parse(&mut self, root: impl Into<PathBuf>) -> Result<Workspace, FrontendError> {
        while !self.at(TokenKind::Eof) {
            self.statement()?;
        }
        let mut ws = std::mem::take(&mut self.ws);
        ws.root = root.into();
        Ok(ws)
    }

    // ---- token helpers ----

    fn peek(&self) -> &Token {
        // the stream always ends with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, FrontendError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> FrontendError {
        let found = self.peek().to_string();
        self.error_at(
            self.peek(),
            ErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found,
            },
        )
    }

    fn error_at(&self, token: &Token, kind: ErrorKind) -> FrontendError {
        let len = token.len.max(1).min(self.src.len().saturating_sub(token.offset));
        FrontendError::new(
            kind,
            self.name,
            self.src,
            (token.offset, len).into(),
            token.line,
            token.col,
        )
    }

    fn warn(&mut self, token: &Token, message: String) {
        let diagnostic = Diagnostic::warning(message)
            .with_location(format!("{}:{}:{}", self.name, token.line, token.col));
        diagnostic.emit();
        self.warnings.push(diagnostic);
    }

    // ---- values ----

    fn value(&mut self) -> Result<String, FrontendError> {
        if self.peek().is_value() {
            Ok(self.advance().text)
        } else {
            Err(self.unexpected("a value"))
        }
    }

    /// A `[...]` list. A single bare value is accepted as a one-element list.
    fn list(&mut self) -> Result<Vec<String>, FrontendError> {
        if !self.eat(TokenKind::LBracket) {
            return Ok(vec![self.value()?]);
        }

        let mut items = Vec::new();
        while !self.eat(TokenKind::RBracket) {
            items.push(self.value()?);
            if !self.eat(TokenKind::Comma) {
                self.expect(TokenKind::RBracket, "`,` or `]`")?;
                break;
            }
        }
        Ok(items)
    }

    fn skip_value(&mut self) -> Result<(), FrontendError> {
        if self.at(TokenKind::LBracket) {
            self.list()?;
        } else {
            self.value()?;
        }
        Ok(())
    }

    // ---- statements ----

    fn statement(&mut self) -> Result<(), FrontendError> {
        let key = self.expect(TokenKind::Ident, "a key")?;
        self.expect(TokenKind::Colon, "`:` after key")?;

        let is_block = self.at(TokenKind::Ident)
            && self
                .peek_at(1)
                .is_some_and(|t| t.kind == TokenKind::LBrace);

        if is_block {
            let name = self.advance();
            self.advance();
            self.block(&key, &name)
        } else {
            self.property(&key)
        }
    }

    fn block(&mut self, key: &Token, name: &Token) -> Result<(), FrontendError> {
        match key.text.as_str() {
            "project" => self.project_block(name),
            "conf" | "platform" => self.config_block(name),
            "task" => self.task_block(name),
            "on" => self.hook_block(name),
            other => Err(self.error_at(key, ErrorKind::UnknownBlock(other.to_string()))),
        }
    }

    fn body(&mut self) -> Result<(), FrontendError> {
        while !self.eat(TokenKind::RBrace) {
            if self.at(TokenKind::Eof) {
                return Err(self.unexpected("`}`"));
            }
            self.statement()?;
        }
        Ok(())
    }

    fn project_block(&mut self, name: &Token) -> Result<(), FrontendError> {
        if self.scope.project().is_some() {
            return Err(self.error_at(name, ErrorKind::NestedProject(name.text.clone())));
        }
        if self.ws.project(&name.text).is_some() {
            return Err(self.error_at(name, ErrorKind::DuplicateProject(name.text.clone())));
        }

        self.ws
            .projects
            .push(Project::new(name.text.clone(), ArtifactKind::default()));
        let saved = std::mem::replace(&mut self.scope, Scope::Project(self.ws.projects.len() - 1));
        let result = self.body();
        self.scope = saved;
        result
    }

    fn config_block(&mut self, name: &Token) -> Result<(), FrontendError> {
        let scope = match self.scope.project() {
            Some(idx) => Scope::ProjectNamed(idx, name.text.clone()),
            None => Scope::WorkspaceNamed(name.text.clone()),
        };
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = self.body();
        self.scope = saved;
        result
    }

    fn task_block(&mut self, name: &Token) -> Result<(), FrontendError> {
        let mut task = Task::new(name.text.clone());

        while !self.eat(TokenKind::RBrace) {
            let key = self.expect(TokenKind::Ident, "a task property or `}`")?;
            self.expect(TokenKind::Colon, "`:` after key")?;
            match key.text.as_str() {
                "deps" => task.deps = self.list()?,
                "exec" => task.commands.extend(self.list()?),
                other => {
                    self.warn(&key, format!("ignored task key `{}`", other));
                    self.skip_value()?;
                }
            }
        }

        self.ws.tasks.push(task);
        Ok(())
    }

    fn hook_block(&mut self, name: &Token) -> Result<(), FrontendError> {
        let Some(idx) = self.scope.project() else {
            return Err(self.error_at(name, ErrorKind::HookOutsideProject(name.text.clone())));
        };
        let hook = match name.text.as_str() {
            "prebuild" => Hook::PreBuild,
            "postbuild" => Hook::PostBuild,
            other => return Err(self.error_at(name, ErrorKind::UnknownHook(other.to_string()))),
        };

        while !self.eat(TokenKind::RBrace) {
            let key = self.expect(TokenKind::Ident, "`exec` or `}`")?;
            self.expect(TokenKind::Colon, "`:` after key")?;
            if key.text == "exec" {
                let commands = self.list()?;
                let project = &mut self.ws.projects[idx];
                match hook {
                    Hook::PreBuild => project.pre_build.extend(commands),
                    Hook::PostBuild => project.post_build.extend(commands),
                }
            } else {
                self.warn(&key, format!("ignored hook key `{}`", key.text));
                self.skip_value()?;
            }
        }
        Ok(())
    }

    fn config_mut(&mut self) -> &mut Config {
        match &self.scope {
            Scope::Workspace => &mut self.ws.base_config,
            Scope::WorkspaceNamed(name) => self.ws.configs.entry(name.clone()).or_default(),
            Scope::Project(idx) => &mut self.ws.projects[*idx].base_config,
            Scope::ProjectNamed(idx, name) => self.ws.projects[*idx]
                .configs
                .entry(name.clone())
                .or_default(),
        }
    }

    fn property(&mut self, key: &Token) -> Result<(), FrontendError> {
        match key.text.as_str() {
            "workspace" => self.ws.name = self.value()?,
            "dist" => self.ws.dist_dir = PathBuf::from(self.value()?),
            "obj" => self.ws.obj_dir = PathBuf::from(self.value()?),
            "compiler" => {
                let value = self.value()?;
                self.config_mut().compiler = value;
            }
            "c_std" => {
                let value = self.value()?;
                self.config_mut().c_std = Some(value);
            }
            "cpp_std" => {
                let value = self.value()?;
                self.config_mut().cpp_std = Some(value);
            }
            "std" => {
                let value = self.value()?;
                let config = self.config_mut();
                if value.to_ascii_lowercase().contains("c++") {
                    config.cpp_std = Some(value);
                } else {
                    config.c_std = Some(value);
                }
            }
            "optimize" => {
                let value = self.value()?;
                self.config_mut().optimize = Some(value);
            }
            "defines" => {
                let values = self.list()?;
                self.config_mut().defines = values;
            }
            "flags" => {
                let values = self.list()?;
                self.config_mut().flags = values;
            }
            "inc" => {
                let values = self.list()?;
                self.config_mut().includes = values;
            }
            "links" => {
                let values = self.list()?;
                self.config_mut().links = values;
            }
            "kind" | "language" | "src" | "use" if self.scope.project().is_some() => {
                self.project_property(key)?;
            }
            other => {
                self.warn(key, format!("unknown property `{}`", other));
                self.skip_value()?;
            }
        }
        Ok(())
    }

    fn project_property(&mut self, key: &Token) -> Result<(), FrontendError> {
        let Some(idx) = self.scope.project() else {
            return Ok(());
        };

        match key.text.as_str() {
            "kind" | "language" => {
                let token = self.peek().clone();
                let value = self.value()?;
                let project = &mut self.ws.projects[idx];
                let parsed = if key.text == "kind" {
                    value.parse::<ArtifactKind>().map(|k| project.kind = k)
                } else {
                    value.parse::<Language>().map(|l| project.language = l)
                };
                if let Err(message) = parsed {
                    return Err(self.error_at(
                        &token,
                        ErrorKind::InvalidValue {
                            key: key.text.clone(),
                            message,
                        },
                    ));
                }
            }
            "src" => self.ws.projects[idx].sources = self.list()?,
            "use" => self.ws.projects[idx].deps = self.list()?,
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::test_support::TWO_PROJECT_BUILD_FILE;

    fn parse(src: &str) -> Result<Workspace, FrontendError> {
        let tokens = Lexer::new("build.ymk", src).tokenize()?;
        Parser::new("build.ymk", src, tokens).parse("/ws")
    }

    fn parse_err(src: &str) -> ErrorKind {
        parse(src).unwrap_err().kind
    }

    #[test]
    fn test_two_project_file() {
        let ws = parse(TWO_PROJECT_BUILD_FILE).unwrap();

        assert_eq!(ws.name, "demo");
        assert_eq!(ws.root, PathBuf::from("/ws"));
        assert_eq!(ws.dist_dir, PathBuf::from("out/bin"));
        assert_eq!(ws.obj_dir, PathBuf::from("out/obj"));

        let debug = &ws.configs["debug"];
        assert_eq!(debug.defines, vec!["DEBUG"]);
        assert_eq!(debug.optimize.as_deref(), Some("0"));

        let net = ws.project("net").unwrap();
        assert_eq!(net.kind, ArtifactKind::SharedLib);
        assert_eq!(net.language, Language::Cxx);
        assert_eq!(net.base_config.cpp_std.as_deref(), Some("c++20"));
        assert_eq!(net.sources, vec!["net/*.cpp"]);
        assert_eq!(net.base_config.includes, vec!["net/include"]);
        assert_eq!(net.configs["release"].optimize.as_deref(), Some("3"));

        let app = ws.project("app").unwrap();
        assert_eq!(app.kind, ArtifactKind::Exe);
        assert_eq!(app.deps, vec!["net"]);
        assert_eq!(app.post_build, vec!["echo done"]);
        assert!(app.pre_build.is_empty());

        let package = ws.task("package").unwrap();
        assert_eq!(package.deps, vec!["app"]);
        assert_eq!(package.commands, vec!["echo packaging", "echo finished"]);
    }

    #[test]
    fn test_std_routes_by_value() {
        let ws = parse("std: c11\nstd: c++17\nproject: p { std: C++20 }").unwrap();
        assert_eq!(ws.base_config.c_std.as_deref(), Some("c11"));
        assert_eq!(ws.base_config.cpp_std.as_deref(), Some("c++17"));
        let p = ws.project("p").unwrap();
        assert_eq!(p.base_config.cpp_std.as_deref(), Some("C++20"));
        assert_eq!(p.base_config.c_std, None);
    }

    #[test]
    fn test_compiler_sets_active_layer_only() {
        let ws = parse(
            "compiler: gcc\nconf: release { compiler: clang }\nproject: p { compiler: \"cl.exe\" }",
        )
        .unwrap();
        assert_eq!(ws.base_config.compiler, "gcc");
        assert_eq!(ws.configs["release"].compiler, "clang");
        assert_eq!(ws.project("p").unwrap().base_config.compiler, "cl.exe");
    }

    #[test]
    fn test_platform_block_is_named_config() {
        let ws = parse("project: p { platform: linux { links: [m, pthread] } }").unwrap();
        let p = ws.project("p").unwrap();
        assert_eq!(p.configs["linux"].links, vec!["m", "pthread"]);
        assert!(ws.configs.is_empty());
    }

    #[test]
    fn test_lists_assign_and_accept_trailing_comma() {
        let ws = parse("defines: [A, B]\ndefines: [C,]\nflags: []").unwrap();
        assert_eq!(ws.base_config.defines, vec!["C"]);
        assert!(ws.base_config.flags.is_empty());
    }

    #[test]
    fn test_exec_appends() {
        let ws = parse(
            r#"
            task: t { exec: "one" exec: ["two", "three"] }
            project: p {
                on: prebuild { exec: "gen" exec: "gen2" }
            }
            "#,
        )
        .unwrap();
        assert_eq!(ws.task("t").unwrap().commands, vec!["one", "two", "three"]);
        assert_eq!(ws.project("p").unwrap().pre_build, vec!["gen", "gen2"]);
    }

    #[test]
    fn test_unknown_keys_warn_and_skip() {
        let src = "colour: blue\nproject: p { sizes: [1, 2] kind: static }\nkind: exe";
        let tokens = Lexer::new("build.ymk", src).tokenize().unwrap();
        let mut parser = Parser::new("build.ymk", src, tokens);
        let ws = parser.parse("/ws").unwrap();

        assert_eq!(ws.project("p").unwrap().kind, ArtifactKind::StaticLib);
        let messages: Vec<_> = parser.warnings().iter().map(|d| d.message.clone()).collect();
        assert_eq!(
            messages,
            vec![
                "unknown property `colour`",
                "unknown property `sizes`",
                "unknown property `kind`"
            ]
        );
    }

    #[test]
    fn test_unknown_kind_is_error() {
        let err = parse("project: p {\n  kind: dylib\n}").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidValue { ref key, .. } if key == "kind"));
        assert_eq!((err.line, err.col), (2, 9));
    }

    #[test]
    fn test_duplicate_project_is_error() {
        assert_eq!(
            parse_err("project: a {}\nproject: a {}"),
            ErrorKind::DuplicateProject("a".into())
        );
    }

    #[test]
    fn test_nested_project_is_error() {
        assert_eq!(
            parse_err("project: a { project: b {} }"),
            ErrorKind::NestedProject("b".into())
        );
    }

    #[test]
    fn test_hook_outside_project_is_error() {
        assert_eq!(
            parse_err("on: prebuild { exec: \"x\" }"),
            ErrorKind::HookOutsideProject("prebuild".into())
        );
        assert_eq!(
            parse_err("project: p { on: install { exec: \"x\" } }"),
            ErrorKind::UnknownHook("install".into())
        );
    }

    #[test]
    fn test_unknown_block_is_error() {
        assert_eq!(
            parse_err("target: x { }"),
            ErrorKind::UnknownBlock("target".into())
        );
    }

    #[test]
    fn test_unexpected_token() {
        let err = parse("workspace demo").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedToken {
                expected: "`:` after key".into(),
                found: "`demo`".into(),
            }
        );
        assert_eq!((err.line, err.col), (1, 11));

        assert!(matches!(
            parse_err("project: p { kind: exe"),
            ErrorKind::UnexpectedToken { ref found, .. } if found == "end of file"
        ));
        assert!(matches!(
            parse_err("src: [a b]"),
            ErrorKind::UnexpectedToken { ref expected, .. } if expected == "`,` or `]`"
        ));
    }
}
