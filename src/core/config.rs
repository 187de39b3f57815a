//! Compiler configuration layers.
//!
//! A `Config` is either a complete configuration or a partial layer that is
//! merged on top of one. Scalars in a later layer override earlier ones when
//! they are set; lists are concatenated in layer order, duplicates included.

use serde::Serialize;

use crate::core::project::Language;

/// A (possibly partial) compiler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Compiler command, e.g. `clang++` or `cl.exe`. Empty means "not set".
    pub compiler: String,

    /// C language standard (e.g. `c11`)
    pub c_std: Option<String>,

    /// C++ language standard (e.g. `c++20`)
    pub cpp_std: Option<String>,

    /// Optimization level without the flag prefix (e.g. `2`, `s`)
    pub optimize: Option<String>,

    /// Preprocessor defines (`NAME` or `NAME=VALUE`)
    pub defines: Vec<String>,

    /// Raw compiler flags, passed through verbatim
    pub flags: Vec<String>,

    /// Include directories
    pub includes: Vec<String>,

    /// Libraries to link, without prefix or extension
    pub links: Vec<String>,

    /// Library search directories (link step only)
    pub lib_dirs: Vec<String>,
}

impl Config {
    /// Overlay `other` onto this configuration.
    pub fn merge(&mut self, other: &Config) {
        if !other.compiler.is_empty() {
            self.compiler = other.compiler.clone();
        }
        if other.c_std.is_some() {
            self.c_std = other.c_std.clone();
        }
        if other.cpp_std.is_some() {
            self.cpp_std = other.cpp_std.clone();
        }
        if other.optimize.is_some() {
            self.optimize = other.optimize.clone();
        }

        self.defines.extend(other.defines.iter().cloned());
        self.flags.extend(other.flags.iter().cloned());
        self.includes.extend(other.includes.iter().cloned());
        self.links.extend(other.links.iter().cloned());
        self.lib_dirs.extend(other.lib_dirs.iter().cloned());
    }

    /// Consuming variant of [`Config::merge`].
    pub fn merged(mut self, other: &Config) -> Self {
        self.merge(other);
        self
    }

    /// The compiler to invoke for a project of the given language.
    ///
    /// Falls back to the conventional `cc` / `c++` drivers when no compiler
    /// was configured in any layer.
    pub fn compiler_for(&self, language: Language) -> &str {
        if !self.compiler.is_empty() {
            return &self.compiler;
        }
        match language {
            Language::C => "cc",
            Language::Cxx => "c++",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(compiler: &str, opt: Option<&str>, defines: &[&str]) -> Config {
        Config {
            compiler: compiler.to_string(),
            optimize: opt.map(str::to_string),
            defines: defines.iter().map(|d| d.to_string()).collect(),
            ..Config::default()
        }
    }

    #[test]
    fn test_merge_scalars_last_present_wins() {
        let a = layer("gcc", Some("0"), &[]);
        let b = layer("", Some("2"), &[]);
        let c = layer("clang", None, &[]);

        let merged = a.merged(&b).merged(&c);

        assert_eq!(merged.compiler, "clang");
        // absent in C, present in B
        assert_eq!(merged.optimize.as_deref(), Some("2"));
        assert_eq!(merged.c_std, None);
    }

    #[test]
    fn test_merge_lists_concatenate_with_duplicates() {
        let a = layer("", None, &["A", "SHARED"]);
        let b = layer("", None, &["B"]);
        let c = layer("", None, &["SHARED", "C"]);

        let merged = a.merged(&b).merged(&c);

        assert_eq!(merged.defines, vec!["A", "SHARED", "B", "SHARED", "C"]);
    }

    #[test]
    fn test_merge_is_associative() {
        let a = Config {
            compiler: "gcc".into(),
            flags: vec!["-Wall".into()],
            ..Config::default()
        };
        let b = Config {
            cpp_std: Some("c++17".into()),
            flags: vec!["-g".into()],
            ..Config::default()
        };
        let c = Config {
            cpp_std: Some("c++20".into()),
            includes: vec!["include".into()],
            ..Config::default()
        };

        let left = a.clone().merged(&b).merged(&c);
        let right = a.merged(&b.merged(&c));

        assert_eq!(left, right);
    }

    #[test]
    fn test_compiler_fallback() {
        let cfg = Config::default();
        assert_eq!(cfg.compiler_for(Language::C), "cc");
        assert_eq!(cfg.compiler_for(Language::Cxx), "c++");

        let cfg = layer("clang++", None, &[]);
        assert_eq!(cfg.compiler_for(Language::C), "clang++");
    }
}
