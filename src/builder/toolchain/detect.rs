//! Compiler vendor detection.

use std::fmt;

use serde::Serialize;

/// The compiler family a compiler command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// Unrecognized compiler; treated as GCC-compatible
    #[default]
    Unknown,
    /// Clang/LLVM
    Clang,
    /// GCC (GNU Compiler Collection)
    Gcc,
    /// Microsoft Visual C++
    Msvc,
}

impl Vendor {
    /// Classify a compiler command by name.
    ///
    /// Matching is a case-insensitive substring test, checked in priority
    /// order: `clang`, then `g++`/`gcc`, then `cl`/`msvc`. `clang-cl` is
    /// therefore reported as Clang.
    pub fn detect(compiler: &str) -> Vendor {
        let lower = compiler.to_ascii_lowercase();

        if lower.contains("clang") {
            Vendor::Clang
        } else if lower.contains("g++") || lower.contains("gcc") {
            Vendor::Gcc
        } else if lower.contains("cl") || lower.contains("msvc") {
            Vendor::Msvc
        } else {
            Vendor::Unknown
        }
    }

    /// Get the vendor name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Unknown => "unknown",
            Vendor::Clang => "clang",
            Vendor::Gcc => "gcc",
            Vendor::Msvc => "msvc",
        }
    }

    /// Whether the vendor uses MSVC-style `/flag` syntax.
    pub fn is_msvc(&self) -> bool {
        matches!(self, Vendor::Msvc)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
