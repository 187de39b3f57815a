//! Command synthesis for C/C++ compilers.
//!
//! Given a project, its effective configuration and a compiler vendor, this
//! module produces the exact preprocess, compile and link invocations. It is
//! a pure function set: no state, no I/O, no errors. Vendor differences are
//! confined to [`FlagSyntax`]; the order in which flags are assembled lives
//! here so it is identical for every vendor.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::{ArtifactKind, Config, Project};

mod detect;
mod gcc;
mod msvc;

pub use detect::Vendor;
pub use gcc::GccSyntax;
pub use msvc::MsvcSyntax;

/// A command to execute: a program and its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileCommand {
    /// The program to run (e.g., "gcc", "cl.exe")
    pub program: String,
    /// Command arguments
    pub args: Vec<String>,
}

impl CompileCommand {
    /// Create a new command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        CompileCommand {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }
}

impl fmt::Display for CompileCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Inputs of a link or archive step.
#[derive(Debug, Clone, Copy)]
pub struct LinkInput<'a> {
    /// Produce a shared library instead of an executable
    pub shared: bool,
    /// Object files, in link order
    pub objects: &'a [PathBuf],
    /// Library search directories
    pub lib_dirs: &'a [String],
    /// Libraries to link, without prefix or extension
    pub libs: &'a [String],
    /// Output artifact
    pub output: &'a Path,
}

/// How a compiler family spells each flag.
pub trait FlagSyntax: Send + Sync {
    /// Flag that stops after preprocessing.
    fn preprocess_only(&self) -> &'static str;

    /// Flag that stops after compiling to an object.
    fn compile_only(&self) -> &'static str;

    /// Language standard flag.
    fn std_flag(&self, std: &str) -> String;

    /// Include directory flag.
    fn include_flag(&self, dir: &str) -> String;

    /// Preprocessor define flag.
    fn define_flag(&self, define: &str) -> String;

    /// Optimization level flag.
    fn optimize_flag(&self, level: &str) -> String;

    /// Position-independent code flag for shared library objects.
    fn pic_flag(&self) -> Option<&'static str>;

    /// Arguments naming the preprocessor output file.
    fn preprocess_output(&self, output: &Path) -> Vec<String>;

    /// Arguments naming the object output file.
    fn object_output(&self, output: &Path) -> Vec<String>;

    /// Arguments of a link driven by the compiler.
    fn link_args(&self, input: &LinkInput<'_>) -> Vec<String>;

    /// Command creating a static library.
    fn archive_command(&self, compiler: &str, input: &LinkInput<'_>) -> CompileCommand;

    /// Object file extension.
    fn object_extension(&self) -> &'static str;

    /// Executable extension; empty for none.
    fn exe_extension(&self) -> &'static str;

    /// Shared library extension.
    fn shared_lib_extension(&self) -> &'static str;

    /// Static library extension.
    fn static_lib_extension(&self) -> &'static str;
}

/// The flag syntax for a vendor. Unknown vendors get GCC syntax.
pub fn syntax_for(vendor: Vendor) -> &'static dyn FlagSyntax {
    match vendor {
        Vendor::Msvc => &MsvcSyntax,
        Vendor::Clang | Vendor::Gcc | Vendor::Unknown => &GccSyntax,
    }
}

/// The compiler a project uses, together with its detected vendor.
pub fn compiler_for<'a>(project: &Project, config: &'a Config) -> (&'a str, Vendor) {
    let compiler = config.compiler_for(project.language);
    (compiler, Vendor::detect(compiler))
}

/// Language standard for one source file: `.c` files get the C standard,
/// everything else gets the C++ standard. `.C` is C++.
fn std_for_source<'a>(config: &'a Config, source: &Path) -> Option<&'a str> {
    let is_c = source.extension().is_some_and(|ext| ext == "c");
    if is_c {
        config.c_std.as_deref()
    } else {
        config.cpp_std.as_deref()
    }
}

/// Flags shared by preprocess and compile commands, in their fixed order:
/// standard, includes, defines, raw flags, optimization.
fn common_flags(syntax: &dyn FlagSyntax, config: &Config, source: &Path) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(std) = std_for_source(config, source) {
        args.push(syntax.std_flag(std));
    }

    for dir in &config.includes {
        args.push(syntax.include_flag(dir));
    }

    for define in &config.defines {
        args.push(syntax.define_flag(define));
    }

    args.extend(config.flags.iter().cloned());

    if let Some(ref level) = config.optimize {
        args.push(syntax.optimize_flag(level));
    }

    args
}

/// Command that preprocesses `source` into `output`.
pub fn preprocess_command(
    project: &Project,
    config: &Config,
    source: &Path,
    output: &Path,
) -> CompileCommand {
    let (compiler, vendor) = compiler_for(project, config);
    let syntax = syntax_for(vendor);

    CompileCommand::new(compiler)
        .arg(syntax.preprocess_only())
        .args(common_flags(syntax, config, source))
        .arg(source.display().to_string())
        .args(syntax.preprocess_output(output))
}

/// Command that compiles `source` into the object `output`.
pub fn compile_command(
    project: &Project,
    config: &Config,
    source: &Path,
    output: &Path,
) -> CompileCommand {
    let (compiler, vendor) = compiler_for(project, config);
    let syntax = syntax_for(vendor);

    let mut cmd = CompileCommand::new(compiler)
        .arg(syntax.compile_only())
        .args(common_flags(syntax, config, source));

    if project.kind == ArtifactKind::SharedLib {
        if let Some(pic) = syntax.pic_flag() {
            cmd = cmd.arg(pic);
        }
    }

    cmd.arg(source.display().to_string())
        .args(syntax.object_output(output))
}

/// Command that links (or archives) `objects` into `output`.
pub fn link_command(
    project: &Project,
    config: &Config,
    objects: &[PathBuf],
    output: &Path,
) -> CompileCommand {
    let (compiler, vendor) = compiler_for(project, config);
    let syntax = syntax_for(vendor);

    let input = LinkInput {
        shared: project.kind == ArtifactKind::SharedLib,
        objects,
        lib_dirs: &config.lib_dirs,
        libs: &config.links,
        output,
    };

    match project.kind {
        ArtifactKind::StaticLib => syntax.archive_command(compiler, &input),
        ArtifactKind::Exe | ArtifactKind::SharedLib => {
            CompileCommand::new(compiler).args(syntax.link_args(&input))
        }
    }
}

/// Object file extension for a vendor.
pub fn object_extension(vendor: Vendor) -> &'static str {
    syntax_for(vendor).object_extension()
}

/// Artifact extension for a project kind and vendor; empty for none.
pub fn artifact_extension(kind: ArtifactKind, vendor: Vendor) -> &'static str {
    let syntax = syntax_for(vendor);
    match kind {
        ArtifactKind::Exe => syntax.exe_extension(),
        ArtifactKind::SharedLib => syntax.shared_lib_extension(),
        ArtifactKind::StaticLib => syntax.static_lib_extension(),
    }
}

/// Path of a project's linked artifact: `<dist>/<name>[.<ext>]`.
pub fn artifact_path(dist: &Path, project: &Project, vendor: Vendor) -> PathBuf {
    let ext = artifact_extension(project.kind, vendor);
    if ext.is_empty() {
        dist.join(&project.name)
    } else {
        dist.join(format!("{}.{}", project.name, ext))
    }
}
