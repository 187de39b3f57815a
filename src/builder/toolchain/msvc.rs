//! MSVC flag syntax.

use std::path::Path;

use super::{CompileCommand, FlagSyntax, LinkInput};

/// MSVC flag spelling (`/c`, `/I`, `/D`, `/Fo<out>`).
///
/// `cl` drives the link, so linker-only options go after `/link`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsvcSyntax;

impl MsvcSyntax {
    /// The librarian next to `cl`, or `lib` from PATH.
    fn librarian(compiler: &str) -> String {
        match Path::new(compiler).parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => dir.join("lib.exe").display().to_string(),
            None => "lib".to_string(),
        }
    }
}

impl FlagSyntax for MsvcSyntax {
    fn preprocess_only(&self) -> &'static str {
        "/P"
    }

    fn compile_only(&self) -> &'static str {
        "/c"
    }

    fn std_flag(&self, std: &str) -> String {
        format!("/std:{}", std)
    }

    fn include_flag(&self, dir: &str) -> String {
        format!("/I{}", dir)
    }

    fn define_flag(&self, define: &str) -> String {
        format!("/D{}", define)
    }

    fn optimize_flag(&self, level: &str) -> String {
        format!("/O{}", level)
    }

    fn pic_flag(&self) -> Option<&'static str> {
        None
    }

    fn preprocess_output(&self, output: &Path) -> Vec<String> {
        vec![format!("/Fi{}", output.display())]
    }

    fn object_output(&self, output: &Path) -> Vec<String> {
        vec![format!("/Fo{}", output.display())]
    }

    fn link_args(&self, input: &LinkInput<'_>) -> Vec<String> {
        let mut args: Vec<String> = input
            .objects
            .iter()
            .map(|o| o.display().to_string())
            .collect();

        for lib in input.libs {
            args.push(format!("{}.lib", lib));
        }

        args.push(format!("/Fe{}", input.output.display()));

        if input.shared || !input.lib_dirs.is_empty() {
            args.push("/link".to_string());
        }
        if input.shared {
            args.push("/DLL".to_string());
        }
        for dir in input.lib_dirs {
            args.push(format!("/LIBPATH:{}", dir));
        }

        args
    }

    fn archive_command(&self, compiler: &str, input: &LinkInput<'_>) -> CompileCommand {
        CompileCommand::new(Self::librarian(compiler))
            .arg("/nologo")
            .arg(format!("/OUT:{}", input.output.display()))
            .args(input.objects.iter().map(|o| o.display().to_string()))
    }

    fn object_extension(&self) -> &'static str {
        "obj"
    }

    fn exe_extension(&self) -> &'static str {
        "exe"
    }

    fn shared_lib_extension(&self) -> &'static str {
        "dll"
    }

    fn static_lib_extension(&self) -> &'static str {
        "lib"
    }
}
