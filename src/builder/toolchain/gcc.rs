//! GCC/Clang flag syntax.
//!
//! Also used for unrecognized compilers, which are assumed to accept
//! POSIX-style driver flags.

use std::path::Path;

use super::{CompileCommand, FlagSyntax, LinkInput};

/// GCC-compatible flag spelling (`-c`, `-I`, `-D`, `-o <out>`).
#[derive(Debug, Clone, Copy, Default)]
pub struct GccSyntax;

impl GccSyntax {
    /// Infer the archiver that belongs to a compiler driver.
    ///
    /// Handles common patterns:
    /// - gcc, g++, cc, clang -> ar
    /// - arm-none-eabi-gcc -> arm-none-eabi-ar
    /// - /opt/cross/bin/x86_64-w64-mingw32-g++ -> /opt/cross/bin/x86_64-w64-mingw32-ar
    pub fn infer_ar(compiler: &str) -> String {
        const DRIVERS: [&str; 6] = ["clang++", "clang", "g++", "gcc", "c++", "cc"];

        let path = Path::new(compiler);
        let Some(file_name) = path.file_name().map(|f| f.to_string_lossy()) else {
            return "ar".to_string();
        };
        let stem = file_name.strip_suffix(".exe").unwrap_or(&file_name);

        // Drop a trailing version, e.g. gcc-12 -> gcc
        let unversioned = match stem.rsplit_once('-') {
            Some((head, tail)) if tail.chars().all(|c| c.is_ascii_digit() || c == '.') => head,
            _ => stem,
        };

        for driver in DRIVERS {
            if let Some(prefix) = unversioned.strip_suffix(driver) {
                if prefix.ends_with('-') {
                    let ar = format!("{}ar", prefix);
                    return match path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        Some(dir) => dir.join(ar).display().to_string(),
                        None => ar,
                    };
                }
                break;
            }
        }

        "ar".to_string()
    }
}

impl FlagSyntax for GccSyntax {
    fn preprocess_only(&self) -> &'static str {
        "-E"
    }

    fn compile_only(&self) -> &'static str {
        "-c"
    }

    fn std_flag(&self, std: &str) -> String {
        format!("-std={}", std)
    }

    fn include_flag(&self, dir: &str) -> String {
        format!("-I{}", dir)
    }

    fn define_flag(&self, define: &str) -> String {
        format!("-D{}", define)
    }

    fn optimize_flag(&self, level: &str) -> String {
        format!("-O{}", level)
    }

    fn pic_flag(&self) -> Option<&'static str> {
        Some("-fPIC")
    }

    fn preprocess_output(&self, output: &Path) -> Vec<String> {
        vec!["-o".to_string(), output.display().to_string()]
    }

    fn object_output(&self, output: &Path) -> Vec<String> {
        vec!["-o".to_string(), output.display().to_string()]
    }

    fn link_args(&self, input: &LinkInput<'_>) -> Vec<String> {
        let mut args = Vec::new();

        if input.shared {
            args.push("-shared".to_string());
        }

        args.extend(input.objects.iter().map(|o| o.display().to_string()));

        for dir in input.lib_dirs {
            args.push(format!("-L{}", dir));
        }

        for lib in input.libs {
            args.push(format!("-l{}", lib));
        }

        args.push("-o".to_string());
        args.push(input.output.display().to_string());

        args
    }

    fn archive_command(&self, compiler: &str, input: &LinkInput<'_>) -> CompileCommand {
        CompileCommand::new(Self::infer_ar(compiler))
            .arg("rcs")
            .arg(input.output.display().to_string())
            .args(input.objects.iter().map(|o| o.display().to_string()))
    }

    fn object_extension(&self) -> &'static str {
        "o"
    }

    fn exe_extension(&self) -> &'static str {
        if cfg!(windows) {
            "exe"
        } else {
            ""
        }
    }

    fn shared_lib_extension(&self) -> &'static str {
        if cfg!(windows) {
            "dll"
        } else if cfg!(target_os = "macos") {
            "dylib"
        } else {
            "so"
        }
    }

    fn static_lib_extension(&self) -> &'static str {
        "a"
    }
}
