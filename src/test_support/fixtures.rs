//! Workspace fixtures for builder and front-end tests.

use std::path::Path;

use crate::builder::BuildOptions;
use crate::core::{ArtifactKind, Config, Language, Project, Workspace};

use super::write_file;

/// Build file for a workspace with one shared library and one executable.
pub const TWO_PROJECT_BUILD_FILE: &str = r#"
# demo workspace
workspace: demo
dist: "out/bin"
obj: "out/obj"

conf: debug {
    defines: [DEBUG]
    optimize: 0
}

project: net {
    kind: shared
    language: c++
    std: c++20
    src: ["net/*.cpp"]
    inc: ["net/include"]

    conf: release {
        optimize: 3
    }
}

project: app {
    kind: exe
    src: ["app/main.cpp"]
    use: [net]

    on: postbuild {
        exec: "echo done"
    }
}

task: package {
    deps: [app]
    exec: ["echo packaging", "echo finished"]
}
"#;

/// Build options for tests: given configuration, two workers, no progress bar.
pub fn options(configuration: &str) -> BuildOptions {
    BuildOptions {
        configuration: configuration.to_string(),
        jobs: 2,
        progress: false,
        ..BuildOptions::default()
    }
}

/// A workspace at `root` with a single shared library `net` built from
/// `src/*.cpp` by `compiler`. The `debug` configuration adds `-g -O0`.
///
/// The workspace root is canonicalized so it matches resolved source paths.
pub fn shared_lib_workspace(root: &Path, compiler: &Path) -> Workspace {
    let root = root.canonicalize().unwrap();
    write_file(
        &root.join("src/net.cpp"),
        "int net_answer() { return 42; }\n",
    );

    let mut project = Project::new("net", ArtifactKind::SharedLib);
    project.language = Language::Cxx;
    project.sources = vec!["src/*.cpp".to_string()];
    project.base_config = Config {
        compiler: compiler.display().to_string(),
        cpp_std: Some("c++17".into()),
        includes: vec!["include".into()],
        ..Config::default()
    };
    project.configs.insert(
        "debug".to_string(),
        Config {
            flags: vec!["-g".into(), "-O0".into()],
            ..Config::default()
        },
    );

    let mut ws = Workspace::new("demo", root);
    ws.projects.push(project);
    ws
}

/// Add an executable `app` using `net` to a workspace made by
/// [`shared_lib_workspace`].
pub fn add_app(ws: &mut Workspace, compiler: &Path) {
    write_file(&ws.root.join("app/main.cpp"), "int main() { return 0; }\n");

    let mut app = Project::new("app", ArtifactKind::Exe);
    app.sources = vec!["app/*.cpp".to_string()];
    app.deps = vec!["net".to_string()];
    app.base_config.compiler = compiler.display().to_string();
    ws.projects.push(app);
}
