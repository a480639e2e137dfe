//! Build graph compiler integration tests
//!
//! Scratch projects on disk, planned end to end, with assertions on the
//! rendered Ninja text.

use kiln_build::{BuildError, Builder, CompileCommand, PlannedBuild, Planner};
use kiln_config::{Config, ConfigLoader};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a project with the given document and source files
fn create_project(document: &str, sources: &[&str]) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("kiln.toml"), document).unwrap();
    for source in sources {
        let path = temp.path().join(source);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "int placeholder() { return 0; }\n").unwrap();
    }
    temp
}

fn load(project: &TempDir) -> Config {
    ConfigLoader::new()
        .with_global_config_path(project.path().join("no-global.toml"))
        .load_from_directory(project.path())
        .unwrap()
}

fn plan(project: &TempDir) -> Result<PlannedBuild, BuildError> {
    Planner::from_config(&load(project)).plan()
}

fn unit_plan<'a>(planned: &'a PlannedBuild, name: &str) -> &'a str {
    let dir = &planned.unit(name).unwrap().build_dir;
    planned.plan.get(&dir.join("unit.ninja")).unwrap()
}

fn linker_args<'a>(plan: &'a str) -> &'a str {
    plan.lines()
        .find_map(|l| l.strip_prefix("  linker_args = "))
        .unwrap()
}

fn edge_line<'a>(plan: &'a str, rule: &str) -> &'a str {
    let marker = format!(": {} ", rule);
    plan.lines()
        .find(|l| l.starts_with("build ") && l.contains(&marker))
        .unwrap()
}

fn dir_of(planned: &PlannedBuild, name: &str) -> String {
    planned.build_root.join(name).display().to_string()
}

const HEADER: &str = r#"
cxx = "g++"
cc = "gcc"
ar = "ar"
"#;

fn document(frontend: &str, units: &str) -> String {
    format!("{}compilerFrontend = \"{}\"\n{}", HEADER, frontend, units)
}

const MATH_AND_APP: &str = r#"
[[builds]]
name = "math"
buildRule = "dynamiclib"
outputName = "libmath.so"
srcDirs = ["math"]
includePaths = ["math/include"]

[[builds]]
name = "app"
buildRule = "exe"
outputName = "app"
srcDirs = ["app"]
requires = ["math"]
libraries = ["libz.so"]
"#;

fn math_and_app(frontend: &str) -> TempDir {
    let temp = create_project(
        &document(frontend, MATH_AND_APP),
        &["math/math.cpp", "app/main.cpp"],
    );
    fs::create_dir_all(temp.path().join("math/include")).unwrap();
    temp
}

#[test]
fn test_duplicate_unit_names() {
    let project = create_project(
        &document(
            "gcc",
            r#"
[[builds]]
name = "core"
buildRule = "staticlib"
outputName = "libcore.a"
srcDirs = ["core"]

[[builds]]
name = "core"
buildRule = "staticlib"
outputName = "libcore2.a"
srcDirs = ["core"]
"#,
        ),
        &["core/a.cpp"],
    );

    match plan(&project) {
        Err(BuildError::DuplicateUnit { name }) => assert_eq!(name, "core"),
        other => panic!("Expected DuplicateUnit, got {:?}", other),
    }
}

#[test]
fn test_unknown_requirement_named() {
    let project = create_project(
        &document(
            "gcc",
            r#"
[[builds]]
name = "app"
buildRule = "exe"
outputName = "app"
srcDirs = ["app"]
requires = ["mathlib"]
"#,
        ),
        &["app/main.cpp"],
    );

    let err = plan(&project).unwrap_err();
    assert!(err.to_string().contains("mathlib"), "{}", err);
    assert!(err.is_configuration_error());
}

#[test]
fn test_cycle_detected_and_nothing_written() {
    let project = create_project(
        &document(
            "gcc",
            r#"
[[builds]]
name = "a"
buildRule = "staticlib"
outputName = "liba.a"
srcDirs = ["a"]
requires = ["b"]

[[builds]]
name = "b"
buildRule = "staticlib"
outputName = "libb.a"
srcDirs = ["b"]
requires = ["a"]
"#,
        ),
        &["a/a.cpp", "b/b.cpp"],
    );

    let builder = Builder::from_config(load(&project));
    assert!(matches!(
        builder.generate(),
        Err(BuildError::CyclicDependency(_))
    ));
    assert!(!project.path().join("builds").exists());
}

#[test]
fn test_missing_source_directory() {
    let project = create_project(
        &document(
            "gcc",
            r#"
[[builds]]
name = "core"
buildRule = "staticlib"
outputName = "libcore.a"
srcDirs = ["nowhere"]
"#,
        ),
        &[],
    );

    assert!(matches!(
        plan(&project),
        Err(BuildError::DirectoryNotFound { .. })
    ));
}

#[test]
fn test_static_library_edges() {
    let project = create_project(
        &document(
            "gcc",
            r#"
[[builds]]
name = "core"
buildRule = "staticlib"
outputName = "libcore.a"
srcDirs = ["core"]
"#,
        ),
        &["core/a.cpp", "core/b.cpp", "core/c.c"],
    );

    let planned = plan(&project).unwrap();
    let text = unit_plan(&planned, "core");
    let core = dir_of(&planned, "core");

    let compiles = text
        .lines()
        .filter(|l| l.starts_with("build ") && l.contains(": compile "))
        .count();
    assert_eq!(compiles, 3);

    assert_eq!(
        edge_line(text, "archive"),
        format!(
            "build {core}/libcore.a: archive {core}/a.o {core}/b.o {core}/c.o",
            core = core
        )
    );
    assert!(text.contains(&format!("build core: phony {}/libcore.a", core)));
    assert!(text.contains("  compiler = gcc\n"));
}

#[test]
fn test_gcc_executable_links_dynamic_dependency_first() {
    let project = math_and_app("gcc");
    let planned = plan(&project).unwrap();
    let text = unit_plan(&planned, "app");
    let math = dir_of(&planned, "math");

    assert_eq!(
        linker_args(text),
        format!(
            "-Wl,-rpath,'$$ORIGIN:$$ORIGIN/../math' -L{} -l:libmath.so -l:libz.so",
            math
        )
    );
    assert!(edge_line(text, "link_exe").ends_with(&format!("| {}/libmath.so", math)));

    // Requirement include directories reach the dependent's compile flags.
    let include = project.path().join("math/include");
    assert!(text.contains(&format!("includes = -I{}", include.display())));
}

#[test]
fn test_gcc_dynamic_library_is_position_independent() {
    let project = math_and_app("gcc");
    let planned = plan(&project).unwrap();

    assert!(unit_plan(&planned, "math").contains("flags = -fPIC\n"));
    assert!(unit_plan(&planned, "app").contains("flags = \n"));
}

#[test]
fn test_darwin_executable_search_path() {
    let units = MATH_AND_APP
        .replace("\"libmath.so\"", "\"math\"")
        .replace("\"libz.so\"", "\"z\"")
        .replace("requires = [\"math\"]", "requires = [\"math\", \"io\"]");
    let units = format!(
        "{}{}",
        units,
        r#"
[[builds]]
name = "io"
buildRule = "dynamiclib"
outputName = "io"
srcDirs = ["io"]
"#
    );
    let project = create_project(
        &document("osx", &units),
        &["math/math.cpp", "io/io.cpp", "app/main.cpp"],
    );
    fs::create_dir_all(project.path().join("math/include")).unwrap();
    let planned = plan(&project).unwrap();

    assert_eq!(planned.unit("math").unwrap().artifact, "libmath.dylib");
    assert_eq!(planned.unit("app").unwrap().artifact, "app.exe");

    // One -rpath per entry: Darwin never splits a search list on ':'.
    assert_eq!(
        linker_args(unit_plan(&planned, "app")),
        format!(
            "-Wl,-rpath,'@executable_path' -Wl,-rpath,'@executable_path/../math' \
             -Wl,-rpath,'@executable_path/../io' -L{} -lmath -L{} -lio -lz",
            dir_of(&planned, "math"),
            dir_of(&planned, "io")
        )
    );

    let math_plan = unit_plan(&planned, "math");
    assert!(math_plan.contains("  install_name = @rpath/libmath.dylib\n"));
    assert!(!math_plan.contains("-fPIC"));
}

#[test]
fn test_msvc_dll_import_library() {
    let project = create_project(
        &document(
            "msvc",
            r#"
[[builds]]
name = "math"
buildRule = "dynamiclib"
outputName = "math.dll"
srcDirs = ["math"]

[[builds]]
name = "app"
buildRule = "exe"
outputName = "app"
srcDirs = ["app"]
requires = ["math"]
thirdPartyLibraries = ["zlib.dll"]
"#,
        ),
        &["math/math.cpp", "app/main.cpp"],
    );

    let planned = plan(&project).unwrap();
    let math = dir_of(&planned, "math");
    let app = dir_of(&planned, "app");

    let dll_edge = edge_line(unit_plan(&planned, "math"), "link_shared");
    assert_eq!(
        dll_edge,
        format!(
            "build {m}/math.dll | {m}/math.lib {m}/math.exp: link_shared {m}/math.obj",
            m = math
        )
    );

    let app_plan = unit_plan(&planned, "app");
    assert_eq!(
        linker_args(app_plan),
        format!("/LIBPATH:{} math.lib zlib.lib", math)
    );
    assert_eq!(
        edge_line(app_plan, "link_exe"),
        format!(
            "build {a}/app.exe: link_exe {a}/main.obj | {m}/math.dll {m}/math.lib {m}/math.exp",
            a = app,
            m = math
        )
    );
}

#[test]
fn test_link_order_for_shared_requirement() {
    let project = create_project(
        &document(
            "gcc",
            r#"
[[builds]]
name = "app"
buildRule = "exe"
outputName = "app"
srcDirs = ["app"]
requires = ["a", "b"]

[[builds]]
name = "a"
buildRule = "staticlib"
outputName = "liba.a"
srcDirs = ["a"]
requires = ["c"]

[[builds]]
name = "b"
buildRule = "staticlib"
outputName = "libb.a"
srcDirs = ["b"]
requires = ["c"]

[[builds]]
name = "c"
buildRule = "staticlib"
outputName = "libc_.a"
srcDirs = ["c"]
"#,
        ),
        &["app/main.cpp", "a/a.cpp", "b/b.cpp", "c/c.cpp"],
    );

    let planned = plan(&project).unwrap();
    assert_eq!(planned.build_order(), vec!["c", "a", "b", "app"]);

    let libraries: Vec<_> = linker_args(unit_plan(&planned, "app"))
        .split_whitespace()
        .filter(|arg| arg.starts_with("-l:"))
        .collect();
    assert_eq!(libraries, vec!["-l:liba.a", "-l:libb.a", "-l:libc_.a"]);

    // Static-only requirements need no runtime search path.
    assert!(!linker_args(unit_plan(&planned, "app")).contains("rpath"));

    // The shared requirement is included once in the entry plan.
    let entry = planned
        .plan
        .get(&planned.entry_plan_path("app").unwrap())
        .unwrap();
    let c_plan = format!("subninja {}/unit.ninja", dir_of(&planned, "c"));
    assert_eq!(entry.matches(&c_plan).count(), 1);
    assert!(entry.ends_with("default app\n"));
}

#[test]
fn test_regeneration_is_byte_identical() {
    let project = math_and_app("gcc");
    let builder = Builder::from_config(load(&project));

    let first = builder.generate().unwrap();
    assert_eq!(first.stats.written_files, first.stats.plan_files);

    let snapshot: Vec<(PathBuf, String)> = first
        .planned
        .plan
        .files()
        .map(|(p, _)| (p.to_path_buf(), fs::read_to_string(p).unwrap()))
        .collect();

    let second = builder.generate().unwrap();
    assert_eq!(second.stats.written_files, 0);
    assert_eq!(second.stats.unchanged_files, second.stats.plan_files);

    for (path, contents) in snapshot {
        assert_eq!(fs::read_to_string(&path).unwrap(), contents);
    }
}

#[test]
fn test_compile_database() {
    let project = math_and_app("gcc");
    let builder = Builder::from_config(load(&project));
    let context = builder.generate().unwrap();

    let json = fs::read_to_string(context.planned.compile_database_path()).unwrap();
    let commands: Vec<CompileCommand> = serde_json::from_str(&json).unwrap();

    assert_eq!(commands.len(), 2);
    let main = commands
        .iter()
        .find(|c| c.file.ends_with("main.cpp"))
        .unwrap();
    assert!(main.command.starts_with("g++ "));
    assert!(main.command.contains(" -c "));
    assert_eq!(main.directory, context.planned.unit("app").unwrap().build_dir);
}

#[test]
fn test_root_plan_covers_every_unit() {
    let project = math_and_app("gcc");
    let planned = plan(&project).unwrap();
    let root = planned.plan.get(&planned.root_plan_path()).unwrap();

    assert!(root.contains("build all: phony math app\n"));
    assert_eq!(root.matches("subninja ").count(), 2);
}

#[test]
fn test_every_entry_plan_shares_build_log() {
    let project = math_and_app("gcc");
    let planned = plan(&project).unwrap();
    let binding = format!("builddir = {}\n", planned.build_root.display());

    let entries: Vec<_> = planned
        .plan
        .files()
        .filter(|(path, _)| path.ends_with("build.ninja"))
        .collect();
    assert_eq!(entries.len(), 3);
    for (path, text) in entries {
        assert!(
            text.contains(&binding),
            "{} does not share the build log",
            path.display()
        );
    }
}

#[test]
fn test_unit_named_like_root_target() {
    let project = create_project(
        &document(
            "gcc",
            r#"
[[builds]]
name = "all"
buildRule = "staticlib"
outputName = "liball.a"
srcDirs = ["all"]
"#,
        ),
        &["all/a.cpp"],
    );

    match plan(&project) {
        Err(BuildError::InvalidUnitName { name, .. }) => assert_eq!(name, "all"),
        other => panic!("Expected InvalidUnitName, got {:?}", other),
    }
    assert!(!project.path().join("builds").exists());
}

#[test]
fn test_unit_name_escaping_build_root() {
    let project = create_project(
        &document(
            "gcc",
            r#"
[[builds]]
name = "../escape"
buildRule = "staticlib"
outputName = "libescape.a"
srcDirs = ["core"]
"#,
        ),
        &["core/a.cpp"],
    );

    let err = plan(&project).unwrap_err();
    assert!(matches!(err, BuildError::InvalidUnitName { .. }));
    assert!(err.is_configuration_error());
}

#[test]
fn test_project_root_and_build_dir_settings() {
    let project = create_project(
        &document(
            "gcc",
            r#"
projectRoot = "native"
buildDir = "out"

[[builds]]
name = "core"
buildRule = "staticlib"
outputName = "libcore.a"
srcDirs = ["core"]
"#,
        ),
        &["native/core/a.cpp"],
    );

    let planned = plan(&project).unwrap();
    assert_eq!(
        planned.build_root,
        project.path().join("native").join("out")
    );
    assert!(Path::new(&dir_of(&planned, "core")).ends_with("out/core"));
}
