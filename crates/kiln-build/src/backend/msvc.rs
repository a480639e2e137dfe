//! MSVC-style frontend (`cl.exe`, `lib.exe`)
//!
//! Dynamic libraries produce an import library (`.lib`) and export file
//! (`.exp`) next to the `.dll`. Dependents link the import library.
use super::{quote, LinkDependency, ARCHIVE_RULE, COMPILE_RULE, LINK_EXE_RULE, LINK_SHARED_RULE};
use crate::ninja::Rule;
use crate::targets::RuleKind;
use std::path::{Path, PathBuf};

pub(super) fn artifact_name(kind: RuleKind, output_name: &str) -> String {
    let extension = match kind {
        RuleKind::StaticLibrary => "lib",
        RuleKind::DynamicLibrary => "dll",
        RuleKind::Executable => "exe",
    };
    Path::new(output_name)
        .with_extension(extension)
        .to_string_lossy()
        .into_owned()
}

fn stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

fn is_dll(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("dll"))
}

pub(super) fn include_flag(dir: &Path) -> String {
    quote(&format!("/I{}", dir.display()))
}

pub(super) fn library_path_flag(dir: &Path) -> String {
    quote(&format!("/LIBPATH:{}", dir.display()))
}

/// Declared libraries pass through, with `.dll` names pointing at their import library
pub(super) fn library_flag(library: &str) -> String {
    if is_dll(library) {
        quote(&format!("{}.lib", stem(library)))
    } else {
        quote(library)
    }
}

pub(super) fn dependency_flag(dependency: &LinkDependency) -> String {
    match dependency.kind {
        RuleKind::DynamicLibrary => quote(&format!("{}.lib", stem(&dependency.artifact))),
        RuleKind::StaticLibrary | RuleKind::Executable => quote(&dependency.artifact),
    }
}

/// Import library and export file written by a DLL link
pub(super) fn import_files(build_dir: &Path, artifact: &str) -> Vec<PathBuf> {
    let stem = stem(artifact);
    vec![
        build_dir.join(format!("{}.lib", stem)),
        build_dir.join(format!("{}.exp", stem)),
    ]
}

pub(super) fn dependency_inputs(dependency: &LinkDependency) -> Vec<PathBuf> {
    let mut inputs = vec![dependency.artifact_path()];
    if dependency.kind == RuleKind::DynamicLibrary {
        inputs.extend(import_files(&dependency.build_dir, &dependency.artifact));
    }
    inputs
}

pub(super) fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            COMPILE_RULE,
            "$compiler /nologo /showIncludes $defines $flags $includes /c $in /Fo$out",
        )
        .with_description("COMPILE $out")
        .with_deps("msvc"),
        Rule::new(ARCHIVE_RULE, "$ar /nologo /OUT:$out $in").with_description("ARCHIVE $out"),
        Rule::new(
            LINK_EXE_RULE,
            "$cxx /nologo $flags $in /link /OUT:$out $linker_args",
        )
        .with_description("LINK $out"),
        Rule::new(
            LINK_SHARED_RULE,
            "$cxx /nologo $flags $in /link /DLL /OUT:$out $linker_args",
        )
        .with_description("LINK $out"),
    ]
}
