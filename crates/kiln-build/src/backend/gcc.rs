//! GCC-style frontend (gcc, clang on ELF platforms)
use super::{quote, ARCHIVE_RULE, COMPILE_RULE, LINK_EXE_RULE, LINK_SHARED_RULE};
use crate::ninja::Rule;
use crate::paths::to_slash;
use crate::targets::RuleKind;
use std::path::Path;

/// Artifacts are named exactly as declared
pub(super) fn artifact_name(_kind: RuleKind, output_name: &str) -> String {
    output_name.to_string()
}

pub(super) fn compile_flags(kind: RuleKind) -> &'static [&'static str] {
    match kind {
        RuleKind::DynamicLibrary => &["-fPIC"],
        RuleKind::StaticLibrary | RuleKind::Executable => &[],
    }
}

pub(super) fn include_flag(dir: &Path) -> String {
    quote(&format!("-I{}", to_slash(dir)))
}

pub(super) fn library_path_flag(dir: &Path) -> String {
    quote(&format!("-L{}", to_slash(dir)))
}

/// `-l:` links the exact file name, so artifacts need no `lib` prefix
pub(super) fn library_flag(library: &str) -> String {
    quote(&format!("-l:{}", library))
}

pub(super) fn compile_rule() -> Rule {
    Rule::new(
        COMPILE_RULE,
        "$compiler $defines $flags -MMD -MF $out.d $includes -c $in -o $out",
    )
    .with_description("COMPILE $out")
    .with_depfile("$out.d")
    .with_deps("gcc")
}

pub(super) fn archive_rule() -> Rule {
    Rule::new(ARCHIVE_RULE, "$ar crs $out $in").with_description("ARCHIVE $out")
}

pub(super) fn link_exe_rule() -> Rule {
    Rule::new(LINK_EXE_RULE, "$cxx $flags $in -o $out $linker_args").with_description("LINK $out")
}

pub(super) fn rules() -> Vec<Rule> {
    vec![
        compile_rule(),
        archive_rule(),
        link_exe_rule(),
        Rule::new(
            LINK_SHARED_RULE,
            "$cxx -shared $flags $in -o $out $linker_args",
        )
        .with_description("LINK $out"),
    ]
}
