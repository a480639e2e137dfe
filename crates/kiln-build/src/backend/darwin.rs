//! Darwin frontend: GCC-style flags with `lib<name>` naming and `@rpath` install names
use super::{gcc, quote, LINK_SHARED_RULE};
use crate::ninja::Rule;
use crate::rpath::OriginMarker;
use crate::targets::RuleKind;

pub(super) fn artifact_name(kind: RuleKind, output_name: &str) -> String {
    match kind {
        RuleKind::StaticLibrary => format!("lib{}.a", output_name),
        RuleKind::DynamicLibrary => format!("lib{}.dylib", output_name),
        RuleKind::Executable => format!("{}.exe", output_name),
    }
}

/// `-l<name>` resolves `lib<name>.dylib` or `lib<name>.a`
pub(super) fn library_flag(library: &str) -> String {
    quote(&format!("-l{}", library))
}

pub(super) fn origin_marker(kind: RuleKind) -> Option<OriginMarker> {
    match kind {
        RuleKind::Executable => Some(OriginMarker::ExecutablePath),
        RuleKind::DynamicLibrary => Some(OriginMarker::LoaderPath),
        RuleKind::StaticLibrary => None,
    }
}

pub(super) fn install_name(artifact: &str) -> String {
    format!("@rpath/{}", artifact)
}

pub(super) fn rules() -> Vec<Rule> {
    vec![
        gcc::compile_rule(),
        gcc::archive_rule(),
        gcc::link_exe_rule(),
        Rule::new(
            LINK_SHARED_RULE,
            "$cxx -dynamiclib -install_name $install_name $flags $in -o $out $linker_args",
        )
        .with_description("LINK $out"),
    ]
}
