use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use kiln_core::{AbiGenerationMode, VerificationPolicy};

pub use kiln_core::UnusedDependenciesAction;

/// What downstream modules compile against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompileAgainstLibraryType {
    /// Dependencies' interface artifacts (when they have one).
    Abi,
    /// Dependencies' full output.
    Full,
}

/// Build-wide unused-dependency policy. Extends the per-module action with
/// two override values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnusedDependenciesConfig {
    #[default]
    Ignore,
    Warn,
    Fail,
    /// Downgrade a module-local `fail` to `warn`.
    WarnIfFail,
    /// Ignore regardless of what modules ask for.
    IgnoreAlways,
}

/// Resolve the effective unused-dependency action from the build-wide policy
/// and the module-local request.
///
/// `ignore-always` wins outright; `warn-if-fail` downgrades a local `fail`;
/// otherwise the local action applies, then the config value, then ignore.
pub fn resolve_unused_dependencies_action(
    config: UnusedDependenciesConfig,
    local: Option<UnusedDependenciesAction>,
) -> UnusedDependenciesAction {
    if config == UnusedDependenciesConfig::IgnoreAlways {
        return UnusedDependenciesAction::Ignore;
    }
    if config == UnusedDependenciesConfig::WarnIfFail && local == Some(UnusedDependenciesAction::Fail)
    {
        return UnusedDependenciesAction::Warn;
    }
    if let Some(local) = local {
        return local;
    }
    match config {
        UnusedDependenciesConfig::Fail => UnusedDependenciesAction::Fail,
        UnusedDependenciesConfig::Warn => UnusedDependenciesAction::Warn,
        _ => UnusedDependenciesAction::Ignore,
    }
}

/// Compiler-factory and build configuration consumed by the pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Default ABI mode for modules with no explicit request.
    pub abi_generation_mode: AbiGenerationMode,
    /// Whether interface-from-source generation is enabled at all.
    pub generate_source_abi: bool,
    /// Whether interface-from-source-only generation is enabled at all.
    pub generate_source_only_abi: bool,
    /// Whether modules may stay in `migrating-to-source-only`.
    pub migrate_to_source_only_abi: bool,
    /// Whether a source interface is available whenever a source-only
    /// interface is (compiler-dependent).
    pub source_abi_with_source_only_abi: bool,
    /// Build-wide verification policy; modules may override.
    pub source_abi_verification: VerificationPolicy,
    /// Compile downstream modules against interface artifacts.
    pub compile_against_abis: bool,
    /// Record used-class dependency files for unused-dependency analysis.
    pub track_class_usage: bool,
    pub unused_dependencies: UnusedDependenciesConfig,
    /// Root directory for all build outputs.
    pub output_root: PathBuf,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            abi_generation_mode: AbiGenerationMode::Class,
            generate_source_abi: true,
            generate_source_only_abi: false,
            migrate_to_source_only_abi: false,
            source_abi_with_source_only_abi: false,
            source_abi_verification: VerificationPolicy::Off,
            compile_against_abis: true,
            track_class_usage: true,
            unused_dependencies: UnusedDependenciesConfig::Ignore,
            output_root: PathBuf::from("kiln-out"),
        }
    }
}

impl CompilerConfig {
    pub fn compile_against(&self) -> CompileAgainstLibraryType {
        if self.compile_against_abis {
            CompileAgainstLibraryType::Abi
        } else {
            CompileAgainstLibraryType::Full
        }
    }
}
