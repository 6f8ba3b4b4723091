use std::path::PathBuf;

use kiln_core::{AbiGenerationMode, ProcessorDescriptor, TargetId, VerificationPolicy};
use kiln_steps::{RemovePatterns, ResolvedCompiler};

use crate::config::UnusedDependenciesAction;

/// One declared dependency of a module, with the outputs it contributes to
/// classpaths.
#[derive(Clone, Debug)]
pub struct ModuleDep {
    pub target: TargetId,
    /// The dependency's full compiled output (jar or classes directory).
    pub output: PathBuf,
    /// The dependency's interface-only output, present when the dependency is
    /// declared safe for interface-only compilation.
    pub abi_output: Option<PathBuf>,
}

impl ModuleDep {
    pub fn new(target: TargetId, output: impl Into<PathBuf>) -> Self {
        Self {
            target,
            output: output.into(),
            abi_output: None,
        }
    }

    pub fn with_abi_output(mut self, abi_output: impl Into<PathBuf>) -> Self {
        self.abi_output = Some(abi_output.into());
        self
    }
}

/// A declared compilation unit: sources, resources, dependencies, and the
/// module-local compiler configuration.
#[derive(Clone, Debug)]
pub struct ModuleSpec {
    /// The unflavored library identifier.
    pub target: TargetId,
    pub sources: Vec<PathBuf>,
    /// Resource copies into the classes directory, (source, relative dest).
    pub resources: Vec<(PathBuf, PathBuf)>,
    pub manifest: Option<PathBuf>,
    pub deps: Vec<ModuleDep>,
    pub processors: Vec<ProcessorDescriptor>,
    pub requested_abi_mode: Option<AbiGenerationMode>,
    /// Module-local override of the build-wide verification policy.
    pub verification: Option<VerificationPolicy>,
    pub source_only_abis_allowed: bool,
    /// Downstream source-only generation needs this module's interface.
    pub required_for_source_only_abi: bool,
    pub remove_classes: RemovePatterns,
    pub main_class: Option<String>,
    /// Raw source level ("7" or "1.7" notation), when declared.
    pub source_level: Option<String>,
    pub on_unused_dependencies: Option<UnusedDependenciesAction>,
    pub compiler: ResolvedCompiler,
}

impl ModuleSpec {
    pub fn new(target: TargetId, compiler: ResolvedCompiler) -> Self {
        Self {
            target,
            sources: Vec::new(),
            resources: Vec::new(),
            manifest: None,
            deps: Vec::new(),
            processors: Vec::new(),
            requested_abi_mode: None,
            verification: None,
            source_only_abis_allowed: true,
            required_for_source_only_abi: false,
            remove_classes: RemovePatterns::default(),
            main_class: None,
            source_level: None,
            on_unused_dependencies: None,
            compiler,
        }
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Whether this module produces any artifact at all.
    pub fn produces_artifact(&self) -> bool {
        !self.sources.is_empty() || !self.resources.is_empty() || self.manifest.is_some()
    }

    pub fn requires_desugar(&self) -> bool {
        source_level_requires_desugar(self.source_level.as_deref())
    }
}

/// Parse a Java source level from either "7" or "1.7" notation.
pub fn extract_source_level(raw: &str) -> Option<u32> {
    let mut rest = raw;
    while let Some(stripped) = rest.strip_prefix("1.") {
        rest = stripped;
    }
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_digit() => Some(c as u32 - '0' as u32),
        _ => None,
    }
}

/// Desugaring applies to source level 8 and above.
pub fn source_level_requires_desugar(raw: Option<&str>) -> bool {
    raw.and_then(extract_source_level).map_or(false, |level| level > 7)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_levels_parse_in_both_notations() {
        assert_eq!(extract_source_level("7"), Some(7));
        assert_eq!(extract_source_level("1.7"), Some(7));
        assert_eq!(extract_source_level("8"), Some(8));
        assert_eq!(extract_source_level("1.8"), Some(8));
        assert_eq!(extract_source_level("11"), None);
        assert_eq!(extract_source_level("banana"), None);
        assert_eq!(extract_source_level(""), None);
    }

    #[test]
    fn desugar_applies_above_source_level_seven() {
        assert!(!source_level_requires_desugar(None));
        assert!(!source_level_requires_desugar(Some("7")));
        assert!(!source_level_requires_desugar(Some("1.7")));
        assert!(source_level_requires_desugar(Some("8")));
        assert!(source_level_requires_desugar(Some("1.8")));
    }

    #[test]
    fn produces_artifact_counts_sources_resources_and_manifest() {
        let compiler = ResolvedCompiler::new("javac", Vec::new());
        let mut module = ModuleSpec::new(TargetId::library("//lib:a"), compiler);
        assert!(!module.produces_artifact());

        module.manifest = Some(PathBuf::from("META-INF/MANIFEST.MF"));
        assert!(module.produces_artifact());

        module.manifest = None;
        module.resources = vec![(PathBuf::from("res/a"), PathBuf::from("a"))];
        assert!(module.produces_artifact());

        module.resources.clear();
        module.sources = vec![PathBuf::from("src/A.java")];
        assert!(module.produces_artifact());
    }
}
