use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use kiln_core::{AbiGenerationMode, ProcessorDescriptor, TargetId, Variant, VerificationPolicy};
use kiln_graph::{BuildGraph, BuildNode};
use kiln_steps::{
    compile_steps, CompileKind, CompileRequest, CompilerOutputPaths, CompilerParameters,
    JarParameters, Step,
};

use crate::config::{
    resolve_unused_dependencies_action, CompileAgainstLibraryType, CompilerConfig,
};
use crate::mode::select_abi_mode;
use crate::module::ModuleSpec;
use crate::processor::abi_processors_only;
use crate::PipelineError;

/// Per-module planning state: the selected ABI mode and the predicates that
/// decide which of the five co-dependent nodes exist.
#[derive(Debug)]
pub struct LibraryPlanner<'a> {
    module: &'a ModuleSpec,
    config: &'a CompilerConfig,
    mode: AbiGenerationMode,
    verification: VerificationPolicy,
}

impl<'a> LibraryPlanner<'a> {
    pub fn new(module: &'a ModuleSpec, config: &'a CompilerConfig) -> Result<Self, PipelineError> {
        for dep in &module.deps {
            if !dep.target.is_library() {
                return Err(PipelineError::NonLibraryDep {
                    module: module.target.clone(),
                    dep: dep.target.clone(),
                });
            }
        }

        // A module without sources has nothing to compile an interface from;
        // mask the generate flags so the downgrade ladder lands on `class`.
        let effective = CompilerConfig {
            generate_source_abi: config.generate_source_abi && module.has_sources(),
            generate_source_only_abi: config.generate_source_only_abi && module.has_sources(),
            ..config.clone()
        };
        let mode = select_abi_mode(
            module.requested_abi_mode,
            &effective,
            &module.processors,
            module.source_only_abis_allowed,
        );
        let verification = module.verification.unwrap_or(config.source_abi_verification);
        debug!(module = %module.target, ?mode, ?verification, "selected ABI generation mode");

        Ok(Self {
            module,
            config,
            mode,
            verification,
        })
    }

    pub fn abi_generation_mode(&self) -> AbiGenerationMode {
        self.mode
    }

    pub fn verification(&self) -> VerificationPolicy {
        self.verification
    }

    pub fn produces_source_only_abi(&self) -> bool {
        self.module.produces_artifact() && self.mode.is_source_only_abi()
    }

    pub fn produces_source_abi(&self) -> bool {
        self.module.produces_artifact() && self.mode.is_source_abi()
            || self.produces_source_only_abi() && self.config.source_abi_with_source_only_abi
    }

    pub fn produces_class_abi(&self) -> bool {
        self.module.produces_artifact()
            && ((!self.produces_source_abi() && !self.produces_source_only_abi())
                || self.produces_compare_abis())
    }

    pub fn produces_compare_abis(&self) -> bool {
        self.produces_source_abi() && self.verification != VerificationPolicy::Off
    }

    /// The interface identifier downstream modules compile against, if any.
    pub fn abi_target(&self) -> Option<TargetId> {
        let library = self.module.target.library_target();
        if self.produces_compare_abis() {
            Some(library.verified_source_abi())
        } else if self.produces_source_abi() || self.produces_source_only_abi() {
            Some(library.source_abi())
        } else if self.produces_class_abi() {
            Some(library.class_abi())
        } else {
            None
        }
    }

    /// The mode used when checking downstream compatibility of a class
    /// interface. The config-wide default (rather than the per-module mode)
    /// applies under verification, because any source-only module can affect
    /// other modules' outputs in ways that are hard to simulate.
    pub fn abi_compatibility_mode(&self) -> AbiGenerationMode {
        if self.config.source_abi_verification == VerificationPolicy::Off {
            AbiGenerationMode::Class
        } else {
            self.config.abi_generation_mode
        }
    }

    /// The identifier closest to the root of the node graph. Requests for any
    /// variant funnel through a single get-or-create on this identifier so
    /// all five co-dependent nodes are built in one construction call.
    pub fn rootmost_target(&self) -> TargetId {
        let library = self.module.target.library_target();
        if self.produces_compare_abis() {
            library.verified_source_abi()
        } else if self.produces_class_abi() {
            library.class_abi()
        } else {
            library
        }
    }

    fn dep_targets(&self) -> Vec<TargetId> {
        self.module.deps.iter().map(|d| d.target.clone()).collect()
    }

    fn compile_classpath(&self) -> Vec<PathBuf> {
        match self.config.compile_against() {
            CompileAgainstLibraryType::Abi => self
                .module
                .deps
                .iter()
                .map(|d| d.abi_output.clone().unwrap_or_else(|| d.output.clone()))
                .collect(),
            CompileAgainstLibraryType::Full => {
                self.module.deps.iter().map(|d| d.output.clone()).collect()
            }
        }
    }

    /// Only outputs declared safe for interface-only compilation.
    fn interface_only_classpath(&self) -> Vec<PathBuf> {
        self.module
            .deps
            .iter()
            .filter_map(|d| d.abi_output.clone())
            .collect()
    }

    fn output_paths(&self, target: &TargetId) -> CompilerOutputPaths {
        CompilerOutputPaths::for_target(&self.config.output_root, target)
    }

    fn resource_mappings(&self, paths: &CompilerOutputPaths) -> Vec<(PathBuf, PathBuf)> {
        self.module
            .resources
            .iter()
            .map(|(source, rel)| (source.clone(), paths.classes_dir.join(rel)))
            .collect()
    }

    fn jar_parameters(&self, paths: &CompilerOutputPaths) -> JarParameters {
        JarParameters {
            jar_path: paths.jar_path.clone(),
            entries: vec![paths.classes_dir.clone()],
            main_class: self.module.main_class.clone(),
            manifest_file: self.module.manifest.clone(),
            remove_entries: self.module.remove_classes.clone(),
            merge_manifests: true,
        }
    }

    fn compiler_parameters(
        &self,
        paths: CompilerOutputPaths,
        classpath: Vec<PathBuf>,
        processors: Vec<ProcessorDescriptor>,
    ) -> CompilerParameters {
        CompilerParameters {
            sources: self.module.sources.clone(),
            classpath,
            output_paths: paths,
            processors,
            abi_generation_mode: self.mode,
            abi_compatibility_mode: self.abi_compatibility_mode(),
            track_class_usage: self.config.track_class_usage,
            required_for_source_only_abi: self.module.required_for_source_only_abi,
            on_unused_dependencies: resolve_unused_dependencies_action(
                self.config.unused_dependencies,
                self.module.on_unused_dependencies,
            ),
            requires_desugar: self.module.requires_desugar(),
        }
    }

    fn source_only_abi_node(&self) -> Option<BuildNode> {
        if !self.produces_source_only_abi() {
            return None;
        }
        Some(self.abi_compile_node(
            self.module.target.source_only_abi(),
            CompileKind::SourceOnlyAbi,
            self.interface_only_classpath(),
            abi_processors_only(&self.module.processors),
        ))
    }

    fn source_abi_node(&self) -> Option<BuildNode> {
        if !self.produces_source_abi() {
            return None;
        }
        Some(self.abi_compile_node(
            self.module.target.source_abi(),
            CompileKind::SourceAbi,
            self.compile_classpath(),
            self.module.processors.clone(),
        ))
    }

    fn abi_compile_node(
        &self,
        id: TargetId,
        kind: CompileKind,
        classpath: Vec<PathBuf>,
        processors: Vec<ProcessorDescriptor>,
    ) -> BuildNode {
        let paths = self.output_paths(&id);
        let abi_jar = self.jar_parameters(&paths);
        // Interface construction always needs the library's own output layout
        // for consistency, even when only the interface is requested.
        let library_paths = self.output_paths(&self.module.target);
        let library_jar = self.jar_parameters(&library_paths);

        let request = CompileRequest {
            target: id.clone(),
            kind,
            parameters: self.compiler_parameters(paths.clone(), classpath, processors),
            resources: self.resource_mappings(&paths),
            abi_jar: Some(abi_jar),
            library_jar: Some(library_jar),
            compiler: self.module.compiler.clone(),
        };
        let plan = compile_steps(&request);

        BuildNode {
            id,
            deps: self.dep_targets(),
            steps: plan.steps,
            output: Some(paths.jar_path),
            artifacts: plan.artifacts,
        }
    }

    fn library_node(&self, source_abi: Option<&BuildNode>) -> BuildNode {
        let id = self.module.target.library_target();
        let paths = self.output_paths(&id);
        let library_jar = self
            .module
            .produces_artifact()
            .then(|| self.jar_parameters(&paths));

        let request = CompileRequest {
            target: id.clone(),
            kind: CompileKind::Library,
            parameters: self.compiler_parameters(
                paths.clone(),
                self.compile_classpath(),
                self.module.processors.clone(),
            ),
            resources: self.resource_mappings(&paths),
            abi_jar: None,
            library_jar: library_jar.clone(),
            compiler: self.module.compiler.clone(),
        };
        let plan = compile_steps(&request);

        // The source interface is an upstream link so the two stay
        // configuration-consistent and the compiler can pipeline them.
        let mut deps = self.dep_targets();
        if let Some(source_abi) = source_abi {
            deps.push(source_abi.id.clone());
        }

        BuildNode {
            id,
            deps,
            steps: plan.steps,
            output: library_jar.map(|jar| jar.jar_path),
            artifacts: plan.artifacts,
        }
    }

    fn class_abi_node(&self, library: &BuildNode) -> Option<BuildNode> {
        if !self.produces_class_abi() {
            return None;
        }
        let id = self.module.target.class_abi();
        let paths = self.output_paths(&id);
        let library_jar = library.output.clone().unwrap_or_else(|| {
            panic!("class interface of `{}` requires a library jar", library.id)
        });

        let output = paths.jar_path.clone();
        Some(BuildNode {
            id,
            deps: vec![library.id.clone()],
            steps: vec![
                Step::MakeCleanDirectory(paths.output_jar_dir.clone()),
                Step::ExtractClassAbi {
                    library_jar,
                    output_jar: output.clone(),
                    compatibility_mode: self.abi_compatibility_mode(),
                },
            ],
            output: Some(output.clone()),
            artifacts: vec![output],
        })
    }

    fn compare_abis_node(
        &self,
        correct: Option<&BuildNode>,
        experimental: Option<&BuildNode>,
    ) -> Option<BuildNode> {
        if !self.produces_compare_abis() {
            return None;
        }
        let correct = correct.unwrap_or_else(|| {
            panic!(
                "ABI verification of `{}` lacks a trusted interface node",
                self.module.target
            )
        });
        let experimental = experimental.unwrap_or_else(|| {
            panic!(
                "ABI verification of `{}` lacks an experimental interface node",
                self.module.target
            )
        });
        let correct_jar = correct
            .output
            .clone()
            .unwrap_or_else(|| panic!("interface node `{}` has no output", correct.id));
        let experimental_jar = experimental
            .output
            .clone()
            .unwrap_or_else(|| panic!("interface node `{}` has no output", experimental.id));

        let id = self.module.target.verified_source_abi();
        let paths = self.output_paths(&id);
        let output = paths.jar_path.clone();
        Some(BuildNode {
            id,
            deps: vec![correct.id.clone(), experimental.id.clone()],
            steps: vec![
                Step::MakeCleanDirectory(paths.output_jar_dir.clone()),
                Step::CompareAbis {
                    correct: correct_jar,
                    experimental: experimental_jar,
                    output_jar: output.clone(),
                    policy: self.verification,
                },
            ],
            output: Some(output.clone()),
            artifacts: vec![output],
        })
    }
}

/// Build (or look up) the node for `requested`, constructing all co-dependent
/// variant nodes of the module as a side effect.
///
/// To guarantee all nodes of one module come from the same configuration, the
/// pipeline forces a single get-or-create on the rootmost identifier and
/// constructs every node inside that call, leafmost first. Concurrent
/// requests for any variant of the module block until the whole family is
/// built.
pub fn build_pipeline(
    graph: &BuildGraph,
    requested: &TargetId,
    module: &ModuleSpec,
    config: &CompilerConfig,
) -> Result<Arc<BuildNode>, PipelineError> {
    let planner = LibraryPlanner::new(module, config)?;
    let rootmost = planner.rootmost_target();
    debug!(requested = %requested, rootmost = %rootmost, "building library node family");

    graph.get_or_create(&rootmost, |target| {
        let source_only_abi = planner.source_only_abi_node();
        let source_abi = planner.source_abi_node();
        let library = planner.library_node(source_abi.as_ref());
        let class_abi = planner.class_abi_node(&library);
        // The trusted/experimental pair: during migration the source
        // interface is the trusted side and the source-only interface the
        // experimental one; otherwise the class interface anchors the
        // comparison.
        let compare = if source_only_abi.is_some() {
            planner.compare_abis_node(source_abi.as_ref(), source_only_abi.as_ref())
        } else {
            planner.compare_abis_node(class_abi.as_ref(), source_abi.as_ref())
        };

        let mut rootmost_node = None;
        let family = source_only_abi
            .into_iter()
            .chain(source_abi)
            .chain(Some(library))
            .chain(class_abi)
            .chain(compare);
        for node in family {
            if node.id == *target {
                rootmost_node = Some(node);
            } else {
                graph.insert(node);
            }
        }

        match target.variant() {
            Variant::Library | Variant::ClassAbi | Variant::VerifiedSourceAbi => rootmost_node
                .unwrap_or_else(|| panic!("rootmost node `{target}` was not constructed")),
            _ => unreachable!("rootmost target is always library, class-abi, or verified-source-abi"),
        }
    });

    graph
        .get(requested)
        .ok_or_else(|| PipelineError::VariantNotProduced {
            target: requested.clone(),
        })
}
