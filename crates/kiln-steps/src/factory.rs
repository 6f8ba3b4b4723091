use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::trace;

use kiln_core::{AbiGenerationMode, ProcessorDescriptor, TargetId, UnusedDependenciesAction};

use crate::jar::JarParameters;
use crate::paths::CompilerOutputPaths;
use crate::step::{CompileKind, ResolvedCompiler, Step};

/// Resolved compile parameters: ordered sources, ordered classpath, output
/// layout, and the flags the compiler host needs to interpret them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerParameters {
    pub sources: Vec<PathBuf>,
    pub classpath: Vec<PathBuf>,
    pub output_paths: CompilerOutputPaths,
    pub processors: Vec<ProcessorDescriptor>,
    pub abi_generation_mode: AbiGenerationMode,
    pub abi_compatibility_mode: AbiGenerationMode,
    pub track_class_usage: bool,
    pub required_for_source_only_abi: bool,
    /// What the compiler host does when the recorded dep file shows a
    /// declared dependency was never used.
    pub on_unused_dependencies: UnusedDependenciesAction,
    /// Compiled output must be desugared for the declared source level.
    pub requires_desugar: bool,
}

/// A fully-resolved compilation request.
#[derive(Clone, Debug)]
pub struct CompileRequest {
    pub target: TargetId,
    pub kind: CompileKind,
    pub parameters: CompilerParameters,
    /// Resource copies into the classes directory, (source, destination).
    pub resources: Vec<(PathBuf, PathBuf)>,
    pub abi_jar: Option<JarParameters>,
    pub library_jar: Option<JarParameters>,
    pub compiler: ResolvedCompiler,
}

/// Ordered steps plus the artifacts to register with the cache.
#[derive(Clone, Debug, Default)]
pub struct StepPlan {
    pub steps: Vec<Step>,
    pub artifacts: Vec<PathBuf>,
}

/// Turn a compile request into an ordered list of build steps.
///
/// Contract: interface-jar parameters require library-jar parameters, because
/// interface construction always needs the library's own output layout even
/// when only the interface artifact is requested. A library compile must
/// package its own classes directory. Violations are programming errors, not
/// user-recoverable failures.
pub fn compile_steps(request: &CompileRequest) -> StepPlan {
    assert!(
        request.library_jar.is_some() || request.abi_jar.is_none(),
        "interface-jar parameters require library-jar parameters ({})",
        request.target,
    );

    let mut steps = Vec::new();
    let mut artifacts = Vec::new();
    let has_sources = !request.parameters.sources.is_empty();

    steps.extend(compiler_setup_steps(
        &request.resources,
        &request.parameters.output_paths,
        !has_sources,
    ));

    let jar = request.abi_jar.as_ref().or(request.library_jar.as_ref());
    if let Some(jar) = jar {
        steps.extend(jar_setup_steps(jar));
    }

    if has_sources {
        if request.parameters.track_class_usage {
            artifacts.push(request.parameters.output_paths.dep_file_path());
        }
        add_compile_steps(request, &mut steps);
    }

    if let Some(jar) = jar {
        if !has_sources {
            // No source files; package resources (and manifest) directly.
            steps.push(Step::JarDirectory(jar.clone()));
        }
        artifacts.push(jar.jar_path.clone());
    }

    trace!(id = %request.target, steps = steps.len(), "planned compile steps");
    StepPlan { steps, artifacts }
}

/// Compiler setup: clean output directories and stage resources.
///
/// The classes directory is always created, even with no sources to compile,
/// because resources may still need to be copied there.
fn compiler_setup_steps(
    resources: &[(PathBuf, PathBuf)],
    output_paths: &CompilerOutputPaths,
    empty_sources: bool,
) -> Vec<Step> {
    let mut steps = vec![
        Step::MakeCleanDirectory(output_paths.classes_dir.clone()),
        Step::MakeCleanDirectory(output_paths.annotation_dir.clone()),
        Step::MakeDirectory(output_paths.output_jar_dir.clone()),
    ];

    if !resources.is_empty() {
        steps.push(Step::CopyResources {
            mappings: resources.to_vec(),
        });
    }

    if !empty_sources {
        if let Some(parent) = output_paths.sources_list_path.parent() {
            steps.push(Step::MakeDirectory(parent.to_path_buf()));
        }
        steps.push(Step::MakeCleanDirectory(output_paths.working_dir.clone()));
    }

    steps
}

fn jar_setup_steps(jar: &JarParameters) -> Vec<Step> {
    match jar.jar_path.parent() {
        Some(parent) => vec![Step::MakeCleanDirectory(parent.to_path_buf())],
        None => Vec::new(),
    }
}

fn add_compile_steps(request: &CompileRequest, steps: &mut Vec<Step>) {
    match request.kind {
        CompileKind::Library => {
            assert!(
                request.abi_jar.is_none(),
                "library compile must not carry interface-jar parameters ({})",
                request.target,
            );
            let library_jar = request.library_jar.as_ref().unwrap_or_else(|| {
                panic!("library compile without jar parameters ({})", request.target)
            });
            assert!(
                library_jar
                    .entries
                    .contains(&request.parameters.output_paths.classes_dir),
                "library jar must package its own classes directory ({})",
                request.target,
            );

            steps.push(Step::Compile {
                kind: request.kind,
                compiler: request.compiler.clone(),
                parameters: request.parameters.clone(),
                abi_jar: None,
            });
            steps.push(Step::JarDirectory(library_jar.clone()));
        }
        CompileKind::SourceAbi | CompileKind::SourceOnlyAbi => {
            let abi_jar = request.abi_jar.as_ref().unwrap_or_else(|| {
                panic!("ABI compile without interface-jar parameters ({})", request.target)
            });
            steps.push(Step::Compile {
                kind: request.kind,
                compiler: request.compiler.clone(),
                parameters: request.parameters.clone(),
                abi_jar: Some(abi_jar.clone()),
            });
        }
    }
}
