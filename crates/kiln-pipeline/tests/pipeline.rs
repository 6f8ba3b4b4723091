use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use kiln_core::{AbiGenerationMode, ProcessorDescriptor, TargetId, VerificationPolicy};
use kiln_graph::BuildGraph;
use kiln_pipeline::{
    build_pipeline, CompilerConfig, ModuleDep, ModuleSpec, PipelineError, UnusedDependenciesAction,
    UnusedDependenciesConfig,
};
use kiln_steps::{CompileKind, ResolvedCompiler, Step};

fn module(base: &str) -> ModuleSpec {
    let mut module = ModuleSpec::new(
        TargetId::library(base),
        ResolvedCompiler::new("javac", vec!["-g".to_owned()]),
    );
    module.sources = vec![PathBuf::from("src/A.java"), PathBuf::from("src/B.java")];
    module
}

fn source_only_config() -> CompilerConfig {
    CompilerConfig {
        abi_generation_mode: AbiGenerationMode::SourceOnly,
        generate_source_abi: true,
        generate_source_only_abi: true,
        ..CompilerConfig::default()
    }
}

#[test]
fn artifactless_module_yields_only_the_library_node() {
    let graph = BuildGraph::new();
    let mut module = module("//lib:empty");
    module.sources.clear();
    let config = CompilerConfig::default();

    let node = build_pipeline(&graph, &module.target, &module, &config).unwrap();
    assert_eq!(node.id, module.target);
    assert!(node.output.is_none());
    assert_eq!(graph.constructed_ids(), vec![module.target.clone()]);

    let err = build_pipeline(&graph, &module.target.class_abi(), &module, &config).unwrap_err();
    assert!(matches!(err, PipelineError::VariantNotProduced { .. }));
}

#[test]
fn class_mode_module_yields_library_and_class_interface() {
    let graph = BuildGraph::new();
    let module = module("//lib:a");
    let config = CompilerConfig::default();

    let abi = build_pipeline(&graph, &module.target.class_abi(), &module, &config).unwrap();
    let library = graph.get(&module.target).unwrap();

    let mut ids = graph.constructed_ids();
    ids.sort();
    let mut expected = vec![module.target.clone(), module.target.class_abi()];
    expected.sort();
    assert_eq!(ids, expected);

    // The class interface is extracted from the finished library jar.
    assert_eq!(abi.deps, vec![module.target.clone()]);
    assert!(abi.steps.iter().any(|step| matches!(
        step,
        Step::ExtractClassAbi { library_jar, .. } if Some(library_jar) == library.output.as_ref()
    )));
}

#[test]
fn incompatible_processor_downgrades_source_only_to_source() {
    let graph = BuildGraph::new();
    let mut module = module("//lib:b");
    module.requested_abi_mode = Some(AbiGenerationMode::SourceOnly);
    module.processors = vec![ProcessorDescriptor::new("LegacyCodegen", true, false)];
    let config = source_only_config();

    let abi = build_pipeline(&graph, &module.target.source_abi(), &module, &config).unwrap();
    assert!(abi.steps.iter().any(|step| matches!(
        step,
        Step::Compile { kind: CompileKind::SourceAbi, abi_jar: Some(_), .. }
    )));

    // The library links to the source interface it pipelines with.
    let library = graph.get(&module.target).unwrap();
    assert!(library.deps.contains(&module.target.source_abi()));

    // No verification means no class interface and no comparison node.
    assert!(!graph.contains(&module.target.class_abi()));
    assert!(!graph.contains(&module.target.verified_source_abi()));
    assert!(!graph.contains(&module.target.source_only_abi()));
}

#[test]
fn source_only_mode_filters_processors_and_classpath() {
    let graph = BuildGraph::new();
    let mut module = module("//lib:c");
    module.processors = vec![
        ProcessorDescriptor::new("Immutables", true, true),
        ProcessorDescriptor::new("LoggerGen", false, false),
    ];
    module.deps = vec![
        ModuleDep::new(TargetId::library("//lib:x"), "out/x.jar").with_abi_output("out/x-abi.jar"),
        ModuleDep::new(TargetId::library("//lib:y"), "out/y.jar"),
    ];
    let config = source_only_config();

    let abi =
        build_pipeline(&graph, &module.target.source_only_abi(), &module, &config).unwrap();

    let compile = abi
        .steps
        .iter()
        .find_map(|step| match step {
            Step::Compile {
                kind: CompileKind::SourceOnlyAbi,
                parameters,
                abi_jar,
                ..
            } => Some((parameters, abi_jar)),
            _ => None,
        })
        .expect("source-only interface compile step");
    let (parameters, abi_jar) = compile;

    assert!(abi_jar.is_some());
    // Only ABI-affecting processors run during interface-only generation.
    assert_eq!(parameters.processors.len(), 1);
    assert_eq!(parameters.processors[0].name, "Immutables");
    // Only dependencies declared safe for interface-only compilation appear.
    assert_eq!(parameters.classpath, vec![PathBuf::from("out/x-abi.jar")]);
}

#[test]
fn verification_builds_the_full_node_family() {
    let graph = BuildGraph::new();
    let mut module = module("//lib:d");
    module.requested_abi_mode = Some(AbiGenerationMode::Source);
    module.verification = Some(VerificationPolicy::Fail);
    let config = CompilerConfig::default();

    let verified =
        build_pipeline(&graph, &module.target.verified_source_abi(), &module, &config).unwrap();

    for id in [
        module.target.clone(),
        module.target.source_abi(),
        module.target.class_abi(),
        module.target.verified_source_abi(),
    ] {
        assert!(graph.contains(&id), "missing node {id}");
    }
    assert!(!graph.contains(&module.target.source_only_abi()));

    let class_abi = graph.get(&module.target.class_abi()).unwrap();
    let source_abi = graph.get(&module.target.source_abi()).unwrap();
    assert_eq!(
        verified.deps,
        vec![module.target.class_abi(), module.target.source_abi()]
    );
    assert!(verified.steps.iter().any(|step| matches!(
        step,
        Step::CompareAbis { correct, experimental, policy, .. }
            if Some(correct) == class_abi.output.as_ref()
                && Some(experimental) == source_abi.output.as_ref()
                && *policy == VerificationPolicy::Fail
    )));
}

#[test]
fn compile_parameters_carry_the_resolved_module_policies() {
    let graph = BuildGraph::new();
    let mut module = module("//lib:policies");
    module.on_unused_dependencies = Some(UnusedDependenciesAction::Fail);
    module.source_level = Some("1.8".to_owned());
    let mut config = CompilerConfig::default();
    config.unused_dependencies = UnusedDependenciesConfig::WarnIfFail;

    let library = build_pipeline(&graph, &module.target, &module, &config).unwrap();

    let parameters = library
        .steps
        .iter()
        .find_map(|step| match step {
            Step::Compile { parameters, .. } => Some(parameters),
            _ => None,
        })
        .expect("library compile step");
    // warn-if-fail downgrades the module-local fail.
    assert_eq!(
        parameters.on_unused_dependencies,
        UnusedDependenciesAction::Warn
    );
    assert!(parameters.requires_desugar);
}

#[test]
fn migration_verifies_source_against_source_only() {
    let graph = BuildGraph::new();
    let mut module = module("//lib:m");
    module.requested_abi_mode = Some(AbiGenerationMode::MigratingToSourceOnly);
    module.verification = Some(VerificationPolicy::Log);
    let mut config = source_only_config();
    config.migrate_to_source_only_abi = true;

    let verified =
        build_pipeline(&graph, &module.target.verified_source_abi(), &module, &config).unwrap();

    assert_eq!(graph.constructed_ids().len(), 5);
    assert_eq!(
        verified.deps,
        vec![module.target.source_abi(), module.target.source_only_abi()]
    );
    let source_abi = graph.get(&module.target.source_abi()).unwrap();
    let source_only = graph.get(&module.target.source_only_abi()).unwrap();
    assert!(verified.steps.iter().any(|step| matches!(
        step,
        Step::CompareAbis { correct, experimental, policy, .. }
            if Some(correct) == source_abi.output.as_ref()
                && Some(experimental) == source_only.output.as_ref()
                && *policy == VerificationPolicy::Log
    )));
}

#[test]
fn construction_is_idempotent_across_variant_requests() {
    let graph = BuildGraph::new();
    let mut module = module("//lib:e");
    module.requested_abi_mode = Some(AbiGenerationMode::Source);
    let config = CompilerConfig::default();

    let abi = build_pipeline(&graph, &module.target.source_abi(), &module, &config).unwrap();
    let library = build_pipeline(&graph, &module.target, &module, &config).unwrap();
    let abi_again = build_pipeline(&graph, &module.target.source_abi(), &module, &config).unwrap();

    assert!(Arc::ptr_eq(&abi, &abi_again));
    assert!(Arc::ptr_eq(&library, &graph.get(&module.target).unwrap()));
}

#[test]
fn concurrent_requests_observe_one_node_family() {
    let graph = Arc::new(BuildGraph::new());
    let mut shared = module("//lib:f");
    shared.requested_abi_mode = Some(AbiGenerationMode::Source);
    shared.verification = Some(VerificationPolicy::Log);
    let module = Arc::new(shared);
    let config = Arc::new(CompilerConfig::default());

    let requests = [
        module.target.clone(),
        module.target.source_abi(),
        module.target.class_abi(),
        module.target.verified_source_abi(),
    ];

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let graph = Arc::clone(&graph);
            let module = Arc::clone(&module);
            let config = Arc::clone(&config);
            let requested = requests[i % requests.len()].clone();
            thread::spawn(move || build_pipeline(&graph, &requested, &module, &config).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(graph.constructed_ids().len(), 4);
    // Every library request got the identical node.
    let library = graph.get(&module.target).unwrap();
    let again = build_pipeline(&graph, &module.target, &module, &config).unwrap();
    assert!(Arc::ptr_eq(&library, &again));
}

#[test]
fn flavored_dependency_is_rejected() {
    let graph = BuildGraph::new();
    let mut module = module("//lib:g");
    module.deps = vec![ModuleDep::new(
        TargetId::library("//lib:x").source_abi(),
        "out/x.jar",
    )];
    let config = CompilerConfig::default();

    let err = build_pipeline(&graph, &module.target, &module, &config).unwrap_err();
    assert!(matches!(err, PipelineError::NonLibraryDep { .. }));
    assert!(err.to_string().contains("//lib:x#source-abi"));
    assert!(graph.constructed_ids().is_empty());
}
