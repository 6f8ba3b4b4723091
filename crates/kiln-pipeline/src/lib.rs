//! The library node pipeline.
//!
//! Given a module's declared sources, resources, dependencies, and compiler
//! configuration, this crate selects an ABI-generation strategy and constructs
//! the consistent set of interdependent build nodes (source-only interface,
//! source interface, library, class interface, verification) exactly once in
//! the shared build graph.

mod config;
mod mode;
mod module;
mod planner;
mod processor;

use thiserror::Error;

use kiln_core::TargetId;

pub use config::{
    resolve_unused_dependencies_action, CompileAgainstLibraryType, CompilerConfig,
    UnusedDependenciesAction, UnusedDependenciesConfig,
};
pub use mode::select_abi_mode;
pub use module::{
    extract_source_level, source_level_requires_desugar, ModuleDep, ModuleSpec,
};
pub use planner::{build_pipeline, LibraryPlanner};
pub use processor::{abi_processors_only, plugins_support_source_only_abi};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A declared dependency carries a variant tag; only library-shaped
    /// targets can be depended on directly.
    #[error("module `{module}` declares dependency `{dep}`, which is not a library target")]
    NonLibraryDep { module: TargetId, dep: TargetId },

    /// The requested variant is not produced by this module's configuration
    /// (for example, the source interface of a class-ABI module).
    #[error("target `{target}` does not produce the requested artifact variant")]
    VariantNotProduced { target: TargetId },
}
