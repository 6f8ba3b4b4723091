//! Build-step model and the compile-step factory.
//!
//! Turns a fully-resolved compilation request (sources, resources, output
//! layout, jar packaging parameters) into an ordered list of build steps.
//! Steps are plain data; executing them is the job of an external step
//! executor.

mod factory;
mod jar;
mod paths;
mod step;

pub use factory::{compile_steps, CompileRequest, CompilerParameters, StepPlan};
pub use jar::{JarParameters, RemovePatterns};
pub use paths::CompilerOutputPaths;
pub use step::{CompileKind, ResolvedCompiler, Step};
