use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use kiln_core::{AbiGenerationMode, VerificationPolicy};

use crate::factory::CompilerParameters;
use crate::jar::JarParameters;

/// An opaque, resolved compiler invocation handle.
///
/// Resolved ahead of planning and passed through to build steps unchanged so
/// the step list stays cacheable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCompiler {
    pub executable: PathBuf,
    pub flags: Vec<String>,
}

impl ResolvedCompiler {
    pub fn new(executable: impl Into<PathBuf>, flags: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            flags,
        }
    }
}

/// Which artifact a compile step produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompileKind {
    /// Full compilation; the jar is packaged by a separate step afterwards.
    Library,
    /// Interface compiled from source against the full compile classpath.
    SourceAbi,
    /// Interface compiled from source against interface-only dependencies.
    SourceOnlyAbi,
}

/// One build step, as plain data for the external step executor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Delete and recreate a directory.
    MakeCleanDirectory(PathBuf),
    /// Create a directory (and parents) if missing.
    MakeDirectory(PathBuf),
    /// Copy or link declared resources into the classes directory.
    CopyResources { mappings: Vec<(PathBuf, PathBuf)> },
    /// Invoke the compiler. For ABI kinds the compiler writes the interface
    /// jar itself, so the jar parameters ride along.
    Compile {
        kind: CompileKind,
        compiler: ResolvedCompiler,
        parameters: CompilerParameters,
        abi_jar: Option<JarParameters>,
    },
    /// Package a directory tree into a jar.
    JarDirectory(JarParameters),
    /// Strip a compiled library jar down to its class interface.
    ExtractClassAbi {
        library_jar: PathBuf,
        output_jar: PathBuf,
        compatibility_mode: AbiGenerationMode,
    },
    /// Compare a trusted interface jar against an experimental one.
    CompareAbis {
        correct: PathBuf,
        experimental: PathBuf,
        output_jar: PathBuf,
        policy: VerificationPolicy,
    },
}
