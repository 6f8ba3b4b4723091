use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use kiln_core::{TargetId, Variant};

/// Per-target output layout under the build output root.
///
/// Every path is derived deterministically from the target identifier so that
/// any component can compute the layout without asking the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerOutputPaths {
    /// Where compiled classes (and copied resources) land.
    pub classes_dir: PathBuf,
    /// Output directory for annotation-processor generated sources.
    pub annotation_dir: PathBuf,
    /// Directory holding the output jar.
    pub output_jar_dir: PathBuf,
    /// The output jar itself.
    pub jar_path: PathBuf,
    /// The "source file list" artifact handed to the compiler.
    pub sources_list_path: PathBuf,
    /// Scratch space for the compiler invocation.
    pub working_dir: PathBuf,
}

impl CompilerOutputPaths {
    pub fn for_target(out_root: &Path, target: &TargetId) -> Self {
        let dir = target_dir(out_root, target);
        let jar_dir = dir.join("jar");
        let jar_path = jar_dir.join(format!("{}.jar", short_name(target.base())));
        Self {
            classes_dir: dir.join("classes"),
            annotation_dir: dir.join("annotations"),
            output_jar_dir: jar_dir,
            jar_path,
            sources_list_path: dir.join("srcs").join("__srcs__"),
            working_dir: dir.join("working"),
        }
    }

    /// The used-class dependency-file artifact recorded for unused-dependency
    /// analysis.
    pub fn dep_file_path(&self) -> PathBuf {
        self.output_jar_dir.join("used-classes.json")
    }
}

fn variant_dir_name(variant: Variant) -> &'static str {
    match variant {
        Variant::Library => "library",
        Variant::ClassAbi => "class-abi",
        Variant::SourceAbi => "source-abi",
        Variant::SourceOnlyAbi => "source-only-abi",
        Variant::VerifiedSourceAbi => "verified-source-abi",
    }
}

/// `//java/com/example:util#source-abi` lands in
/// `<root>/java/com/example/util__source-abi`. The package path is kept as
/// real directory components, so the mapping is injective: distinct targets
/// never share an output directory.
fn target_dir(out_root: &Path, target: &TargetId) -> PathBuf {
    let base = target.base().trim_start_matches("//");
    let (package, name) = base.split_once(':').unwrap_or(("", base));
    let mut dir = out_root.to_path_buf();
    for component in package.split('/').filter(|c| !c.is_empty()) {
        dir.push(component);
    }
    dir.push(format!("{}__{}", name, variant_dir_name(target.variant())));
    dir
}

/// The part of the base name after the last `:`, used for the jar file name.
fn short_name(base: &str) -> &str {
    base.rsplit(':').next().unwrap_or(base)
}
