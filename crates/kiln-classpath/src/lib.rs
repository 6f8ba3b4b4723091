//! Symbol availability resolution for interface-only compilation.
//!
//! While compiling a module's public surface against only its dependencies'
//! interface artifacts, the compiler host asks this crate whether a referenced
//! class is visibly available: either some dependency contributes it on the
//! interface-only classpath, or it lives on the platform runtime classpath.
//! The owning-module lookup doubles as the diagnostics source ("add a dep on
//! module X").

mod platform;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use thiserror::Error;

use kiln_core::TargetId;

pub use platform::{DirPlatformIndex, PlatformClassIndex};

#[derive(Debug, Error)]
pub enum ClasspathError {
    #[error("failed to list platform classpath contents for package `{package}`: {source}")]
    PlatformList {
        package: String,
        #[source]
        source: std::io::Error,
    },
}

/// The compiled classes one module contributes to a classpath, queryable by
/// relative class-file path.
#[derive(Clone, Debug)]
pub struct ModuleClasses {
    module: TargetId,
    class_files: HashSet<String>,
}

impl ModuleClasses {
    pub fn new(module: TargetId, class_files: impl IntoIterator<Item = String>) -> Self {
        Self {
            module,
            class_files: class_files.into_iter().collect(),
        }
    }

    pub fn module(&self) -> &TargetId {
        &self.module
    }

    pub fn contains(&self, class_file_path: &str) -> bool {
        self.class_files.contains(class_file_path)
    }
}

/// An ordered sequence of module containment predicates.
#[derive(Clone, Debug, Default)]
pub struct ClasspathIndex {
    entries: Vec<ModuleClasses>,
}

impl ClasspathIndex {
    pub fn new(entries: Vec<ModuleClasses>) -> Self {
        Self { entries }
    }

    /// The first module whose classes contain `class_file_path`, scanning in
    /// classpath order.
    pub fn owning_module(&self, class_file_path: &str) -> Option<&TargetId> {
        self.entries
            .iter()
            .find(|entry| entry.contains(class_file_path))
            .map(ModuleClasses::module)
    }
}

/// Relative `.class` path for the top-level type enclosing `binary_name`.
///
/// Nested classes are compiled into the same artifact as their enclosing
/// top-level class, so availability is decided by the top-level class file.
pub fn class_file_path(binary_name: &str) -> String {
    let top_level = match binary_name.split_once('$') {
        Some((outer, _)) => outer,
        None => binary_name,
    };
    format!("{}.class", top_level.replace('.', "/"))
}

/// The package part of a binary name, or the empty string for the default
/// package.
pub fn package_name(binary_name: &str) -> &str {
    match binary_name.rsplit_once('.') {
        Some((package, _)) => package,
        None => "",
    }
}

/// Per-compilation availability resolver.
///
/// One resolver is created per interface-only compilation run; its platform
/// package cache is populated lazily per package and never invalidated within
/// the run.
pub struct AbiAvailability<P> {
    full_classpath: ClasspathIndex,
    abi_classpath: ClasspathIndex,
    platform: P,
    module: TargetId,
    required_for_source_only_abi: bool,
    package_contents: RefCell<HashMap<String, HashSet<String>>>,
}

impl<P: PlatformClassIndex> AbiAvailability<P> {
    pub fn new(
        full_classpath: ClasspathIndex,
        abi_classpath: ClasspathIndex,
        platform: P,
        module: TargetId,
        required_for_source_only_abi: bool,
    ) -> Self {
        Self {
            full_classpath,
            abi_classpath,
            platform,
            module,
            required_for_source_only_abi,
            package_contents: RefCell::new(HashMap::new()),
        }
    }

    /// The module being compiled, for diagnostics.
    pub fn module(&self) -> &TargetId {
        &self.module
    }

    /// Whether downstream source-only generation requires this module's
    /// interface artifact.
    pub fn required_for_source_only_abi(&self) -> bool {
        self.required_for_source_only_abi
    }

    /// The module that owns `binary_name` on the full classpath, for
    /// diagnostics.
    pub fn owning_module(&self, binary_name: &str) -> Option<&TargetId> {
        self.full_classpath
            .owning_module(&class_file_path(binary_name))
    }

    fn owning_module_if_available(&self, binary_name: &str) -> Option<&TargetId> {
        self.abi_classpath
            .owning_module(&class_file_path(binary_name))
    }

    /// A class may be used during interface-only compilation iff a dependency
    /// contributes it on the interface-only classpath, or it is present on
    /// the platform runtime classpath.
    pub fn is_available_for_interface_only(
        &self,
        binary_name: &str,
    ) -> Result<bool, ClasspathError> {
        if self.owning_module_if_available(binary_name).is_some() {
            return Ok(true);
        }
        self.class_is_on_platform(binary_name)
    }

    fn class_is_on_platform(&self, binary_name: &str) -> Result<bool, ClasspathError> {
        let package = package_name(binary_name);
        let mut cache = self.package_contents.borrow_mut();
        if !cache.contains_key(package) {
            let classes = self.platform.list_package_classes(package).map_err(|source| {
                ClasspathError::PlatformList {
                    package: package.to_owned(),
                    source,
                }
            })?;
            cache.insert(package.to_owned(), classes.into_iter().collect());
        }
        Ok(cache[package].contains(binary_name))
    }
}
