use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

/// Read access to the platform runtime classpath: "list every compiled class
/// under package P, recursively".
///
/// The platform classpath is assumed always readable; an enumeration failure
/// is fatal for the availability resolver.
pub trait PlatformClassIndex {
    /// Binary names of all class files in `package` and its subpackages.
    /// `package` may be empty for the default package.
    fn list_package_classes(&self, package: &str) -> io::Result<Vec<String>>;
}

/// Platform index over an exploded class directory (for example an extracted
/// `java.base`).
#[derive(Clone, Debug)]
pub struct DirPlatformIndex {
    root: PathBuf,
}

impl DirPlatformIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PlatformClassIndex for DirPlatformIndex {
    fn list_package_classes(&self, package: &str) -> io::Result<Vec<String>> {
        let dir = if package.is_empty() {
            self.root.clone()
        } else {
            self.root.join(package.replace('.', "/"))
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for entry in walkdir::WalkDir::new(&dir).follow_links(false) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension() != Some(OsStr::new("class")) {
                continue;
            }
            if let Some(binary) = binary_name(&self.root, entry.path()) {
                if is_ignored_class(&binary) {
                    continue;
                }
                out.push(binary);
            }
        }
        out.sort();
        Ok(out)
    }
}

fn binary_name(root: &Path, class_file: &Path) -> Option<String> {
    let rel = class_file.strip_prefix(root).ok()?;
    let stem = rel.with_extension("");
    let mut parts = Vec::new();
    for component in stem.components() {
        parts.push(component.as_os_str().to_str()?.to_owned());
    }
    Some(parts.join("."))
}

fn is_ignored_class(binary_name: &str) -> bool {
    binary_name == "module-info"
        || binary_name == "package-info"
        || binary_name.ends_with(".package-info")
        || binary_name.ends_with(".module-info")
}
