//! Core identifiers and model types shared across the Kiln planning core.
//!
//! This crate is intentionally small and dependency-light.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetIdError {
    #[error("unrecognized variant tag `#{0}`")]
    UnknownVariant(String),
    #[error("empty target name")]
    Empty,
}

/// Which artifact of a module a target identifier refers to.
///
/// The suffix mapping is bit-exact: identifiers are cache keys visible across
/// machines, so every component that needs "the interface artifact for module
/// M" computes the identifier with this mapping rather than querying the
/// pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variant {
    Library,
    ClassAbi,
    SourceAbi,
    SourceOnlyAbi,
    VerifiedSourceAbi,
}

impl Variant {
    /// The identifier suffix for this variant. The unflavored identifier
    /// denotes the library.
    pub fn suffix(self) -> &'static str {
        match self {
            Variant::Library => "",
            Variant::ClassAbi => "#class-abi",
            Variant::SourceAbi => "#source-abi",
            Variant::SourceOnlyAbi => "#source-only-abi",
            Variant::VerifiedSourceAbi => "#verified-source-abi",
        }
    }

    fn from_tag(tag: &str) -> Option<Variant> {
        match tag {
            "class-abi" => Some(Variant::ClassAbi),
            "source-abi" => Some(Variant::SourceAbi),
            "source-only-abi" => Some(Variant::SourceOnlyAbi),
            "verified-source-abi" => Some(Variant::VerifiedSourceAbi),
            _ => None,
        }
    }
}

/// A globally unique name for a compilation unit, optionally carrying a
/// variant tag selecting which artifact is wanted.
///
/// Identifiers with different variant tags but the same base name refer to
/// co-dependent artifacts of the same module.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId {
    base: String,
    variant: Variant,
}

impl TargetId {
    pub fn new(base: impl Into<String>, variant: Variant) -> Self {
        Self {
            base: base.into(),
            variant,
        }
    }

    /// The unflavored library identifier for `base`.
    pub fn library(base: impl Into<String>) -> Self {
        Self::new(base, Variant::Library)
    }

    pub fn parse(s: &str) -> Result<Self, TargetIdError> {
        if s.is_empty() {
            return Err(TargetIdError::Empty);
        }
        match s.split_once('#') {
            None => Ok(Self::library(s)),
            Some(("", _)) => Err(TargetIdError::Empty),
            Some((base, tag)) => match Variant::from_tag(tag) {
                Some(variant) => Ok(Self::new(base, variant)),
                None => Err(TargetIdError::UnknownVariant(tag.to_owned())),
            },
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn is_library(&self) -> bool {
        self.variant == Variant::Library
    }

    pub fn with_variant(&self, variant: Variant) -> TargetId {
        TargetId {
            base: self.base.clone(),
            variant,
        }
    }

    /// The library identifier this identifier is a variant of.
    pub fn library_target(&self) -> TargetId {
        self.with_variant(Variant::Library)
    }

    pub fn class_abi(&self) -> TargetId {
        self.with_variant(Variant::ClassAbi)
    }

    pub fn source_abi(&self) -> TargetId {
        self.with_variant(Variant::SourceAbi)
    }

    pub fn source_only_abi(&self) -> TargetId {
        self.with_variant(Variant::SourceOnlyAbi)
    }

    pub fn verified_source_abi(&self) -> TargetId {
        self.with_variant(Variant::VerifiedSourceAbi)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.variant.suffix())
    }
}

impl FromStr for TargetId {
    type Err = TargetIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetId::parse(s)
    }
}

/// How a module's interface (ABI) artifact is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbiGenerationMode {
    /// Strip the interface out of the fully compiled classes.
    Class,
    /// Compile the interface from source against the full dependency ABIs.
    Source,
    /// Compile the interface from source against interface-only dependencies.
    SourceOnly,
    /// Like `Source`, but also produce the source-only interface so the two
    /// can be compared during migration.
    MigratingToSourceOnly,
}

impl AbiGenerationMode {
    /// True for modes whose interface artifact is compiled from source.
    pub fn is_source_abi(self) -> bool {
        matches!(
            self,
            AbiGenerationMode::Source | AbiGenerationMode::MigratingToSourceOnly
        )
    }

    /// True for modes that produce a source-only interface artifact.
    pub fn is_source_only_abi(self) -> bool {
        matches!(
            self,
            AbiGenerationMode::SourceOnly | AbiGenerationMode::MigratingToSourceOnly
        )
    }
}

/// Whether (and how hard) a source ABI is verified against a trusted ABI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationPolicy {
    #[default]
    Off,
    /// Log mismatches but let the build continue.
    Log,
    /// Fail the verification step on mismatch.
    Fail,
}

/// The action taken when a declared dependency turns out to be unused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnusedDependenciesAction {
    Ignore,
    Warn,
    Fail,
}

/// Capability flags for one annotation processor.
///
/// A processor disqualifies interface-only generation if it affects the ABI
/// and cannot run during interface generation from source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorDescriptor {
    pub name: String,
    pub affects_abi: bool,
    pub supports_abi_from_source: bool,
}

impl ProcessorDescriptor {
    pub fn new(name: impl Into<String>, affects_abi: bool, supports_abi_from_source: bool) -> Self {
        Self {
            name: name.into(),
            affects_abi,
            supports_abi_from_source,
        }
    }
}
