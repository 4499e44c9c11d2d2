//! Shared core types used across the partitioning, store and routing layers.

mod options;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::GenerateError;

pub use options::{ApplicationType, BuildTool, GeneratorOptions, Language, TestFramework};

/// Deployment targets, plus the `Shared` sentinel for the library module.
///
/// The derived ordering is the identifier order (`AWS` < `AZURE` < `GCP` <
/// `OCI`), with `Shared` last. Targets are applied in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Target {
    Aws,
    Azure,
    Gcp,
    Oci,
    /// Library/common scope.
    Shared,
}

impl Target {
    /// Every concrete (non-shared) target.
    pub const CLOUDS: [Target; 4] = [Target::Aws, Target::Azure, Target::Gcp, Target::Oci];

    pub fn is_shared(self) -> bool {
        self == Target::Shared
    }

    pub fn identifier(self) -> &'static str {
        match self {
            Target::Aws => "AWS",
            Target::Azure => "AZURE",
            Target::Gcp => "GCP",
            Target::Oci => "OCI",
            Target::Shared => "SHARED",
        }
    }

    /// Name of the output module this target writes into.
    pub fn module_name(self) -> &'static str {
        self.module().name()
    }

    pub fn module(self) -> Module {
        match self {
            Target::Shared => Module::Lib,
            cloud => Module::Target(cloud),
        }
    }

    /// Runtime environment activated by default in the target's application.
    pub fn environment_name(self) -> Option<&'static str> {
        match self {
            Target::Aws => Some("ec2"),
            Target::Azure => Some("azure"),
            Target::Gcp => Some("gcp"),
            Target::Oci => Some("oraclecloud"),
            Target::Shared => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for Target {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AWS" => Ok(Target::Aws),
            "AZURE" => Ok(Target::Azure),
            "GCP" => Ok(Target::Gcp),
            "OCI" => Ok(Target::Oci),
            "SHARED" | "NONE" | "LIB" => Ok(Target::Shared),
            _ => Err(GenerateError::UnknownTarget(s.to_string())),
        }
    }
}

/// Output module a template is written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Module {
    /// The aggregate project root.
    Root,
    /// Placeholder used by capabilities that do not know their module yet.
    Default,
    /// The shared library module.
    Lib,
    /// Application module of a single-module layout.
    App,
    Target(Target),
}

impl Module {
    pub fn name(self) -> &'static str {
        match self {
            Module::Root => "root",
            Module::Default => "default",
            Module::Lib | Module::Target(Target::Shared) => "lib",
            Module::App => "app",
            Module::Target(Target::Aws) => "aws",
            Module::Target(Target::Azure) => "azure",
            Module::Target(Target::Gcp) => "gcp",
            Module::Target(Target::Oci) => "oci",
        }
    }

    /// `Target(Shared)` is spelled `Lib`; every other module is unchanged.
    pub fn canonical(self) -> Self {
        match self {
            Module::Target(Target::Shared) => Module::Lib,
            other => other,
        }
    }

    /// Whether this is the shared module or a placeholder that resolves to it.
    pub fn is_shared_or_default(self) -> bool {
        matches!(
            self,
            Module::Lib | Module::App | Module::Default | Module::Target(Target::Shared)
        )
    }
}

impl From<Target> for Module {
    fn from(target: Target) -> Self {
        target.module()
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Module {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_sort_by_identifier_with_shared_last() {
        let mut targets = vec![Target::Shared, Target::Oci, Target::Aws, Target::Gcp, Target::Azure];
        targets.sort();
        assert_eq!(
            targets,
            vec![Target::Aws, Target::Azure, Target::Gcp, Target::Oci, Target::Shared]
        );
    }

    #[test]
    fn shared_target_maps_to_lib_module() {
        assert_eq!(Target::Shared.module(), Module::Lib);
        assert_eq!(Target::Aws.module_name(), "aws");
        assert_eq!(Module::from(Target::Oci).name(), "oci");
        assert_eq!(Module::Target(Target::Shared).canonical(), Module::Lib);
        assert_eq!(Module::Target(Target::Gcp).canonical(), Module::Target(Target::Gcp));
    }

    #[test]
    fn parse_target_is_case_insensitive() {
        assert_eq!("aws".parse::<Target>().unwrap(), Target::Aws);
        assert_eq!("Gcp".parse::<Target>().unwrap(), Target::Gcp);
        assert!(matches!(
            "mars".parse::<Target>(),
            Err(GenerateError::UnknownTarget(_))
        ));
    }
}
