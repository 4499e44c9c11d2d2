//! Build tool plugins, their propagation into the shared module and the
//! coordinate registry used to publish them.

mod aggregator;
mod registry;

use std::fmt;

use serde::Serialize;

use crate::dependency::CoordinateResolver;

pub use aggregator::{ExclusionReason, PluginAggregator, PropagationDefault, PropagationPolicy};
pub use registry::{PluginRegistry, REGISTRY_VERSION, VersionRewrite};

/// Fat jar packaging plugin, always present in the shared module.
pub const PLUGIN_SHADOW: &str = "com.github.johnrengelman.shadow";
/// Azure Functions plugin for Gradle builds.
pub const PLUGIN_GRADLE_AZURE_FUNCTIONS: &str = "com.microsoft.azure.azurefunctions";
/// Azure Functions plugin for Maven builds.
pub const PLUGIN_MAVEN_AZURE_FUNCTIONS: &str = "azure-functions-maven-plugin";
/// Application plugin marker.
pub const PLUGIN_APPLICATION: &str = "io.micronaut.application";
/// Library plugin marker.
pub const PLUGIN_LIBRARY: &str = "io.micronaut.library";

/// Plugin applied from a Gradle build script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GradlePlugin {
    pub id: String,
    pub version: Option<String>,
    /// Artifact whose published version becomes the plugin version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_artifact_id: Option<String>,
}

impl GradlePlugin {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
            lookup_artifact_id: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_lookup(mut self, artifact_id: impl Into<String>) -> Self {
        self.lookup_artifact_id = Some(artifact_id.into());
        self
    }
}

/// Plugin declared in a Maven POM.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MavenPlugin {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    #[serde(skip)]
    pub requires_lookup: bool,
}

impl MavenPlugin {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: Some(group_id.into()),
            artifact_id: artifact_id.into(),
            version: None,
            requires_lookup: false,
        }
    }

    /// A plugin known only by artifact id; group and version are looked up.
    pub fn lookup(artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: None,
            artifact_id: artifact_id.into(),
            version: None,
            requires_lookup: true,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "tool", rename_all = "lowercase")]
pub enum BuildPlugin {
    Gradle(GradlePlugin),
    Maven(MavenPlugin),
}

impl BuildPlugin {
    /// Gradle plugin id, or Maven artifact id.
    pub fn identifier(&self) -> &str {
        match self {
            BuildPlugin::Gradle(p) => &p.id,
            BuildPlugin::Maven(p) => &p.artifact_id,
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            BuildPlugin::Gradle(p) => p.version.as_deref(),
            BuildPlugin::Maven(p) => p.version.as_deref(),
        }
    }

    pub fn requires_lookup(&self) -> bool {
        match self {
            BuildPlugin::Gradle(p) => p.lookup_artifact_id.is_some() && p.version.is_none(),
            BuildPlugin::Maven(p) => p.requires_lookup,
        }
    }

    pub fn is_gradle_id(&self, id: &str) -> bool {
        matches!(self, BuildPlugin::Gradle(p) if p.id == id)
    }

    /// Copy of this plugin with its coordinate filled in by `resolver`.
    pub fn resolved(&self, resolver: &dyn CoordinateResolver) -> anyhow::Result<Self> {
        match self {
            BuildPlugin::Gradle(p) => {
                let Some(artifact) = &p.lookup_artifact_id else {
                    return Ok(self.clone());
                };
                let coordinate = resolver.resolve(artifact)?;
                Ok(BuildPlugin::Gradle(GradlePlugin {
                    id: p.id.clone(),
                    version: Some(coordinate.version),
                    lookup_artifact_id: None,
                }))
            }
            BuildPlugin::Maven(p) => {
                let coordinate = resolver.resolve(&p.artifact_id)?;
                Ok(BuildPlugin::Maven(MavenPlugin {
                    group_id: Some(coordinate.group_id),
                    artifact_id: coordinate.artifact_id,
                    version: Some(coordinate.version),
                    requires_lookup: false,
                }))
            }
        }
    }
}

impl From<GradlePlugin> for BuildPlugin {
    fn from(plugin: GradlePlugin) -> Self {
        BuildPlugin::Gradle(plugin)
    }
}

impl From<MavenPlugin> for BuildPlugin {
    fn from(plugin: MavenPlugin) -> Self {
        BuildPlugin::Maven(plugin)
    }
}

impl fmt::Display for BuildPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())?;
        if let Some(version) = self.version() {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}
