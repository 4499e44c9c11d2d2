//! Schema of the generator's `cloudgen.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::capability::Selection;
use crate::dependency::StaticCoordinateResolver;
use crate::partition::SingletonPolicy;
use crate::plugin::PluginRegistry;
use crate::project::Project;
use crate::types::{
    ApplicationType, BuildTool, GeneratorOptions, Language, Target, TestFramework,
};

/// Root of `cloudgen.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub selection: SelectionSection,

    /// Path to a plugin coordinate registry; the bundled registry is used when unset.
    #[serde(default)]
    pub plugin_registry: Option<PathBuf>,

    /// Artifact id -> `group:artifact:version` entries for the coordinate resolver.
    #[serde(default)]
    pub coordinates: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Fully qualified application name, e.g. `com.example.demo`.
    #[serde(default = "default_project_name")]
    pub name: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: default_project_name(),
        }
    }
}

fn default_project_name() -> String {
    "com.example.demo".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default)]
    pub tool: BuildTool,

    /// Kept as text so an unsupported language surfaces as a generation error.
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub test_framework: TestFramework,

    #[serde(default)]
    pub application_type: ApplicationType,

    #[serde(default = "default_platform_version")]
    pub platform_version: String,

    #[serde(default)]
    pub bom_suffix: String,

    #[serde(default = "default_example_code")]
    pub example_code: bool,

    #[serde(default)]
    pub singleton_policy: SingletonPolicy,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            tool: BuildTool::default(),
            language: default_language(),
            test_framework: TestFramework::default(),
            application_type: ApplicationType::default(),
            platform_version: default_platform_version(),
            bom_suffix: String::new(),
            example_code: default_example_code(),
            singleton_policy: SingletonPolicy::default(),
        }
    }
}

fn default_language() -> String {
    Language::default().name().to_string()
}

fn default_platform_version() -> String {
    GeneratorOptions::default().platform_version
}

fn default_example_code() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionSection {
    /// Capability names explicitly chosen by the user.
    #[serde(default)]
    pub features: Vec<String>,

    /// Capability name -> targets it should also apply to.
    #[serde(default)]
    pub propagate: BTreeMap<String, Vec<String>>,
}

impl GeneratorConfig {
    pub fn project(&self) -> Project {
        Project::parse(&self.project.name)
    }

    pub fn options(&self) -> anyhow::Result<GeneratorOptions> {
        let build = &self.build;
        Ok(GeneratorOptions {
            build_tool: build.tool,
            language: build.language.parse::<Language>()?,
            test_framework: build.test_framework,
            application_type: build.application_type,
            example_code: build.example_code,
            platform_version: build.platform_version.clone(),
            bom_suffix: build.bom_suffix.clone(),
            singleton_policy: build.singleton_policy,
        })
    }

    pub fn selection(&self) -> anyhow::Result<Selection> {
        let mut selection = Selection::new();
        for name in &self.selection.features {
            selection.select(name);
        }
        for (name, targets) in &self.selection.propagate {
            for target in targets {
                selection.propagate(name, target.parse::<Target>()?);
            }
        }
        Ok(selection)
    }

    pub fn resolver(&self) -> anyhow::Result<StaticCoordinateResolver> {
        let mut resolver = StaticCoordinateResolver::new();
        for (artifact, gav) in &self.coordinates {
            resolver.insert_gav(artifact, gav)?;
        }
        Ok(resolver)
    }

    /// Loads the configured plugin registry, resolving relative paths
    /// against `base_dir`.
    pub fn plugin_registry(&self, base_dir: &Path) -> anyhow::Result<PluginRegistry> {
        match &self.plugin_registry {
            Some(path) if path.is_absolute() => PluginRegistry::load(path),
            Some(path) => PluginRegistry::load(&base_dir.join(path)),
            None => PluginRegistry::bundled(),
        }
    }
}
