//! Versioned plugin coordinate registry.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::error::GenerateError;

/// Registry document version this build understands.
pub const REGISTRY_VERSION: u32 = 1;

const BUNDLED_REGISTRY: &str = include_str!("../../assets/plugin-registry.toml");

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    version: u32,
    #[serde(default)]
    plugins: BTreeMap<String, String>,
    #[serde(default, rename = "rewrite")]
    rewrites: Vec<VersionRewrite>,
}

/// Replaces the version of coordinates under `prefix` that end in `from`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionRewrite {
    pub prefix: String,
    pub from: String,
    pub to: String,
}

impl VersionRewrite {
    fn apply(&self, gav: &str) -> Option<String> {
        let suffix = format!(":{}", self.from);
        if gav.starts_with(&self.prefix) && gav.ends_with(&suffix) {
            let head = &gav[..gav.len() - suffix.len()];
            Some(format!("{head}:{}", self.to))
        } else {
            None
        }
    }
}

/// Maps `id:version` plugin keys to published coordinates.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, String>,
    rewrites: Vec<VersionRewrite>,
}

impl PluginRegistry {
    /// Registry shipped with the crate.
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_toml_str(BUNDLED_REGISTRY).context("Bundled plugin registry is invalid")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plugin registry: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse plugin registry: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let doc: RegistryDocument =
            toml::from_str(content).map_err(|e| crate::config::parser::enhance_toml_error(e, content))?;
        if doc.version != REGISTRY_VERSION {
            return Err(GenerateError::UnsupportedRegistryVersion(doc.version).into());
        }
        debug!(
            plugins = doc.plugins.len(),
            rewrites = doc.rewrites.len(),
            "Loaded plugin registry"
        );
        Ok(Self {
            plugins: doc.plugins,
            rewrites: doc.rewrites,
        })
    }

    pub fn with_entry(mut self, key: impl Into<String>, gav: impl Into<String>) -> Self {
        self.plugins.insert(key.into(), gav.into());
        self
    }

    /// Published coordinate for `id:version`, after version rewrites.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let gav = self.plugins.get(key)?;
        let rewritten = self.rewrites.iter().find_map(|rule| rule.apply(gav));
        Some(rewritten.unwrap_or_else(|| gav.clone()))
    }

    /// Like [`lookup`](Self::lookup), but a missing entry is a fatal error.
    pub fn coordinate_for(&self, id: &str, version: &str) -> Result<String, GenerateError> {
        let key = format!("{id}:{version}");
        self.lookup(&key)
            .ok_or(GenerateError::UnknownPluginCoordinate { key })
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
