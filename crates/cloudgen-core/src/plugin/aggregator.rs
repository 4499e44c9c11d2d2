//! Per-target plugin sets and their fold into the shared module.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{
    BuildPlugin, PLUGIN_APPLICATION, PLUGIN_GRADLE_AZURE_FUNCTIONS, PLUGIN_LIBRARY,
    PLUGIN_MAVEN_AZURE_FUNCTIONS, PLUGIN_SHADOW, PluginRegistry,
};
use crate::dependency::CoordinateResolver;
use crate::store::ScopedStore;
use crate::types::{ApplicationType, Target};

/// What happens to a plugin the policy has no explicit entry for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropagationDefault {
    /// Copy it into the shared module.
    #[default]
    Propagate,
    /// Keep it in the target module only.
    Exclude,
}

/// Why a plugin is kept out of the shared module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Only meaningful for one target's runtime.
    TargetSpecific,
    /// The shared module already applies it.
    AlreadyShared,
}

/// Decides whether a plugin added under a concrete target is copied into
/// the shared module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationPolicy {
    default: PropagationDefault,
    exclusions: BTreeMap<String, ExclusionReason>,
    inclusions: BTreeSet<String>,
}

impl Default for PropagationPolicy {
    fn default() -> Self {
        Self::new(PropagationDefault::Propagate)
            .exclude(PLUGIN_GRADLE_AZURE_FUNCTIONS, ExclusionReason::TargetSpecific)
            .exclude(PLUGIN_MAVEN_AZURE_FUNCTIONS, ExclusionReason::TargetSpecific)
            .exclude(PLUGIN_SHADOW, ExclusionReason::AlreadyShared)
            .exclude(PLUGIN_APPLICATION, ExclusionReason::AlreadyShared)
            .exclude(PLUGIN_LIBRARY, ExclusionReason::AlreadyShared)
    }
}

impl PropagationPolicy {
    /// Empty policy with the given default.
    pub fn new(default: PropagationDefault) -> Self {
        Self {
            default,
            exclusions: BTreeMap::new(),
            inclusions: BTreeSet::new(),
        }
    }

    /// Never propagate plugins with this identifier.
    pub fn exclude(mut self, identifier: impl Into<String>, reason: ExclusionReason) -> Self {
        let identifier = identifier.into();
        self.inclusions.remove(&identifier);
        self.exclusions.insert(identifier, reason);
        self
    }

    /// Always propagate plugins with this identifier.
    pub fn include(mut self, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        self.exclusions.remove(&identifier);
        self.inclusions.insert(identifier);
        self
    }

    pub fn default_behavior(&self) -> PropagationDefault {
        self.default
    }

    pub fn exclusion(&self, plugin: &BuildPlugin) -> Option<ExclusionReason> {
        self.exclusions.get(plugin.identifier()).copied()
    }

    pub fn should_propagate(&self, plugin: &BuildPlugin) -> bool {
        let id = plugin.identifier();
        if self.exclusions.contains_key(id) {
            return false;
        }
        if self.inclusions.contains(id) {
            return true;
        }
        self.default == PropagationDefault::Propagate
    }
}

/// Build plugin sets keyed by target.
#[derive(Debug, Clone, Default)]
pub struct PluginAggregator {
    plugins: ScopedStore<BTreeSet<BuildPlugin>>,
    policy: PropagationPolicy,
}

impl PluginAggregator {
    pub fn new(policy: PropagationPolicy) -> Self {
        Self {
            plugins: ScopedStore::default(),
            policy,
        }
    }

    pub fn policy(&self) -> &PropagationPolicy {
        &self.policy
    }

    /// Adds `plugin` to `scope`, resolving its coordinate first if needed.
    ///
    /// Under a concrete target the plugin is also copied into the shared
    /// set unless the policy excludes it.
    pub fn add(
        &mut self,
        scope: Target,
        plugin: BuildPlugin,
        resolver: &dyn CoordinateResolver,
    ) -> anyhow::Result<()> {
        let plugin = if plugin.requires_lookup() {
            plugin.resolved(resolver)?
        } else {
            plugin
        };

        if !scope.is_shared() {
            if self.policy.should_propagate(&plugin) {
                self.plugins.base_mut().insert(plugin.clone());
            } else {
                debug!(
                    plugin = %plugin,
                    target = %scope,
                    reason = ?self.policy.exclusion(&plugin),
                    "Plugin kept out of shared module"
                );
            }
        }
        self.plugins
            .get_or_insert_with(scope, BTreeSet::new)
            .insert(plugin);
        Ok(())
    }

    /// Plugins stored for `scope`; empty for a target with none.
    pub fn plugins(&self, scope: Target) -> BTreeSet<&BuildPlugin> {
        self.plugins
            .get(scope)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    /// Plugins the build description of `scope` should apply.
    ///
    /// For function builds the shared module applies every plugin of every
    /// module except the application marker.
    pub fn view(&self, scope: Target, application_type: ApplicationType) -> BTreeSet<&BuildPlugin> {
        if scope.is_shared() && application_type == ApplicationType::Function {
            return self
                .all_plugins()
                .into_iter()
                .filter(|plugin| !plugin.is_gradle_id(PLUGIN_APPLICATION))
                .collect();
        }
        self.plugins(scope)
    }

    /// Union of every module's plugins.
    pub fn all_plugins(&self) -> BTreeSet<&BuildPlugin> {
        self.plugins
            .iter_all()
            .flat_map(|(_, set)| set.iter())
            .collect()
    }

    /// Targets with a plugin set, shared first.
    pub fn scopes(&self) -> impl Iterator<Item = (Target, &BTreeSet<BuildPlugin>)> {
        self.plugins.iter_all()
    }

    /// Published coordinates of every versioned Gradle plugin across all
    /// modules.
    ///
    /// Plugins without a version are applied by convention and skipped. A
    /// versioned plugin missing from `registry` fails the run.
    pub fn coordinates(&self, registry: &PluginRegistry) -> anyhow::Result<BTreeSet<String>> {
        let mut gavs = BTreeSet::new();
        for plugin in self.all_plugins() {
            let BuildPlugin::Gradle(gradle) = plugin else {
                continue;
            };
            let Some(version) = gradle.version.as_deref() else {
                continue;
            };
            gavs.insert(registry.coordinate_for(&gradle.id, version)?);
        }
        Ok(gavs)
    }
}
