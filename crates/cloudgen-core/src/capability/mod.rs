//! Capabilities (features) and the sets they are grouped into.

mod selection;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::context::TargetContext;
use crate::types::Target;

pub use selection::Selection;

/// Roles a capability plays during partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Roles {
    /// Included automatically unless overridden.
    pub default: bool,
    /// Configures the build itself; never auto-included as a default.
    pub build: bool,
    /// Contributes build plugins; always part of the shared subset.
    pub build_plugin: bool,
    /// Platform service the shared module always needs.
    pub shared_service: bool,
    /// Provides the application identity (single slot).
    pub application: bool,
    /// Provides the database driver (single slot).
    pub database_driver: bool,
    /// Requires singletons to be initialised eagerly.
    pub eager_singleton: bool,
}

/// A unit of generation logic.
///
/// Capabilities are read-only for the whole run. Their effects go through
/// the [`TargetContext`] handed to [`apply`](Capability::apply), which is
/// bound to the target being generated.
pub trait Capability: fmt::Debug {
    fn name(&self) -> &str;

    /// Target this capability is bound to, or `None` for target-neutral.
    fn declared_target(&self) -> Option<Target> {
        None
    }

    /// Lower orders apply first.
    fn apply_order(&self) -> i32 {
        0
    }

    fn roles(&self) -> Roles {
        Roles::default()
    }

    /// Target whose absence from the build discards this capability.
    fn gated_on(&self) -> Option<Target> {
        None
    }

    fn apply(&self, ctx: &mut TargetContext<'_>) -> anyhow::Result<()>;
}

pub type CapabilityRef = Arc<dyn Capability>;

/// Capabilities keyed by name.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    items: BTreeMap<String, CapabilityRef>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `capability` unless one with the same name is present.
    pub fn insert(&mut self, capability: CapabilityRef) -> bool {
        let name = capability.name().to_string();
        if self.items.contains_key(&name) {
            return false;
        }
        self.items.insert(name, capability);
        true
    }

    pub fn extend<'a>(&mut self, capabilities: impl IntoIterator<Item = &'a CapabilityRef>) {
        for capability in capabilities {
            self.insert(Arc::clone(capability));
        }
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityRef> {
        self.items.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CapabilityRef> {
        self.items.values()
    }

    /// Capabilities sorted by apply order, ties broken by name.
    pub fn ordered(&self) -> Vec<CapabilityRef> {
        let mut sorted: Vec<CapabilityRef> = self.items.values().cloned().collect();
        sorted.sort_by(|a, b| {
            a.apply_order()
                .cmp(&b.apply_order())
                .then_with(|| a.name().cmp(b.name()))
        });
        sorted
    }

    /// Whether any member has a role matching `predicate`.
    pub fn any_role(&self, predicate: impl Fn(&Roles) -> bool) -> bool {
        self.items.values().any(|c| predicate(&c.roles()))
    }

    /// Members that are not bound to a concrete target.
    pub fn target_neutral(&self) -> FeatureSet {
        let mut neutral = FeatureSet::new();
        neutral.extend(self.items.values().filter(|c| is_target_neutral(&***c)));
        neutral
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names().collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Neutral capabilities have no target, or declare the shared scope.
pub(crate) fn is_target_neutral(capability: &dyn Capability) -> bool {
    capability.declared_target().is_none_or(Target::is_shared)
}
