use std::collections::{BTreeMap, BTreeSet};

use crate::types::Target;

/// What the caller chose: explicitly selected capability names, and the
/// extra targets each neutral capability should also apply to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: BTreeSet<String>,
    propagated: BTreeMap<String, BTreeSet<Target>>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, name: impl Into<String>) -> &mut Self {
        self.selected.insert(name.into());
        self
    }

    /// Records that `name` should also apply to `target`.
    ///
    /// The shared scope always gets neutral capabilities, so propagating
    /// there is ignored.
    pub fn propagate(&mut self, name: impl Into<String>, target: Target) -> &mut Self {
        if !target.is_shared() {
            self.propagated.entry(name.into()).or_default().insert(target);
        }
        self
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn propagated_targets(&self, name: &str) -> impl Iterator<Item = Target> + '_ {
        self.propagated
            .get(name)
            .into_iter()
            .flat_map(|targets| targets.iter().copied())
    }

    pub fn is_propagated(&self, name: &str) -> bool {
        self.propagated.get(name).is_some_and(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propagating_to_shared_is_ignored() {
        let mut selection = Selection::new();
        selection.propagate("postgres", Target::Shared);
        assert!(!selection.is_propagated("postgres"));

        selection.propagate("postgres", Target::Oci);
        assert_eq!(
            selection.propagated_targets("postgres").collect::<Vec<_>>(),
            vec![Target::Oci]
        );
    }
}
