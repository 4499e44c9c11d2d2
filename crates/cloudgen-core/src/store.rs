//! Per-target keyed storage.
//!
//! The same pattern holds configuration trees, dependency lists, project
//! identities, build plugin sets and build properties. `Target::Shared`
//! always resolves to the base entry that exists from the start; concrete
//! targets are opened lazily on first access and never removed.

use std::collections::BTreeMap;

use crate::types::Target;

#[derive(Debug, Clone, PartialEq)]
pub struct ScopedStore<T> {
    base: T,
    scoped: BTreeMap<Target, T>,
}

impl<T: Default> Default for ScopedStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> ScopedStore<T> {
    pub fn new(base: T) -> Self {
        Self {
            base,
            scoped: BTreeMap::new(),
        }
    }

    /// The entry used by the shared module.
    pub fn base(&self) -> &T {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut T {
        &mut self.base
    }

    /// Existing entry for `target`, or `None` if it was never opened.
    pub fn get(&self, target: Target) -> Option<&T> {
        if target.is_shared() {
            return Some(&self.base);
        }
        self.scoped.get(&target)
    }

    /// Existing entry for `target`, falling back to the base entry.
    pub fn get_or_base(&self, target: Target) -> &T {
        self.get(target).unwrap_or(&self.base)
    }

    pub fn get_mut(&mut self, target: Target) -> Option<&mut T> {
        if target.is_shared() {
            return Some(&mut self.base);
        }
        self.scoped.get_mut(&target)
    }

    /// Returns the entry for `target`, creating it with `factory` if absent.
    ///
    /// Repeated calls return the same entry; the factory runs at most once
    /// per target.
    pub fn get_or_insert_with(&mut self, target: Target, factory: impl FnOnce() -> T) -> &mut T {
        if target.is_shared() {
            return &mut self.base;
        }
        self.scoped.entry(target).or_insert_with(factory)
    }

    pub fn is_open(&self, target: Target) -> bool {
        target.is_shared() || self.scoped.contains_key(&target)
    }

    /// Concrete targets that have been opened, in target order.
    pub fn targets(&self) -> impl Iterator<Item = Target> + '_ {
        self.scoped.keys().copied()
    }

    /// Entries of opened concrete targets, in target order.
    pub fn iter_scoped(&self) -> impl Iterator<Item = (Target, &T)> {
        self.scoped.iter().map(|(target, value)| (*target, value))
    }

    /// Base entry followed by every opened target entry.
    pub fn iter_all(&self) -> impl Iterator<Item = (Target, &T)> {
        std::iter::once((Target::Shared, &self.base)).chain(self.iter_scoped())
    }
}

/// Per-target, per-environment storage keyed by `(target, env)`.
///
/// Unlike [`ScopedStore`], the shared scope is an ordinary key here.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvScopedStore<T> {
    entries: BTreeMap<Target, BTreeMap<String, T>>,
}

impl<T> Default for EnvScopedStore<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> EnvScopedStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the (possibly empty) environment map for `target`.
    pub fn open(&mut self, target: Target) -> &mut BTreeMap<String, T> {
        self.entries.entry(target).or_default()
    }

    pub fn get(&self, target: Target, env: &str) -> Option<&T> {
        self.entries.get(&target).and_then(|envs| envs.get(env))
    }

    /// Returns the entry for `(target, env)`, creating it with `factory` if absent.
    pub fn get_or_insert_with(
        &mut self,
        target: Target,
        env: &str,
        factory: impl FnOnce() -> T,
    ) -> &mut T {
        self.open(target)
            .entry(env.to_string())
            .or_insert_with(factory)
    }

    pub fn contains(&self, target: Target, env: &str) -> bool {
        self.get(target, env).is_some()
    }

    pub fn environments(&self, target: Target) -> Option<&BTreeMap<String, T>> {
        self.entries.get(&target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Target, &BTreeMap<String, T>)> {
        self.entries.iter().map(|(target, envs)| (*target, envs))
    }
}
