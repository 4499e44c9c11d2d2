//! Splits the selected capabilities into one subset per target.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capability::{CapabilityRef, FeatureSet, Selection, is_target_neutral};
use crate::error::GenerateError;
use crate::types::Target;

/// What happens when a second capability claims a single-instance role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SingletonPolicy {
    /// The first claimant in input order keeps the slot.
    #[default]
    KeepFirst,
    /// A second claimant fails the run.
    Reject,
}

/// Optional single-value slot for a role only one capability may fill.
#[derive(Debug)]
struct Slot {
    role: &'static str,
    value: Option<CapabilityRef>,
}

impl Slot {
    fn new(role: &'static str) -> Self {
        Self { role, value: None }
    }

    fn offer(&mut self, candidate: &CapabilityRef, policy: SingletonPolicy) -> anyhow::Result<()> {
        let Some(existing) = &self.value else {
            self.value = Some(Arc::clone(candidate));
            return Ok(());
        };
        if existing.name() == candidate.name() {
            return Ok(());
        }
        match policy {
            SingletonPolicy::KeepFirst => {
                warn!(
                    role = self.role,
                    kept = existing.name(),
                    ignored = candidate.name(),
                    "Role already filled, keeping first capability"
                );
                Ok(())
            }
            SingletonPolicy::Reject => Err(GenerateError::ConflictingRole {
                role: self.role,
                existing: existing.name().to_string(),
                rejected: candidate.name().to_string(),
            }
            .into()),
        }
    }
}

/// Result of partitioning: every kept capability, each concrete target's
/// subset and the shared subset.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    all: FeatureSet,
    by_target: BTreeMap<Target, FeatureSet>,
    shared: FeatureSet,
}

impl Partition {
    /// Partitions `capabilities` (selected, defaulted and added) for one run.
    ///
    /// Input order only matters for single-instance roles under
    /// [`SingletonPolicy::KeepFirst`].
    pub fn compute(
        capabilities: &[CapabilityRef],
        selection: &Selection,
        policy: SingletonPolicy,
    ) -> anyhow::Result<Self> {
        let initial: BTreeSet<Target> = capabilities
            .iter()
            .filter_map(|c| c.declared_target())
            .filter(|t| !t.is_shared())
            .collect();

        let mut all = FeatureSet::new();
        let mut by_target: BTreeMap<Target, FeatureSet> = BTreeMap::new();
        let mut defaults = Vec::new();
        let mut specified = Vec::new();
        let mut application = Slot::new("application");
        let mut database_driver = Slot::new("database-driver");

        let mut gated_out = BTreeSet::new();

        for capability in capabilities {
            if !all.insert(Arc::clone(capability)) {
                continue;
            }
            if let Some(gate) = capability.gated_on()
                && !initial.contains(&gate)
            {
                debug!(
                    capability = capability.name(),
                    gate = %gate,
                    "Keeping capability gated on an unselected target out of target subsets"
                );
                gated_out.insert(capability.name().to_string());
                continue;
            }

            if !is_target_neutral(capability.as_ref()) {
                if let Some(target) = capability.declared_target() {
                    by_target
                        .entry(target)
                        .or_default()
                        .insert(Arc::clone(capability));
                }
                continue;
            }

            let roles = capability.roles();
            if roles.default && !roles.build && capability.gated_on().is_none() {
                defaults.push(Arc::clone(capability));
            }
            if roles.application {
                application.offer(capability, policy)?;
            }
            if roles.database_driver {
                database_driver.offer(capability, policy)?;
            }
            if selection.is_selected(capability.name()) {
                specified.push(Arc::clone(capability));
            }
            for target in selection.propagated_targets(capability.name()) {
                by_target
                    .entry(target)
                    .or_default()
                    .insert(Arc::clone(capability));
            }
        }

        for subset in by_target.values_mut() {
            subset.extend(&defaults);
            subset.extend(&specified);
            subset.extend(application.value.iter());
            subset.extend(database_driver.value.iter());
        }

        let mut shared = FeatureSet::new();
        for capability in all.iter() {
            if !is_target_neutral(capability.as_ref()) {
                continue;
            }
            let roles = capability.roles();
            if roles.build_plugin
                || roles.shared_service
                || gated_out.contains(capability.name())
                || !selection.is_propagated(capability.name())
            {
                shared.insert(Arc::clone(capability));
            }
        }

        debug!(
            targets = ?by_target.keys().collect::<Vec<_>>(),
            shared = shared.len(),
            "Partitioned capabilities"
        );

        Ok(Self {
            all,
            by_target,
            shared,
        })
    }

    /// Every capability passed in, first of each name.
    pub fn all(&self) -> &FeatureSet {
        &self.all
    }

    /// Targets with a subset, plus `Shared`.
    pub fn active_targets(&self) -> BTreeSet<Target> {
        self.by_target
            .keys()
            .copied()
            .chain(std::iter::once(Target::Shared))
            .collect()
    }

    /// Concrete targets in apply order.
    pub fn concrete_targets(&self) -> impl Iterator<Item = Target> + '_ {
        self.by_target.keys().copied()
    }

    /// True when only the shared scope is active.
    pub fn is_platform_independent(&self) -> bool {
        self.by_target.is_empty()
    }

    /// Subset applied for `target`; `None` for an inactive target.
    pub fn subset(&self, target: Target) -> Option<&FeatureSet> {
        if target.is_shared() {
            Some(&self.shared)
        } else {
            self.by_target.get(&target)
        }
    }

    pub fn shared(&self) -> &FeatureSet {
        &self.shared
    }

    pub fn by_target(&self) -> &BTreeMap<Target, FeatureSet> {
        &self.by_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, Roles};
    use crate::context::TargetContext;

    #[derive(Debug)]
    struct Cap {
        name: &'static str,
        target: Option<Target>,
        roles: Roles,
        gate: Option<Target>,
    }

    impl Cap {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                target: None,
                roles: Roles::default(),
                gate: None,
            }
        }
        fn on(mut self, target: Target) -> Self {
            self.target = Some(target);
            self
        }
        fn roles(mut self, roles: Roles) -> Self {
            self.roles = roles;
            self
        }
        fn gated(mut self, target: Target) -> Self {
            self.gate = Some(target);
            self
        }
        fn arc(self) -> CapabilityRef {
            Arc::new(self)
        }
    }

    impl Capability for Cap {
        fn name(&self) -> &str {
            self.name
        }
        fn declared_target(&self) -> Option<Target> {
            self.target
        }
        fn roles(&self) -> Roles {
            self.roles
        }
        fn gated_on(&self) -> Option<Target> {
            self.gate
        }
        fn apply(&self, _ctx: &mut TargetContext<'_>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn default_role() -> Roles {
        Roles {
            default: true,
            ..Roles::default()
        }
    }

    #[test]
    fn target_subsets_include_defaults_and_specified() {
        let caps = vec![
            Cap::new("aws-metrics").on(Target::Aws).arc(),
            Cap::new("gcp-streaming").on(Target::Gcp).arc(),
            Cap::new("logback").roles(default_role()).arc(),
            Cap::new("kafka").arc(),
            Cap::new("unused").arc(),
        ];
        let mut selection = Selection::new();
        selection.select("kafka");

        let p = Partition::compute(&caps, &selection, SingletonPolicy::KeepFirst).unwrap();
        for target in [Target::Aws, Target::Gcp] {
            let subset = p.subset(target).unwrap();
            assert!(subset.contains("logback"));
            assert!(subset.contains("kafka"));
            assert!(!subset.contains("unused"));
        }
        assert!(!p.subset(Target::Gcp).unwrap().contains("aws-metrics"));
        assert_eq!(
            p.active_targets().into_iter().collect::<Vec<_>>(),
            vec![Target::Aws, Target::Gcp, Target::Shared]
        );
    }

    #[test]
    fn build_defaults_are_not_copied_to_targets() {
        let caps = vec![
            Cap::new("aws-metrics").on(Target::Aws).arc(),
            Cap::new("gradle")
                .roles(Roles {
                    default: true,
                    build: true,
                    ..Roles::default()
                })
                .arc(),
        ];
        let p = Partition::compute(&caps, &Selection::new(), SingletonPolicy::KeepFirst).unwrap();
        assert!(!p.subset(Target::Aws).unwrap().contains("gradle"));
        assert!(p.shared().contains("gradle"));
    }

    #[test]
    fn gated_capability_stays_shared_without_its_target() {
        let caps = vec![
            Cap::new("gcp-streaming").on(Target::Gcp).arc(),
            Cap::new("aws-lambda")
                .roles(default_role())
                .gated(Target::Aws)
                .arc(),
            Cap::new("kafka").arc(),
        ];
        let mut selection = Selection::new();
        selection.select("aws-lambda");
        selection.propagate("aws-lambda", Target::Gcp);

        let p = Partition::compute(&caps, &selection, SingletonPolicy::KeepFirst).unwrap();
        assert!(p.all().contains("aws-lambda"));
        assert!(p.shared().contains("aws-lambda"));
        assert!(p.shared().contains("kafka"));
        assert!(!p.subset(Target::Gcp).unwrap().contains("aws-lambda"));
    }

    #[test]
    fn gated_capability_is_kept_but_not_defaulted_with_its_target() {
        let caps = vec![
            Cap::new("aws-metrics").on(Target::Aws).arc(),
            Cap::new("aws-lambda")
                .roles(default_role())
                .gated(Target::Aws)
                .arc(),
        ];
        let p = Partition::compute(&caps, &Selection::new(), SingletonPolicy::KeepFirst).unwrap();
        assert!(p.all().contains("aws-lambda"));
        assert!(!p.subset(Target::Aws).unwrap().contains("aws-lambda"));
        assert!(p.shared().contains("aws-lambda"));
    }

    #[test]
    fn propagated_capability_leaves_shared_unless_always_shared() {
        let caps = vec![
            Cap::new("oci-tracing").on(Target::Oci).arc(),
            Cap::new("postgres").arc(),
            Cap::new("test-resources")
                .roles(Roles {
                    shared_service: true,
                    ..Roles::default()
                })
                .arc(),
        ];
        let mut selection = Selection::new();
        selection.propagate("postgres", Target::Oci);
        selection.propagate("test-resources", Target::Oci);

        let p = Partition::compute(&caps, &selection, SingletonPolicy::KeepFirst).unwrap();
        let oci = p.subset(Target::Oci).unwrap();
        assert!(oci.contains("postgres"));
        assert!(oci.contains("test-resources"));
        assert!(!p.shared().contains("postgres"));
        assert!(p.shared().contains("test-resources"));
    }

    #[test]
    fn propagation_opens_target() {
        let caps = vec![Cap::new("postgres").arc()];
        let mut selection = Selection::new();
        selection.propagate("postgres", Target::Azure);

        let p = Partition::compute(&caps, &selection, SingletonPolicy::KeepFirst).unwrap();
        assert!(!p.is_platform_independent());
        assert!(p.subset(Target::Azure).unwrap().contains("postgres"));
    }

    #[test]
    fn no_target_scoped_capability_is_platform_independent() {
        let caps = vec![Cap::new("logback").roles(default_role()).arc()];
        let p = Partition::compute(&caps, &Selection::new(), SingletonPolicy::KeepFirst).unwrap();
        assert!(p.is_platform_independent());
        assert_eq!(
            p.active_targets().into_iter().collect::<Vec<_>>(),
            vec![Target::Shared]
        );
        assert!(p.shared().contains("logback"));
    }

    #[test]
    fn application_slot_keeps_first_claimant() {
        let app = Roles {
            application: true,
            ..Roles::default()
        };
        let caps = vec![
            Cap::new("aws-metrics").on(Target::Aws).arc(),
            Cap::new("app-name").roles(app).arc(),
            Cap::new("app-name-alt").roles(app).arc(),
        ];
        let p = Partition::compute(&caps, &Selection::new(), SingletonPolicy::KeepFirst).unwrap();
        let aws = p.subset(Target::Aws).unwrap();
        assert!(aws.contains("app-name"));
        assert!(!aws.contains("app-name-alt"));
    }

    #[test]
    fn application_slot_rejects_second_claimant() {
        let driver = Roles {
            database_driver: true,
            ..Roles::default()
        };
        let caps = vec![
            Cap::new("postgres").roles(driver).arc(),
            Cap::new("mysql").roles(driver).arc(),
        ];
        let err = Partition::compute(&caps, &Selection::new(), SingletonPolicy::Reject).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GenerateError>(),
            Some(&GenerateError::ConflictingRole {
                role: "database-driver",
                existing: "postgres".to_string(),
                rejected: "mysql".to_string(),
            })
        );
    }

    #[test]
    fn shared_declared_capability_is_target_neutral() {
        let caps = vec![
            Cap::new("aws-metrics").on(Target::Aws).arc(),
            Cap::new("lib-banner")
                .on(Target::Shared)
                .roles(default_role())
                .arc(),
        ];
        let p = Partition::compute(&caps, &Selection::new(), SingletonPolicy::KeepFirst).unwrap();
        assert!(p.shared().contains("lib-banner"));
        assert!(p.subset(Target::Aws).unwrap().contains("lib-banner"));
    }
}
