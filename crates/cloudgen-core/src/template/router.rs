//! Template placement: routing rules, suppression and path deduplication.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{K8S_MANIFEST_KEY, PostProcessors, Registration, Template, TemplateKind};
use crate::types::{Module, Target};

/// Facts a routing rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RouteInput<'a> {
    pub key: &'a str,
    pub template: &'a Template,
    pub scope: Target,
    pub platform_independent: bool,
}

/// Where a matched rule sends a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub module: Module,
    /// Appended to the key as `-<suffix>` to keep it unique.
    pub key_suffix: Option<&'static str>,
}

impl Route {
    fn to(module: Module) -> Self {
        Self {
            module,
            key_suffix: None,
        }
    }
}

/// One `(predicate, rewrite)` pair of the routing table.
#[derive(Debug, Clone, Copy)]
pub struct RoutingRule {
    pub name: &'static str,
    pub matches: fn(&RouteInput<'_>) -> bool,
    pub route: fn(&RouteInput<'_>) -> Route,
}

/// The routing table, evaluated in order; the first match wins and a
/// template no rule matches keeps its declared module.
pub fn default_routing_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule {
            name: "cluster-manifest-to-root",
            matches: |input| input.key == K8S_MANIFEST_KEY,
            route: |_| Route::to(Module::Root),
        },
        RoutingRule {
            name: "target-scope-to-target-module",
            matches: |input| {
                !input.scope.is_shared() && input.template.module() != input.scope.module()
            },
            route: |input| Route {
                module: input.scope.module(),
                key_suffix: Some(input.scope.module_name()),
            },
        },
        RoutingRule {
            name: "single-module-to-root",
            matches: |input| {
                input.platform_independent && input.template.module().is_shared_or_default()
            },
            route: |_| Route::to(Module::Root),
        },
        RoutingRule {
            name: "default-to-lib",
            matches: |input| input.template.module() == Module::Default,
            route: |_| Route::to(Module::Lib),
        },
    ]
}

/// A `(kind, module, key)` combination dropped in multi-module builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionRule {
    pub kind: TemplateKind,
    pub module: Module,
    pub key: &'static str,
}

impl SuppressionRule {
    fn matches(&self, key: &str, template: &Template) -> bool {
        self.kind == template.kind()
            && self.module.canonical() == template.module()
            && self.key == key
    }
}

/// Artifacts that only belong to a real application module; the shared
/// module is converted into a library.
pub fn default_suppressions() -> Vec<SuppressionRule> {
    let rendered = |key| SuppressionRule {
        kind: TemplateKind::Rendered,
        module: Module::Default,
        key,
    };
    vec![
        SuppressionRule {
            kind: TemplateKind::Properties,
            module: Module::Lib,
            key: "application-config",
        },
        rendered("application"),
        rendered("applicationTest"),
        rendered("loggingConfig"),
    ]
}

/// Registered templates of one run, unique by key and by physical path.
#[derive(Debug, Clone)]
pub struct TemplateRouter {
    rules: Vec<RoutingRule>,
    suppressions: Vec<SuppressionRule>,
    templates: BTreeMap<String, Template>,
    paths: BTreeSet<String>,
    post_processors: PostProcessors,
}

impl Default for TemplateRouter {
    fn default() -> Self {
        Self {
            rules: default_routing_rules(),
            suppressions: default_suppressions(),
            templates: BTreeMap::new(),
            paths: BTreeSet::new(),
            post_processors: PostProcessors::default(),
        }
    }
}

impl TemplateRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule after the built-in ones.
    pub fn with_rule(mut self, rule: RoutingRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    /// Destination of `template` if it were registered now.
    pub fn route(&self, input: &RouteInput<'_>) -> Route {
        let template = input.template;
        let routable = matches!(template.kind(), TemplateKind::Rendered | TemplateKind::Properties)
            && template.module() != Module::Root;
        if routable
            && let Some(rule) = self.rules.iter().find(|rule| (rule.matches)(input))
        {
            let route = (rule.route)(input);
            debug!(
                key = input.key,
                rule = rule.name,
                from = %template.module(),
                to = %route.module,
                "Rerouted template"
            );
            return route;
        }
        Route::to(template.module())
    }

    /// Whether `(key, template)` is dropped in a multi-module build.
    pub fn is_suppressed(&self, key: &str, template: &Template, platform_independent: bool) -> bool {
        !platform_independent && self.suppressions.iter().any(|s| s.matches(key, template))
    }

    /// Suppresses, routes, then stores the template.
    pub fn register(
        &mut self,
        key: &str,
        template: Template,
        scope: Target,
        platform_independent: bool,
    ) -> Registration {
        if self.is_suppressed(key, &template, platform_independent) {
            debug!(key, module = %template.module(), "Suppressed application-only template");
            return Registration::Suppressed;
        }
        let route = self.route(&RouteInput {
            key,
            template: &template,
            scope,
            platform_independent,
        });
        let key = match route.key_suffix {
            Some(suffix) => format!("{key}-{suffix}"),
            None => key.to_string(),
        };
        self.insert(&key, template.with_module(route.module))
    }

    /// Stores the template as placed, skipping it if its physical path is
    /// taken.
    ///
    /// A key registered again at a free path replaces its earlier template
    /// and releases the old path.
    pub fn insert(&mut self, key: &str, template: Template) -> Registration {
        let path = template.physical_path();
        if self.paths.contains(&path) {
            debug!(key, path = %path, "Template path already registered, keeping first");
            return Registration::Duplicate;
        }
        if let Some(previous) = self.templates.remove(key) {
            self.paths.remove(&previous.physical_path());
        }
        let module = template.module();
        self.paths.insert(path);
        self.templates.insert(key.to_string(), template);
        Registration::Registered {
            key: key.to_string(),
            module,
        }
    }

    /// Removes the template under `key` and frees its path.
    pub fn unregister(&mut self, key: &str) -> Option<Template> {
        let template = self.templates.remove(key)?;
        self.paths.remove(&template.physical_path());
        Some(template)
    }

    pub fn get(&self, key: &str) -> Option<&Template> {
        self.templates.get(key)
    }

    pub fn templates(&self) -> &BTreeMap<String, Template> {
        &self.templates
    }

    pub fn contains_path(&self, physical_path: &str) -> bool {
        self.paths.contains(physical_path)
    }

    pub fn post_processors(&self) -> &PostProcessors {
        &self.post_processors
    }

    pub fn post_processors_mut(&mut self) -> &mut PostProcessors {
        &mut self.post_processors
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
