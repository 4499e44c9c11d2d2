//! The multi-target generation context.
//!
//! [`GeneratorContext`] owns every per-target store of one run. Capabilities
//! never see it directly: each one is applied through a [`TargetContext`]
//! bound to the target being generated, so writes land in that target's
//! stores. The `set_scope`/`reset_scope` cursor remains for drivers that
//! inspect or fill the stores by hand.

mod describe;
mod target;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info};

use crate::capability::{CapabilityRef, FeatureSet, Selection};
use crate::config::{ConfigKind, Configuration, DEVELOPMENT, FUNCTION, TEST};
use crate::dependency::{CoordinateResolver, Dependency, DependencyList, StaticCoordinateResolver};
use crate::partition::Partition;
use crate::plugin::{BuildPlugin, PluginAggregator, PluginRegistry, PropagationPolicy};
use crate::project::Project;
use crate::rendering::ApplicationRenderingContext;
use crate::store::{EnvScopedStore, ScopedStore};
use crate::template::{
    LanguageTemplates, Output, Registration, Template, TemplatePostProcessor, TemplateRouter,
    TestTemplates,
};
use crate::types::{
    ApplicationType, BuildTool, GeneratorOptions, Language, Module, Target, TestFramework,
};

pub use target::TargetContext;

/// Build tool properties of one module, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildProperties {
    entries: Vec<(String, String)>,
}

impl BuildProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing an earlier value in place.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A template with its content rendered and post-processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTemplate {
    pub key: String,
    pub module: Module,
    pub path: String,
    pub output: Output,
    pub executable: bool,
}

#[derive(Debug, Clone)]
struct ModuleStores {
    application: ScopedStore<Configuration>,
    bootstrap: ScopedStore<Configuration>,
    application_env: EnvScopedStore<Configuration>,
    bootstrap_env: EnvScopedStore<Configuration>,
    dependencies: ScopedStore<DependencyList>,
    projects: ScopedStore<Project>,
    build_properties: ScopedStore<BuildProperties>,
}

impl ModuleStores {
    fn new(project: Project, seed: &BuildProperties) -> Self {
        Self {
            application: ScopedStore::new(Configuration::application()),
            bootstrap: ScopedStore::new(Configuration::bootstrap()),
            application_env: EnvScopedStore::new(),
            bootstrap_env: EnvScopedStore::new(),
            dependencies: ScopedStore::default(),
            projects: ScopedStore::new(project),
            build_properties: ScopedStore::new(seed.clone()),
        }
    }
}

/// Assembles a [`GeneratorContext`].
pub struct ContextBuilder {
    project: Project,
    options: GeneratorOptions,
    capabilities: Vec<CapabilityRef>,
    selection: Selection,
    resolver: Box<dyn CoordinateResolver>,
    registry: Option<PluginRegistry>,
    policy: PropagationPolicy,
    router: TemplateRouter,
}

impl ContextBuilder {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            options: GeneratorOptions::default(),
            capabilities: Vec::new(),
            selection: Selection::new(),
            resolver: Box::new(StaticCoordinateResolver::new()),
            registry: None,
            policy: PropagationPolicy::default(),
            router: TemplateRouter::new(),
        }
    }

    pub fn options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn capability(mut self, capability: CapabilityRef) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn capabilities(mut self, capabilities: impl IntoIterator<Item = CapabilityRef>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn resolver(mut self, resolver: impl CoordinateResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Plugin coordinate registry; the bundled one is used if unset.
    pub fn registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn propagation_policy(mut self, policy: PropagationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn router(mut self, router: TemplateRouter) -> Self {
        self.router = router;
        self
    }

    /// Partitions the capabilities and seeds the shared stores.
    pub fn build(self) -> anyhow::Result<GeneratorContext> {
        let partition = Partition::compute(
            &self.capabilities,
            &self.selection,
            self.options.singleton_policy,
        )?;
        let registry = match self.registry {
            Some(registry) => registry,
            None => PluginRegistry::bundled()?,
        };

        let mut seed = BuildProperties::new();
        seed.put(
            self.options.build_tool.platform_version_key(),
            self.options.platform_bom_version(),
        );

        info!(
            project = %self.project.qualified_name(),
            targets = ?partition.active_targets(),
            capabilities = partition.all().len(),
            "Created generator context"
        );

        Ok(GeneratorContext {
            stores: ModuleStores::new(self.project, &seed),
            build_property_seed: seed,
            options: self.options,
            partition,
            resolver: self.resolver,
            registry,
            plugins: PluginAggregator::new(self.policy),
            router: self.router,
            scope: Target::Shared,
            hide_lib_features: false,
            no_features: FeatureSet::new(),
        })
    }
}

pub struct GeneratorContext {
    options: GeneratorOptions,
    partition: Partition,
    resolver: Box<dyn CoordinateResolver>,
    registry: PluginRegistry,
    stores: ModuleStores,
    build_property_seed: BuildProperties,
    plugins: PluginAggregator,
    router: TemplateRouter,
    scope: Target,
    hide_lib_features: bool,
    no_features: FeatureSet,
}

impl GeneratorContext {
    // ---- scope cursor ----

    /// Points the cursor at `target`, opening its stores if needed.
    pub fn set_scope(&mut self, target: Target) {
        self.open(target);
        self.scope = target;
    }

    pub fn reset_scope(&mut self) {
        self.scope = Target::Shared;
    }

    pub fn current_scope(&self) -> Target {
        self.scope
    }

    fn open(&mut self, target: Target) {
        if target.is_shared() || self.stores.projects.is_open(target) {
            return;
        }
        debug!(target = %target, "Opening target stores");
        let stores = &mut self.stores;
        stores
            .application
            .get_or_insert_with(target, Configuration::application);
        stores
            .bootstrap
            .get_or_insert_with(target, Configuration::bootstrap);
        stores.application_env.open(target);
        stores.bootstrap_env.open(target);
        stores
            .dependencies
            .get_or_insert_with(target, DependencyList::new);
        let project = stores.projects.base().for_module(target.module_name());
        stores.projects.get_or_insert_with(target, || project);
        let seed = &self.build_property_seed;
        stores
            .build_properties
            .get_or_insert_with(target, || seed.clone());
    }

    // ---- applying capabilities ----

    /// Applies every target's subset, concrete targets in identifier order
    /// and the shared subset last. The first capability error aborts the
    /// run and is returned unchanged.
    pub fn apply_capabilities(&mut self) -> anyhow::Result<()> {
        if self.options.application_type == ApplicationType::Function {
            self.hide_lib_features = true;
        }
        let targets: Vec<Target> = self.partition.concrete_targets().collect();
        let result = targets
            .into_iter()
            .chain(std::iter::once(Target::Shared))
            .try_for_each(|target| self.apply_target(target));
        self.reset_scope();
        result
    }

    fn apply_target(&mut self, target: Target) -> anyhow::Result<()> {
        self.set_scope(target);
        let ordered = self
            .partition
            .subset(target)
            .map(FeatureSet::ordered)
            .unwrap_or_default();
        info!(target = %target, capabilities = ordered.len(), "Applying capabilities");
        for capability in ordered {
            debug!(
                target = %target,
                capability = capability.name(),
                order = capability.apply_order(),
                "Applying capability"
            );
            let mut ctx = TargetContext::new(self, target);
            capability.apply(&mut ctx)?;
        }
        Ok(())
    }

    // ---- per-target access, used by the cursor and by TargetContext ----

    pub fn configuration_in(&self, target: Target) -> &Configuration {
        self.stores.application.get_or_base(target)
    }

    pub fn configuration_in_mut(&mut self, target: Target) -> &mut Configuration {
        self.stores
            .application
            .get_or_insert_with(target, Configuration::application)
    }

    pub fn bootstrap_configuration_in(&self, target: Target) -> &Configuration {
        self.stores.bootstrap.get_or_base(target)
    }

    pub fn bootstrap_configuration_in_mut(&mut self, target: Target) -> &mut Configuration {
        self.stores
            .bootstrap
            .get_or_insert_with(target, Configuration::bootstrap)
    }

    /// Environment overlay of `kind` for `(target, env)`, created on first use.
    pub fn env_configuration_in_mut(
        &mut self,
        target: Target,
        kind: ConfigKind,
        env: &str,
    ) -> &mut Configuration {
        let store = match kind {
            ConfigKind::Application => &mut self.stores.application_env,
            ConfigKind::Bootstrap => &mut self.stores.bootstrap_env,
        };
        store.get_or_insert_with(target, env, || Configuration::for_environment(kind, env))
    }

    pub fn env_configuration_in(
        &self,
        target: Target,
        kind: ConfigKind,
        env: &str,
    ) -> Option<&Configuration> {
        match kind {
            ConfigKind::Application => self.stores.application_env.get(target, env),
            ConfigKind::Bootstrap => self.stores.bootstrap_env.get(target, env),
        }
    }

    pub fn has_configuration_environment_in(&self, target: Target, env: &str) -> bool {
        self.stores.application_env.contains(target, env)
    }

    pub fn dependencies_in(&self, target: Target) -> &DependencyList {
        self.stores.dependencies.get_or_base(target)
    }

    /// Adds a dependency to `target`'s list, resolving it if needed.
    pub fn add_dependency_in(&mut self, target: Target, dependency: Dependency) -> anyhow::Result<()> {
        let list = self
            .stores
            .dependencies
            .get_or_insert_with(target, DependencyList::new);
        if !list.add(dependency, self.resolver.as_ref())? {
            debug!(target = %target, "Dependency already present");
        }
        Ok(())
    }

    pub fn project_in(&self, target: Target) -> &Project {
        self.stores.projects.get_or_base(target)
    }

    pub fn build_properties_in(&self, target: Target) -> &BuildProperties {
        self.stores.build_properties.get_or_base(target)
    }

    pub fn build_properties_in_mut(&mut self, target: Target) -> &mut BuildProperties {
        let seed = &self.build_property_seed;
        self.stores
            .build_properties
            .get_or_insert_with(target, || seed.clone())
    }

    pub fn add_build_plugin_in(&mut self, target: Target, plugin: BuildPlugin) -> anyhow::Result<()> {
        self.plugins.add(target, plugin, self.resolver.as_ref())
    }

    pub fn build_plugins_in(&self, target: Target) -> BTreeSet<&BuildPlugin> {
        self.plugins.view(target, self.options.application_type)
    }

    /// Capabilities visible from `target`.
    ///
    /// The shared scope sees every capability, or only its own subset in
    /// function builds.
    pub fn features_in(&self, target: Target) -> &FeatureSet {
        if target.is_shared() {
            if self.hide_lib_features {
                return self.partition.shared();
            }
            return self.partition.all();
        }
        self.partition.subset(target).unwrap_or(&self.no_features)
    }

    pub fn add_template_in(&mut self, target: Target, key: &str, template: Template) -> Registration {
        let platform_independent = self.is_platform_independent();
        self.router
            .register(key, template, target, platform_independent)
    }

    /// Registers a template whose model depends on the build language.
    pub fn add_language_template(
        &mut self,
        module: Module,
        key: &str,
        path: &str,
        templates: &LanguageTemplates,
    ) -> Registration {
        match templates.pick(self.options.language) {
            Some(model) => self.router.insert(key, Template::rendered(module, path, model)),
            None => Registration::NoModel,
        }
    }

    /// Registers a test whose model depends on language and test
    /// framework. No matching model is a silent no-op.
    pub fn add_test_template(
        &mut self,
        module: Module,
        key: &str,
        path: &str,
        templates: &TestTemplates,
    ) -> Registration {
        match templates.find(self.options.language, self.options.test_framework) {
            Some(model) => self.router.insert(key, Template::rendered(module, path, model)),
            None => Registration::NoModel,
        }
    }

    /// Registers a test helper class at `<test src dir>/<path>.<ext>`.
    pub fn add_test_helper_template(
        &mut self,
        module: Module,
        key: &str,
        path: &str,
        templates: &LanguageTemplates,
    ) -> Registration {
        let language = self.options.language;
        let Some(model) = templates.pick(language) else {
            return Registration::NoModel;
        };
        let full_path = format!(
            "{}/{}.{}",
            language.test_src_dir(),
            path.trim_start_matches('/'),
            language.extension()
        );
        self.router
            .insert(key, Template::rendered(module, full_path, model))
    }

    pub fn rendering_context_in(&self, target: Target) -> ApplicationRenderingContext {
        ApplicationRenderingContext::new(
            self.options.language,
            target.environment_name(),
            self.features_in(target).any_role(|r| r.eager_singleton),
        )
    }

    // ---- cursor-scoped accessors ----

    pub fn configuration(&self) -> &Configuration {
        self.configuration_in(self.scope)
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        self.configuration_in_mut(self.scope)
    }

    pub fn bootstrap_configuration(&self) -> &Configuration {
        self.bootstrap_configuration_in(self.scope)
    }

    pub fn bootstrap_configuration_mut(&mut self) -> &mut Configuration {
        self.bootstrap_configuration_in_mut(self.scope)
    }

    pub fn dev_configuration(&mut self) -> &mut Configuration {
        self.env_configuration_in_mut(self.scope, ConfigKind::Application, DEVELOPMENT)
    }

    pub fn test_configuration(&mut self) -> &mut Configuration {
        self.env_configuration_in_mut(self.scope, ConfigKind::Application, TEST)
    }

    pub fn function_test_configuration(&mut self) -> &mut Configuration {
        self.env_configuration_in_mut(self.scope, ConfigKind::Application, FUNCTION)
    }

    pub fn test_bootstrap_configuration(&mut self) -> &mut Configuration {
        self.env_configuration_in_mut(self.scope, ConfigKind::Bootstrap, TEST)
    }

    pub fn has_configuration_environment(&self, env: &str) -> bool {
        self.has_configuration_environment_in(self.scope, env)
    }

    pub fn dependencies(&self) -> &DependencyList {
        self.dependencies_in(self.scope)
    }

    pub fn add_dependency(&mut self, dependency: Dependency) -> anyhow::Result<()> {
        self.add_dependency_in(self.scope, dependency)
    }

    pub fn project(&self) -> &Project {
        self.project_in(self.scope)
    }

    pub fn build_properties(&self) -> &BuildProperties {
        self.build_properties_in(self.scope)
    }

    pub fn add_build_plugin(&mut self, plugin: BuildPlugin) -> anyhow::Result<()> {
        self.add_build_plugin_in(self.scope, plugin)
    }

    pub fn build_plugins(&self) -> BTreeSet<&BuildPlugin> {
        self.build_plugins_in(self.scope)
    }

    pub fn features(&self) -> &FeatureSet {
        self.features_in(self.scope)
    }

    pub fn is_feature_present(&self, name: &str) -> bool {
        self.features().contains(name)
    }

    pub fn add_template(&mut self, key: &str, template: Template) -> Registration {
        self.add_template_in(self.scope, key, template)
    }

    pub fn remove_template(&mut self, key: &str) -> Option<Template> {
        self.router.unregister(key)
    }

    pub fn application_rendering_context(&self) -> ApplicationRenderingContext {
        self.rendering_context_in(self.scope)
    }

    /// Rendering context for a language given by name.
    pub fn rendering_context(&self, language: &str) -> anyhow::Result<ApplicationRenderingContext> {
        ApplicationRenderingContext::for_language_name(
            language,
            self.scope.environment_name(),
            self.features().any_role(|r| r.eager_singleton),
        )
    }

    pub fn add_post_processor(&mut self, key: &str, processor: Arc<dyn TemplatePostProcessor>) {
        self.router.post_processors_mut().add_for_key(key, processor);
    }

    pub fn add_pattern_post_processor(
        &mut self,
        pattern: Regex,
        processor: Arc<dyn TemplatePostProcessor>,
    ) {
        self.router
            .post_processors_mut()
            .add_for_pattern(pattern, processor);
    }

    // ---- options ----

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    pub fn language(&self) -> Language {
        self.options.language
    }

    pub fn build_tool(&self) -> BuildTool {
        self.options.build_tool
    }

    pub fn test_framework(&self) -> TestFramework {
        self.options.test_framework
    }

    pub fn application_type(&self) -> ApplicationType {
        self.options.application_type
    }

    pub fn generate_example_code(&self) -> bool {
        self.options.example_code
    }

    // ---- outputs ----

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Active targets, `Shared` included.
    pub fn targets(&self) -> BTreeSet<Target> {
        self.partition.active_targets()
    }

    pub fn is_platform_independent(&self) -> bool {
        self.partition.is_platform_independent()
    }

    /// `lib` followed by the sorted target module names; empty for a
    /// single-module build.
    pub fn module_names(&self) -> Vec<String> {
        if self.is_platform_independent() {
            return Vec::new();
        }
        let mut targets: Vec<&str> = self
            .partition
            .concrete_targets()
            .map(Target::module_name)
            .collect();
        targets.sort_unstable();
        std::iter::once(Module::Lib.name())
            .chain(targets)
            .map(str::to_string)
            .collect()
    }

    pub fn lib_features(&self) -> &FeatureSet {
        self.partition.all()
    }

    pub fn features_for(&self, target: Target) -> Option<&FeatureSet> {
        self.partition.subset(target)
    }

    pub fn lib_configuration(&self) -> &Configuration {
        self.stores.application.base()
    }

    pub fn lib_bootstrap_configuration(&self) -> &Configuration {
        self.stores.bootstrap.base()
    }

    pub fn target_configurations(&self) -> impl Iterator<Item = (Target, &Configuration)> {
        self.stores.application.iter_scoped()
    }

    pub fn target_bootstrap_configurations(&self) -> impl Iterator<Item = (Target, &Configuration)> {
        self.stores.bootstrap.iter_scoped()
    }

    pub fn lib_dependencies(&self) -> &DependencyList {
        self.stores.dependencies.base()
    }

    pub fn target_dependencies(&self) -> impl Iterator<Item = (Target, &DependencyList)> {
        self.stores.dependencies.iter_scoped()
    }

    pub fn lib_project(&self) -> &Project {
        self.stores.projects.base()
    }

    pub fn target_projects(&self) -> impl Iterator<Item = (Target, &Project)> {
        self.stores.projects.iter_scoped()
    }

    pub fn plugin_aggregator(&self) -> &PluginAggregator {
        &self.plugins
    }

    /// Published coordinates of all versioned build plugins of all modules.
    pub fn plugin_coordinates(&self) -> anyhow::Result<BTreeSet<String>> {
        self.plugins.coordinates(&self.registry)
    }

    /// Configurations written by the shared (or single) module.
    ///
    /// In multi-module builds the lib module is a library, so its base
    /// application and bootstrap configurations are left out.
    pub fn all_configurations(&self) -> Vec<&Configuration> {
        let mut all = Vec::new();
        if self.is_platform_independent() {
            all.push(self.stores.application.base());
            all.push(self.stores.bootstrap.base());
        }
        for store in [&self.stores.application_env, &self.stores.bootstrap_env] {
            if let Some(envs) = store.environments(Target::Shared) {
                all.extend(envs.values());
            }
        }
        all
    }

    /// Environment overlays of concrete targets.
    pub fn extra_configurations(&self) -> BTreeMap<Target, Vec<&Configuration>> {
        let mut extra: BTreeMap<Target, Vec<&Configuration>> = BTreeMap::new();
        for store in [&self.stores.application_env, &self.stores.bootstrap_env] {
            for (target, envs) in store.iter().filter(|(t, _)| !t.is_shared()) {
                extra.entry(target).or_default().extend(envs.values());
            }
        }
        extra
    }

    /// Registers a properties template for every non-empty configuration.
    ///
    /// Shared configurations go through the router; target configurations
    /// are placed directly in their module.
    pub fn register_configuration_templates(&mut self) -> Vec<Registration> {
        let platform_independent = self.is_platform_independent();
        let shared: Vec<Configuration> = self
            .all_configurations()
            .into_iter()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect();
        let mut per_target: Vec<(Target, Configuration)> = Vec::new();
        for (target, config) in self
            .target_configurations()
            .chain(self.target_bootstrap_configurations())
        {
            per_target.push((target, config.clone()));
        }
        for (target, configs) in self.extra_configurations() {
            per_target.extend(configs.into_iter().map(|c| (target, c.clone())));
        }

        let mut registrations = Vec::new();
        for config in shared {
            let key = configuration_key(&config);
            let template = Template::properties(Module::Lib, config.path(), config);
            registrations.push(self.router.register(
                &key,
                template,
                Target::Shared,
                platform_independent,
            ));
        }
        for (target, config) in per_target.into_iter().filter(|(_, c)| !c.is_empty()) {
            let key = format!("{}-{}", configuration_key(&config), target.module_name());
            let template = Template::properties(target.module(), config.path(), config);
            registrations.push(self.router.insert(&key, template));
        }
        registrations
    }

    pub fn templates(&self) -> &BTreeMap<String, Template> {
        self.router.templates()
    }

    pub fn router(&self) -> &TemplateRouter {
        &self.router
    }

    /// Renders every registered template and runs its post-processors.
    /// Render errors propagate unchanged.
    pub fn render_templates(&self) -> anyhow::Result<Vec<RenderedTemplate>> {
        let processors = self.router.post_processors();
        self.router
            .templates()
            .iter()
            .map(|(key, template)| {
                let output = match template.content().render()? {
                    Output::Text(text) => {
                        Output::Text(processors.apply(key, &template.physical_path(), text))
                    }
                    resource => resource,
                };
                Ok(RenderedTemplate {
                    key: key.clone(),
                    module: template.module(),
                    path: template.path().to_string(),
                    output,
                    executable: template.is_executable(),
                })
            })
            .collect()
    }
}

/// `application-config`, `application-dev-config`, `bootstrap-test-config`...
fn configuration_key(config: &Configuration) -> String {
    let stem = config.kind().file_stem();
    match config.environment() {
        Some(env) => format!("{stem}-{env}-config"),
        None => format!("{stem}-config"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, Roles};
    use crate::dependency::Coordinate;
    use crate::plugin::{GradlePlugin, PLUGIN_APPLICATION};

    #[derive(Debug)]
    struct Marker {
        name: &'static str,
        target: Option<Target>,
        roles: Roles,
    }

    impl Capability for Marker {
        fn name(&self) -> &str {
            self.name
        }
        fn declared_target(&self) -> Option<Target> {
            self.target
        }
        fn roles(&self) -> Roles {
            self.roles
        }
        fn apply(&self, ctx: &mut TargetContext<'_>) -> anyhow::Result<()> {
            ctx.configuration_mut()
                .add_nested(&format!("applied.{}", self.name), true);
            Ok(())
        }
    }

    fn marker(name: &'static str, target: Option<Target>) -> CapabilityRef {
        Arc::new(Marker {
            name,
            target,
            roles: Roles::default(),
        })
    }

    fn context(caps: Vec<CapabilityRef>) -> GeneratorContext {
        ContextBuilder::new(Project::parse("com.example.demo"))
            .capabilities(caps)
            .build()
            .unwrap()
    }

    #[test]
    fn set_scope_opens_target_stores() {
        let mut ctx = context(vec![marker("aws-metrics", Some(Target::Aws))]);
        assert!(!ctx.stores.projects.is_open(Target::Aws));
        ctx.set_scope(Target::Aws);
        assert_eq!(ctx.project().qualified_name(), "com.example.aws");
        assert!(ctx.stores.dependencies.is_open(Target::Aws));
        assert_eq!(ctx.current_scope(), Target::Aws);

        ctx.reset_scope();
        assert_eq!(ctx.project().qualified_name(), "com.example.demo");
    }

    #[test]
    fn apply_writes_into_each_targets_store_and_resets_scope() {
        let mut ctx = context(vec![
            marker("aws-metrics", Some(Target::Aws)),
            Arc::new(Marker {
                name: "logback",
                target: None,
                roles: Roles {
                    default: true,
                    ..Roles::default()
                },
            }),
        ]);
        ctx.apply_capabilities().unwrap();

        assert_eq!(ctx.current_scope(), Target::Shared);
        let aws = ctx.configuration_in(Target::Aws);
        assert!(aws.contains_nested("applied.aws-metrics"));
        assert!(aws.contains_nested("applied.logback"));
        assert!(ctx.lib_configuration().contains_nested("applied.logback"));
        assert!(!ctx.lib_configuration().contains_nested("applied.aws-metrics"));
    }

    #[test]
    fn platform_version_is_seeded_per_module() {
        let mut ctx = ContextBuilder::new(Project::parse("com.example.demo"))
            .options(GeneratorOptions {
                bom_suffix: "-oracle-00001".to_string(),
                ..GeneratorOptions::default()
            })
            .build()
            .unwrap();
        assert_eq!(ctx.build_properties().get("platformVersion"), Some("4.0.3-oracle-00001"));

        ctx.set_scope(Target::Gcp);
        assert_eq!(ctx.build_properties().get("platformVersion"), Some("4.0.3-oracle-00001"));
    }

    #[test]
    fn shared_features_hidden_for_function_builds() {
        let mut ctx = ContextBuilder::new(Project::parse("com.example.fn"))
            .options(GeneratorOptions::default().with_application_type(ApplicationType::Function))
            .capabilities(vec![
                marker("azure-function", Some(Target::Azure)),
                marker("kafka", None),
            ])
            .build()
            .unwrap();
        assert!(ctx.is_feature_present("azure-function"));
        ctx.apply_capabilities().unwrap();
        assert!(!ctx.is_feature_present("azure-function"));
        assert!(ctx.is_feature_present("kafka"));
    }

    #[test]
    fn all_configurations_drop_lib_base_in_multi_module() {
        let mut ctx = context(vec![marker("gcp-streaming", Some(Target::Gcp))]);
        ctx.test_configuration().add_nested("datasources.default.url", "jdbc:h2:mem");
        assert_eq!(ctx.all_configurations().len(), 1);

        let mut single = context(vec![marker("kafka", None)]);
        single.test_configuration().add_nested("kafka.enabled", false);
        assert_eq!(single.all_configurations().len(), 3);
    }

    #[test]
    fn extra_configurations_group_target_overlays() {
        let mut ctx = context(vec![marker("oci-tracing", Some(Target::Oci))]);
        ctx.set_scope(Target::Oci);
        ctx.test_configuration().add_nested("tracing.enabled", false);
        ctx.test_bootstrap_configuration().add_nested("oci.config.enabled", false);
        ctx.reset_scope();
        ctx.dev_configuration().add_nested("lib.only", true);

        let extra = ctx.extra_configurations();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[&Target::Oci].len(), 2);
    }

    #[test]
    fn test_helper_path_uses_test_source_dir() {
        #[derive(Debug)]
        struct Body;
        impl crate::template::RenderModel for Body {
            fn render(&self) -> anyhow::Result<String> {
                Ok("class Helper {}".to_string())
            }
        }
        let model: Arc<dyn crate::template::RenderModel> = Arc::new(Body);
        let mut ctx = ContextBuilder::new(Project::parse("com.example.demo"))
            .options(GeneratorOptions::default().with_language(Language::Kotlin))
            .build()
            .unwrap();
        let reg = ctx.add_test_helper_template(
            Module::Lib,
            "helper",
            "/com/example/Helper",
            &LanguageTemplates::new(model.clone(), model.clone(), model),
        );
        assert!(reg.is_registered());
        assert_eq!(
            ctx.templates()["helper"].path(),
            "src/test/kotlin/com/example/Helper.kt"
        );
    }

    #[test]
    fn plugin_lookup_uses_context_resolver() {
        let mut ctx = ContextBuilder::new(Project::parse("com.example.demo"))
            .resolver(StaticCoordinateResolver::new().with(Coordinate::new(
                "io.micronaut.gradle",
                "micronaut-gradle-plugin",
                "4.0.3",
            )))
            .build()
            .unwrap();
        ctx.add_build_plugin(
            GradlePlugin::new(PLUGIN_APPLICATION)
                .with_lookup("micronaut-gradle-plugin")
                .into(),
        )
        .unwrap();
        assert_eq!(
            ctx.plugin_coordinates().unwrap().into_iter().collect::<Vec<_>>(),
            vec!["io.micronaut.gradle:micronaut-gradle-plugin:4.0.3".to_string()]
        );
    }
}
