use std::collections::BTreeSet;
use std::sync::Arc;

use regex::Regex;

use super::{BuildProperties, GeneratorContext};
use crate::capability::FeatureSet;
use crate::config::{ConfigKind, Configuration, DEVELOPMENT, FUNCTION, TEST};
use crate::dependency::{Dependency, DependencyList};
use crate::plugin::BuildPlugin;
use crate::project::Project;
use crate::rendering::ApplicationRenderingContext;
use crate::template::{
    LanguageTemplates, Registration, Template, TemplatePostProcessor, TestTemplates,
};
use crate::types::{GeneratorOptions, Module, Target};

/// The generator context as seen by one capability while it is applied.
///
/// Every write goes to the stores of the bound target; shared state
/// (templates, post-processors, options) is reached through the owning
/// context.
pub struct TargetContext<'a> {
    ctx: &'a mut GeneratorContext,
    target: Target,
}

impl<'a> TargetContext<'a> {
    /// Binds `ctx` to `target`, opening the target's stores.
    pub(crate) fn new(ctx: &'a mut GeneratorContext, target: Target) -> Self {
        ctx.open(target);
        Self { ctx, target }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Output module of the bound target.
    pub fn module(&self) -> Module {
        self.target.module()
    }

    pub fn options(&self) -> &GeneratorOptions {
        self.ctx.options()
    }

    pub fn generate_example_code(&self) -> bool {
        self.ctx.generate_example_code()
    }

    pub fn is_platform_independent(&self) -> bool {
        self.ctx.is_platform_independent()
    }

    pub fn project(&self) -> &Project {
        self.ctx.project_in(self.target)
    }

    pub fn features(&self) -> &FeatureSet {
        self.ctx.features_in(self.target)
    }

    pub fn is_feature_present(&self, name: &str) -> bool {
        self.features().contains(name)
    }

    pub fn configuration(&self) -> &Configuration {
        self.ctx.configuration_in(self.target)
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        self.ctx.configuration_in_mut(self.target)
    }

    pub fn bootstrap_configuration_mut(&mut self) -> &mut Configuration {
        self.ctx.bootstrap_configuration_in_mut(self.target)
    }

    pub fn env_configuration_mut(&mut self, kind: ConfigKind, env: &str) -> &mut Configuration {
        self.ctx.env_configuration_in_mut(self.target, kind, env)
    }

    pub fn dev_configuration(&mut self) -> &mut Configuration {
        self.env_configuration_mut(ConfigKind::Application, DEVELOPMENT)
    }

    pub fn test_configuration(&mut self) -> &mut Configuration {
        self.env_configuration_mut(ConfigKind::Application, TEST)
    }

    pub fn function_test_configuration(&mut self) -> &mut Configuration {
        self.env_configuration_mut(ConfigKind::Application, FUNCTION)
    }

    pub fn test_bootstrap_configuration(&mut self) -> &mut Configuration {
        self.env_configuration_mut(ConfigKind::Bootstrap, TEST)
    }

    pub fn has_configuration_environment(&self, env: &str) -> bool {
        self.ctx.has_configuration_environment_in(self.target, env)
    }

    pub fn dependencies(&self) -> &DependencyList {
        self.ctx.dependencies_in(self.target)
    }

    pub fn add_dependency(&mut self, dependency: Dependency) -> anyhow::Result<()> {
        self.ctx.add_dependency_in(self.target, dependency)
    }

    pub fn build_properties(&self) -> &BuildProperties {
        self.ctx.build_properties_in(self.target)
    }

    pub fn build_properties_mut(&mut self) -> &mut BuildProperties {
        self.ctx.build_properties_in_mut(self.target)
    }

    pub fn add_build_plugin(&mut self, plugin: impl Into<BuildPlugin>) -> anyhow::Result<()> {
        self.ctx.add_build_plugin_in(self.target, plugin.into())
    }

    pub fn build_plugins(&self) -> BTreeSet<&BuildPlugin> {
        self.ctx.build_plugins_in(self.target)
    }

    /// Registers a template through suppression and routing.
    pub fn add_template(&mut self, key: &str, template: Template) -> Registration {
        self.ctx.add_template_in(self.target, key, template)
    }

    pub fn remove_template(&mut self, key: &str) -> Option<Template> {
        self.ctx.remove_template(key)
    }

    pub fn add_language_template(
        &mut self,
        key: &str,
        path: &str,
        templates: &LanguageTemplates,
    ) -> Registration {
        let module = self.module();
        self.ctx.add_language_template(module, key, path, templates)
    }

    pub fn add_test_template(
        &mut self,
        key: &str,
        path: &str,
        templates: &TestTemplates,
    ) -> Registration {
        let module = self.module();
        self.ctx.add_test_template(module, key, path, templates)
    }

    pub fn add_test_helper_template(
        &mut self,
        key: &str,
        path: &str,
        templates: &LanguageTemplates,
    ) -> Registration {
        let module = self.module();
        self.ctx.add_test_helper_template(module, key, path, templates)
    }

    /// Registers a verbatim copy of a bundled resource.
    pub fn add_resource_template(&mut self, key: &str, path: &str, location: &str) -> Registration {
        self.add_template(key, Template::resource(Module::Default, path, location))
    }

    pub fn add_post_processor(&mut self, key: &str, processor: Arc<dyn TemplatePostProcessor>) {
        self.ctx.add_post_processor(key, processor);
    }

    pub fn add_pattern_post_processor(
        &mut self,
        pattern: Regex,
        processor: Arc<dyn TemplatePostProcessor>,
    ) {
        self.ctx.add_pattern_post_processor(pattern, processor);
    }

    pub fn application_rendering_context(&self) -> ApplicationRenderingContext {
        self.ctx.rendering_context_in(self.target)
    }
}
