//! Generated file templates and where they land.
//!
//! A template only carries placement (module and path) and a content
//! source. Rendering a model to text belongs to the [`RenderModel`]
//! collaborator; this crate never interprets template content.

mod postprocess;
mod router;

use std::fmt;
use std::sync::Arc;

use crate::config::Configuration;
use crate::types::{Language, Module, TestFramework};

pub use postprocess::{PostProcessors, TemplatePostProcessor};
pub use router::{
    Route, RouteInput, RoutingRule, SuppressionRule, TemplateRouter, default_routing_rules,
    default_suppressions,
};

/// Reserved key of the cluster manifest, always written to the root module.
pub const K8S_MANIFEST_KEY: &str = "k8sYaml";

/// Produces the text of a rendered template.
pub trait RenderModel: fmt::Debug {
    fn render(&self) -> anyhow::Result<String>;
}

/// Kind of a template, derived from its content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Text produced by a render model or given literally.
    Rendered,
    /// A serialized configuration tree.
    Properties,
    /// A file copied from a bundled resource.
    Resource,
}

#[derive(Debug, Clone)]
pub enum ContentSource {
    Properties(Configuration),
    Text(String),
    Model(Arc<dyn RenderModel>),
    /// Location of a bundled resource; copied verbatim by the packager.
    Resource(String),
}

/// Materialised template content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Text(String),
    Resource(String),
}

impl ContentSource {
    pub fn kind(&self) -> TemplateKind {
        match self {
            ContentSource::Properties(_) => TemplateKind::Properties,
            ContentSource::Text(_) | ContentSource::Model(_) => TemplateKind::Rendered,
            ContentSource::Resource(_) => TemplateKind::Resource,
        }
    }

    /// Renders the content. Model errors propagate unchanged.
    pub fn render(&self) -> anyhow::Result<Output> {
        Ok(match self {
            ContentSource::Properties(config) => Output::Text(config.to_properties()),
            ContentSource::Text(text) => Output::Text(text.clone()),
            ContentSource::Model(model) => Output::Text(model.render()?),
            ContentSource::Resource(location) => Output::Resource(location.clone()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    module: Module,
    path: String,
    content: ContentSource,
    executable: bool,
}

impl Template {
    pub fn new(module: Module, path: impl Into<String>, content: ContentSource) -> Self {
        Self {
            module: module.canonical(),
            path: path.into(),
            content,
            executable: false,
        }
    }

    pub fn rendered(module: Module, path: impl Into<String>, model: Arc<dyn RenderModel>) -> Self {
        Self::new(module, path, ContentSource::Model(model))
    }

    pub fn text(module: Module, path: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(module, path, ContentSource::Text(text.into()))
    }

    pub fn properties(module: Module, path: impl Into<String>, config: Configuration) -> Self {
        Self::new(module, path, ContentSource::Properties(config))
    }

    pub fn resource(module: Module, path: impl Into<String>, location: impl Into<String>) -> Self {
        Self::new(module, path, ContentSource::Resource(location.into()))
    }

    pub fn executable(mut self) -> Self {
        self.executable = true;
        self
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &ContentSource {
        &self.content
    }

    pub fn kind(&self) -> TemplateKind {
        self.content.kind()
    }

    pub fn is_executable(&self) -> bool {
        self.executable
    }

    /// Physical identity: `module/path`.
    pub fn physical_path(&self) -> String {
        format!("{}/{}", self.module.name(), self.path)
    }

    /// The same template placed in another module.
    pub fn with_module(mut self, module: Module) -> Self {
        self.module = module.canonical();
        self
    }
}

type ModelRef = Arc<dyn RenderModel>;

/// One model per source language; the build language picks one.
#[derive(Debug, Clone, Default)]
pub struct LanguageTemplates {
    pub java: Option<ModelRef>,
    pub kotlin: Option<ModelRef>,
    pub groovy: Option<ModelRef>,
}

impl LanguageTemplates {
    pub fn new(java: ModelRef, kotlin: ModelRef, groovy: ModelRef) -> Self {
        Self {
            java: Some(java),
            kotlin: Some(kotlin),
            groovy: Some(groovy),
        }
    }

    pub fn pick(&self, language: Language) -> Option<ModelRef> {
        match language {
            Language::Java => self.java.clone(),
            Language::Kotlin => self.kotlin.clone(),
            Language::Groovy => self.groovy.clone(),
        }
    }
}

/// Test models by language and test framework.
#[derive(Debug, Clone, Default)]
pub struct TestTemplates {
    pub spock: Option<ModelRef>,
    pub java_junit: Option<ModelRef>,
    pub groovy_junit: Option<ModelRef>,
    pub kotlin_junit: Option<ModelRef>,
    pub kotest: Option<ModelRef>,
}

impl TestTemplates {
    /// Spock and Kotest ignore the language; JUnit picks by language.
    pub fn find(&self, language: Language, framework: TestFramework) -> Option<ModelRef> {
        match framework {
            TestFramework::Spock => self.spock.clone(),
            TestFramework::Kotest => self.kotest.clone(),
            TestFramework::Junit => match language {
                Language::Java => self.java_junit.clone(),
                Language::Kotlin => self.kotlin_junit.clone(),
                Language::Groovy => self.groovy_junit.clone(),
            },
        }
    }
}

/// Outcome of registering a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Stored under `key` in `module`.
    Registered { key: String, module: Module },
    /// Dropped because it only makes sense in an application module.
    Suppressed,
    /// Its physical path was already taken.
    Duplicate,
    /// No model matched the build's language or test framework.
    NoModel,
}

impl Registration {
    pub fn is_registered(&self) -> bool {
        matches!(self, Registration::Registered { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fixed(&'static str);

    impl RenderModel for Fixed {
        fn render(&self) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn kind_follows_content() {
        let t = Template::text(Module::Lib, "README.md", "# demo");
        assert_eq!(t.kind(), TemplateKind::Rendered);
        assert_eq!(t.physical_path(), "lib/README.md");

        let p = Template::properties(
            Module::Root,
            "gradle.properties",
            Configuration::application(),
        );
        assert_eq!(p.kind(), TemplateKind::Properties);
    }

    #[test]
    fn test_templates_pick_by_framework_then_language() {
        let templates = TestTemplates {
            spock: Some(Arc::new(Fixed("spock"))),
            java_junit: Some(Arc::new(Fixed("java"))),
            kotlin_junit: None,
            ..TestTemplates::default()
        };
        let pick = |l, f| templates.find(l, f).map(|m| m.render().unwrap());

        assert_eq!(pick(Language::Kotlin, TestFramework::Spock).as_deref(), Some("spock"));
        assert_eq!(pick(Language::Java, TestFramework::Junit).as_deref(), Some("java"));
        assert_eq!(pick(Language::Kotlin, TestFramework::Junit), None);
        assert_eq!(pick(Language::Java, TestFramework::Kotest), None);
    }

    #[test]
    fn properties_content_renders_sorted_lines() {
        let mut config = Configuration::application();
        config.add_nested("b.key", 2);
        config.add_nested("a.key", 1);
        let out = ContentSource::Properties(config).render().unwrap();
        assert_eq!(out, Output::Text("a.key=1\nb.key=2".to_string()));
    }
}
