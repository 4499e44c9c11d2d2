//! Cloudgen Core Library
//!
//! Fans a single application build out into one module per deployment
//! target plus a shared library module, keeping configuration, dependencies,
//! build plugins and generated files scoped to the module they belong to.

pub mod capability;
pub mod config;
pub mod context;
pub mod dependency;
pub mod error;
pub mod partition;
pub mod plugin;
pub mod project;
pub mod rendering;
pub mod store;
pub mod template;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Capabilities
    pub use crate::capability::{Capability, CapabilityRef, FeatureSet, Roles, Selection};

    // Configuration
    pub use crate::config::{
        ConfigKind, ConfigValue, Configuration, GeneratorConfig, parse_generator_toml,
        parse_generator_toml_str,
    };

    // Context
    pub use crate::context::{BuildProperties, ContextBuilder, GeneratorContext, TargetContext};

    // Dependencies
    pub use crate::dependency::{
        Coordinate, CoordinateResolver, Dependency, DependencyList, DependencyScope,
        StaticCoordinateResolver,
    };

    // Errors
    pub use crate::error::GenerateError;

    // Partitioning
    pub use crate::partition::{Partition, SingletonPolicy};

    // Plugins
    pub use crate::plugin::{
        BuildPlugin, GradlePlugin, MavenPlugin, PluginAggregator, PluginRegistry,
        PropagationPolicy,
    };

    // Project
    pub use crate::project::Project;

    // Templates
    pub use crate::template::{
        ContentSource, LanguageTemplates, Registration, RenderModel, Template, TemplateKind,
        TemplateRouter, TestTemplates,
    };

    // Types
    pub use crate::types::{
        ApplicationType, BuildTool, GeneratorOptions, Language, Module, Target, TestFramework,
    };
}
