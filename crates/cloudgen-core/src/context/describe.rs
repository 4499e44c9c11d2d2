//! Human-readable dump of a generator context, for debugging runs.

use std::fmt;

use super::GeneratorContext;
use crate::types::Target;

impl fmt::Display for GeneratorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GeneratorContext")?;

        writeln!(f, "templates:")?;
        for (key, template) in self.templates() {
            writeln!(f, "  {key} -> {}", template.physical_path())?;
        }

        writeln!(f, "module names: [{}]", self.module_names().join(", "))?;

        writeln!(f, "lib configuration: {}", self.lib_configuration())?;
        for (target, config) in self.target_configurations() {
            writeln!(f, "{target} configuration: {config}")?;
        }

        writeln!(f, "lib bootstrap configuration: {}", self.lib_bootstrap_configuration())?;
        for (target, config) in self.target_bootstrap_configurations() {
            writeln!(f, "{target} bootstrap configuration: {config}")?;
        }

        writeln!(f, "environment configurations:")?;
        for config in self.all_configurations() {
            if let Some(env) = config.environment() {
                writeln!(f, "  {} {env}: {config}", Target::Shared)?;
            }
        }
        for (target, configs) in self.extra_configurations() {
            for config in configs {
                let env = config.environment().unwrap_or_default();
                writeln!(f, "  {target} {env}: {config}")?;
            }
        }

        writeln!(f, "dependencies:")?;
        for dependency in self.lib_dependencies() {
            writeln!(f, "  lib {dependency}")?;
        }
        for (target, list) in self.target_dependencies() {
            for dependency in list {
                writeln!(f, "  {} {dependency}", target.module_name())?;
            }
        }

        writeln!(f, "projects:")?;
        writeln!(f, "  lib {}", self.lib_project().qualified_name())?;
        for (target, project) in self.target_projects() {
            writeln!(f, "  {} {}", target.module_name(), project.qualified_name())?;
        }

        writeln!(f, "features:")?;
        writeln!(f, "  lib {}", self.lib_features())?;
        for (target, features) in self.partition().by_target() {
            writeln!(f, "  {} {features}", target.module_name())?;
        }

        writeln!(f, "build properties:")?;
        for (target, properties) in self.stores.build_properties.iter_all() {
            for (key, value) in properties.iter() {
                writeln!(f, "  {} {key}={value}", target.module_name())?;
            }
        }

        writeln!(f, "build plugins:")?;
        for (target, plugins) in self.plugins.scopes() {
            for plugin in plugins {
                writeln!(f, "  {} {plugin}", target.module_name())?;
            }
        }

        let processors = self.router.post_processors();
        write!(
            f,
            "post-processors: keys [{}] patterns [{}]",
            processors.keys().collect::<Vec<_>>().join(", "),
            processors.patterns().collect::<Vec<_>>().join(", ")
        )
    }
}
