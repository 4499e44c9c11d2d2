mod support;

use cloudgen_core::prelude::*;
use support::TestCapability;
use tempfile::TempDir;

const CONFIG: &str = r#"
plugin_registry = "registry/plugins.toml"

[project]
name = "com.acme.orders"

[build]
tool = "gradle-kotlin"
language = "kotlin"
test_framework = "kotest"
bom_suffix = "-oracle-00001"

[selection]
features = ["kafka"]

[selection.propagate]
security = ["gcp", "OCI"]

[coordinates]
micronaut-kafka = "io.micronaut.kafka:micronaut-kafka:5.0.0"
"#;

const REGISTRY: &str = r#"
version = 1

[plugins]
"io.micronaut.application:4.0.3" = "io.micronaut.gradle:micronaut-gradle-plugin:4.0.3"
"#;

fn write_project(temp: &TempDir) -> std::path::PathBuf {
    let registry_dir = temp.path().join("registry");
    std::fs::create_dir_all(&registry_dir).unwrap();
    std::fs::write(registry_dir.join("plugins.toml"), REGISTRY).unwrap();
    let config_path = temp.path().join("cloudgen.toml");
    std::fs::write(&config_path, CONFIG).unwrap();
    config_path
}

#[test]
fn config_file_drives_the_context() {
    let temp = TempDir::new().unwrap();
    let config_path = write_project(&temp);

    let config = parse_generator_toml(&config_path).unwrap();
    let options = config.options().unwrap();
    assert_eq!(options.build_tool, BuildTool::GradleKotlin);
    assert_eq!(options.language, Language::Kotlin);
    assert_eq!(options.platform_bom_version(), "4.0.3-oracle-00001");

    let registry = config.plugin_registry(temp.path()).unwrap();
    assert_eq!(registry.len(), 1);

    let mut ctx = ContextBuilder::new(config.project())
        .options(options)
        .selection(config.selection().unwrap())
        .resolver(config.resolver().unwrap())
        .registry(registry)
        .capabilities(vec![
            TestCapability::new("kafka")
                .effect(|ctx| ctx.add_dependency(Dependency::lookup("micronaut-kafka")))
                .build(),
            TestCapability::new("security").marking().build(),
        ])
        .build()
        .unwrap();
    ctx.apply_capabilities().unwrap();

    assert_eq!(ctx.module_names(), vec!["lib", "gcp", "oci"]);
    assert_eq!(ctx.project_in(Target::Oci).qualified_name(), "com.acme.oci");
    assert!(ctx.configuration_in(Target::Gcp).contains_nested("applied.security"));
    assert!(ctx.lib_dependencies().contains_artifact("micronaut-kafka"));
    assert_eq!(
        ctx.build_properties_in(Target::Gcp).get("platformVersion"),
        Some("4.0.3-oracle-00001")
    );
}

#[test]
fn missing_registry_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("cloudgen.toml");
    std::fs::write(&config_path, "plugin_registry = \"nope.toml\"\n").unwrap();

    let config = parse_generator_toml(&config_path).unwrap();
    let err = config.plugin_registry(temp.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to read plugin registry"));
}

#[test]
fn unknown_propagation_target_fails_selection() {
    let config = parse_generator_toml_str("[selection.propagate]\nsecurity = [\"mars\"]\n").unwrap();
    let err = config.selection().unwrap_err();
    assert_eq!(
        err.downcast_ref::<GenerateError>(),
        Some(&GenerateError::UnknownTarget("mars".to_string()))
    );
}
