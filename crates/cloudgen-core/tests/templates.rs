mod support;

use std::sync::Arc;

use cloudgen_core::prelude::*;
use cloudgen_core::context::RenderedTemplate;
use cloudgen_core::template::{K8S_MANIFEST_KEY, Output};
use regex::Regex;
use support::{TestCapability, context, fixed};

fn find<'a>(rendered: &'a [RenderedTemplate], key: &str) -> &'a RenderedTemplate {
    rendered.iter().find(|t| t.key == key).unwrap()
}

#[test]
fn target_templates_are_routed_into_their_module() {
    let mut ctx = context(vec![
        TestCapability::new("gradle-build")
            .default_feature()
            .effect(|ctx| {
                ctx.add_template(
                    "buildGradle",
                    Template::text(Module::Default, "build.gradle", "plugins {}"),
                );
                Ok(())
            })
            .build(),
        TestCapability::new("aws-k8s")
            .target(Target::Aws)
            .effect(|ctx| {
                ctx.add_template(
                    K8S_MANIFEST_KEY,
                    Template::text(Module::Default, "k8s.yml", "kind: Deployment"),
                );
                Ok(())
            })
            .build(),
    ]);
    ctx.apply_capabilities().unwrap();

    let templates = ctx.templates();
    assert_eq!(templates["buildGradle-aws"].physical_path(), "aws/build.gradle");
    assert_eq!(templates["buildGradle"].physical_path(), "lib/build.gradle");
    assert_eq!(templates[K8S_MANIFEST_KEY].physical_path(), "root/k8s.yml");
}

#[test]
fn first_template_at_a_path_is_kept() {
    let mut ctx = context(vec![
        TestCapability::new("readme-a")
            .effect(|ctx| {
                ctx.add_template("readme", Template::text(Module::Lib, "README.md", "first"));
                Ok(())
            })
            .build(),
        TestCapability::new("readme-b")
            .effect(|ctx| {
                let reg = ctx.add_template("readme2", Template::text(Module::Lib, "README.md", "second"));
                assert_eq!(reg, Registration::Duplicate);
                Ok(())
            })
            .build(),
    ]);
    ctx.apply_capabilities().unwrap();

    let rendered = ctx.render_templates().unwrap();
    assert_eq!(rendered.len(), 1);
    assert_eq!(find(&rendered, "readme").output, Output::Text("first".to_string()));
}

#[test]
fn removed_template_frees_its_path() {
    let mut ctx = context(Vec::new());
    ctx.add_template("gitignore", Template::text(Module::Lib, ".gitignore", "build/"));
    assert!(ctx.remove_template("gitignore").is_some());
    assert!(ctx.remove_template("gitignore").is_none());
    assert!(
        ctx.add_template("ignore", Template::text(Module::Lib, ".gitignore", "out/"))
            .is_registered()
    );
}

#[test]
fn post_processors_run_on_rendered_text() {
    let mut ctx = context(Vec::new());
    ctx.add_template("buildGradle", Template::text(Module::Lib, "build.gradle", "version = 1"));
    ctx.add_template(
        "wrapper",
        Template::resource(Module::Root, "gradlew", "gradle/gradlew").executable(),
    );
    ctx.add_post_processor("buildGradle", Arc::new(|s: &str| s.replace('1', "2")));
    ctx.add_pattern_post_processor(
        Regex::new(r"\.gradle$").unwrap(),
        Arc::new(|s: &str| format!("// generated\n{s}")),
    );

    let rendered = ctx.render_templates().unwrap();
    assert_eq!(
        find(&rendered, "buildGradle").output,
        Output::Text("// generated\nversion = 2".to_string())
    );
    let wrapper = find(&rendered, "wrapper");
    assert!(wrapper.executable);
    assert_eq!(wrapper.output, Output::Resource("gradle/gradlew".to_string()));
}

#[test]
fn render_errors_propagate() {
    #[derive(Debug)]
    struct Broken;
    impl RenderModel for Broken {
        fn render(&self) -> anyhow::Result<String> {
            anyhow::bail!("missing template variable")
        }
    }
    let mut ctx = context(Vec::new());
    ctx.add_template("broken", Template::rendered(Module::Lib, "Broken.java", Arc::new(Broken)));
    let err = ctx.render_templates().unwrap_err();
    assert_eq!(err.to_string(), "missing template variable");
}

#[test]
fn language_and_test_templates_follow_build_options() {
    let mut ctx = ContextBuilder::new(Project::parse("com.example.demo"))
        .options(
            GeneratorOptions::default()
                .with_language(Language::Groovy)
                .with_test_framework(TestFramework::Spock),
        )
        .build()
        .unwrap();

    let languages = LanguageTemplates {
        groovy: Some(fixed("class Application {}")),
        ..LanguageTemplates::default()
    };
    assert!(
        ctx.add_language_template(Module::Lib, "application", "src/main/groovy/Application.groovy", &languages)
            .is_registered()
    );

    let tests = TestTemplates {
        spock: Some(fixed("class ApplicationSpec {}")),
        ..TestTemplates::default()
    };
    assert!(
        ctx.add_test_template(Module::Lib, "applicationTest", "src/test/groovy/ApplicationSpec.groovy", &tests)
            .is_registered()
    );

    let kotlin_only = LanguageTemplates {
        kotlin: Some(fixed("object Helper")),
        ..LanguageTemplates::default()
    };
    assert_eq!(
        ctx.add_test_helper_template(Module::Lib, "helper", "com/example/Helper", &kotlin_only),
        Registration::NoModel
    );
    assert_eq!(ctx.templates().len(), 2);
}

#[test]
fn configuration_templates_per_module() {
    let mut ctx = context(vec![
        TestCapability::new("gcp-streaming")
            .target(Target::Gcp)
            .effect(|ctx| {
                ctx.configuration_mut().add_nested("gcp.pubsub.enabled", true);
                ctx.test_configuration().add_nested("gcp.pubsub.enabled", false);
                Ok(())
            })
            .build(),
        TestCapability::new("kafka")
            .effect(|ctx| {
                ctx.configuration_mut().add_nested("kafka.bootstrap.servers", "localhost:9092");
                ctx.dev_configuration().add_nested("kafka.enabled", true);
                Ok(())
            })
            .build(),
    ]);
    ctx.apply_capabilities().unwrap();
    ctx.register_configuration_templates();

    let templates = ctx.templates();
    // the library module gets no application.properties
    assert!(!templates.contains_key("application-config"));
    assert_eq!(
        templates["application-dev-config"].physical_path(),
        "lib/src/main/resources/application-dev.properties"
    );
    assert_eq!(
        templates["application-config-gcp"].physical_path(),
        "gcp/src/main/resources/application.properties"
    );
    assert_eq!(
        templates["application-test-config-gcp"].physical_path(),
        "gcp/src/test/resources/application-test.properties"
    );

    let rendered = ctx.render_templates().unwrap();
    assert_eq!(
        find(&rendered, "application-config-gcp").output,
        Output::Text("gcp.pubsub.enabled=true".to_string())
    );
}

#[test]
fn single_module_configuration_goes_to_root() {
    let mut ctx = context(vec![
        TestCapability::new("kafka")
            .effect(|ctx| {
                ctx.configuration_mut().add_nested("kafka.enabled", true);
                Ok(())
            })
            .build(),
    ]);
    ctx.apply_capabilities().unwrap();
    let registrations = ctx.register_configuration_templates();

    assert_eq!(registrations.len(), 1);
    assert_eq!(
        ctx.templates()["application-config"].physical_path(),
        "root/src/main/resources/application.properties"
    );
}
