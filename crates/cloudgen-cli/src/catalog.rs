//! Capabilities known to the CLI.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use cloudgen_core::plugin::{PLUGIN_APPLICATION, PLUGIN_GRADLE_AZURE_FUNCTIONS, PLUGIN_SHADOW};
use cloudgen_core::prelude::*;
use cloudgen_core::template::K8S_MANIFEST_KEY;

type ApplyFn = fn(&mut TargetContext<'_>) -> Result<()>;

/// A catalog entry: static metadata plus the function applying it.
pub struct CatalogCapability {
    pub name: &'static str,
    pub description: &'static str,
    pub target: Option<Target>,
    pub order: i32,
    pub roles: Roles,
    pub gate: Option<Target>,
    apply: ApplyFn,
}

impl fmt::Debug for CatalogCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogCapability")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish()
    }
}

impl Capability for CatalogCapability {
    fn name(&self) -> &str {
        self.name
    }

    fn declared_target(&self) -> Option<Target> {
        self.target
    }

    fn apply_order(&self) -> i32 {
        self.order
    }

    fn roles(&self) -> Roles {
        self.roles
    }

    fn gated_on(&self) -> Option<Target> {
        self.gate
    }

    fn apply(&self, ctx: &mut TargetContext<'_>) -> Result<()> {
        (self.apply)(ctx)
    }
}

fn entry(name: &'static str, description: &'static str, apply: ApplyFn) -> CatalogCapability {
    CatalogCapability {
        name,
        description,
        target: None,
        order: 0,
        roles: Roles::default(),
        gate: None,
        apply,
    }
}

impl CatalogCapability {
    fn on(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    fn with_roles(mut self, roles: Roles) -> Self {
        self.roles = roles;
        self
    }

    fn gated(mut self, target: Target) -> Self {
        self.gate = Some(target);
        self
    }
}

/// Every capability the CLI can generate with.
pub fn catalog() -> Vec<CatalogCapability> {
    let default = Roles {
        default: true,
        ..Roles::default()
    };
    vec![
        entry("app-name", "Application identity", |ctx| {
            let name = ctx.project().name().to_string();
            ctx.configuration_mut().add_nested("micronaut.application.name", name);
            Ok(())
        })
        .order(-100)
        .with_roles(Roles {
            application: true,
            default: true,
            ..Roles::default()
        }),
        entry("gradle", "Gradle build files", |ctx| {
            ctx.add_template(
                "build",
                Template::text(Module::Default, "build.gradle", "plugins {\n}\n"),
            );
            ctx.add_template(
                "gradlew",
                Template::resource(Module::Root, "gradlew", "gradle/gradlew").executable(),
            );
            Ok(())
        })
        .order(-50)
        .with_roles(Roles {
            build: true,
            default: true,
            ..Roles::default()
        }),
        entry("micronaut-build", "Micronaut application plugin", |ctx| {
            ctx.add_build_plugin(
                GradlePlugin::new(PLUGIN_APPLICATION).with_lookup("micronaut-gradle-plugin"),
            )?;
            ctx.add_build_plugin(GradlePlugin::new(PLUGIN_SHADOW).with_version("8.1.1"))
        })
        .with_roles(Roles {
            build_plugin: true,
            default: true,
            ..Roles::default()
        }),
        entry("logback", "Logback logging configuration", |ctx| {
            ctx.add_dependency(Dependency::lookup("logback-classic").runtime())?;
            ctx.add_template(
                "loggingConfig",
                Template::text(
                    Module::Default,
                    "src/main/resources/logback.xml",
                    "<configuration/>\n",
                ),
            );
            Ok(())
        })
        .with_roles(default),
        entry("test-resources", "Test resources service", |ctx| {
            ctx.test_configuration().add_nested("test-resources.enabled", true);
            Ok(())
        })
        .with_roles(Roles {
            shared_service: true,
            ..Roles::default()
        }),
        entry("security", "Authentication and authorization", |ctx| {
            ctx.add_dependency(Dependency::lookup("micronaut-security-jwt"))?;
            ctx.configuration_mut()
                .add_nested("micronaut.security.authentication", "bearer");
            Ok(())
        }),
        entry("kafka", "Kafka messaging", |ctx| {
            ctx.add_dependency(Dependency::lookup("micronaut-kafka"))?;
            ctx.configuration_mut()
                .add_nested("kafka.bootstrap.servers", "localhost:9092");
            ctx.test_configuration().add_nested("kafka.enabled", false);
            Ok(())
        }),
        entry("postgres", "PostgreSQL driver", |ctx| {
            ctx.add_dependency(Dependency::lookup("postgresql").runtime())?;
            ctx.configuration_mut()
                .add_nested("datasources.default.db-type", "postgres");
            Ok(())
        })
        .with_roles(Roles {
            database_driver: true,
            ..Roles::default()
        }),
        entry("aws-metrics", "CloudWatch metrics", |ctx| {
            ctx.add_dependency(Dependency::lookup("micronaut-aws-cloudwatch-logging"))?;
            ctx.configuration_mut()
                .add_nested("micronaut.metrics.export.cloudwatch.enabled", true);
            Ok(())
        })
        .on(Target::Aws),
        entry("aws-k8s", "Kubernetes manifest for EKS", |ctx| {
            let name = ctx.project().name().to_string();
            ctx.add_template(
                K8S_MANIFEST_KEY,
                Template::text(
                    Module::Default,
                    "k8s.yml",
                    format!("apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: {name}\n"),
                ),
            );
            Ok(())
        })
        .on(Target::Aws),
        entry("aws-lambda", "Lambda runtime support", |ctx| {
            ctx.add_dependency(Dependency::lookup("micronaut-function-aws"))
        })
        .gated(Target::Aws)
        .with_roles(default),
        entry("azure-function", "Azure Functions support", |ctx| {
            ctx.add_dependency(Dependency::lookup("micronaut-azure-function-http"))?;
            ctx.add_build_plugin(
                GradlePlugin::new(PLUGIN_GRADLE_AZURE_FUNCTIONS).with_version("1.11.0"),
            )?;
            ctx.function_test_configuration()
                .add_nested("azure.function.enabled", false);
            Ok(())
        })
        .on(Target::Azure),
        entry("gcp-streaming", "Pub/Sub messaging", |ctx| {
            ctx.add_dependency(Dependency::lookup("micronaut-gcp-pubsub"))?;
            ctx.bootstrap_configuration_mut()
                .add_nested("gcp.project-id", "my-project");
            Ok(())
        })
        .on(Target::Gcp),
        entry("oci-tracing", "Application performance monitoring", |ctx| {
            ctx.add_dependency(Dependency::lookup("micronaut-tracing-zipkin"))?;
            ctx.configuration_mut().add_nested("tracing.zipkin.enabled", true);
            ctx.dev_configuration().add_nested("tracing.zipkin.enabled", false);
            Ok(())
        })
        .on(Target::Oci)
        .with_roles(Roles {
            eager_singleton: true,
            ..Roles::default()
        }),
    ]
}

pub fn capabilities() -> Vec<CapabilityRef> {
    catalog()
        .into_iter()
        .map(|c| Arc::new(c) as CapabilityRef)
        .collect()
}

/// Artifacts the catalog looks up, with the coordinates used when the
/// config file does not override them.
pub const DEFAULT_COORDINATES: &[(&str, &str)] = &[
    ("micronaut-gradle-plugin", "io.micronaut.gradle:micronaut-gradle-plugin:4.0.3"),
    ("logback-classic", "ch.qos.logback:logback-classic:1.4.11"),
    ("micronaut-security-jwt", "io.micronaut.security:micronaut-security-jwt:4.0.2"),
    ("micronaut-kafka", "io.micronaut.kafka:micronaut-kafka:5.0.0"),
    ("postgresql", "org.postgresql:postgresql:42.6.0"),
    ("micronaut-aws-cloudwatch-logging", "io.micronaut.aws:micronaut-aws-cloudwatch-logging:4.0.0"),
    ("micronaut-function-aws", "io.micronaut.aws:micronaut-function-aws:4.0.0"),
    ("micronaut-azure-function-http", "io.micronaut.azure:micronaut-azure-function-http:5.0.0"),
    ("micronaut-gcp-pubsub", "io.micronaut.gcp:micronaut-gcp-pubsub:5.0.0"),
    ("micronaut-tracing-zipkin", "io.micronaut.tracing:micronaut-tracing-zipkin:6.0.0"),
];

/// Coordinate resolver seeded with [`DEFAULT_COORDINATES`], then the
/// config file's entries.
pub fn resolver(config: &GeneratorConfig) -> Result<StaticCoordinateResolver> {
    let mut resolver = StaticCoordinateResolver::new();
    for (artifact, gav) in DEFAULT_COORDINATES {
        resolver.insert_gav(artifact, gav)?;
    }
    for (artifact, gav) in &config.coordinates {
        resolver.insert_gav(artifact, gav)?;
    }
    Ok(resolver)
}
