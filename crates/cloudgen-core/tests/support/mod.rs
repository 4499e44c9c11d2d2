#![allow(dead_code)]

use std::fmt;
use std::sync::Arc;

use cloudgen_core::prelude::*;

type Effect = Arc<dyn Fn(&mut TargetContext<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Capability assembled from closures, for driving the context in tests.
pub struct TestCapability {
    name: String,
    target: Option<Target>,
    order: i32,
    roles: Roles,
    gate: Option<Target>,
    effects: Vec<Effect>,
}

impl TestCapability {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            target: None,
            order: 0,
            roles: Roles::default(),
            gate: None,
            effects: Vec::new(),
        }
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn roles(mut self, roles: Roles) -> Self {
        self.roles = roles;
        self
    }

    pub fn default_feature(self) -> Self {
        let roles = Roles {
            default: true,
            ..self.roles
        };
        self.roles(roles)
    }

    pub fn gated_on(mut self, target: Target) -> Self {
        self.gate = Some(target);
        self
    }

    pub fn effect(
        mut self,
        effect: impl Fn(&mut TargetContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.effects.push(Arc::new(effect));
        self
    }

    /// Writes `applied.<name> = <module>` to the application configuration.
    pub fn marking(self) -> Self {
        let key = format!("applied.{}", self.name);
        self.effect(move |ctx| {
            let module = ctx.module().name();
            ctx.configuration_mut().add_nested(&key, module);
            Ok(())
        })
    }

    pub fn build(self) -> CapabilityRef {
        Arc::new(self)
    }
}

impl fmt::Debug for TestCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCapability")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish()
    }
}

impl Capability for TestCapability {
    fn name(&self) -> &str {
        &self.name
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

    fn apply(&self, ctx: &mut TargetContext<'_>) -> anyhow::Result<()> {
        for effect in &self.effects {
            effect(ctx)?;
        }
        Ok(())
    }
}

pub fn context(capabilities: Vec<CapabilityRef>) -> GeneratorContext {
    ContextBuilder::new(Project::parse("com.example.demo"))
        .capabilities(capabilities)
        .build()
        .unwrap()
}

/// Render model returning fixed text.
#[derive(Debug)]
pub struct Fixed(pub &'static str);

impl RenderModel for Fixed {
    fn render(&self) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

pub fn fixed(text: &'static str) -> Arc<dyn RenderModel> {
    Arc::new(Fixed(text))
}
