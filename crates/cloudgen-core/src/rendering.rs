//! Language-specific values for rendering the application entry point.

use crate::types::Language;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRenderingContext {
    language: Language,
    default_environment: Option<&'static str>,
    eager_init_singleton: bool,
}

impl ApplicationRenderingContext {
    pub fn new(
        language: Language,
        default_environment: Option<&'static str>,
        eager_init_singleton: bool,
    ) -> Self {
        Self {
            language,
            default_environment,
            eager_init_singleton,
        }
    }

    /// Like [`new`](Self::new), from a language name. An unsupported
    /// language fails the run.
    pub fn for_language_name(
        language: &str,
        default_environment: Option<&'static str>,
        eager_init_singleton: bool,
    ) -> anyhow::Result<Self> {
        let language = language.parse::<Language>()?;
        Ok(Self::new(language, default_environment, eager_init_singleton))
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn default_environment(&self) -> Option<&'static str> {
        self.default_environment
    }

    pub fn eager_init_singleton(&self) -> bool {
        self.eager_init_singleton
    }

    /// Body of the generated `main`.
    pub fn main_statement(&self) -> String {
        let mut lines = vec![match self.language {
            Language::Kotlin => "build()\n        .args(*args)".to_string(),
            Language::Java | Language::Groovy => "Micronaut.build(args)".to_string(),
        }];
        if let Some(env) = self.default_environment {
            lines.push(format!("        .defaultEnvironments(\"{env}\")"));
        }
        if self.eager_init_singleton {
            lines.push("        .eagerInitSingletons(true)".to_string());
        }
        let start = match self.language {
            Language::Java => "        .start();",
            Language::Kotlin | Language::Groovy => "        .start()",
        };
        lines.push(start.to_string());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerateError;

    #[test]
    fn java_main_sets_environment_and_eager_init() {
        let ctx = ApplicationRenderingContext::new(Language::Java, Some("ec2"), true);
        assert_eq!(
            ctx.main_statement(),
            "Micronaut.build(args)\n        .defaultEnvironments(\"ec2\")\n        .eagerInitSingletons(true)\n        .start();"
        );
    }

    #[test]
    fn kotlin_main_without_environment() {
        let ctx = ApplicationRenderingContext::new(Language::Kotlin, None, false);
        assert_eq!(ctx.main_statement(), "build()\n        .args(*args)\n        .start()");
    }

    #[test]
    fn unsupported_language_is_fatal() {
        let err = ApplicationRenderingContext::for_language_name("scala", None, false).unwrap_err();
        assert_eq!(
            err.downcast_ref::<GenerateError>(),
            Some(&GenerateError::UnsupportedLanguage("scala".to_string()))
        );
    }
}
