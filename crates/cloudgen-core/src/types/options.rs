//! Build options chosen by the caller before generation starts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GenerateError;
use crate::partition::SingletonPolicy;

/// Source language of the generated application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Java,
    Kotlin,
    Groovy,
}

impl Language {
    pub fn name(self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::Groovy => "groovy",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Kotlin => "kt",
            Language::Groovy => "groovy",
        }
    }

    pub fn src_dir(self) -> String {
        format!("src/main/{}", self.name())
    }

    pub fn test_src_dir(self) -> String {
        format!("src/test/{}", self.name())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(Language::Java),
            "kotlin" => Ok(Language::Kotlin),
            "groovy" => Ok(Language::Groovy),
            _ => Err(GenerateError::UnsupportedLanguage(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestFramework {
    #[default]
    Junit,
    Spock,
    Kotest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildTool {
    #[default]
    Gradle,
    GradleKotlin,
    Maven,
}

impl BuildTool {
    pub fn is_gradle(self) -> bool {
        matches!(self, BuildTool::Gradle | BuildTool::GradleKotlin)
    }

    /// Build property key holding the platform (BOM) version.
    pub fn platform_version_key(self) -> &'static str {
        if self.is_gradle() {
            "platformVersion"
        } else {
            "platform.version"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    #[default]
    Default,
    Function,
    Cli,
    Messaging,
}

/// Options shared by every module of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub build_tool: BuildTool,
    pub language: Language,
    pub test_framework: TestFramework,
    pub application_type: ApplicationType,
    /// Whether capabilities should emit example sources.
    pub example_code: bool,
    pub platform_version: String,
    pub bom_suffix: String,
    pub singleton_policy: SingletonPolicy,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            build_tool: BuildTool::default(),
            language: Language::default(),
            test_framework: TestFramework::default(),
            application_type: ApplicationType::default(),
            example_code: true,
            platform_version: "4.0.3".to_string(),
            bom_suffix: String::new(),
            singleton_policy: SingletonPolicy::default(),
        }
    }
}

impl GeneratorOptions {
    pub fn with_build_tool(mut self, build_tool: BuildTool) -> Self {
        self.build_tool = build_tool;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_test_framework(mut self, test_framework: TestFramework) -> Self {
        self.test_framework = test_framework;
        self
    }

    pub fn with_application_type(mut self, application_type: ApplicationType) -> Self {
        self.application_type = application_type;
        self
    }

    pub fn with_example_code(mut self, example_code: bool) -> Self {
        self.example_code = example_code;
        self
    }

    pub fn with_singleton_policy(mut self, policy: SingletonPolicy) -> Self {
        self.singleton_policy = policy;
        self
    }

    /// Platform version with the BOM suffix appended.
    pub fn platform_bom_version(&self) -> String {
        format!("{}{}", self.platform_version, self.bom_suffix)
    }
}
