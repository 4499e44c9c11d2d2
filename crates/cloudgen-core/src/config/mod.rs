//! Configuration trees and generator configuration
//!
//! Two kinds of configuration live here:
//! - Configuration trees written into generated modules (application and
//!   bootstrap configuration, each with named environment overlays)
//! - The generator's own `cloudgen.toml` input

pub mod parser;
pub mod properties;
pub mod schema;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

pub use parser::{parse_generator_toml, parse_generator_toml_str};
pub use schema::{BuildSection, GeneratorConfig, ProjectSection, SelectionSection};

/// Environment name of the development overlay.
pub const DEVELOPMENT: &str = "dev";
/// Environment name of the test overlay.
pub const TEST: &str = "test";
/// Environment name of the function test overlay.
pub const FUNCTION: &str = "function";

/// Which configuration family a tree belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    #[default]
    Application,
    Bootstrap,
}

impl ConfigKind {
    pub fn file_stem(self) -> &'static str {
        match self {
            ConfigKind::Application => "application",
            ConfigKind::Bootstrap => "bootstrap",
        }
    }
}

/// A configuration leaf or subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(i) => write!(f, "{i}"),
            ConfigValue::Float(x) => write!(f, "{x}"),
            ConfigValue::String(s) => f.write_str(s),
            ConfigValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            ConfigValue::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(value.into())
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(values: Vec<T>) -> Self {
        ConfigValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// A nested configuration tree for one module, optionally for one environment.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Configuration {
    kind: ConfigKind,
    environment: Option<String>,
    values: BTreeMap<String, ConfigValue>,
}

impl Configuration {
    pub fn application() -> Self {
        Self::default()
    }

    pub fn bootstrap() -> Self {
        Self {
            kind: ConfigKind::Bootstrap,
            ..Self::default()
        }
    }

    pub fn for_environment(kind: ConfigKind, environment: &str) -> Self {
        Self {
            kind,
            environment: Some(environment.to_string()),
            values: BTreeMap::new(),
        }
    }

    pub fn dev() -> Self {
        Self::for_environment(ConfigKind::Application, DEVELOPMENT)
    }

    pub fn test() -> Self {
        Self::for_environment(ConfigKind::Application, TEST)
    }

    pub fn function_test() -> Self {
        Self::for_environment(ConfigKind::Application, FUNCTION)
    }

    pub fn bootstrap_test() -> Self {
        Self::for_environment(ConfigKind::Bootstrap, TEST)
    }

    pub fn kind(&self) -> ConfigKind {
        self.kind
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn values(&self) -> &BTreeMap<String, ConfigValue> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// File path of this configuration inside its module.
    ///
    /// Test and function overlays live under test resources.
    pub fn path(&self) -> String {
        let stem = self.kind.file_stem();
        match self.environment.as_deref() {
            None => format!("src/main/resources/{stem}.properties"),
            Some(env @ (TEST | FUNCTION)) => format!("src/test/resources/{stem}-{env}.properties"),
            Some(env) => format!("src/main/resources/{stem}-{env}.properties"),
        }
    }

    /// Sets a value at a dotted path, creating intermediate maps.
    ///
    /// A scalar found on the way is replaced by a map.
    pub fn add_nested(&mut self, path: &str, value: impl Into<ConfigValue>) {
        let mut segments = path.split('.').filter(|s| !s.is_empty()).peekable();
        let mut current = &mut self.values;
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                current.insert(segment.to_string(), value.into());
                return;
            }
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| ConfigValue::Map(BTreeMap::new()));
            if !matches!(entry, ConfigValue::Map(_)) {
                *entry = ConfigValue::Map(BTreeMap::new());
            }
            current = match entry {
                ConfigValue::Map(map) => map,
                _ => unreachable!("entry was just made a map"),
            };
        }
    }

    pub fn add_all_nested<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<ConfigValue>,
    {
        for (path, value) in entries {
            self.add_nested(path.as_ref(), value);
        }
    }

    /// Looks up the value at a dotted path.
    pub fn get_nested(&self, path: &str) -> Option<&ConfigValue> {
        let mut segments = path.split('.').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut value = self.values.get(first)?;
        for segment in segments {
            match value {
                ConfigValue::Map(map) => value = map.get(segment)?,
                _ => return None,
            }
        }
        Some(value)
    }

    pub fn contains_nested(&self, path: &str) -> bool {
        self.get_nested(path).is_some()
    }

    /// Serializes the tree as sorted `key=value` lines.
    pub fn to_properties(&self) -> String {
        properties::to_properties_string(&self.values)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", ConfigValue::Map(self.values.clone()))
    }
}
