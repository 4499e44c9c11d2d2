//! Project identity of a generated module.

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    name: String,
    package_name: String,
}

impl Project {
    /// Builds an identity from a fully qualified name such as
    /// `com.example.demo`: the last segment is the name, the rest the
    /// package. A name without dots is placed in the `com.example` package.
    pub fn parse(qualified: &str) -> Self {
        let qualified = qualified.trim();
        match qualified.rsplit_once('.') {
            Some((package, name)) if !package.is_empty() && !name.is_empty() => Self {
                name: name.to_string(),
                package_name: package.to_string(),
            },
            _ => Self {
                name: qualified.trim_matches('.').to_string(),
                package_name: "com.example".to_string(),
            },
        }
    }

    pub fn new(package_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_name: package_name.into(),
        }
    }

    /// Identity of a target module: `<package>.<module>`.
    pub fn for_module(&self, module_name: &str) -> Self {
        Self::parse(&format!("{}.{}", self.package_name, module_name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package_name, self.name)
    }

    pub fn package_path(&self) -> String {
        self.package_name.replace('.', "/")
    }

    /// `demo-app` becomes `DemoApp`.
    pub fn class_name(&self) -> String {
        self.name
            .split(['-', '_', '.'])
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect()
    }

    /// `demo-app` becomes `demoApp`.
    pub fn property_name(&self) -> String {
        let class = self.class_name();
        let mut chars = class.chars();
        match chars.next() {
            Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }

    /// Values exposed to template models.
    pub fn properties(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("name", self.name.clone()),
            ("packageName", self.package_name.clone()),
            ("packagePath", self.package_path()),
            ("className", self.class_name()),
            ("propertyName", self.property_name()),
        ])
    }
}
