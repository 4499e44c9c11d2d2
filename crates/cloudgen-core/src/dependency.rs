//! Logical dependencies and the coordinate resolver seam.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::GenerateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyScope {
    #[default]
    Compile,
    Runtime,
    CompileOnly,
    AnnotationProcessor,
    Test,
    TestRuntime,
}

impl DependencyScope {
    pub fn name(self) -> &'static str {
        match self {
            DependencyScope::Compile => "compile",
            DependencyScope::Runtime => "runtime",
            DependencyScope::CompileOnly => "compileOnly",
            DependencyScope::AnnotationProcessor => "annotationProcessor",
            DependencyScope::Test => "test",
            DependencyScope::TestRuntime => "testRuntime",
        }
    }
}

/// A published `group:artifact:version` coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl Coordinate {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    /// Parses `group:artifact:version`.
    pub fn parse(gav: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = gav.split(':').collect();
        match parts.as_slice() {
            [group, artifact, version]
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(*group, *artifact, *version))
            }
            _ => anyhow::bail!("Invalid coordinate '{}'. Expected group:artifact:version", gav),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Turns an artifact id into a published coordinate.
///
/// A missing entry is fatal for the run; the context propagates the error
/// unchanged.
pub trait CoordinateResolver {
    fn resolve(&self, artifact_id: &str) -> anyhow::Result<Coordinate>;
}

/// Resolver backed by a fixed artifact table.
#[derive(Debug, Clone, Default)]
pub struct StaticCoordinateResolver {
    entries: BTreeMap<String, Coordinate>,
}

impl StaticCoordinateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, coordinate: Coordinate) -> Self {
        self.insert(coordinate);
        self
    }

    pub fn insert(&mut self, coordinate: Coordinate) {
        self.entries
            .insert(coordinate.artifact_id.clone(), coordinate);
    }

    /// Registers `gav` under `artifact_id`, which may differ from the
    /// coordinate's own artifact id.
    pub fn insert_gav(&mut self, artifact_id: &str, gav: &str) -> anyhow::Result<()> {
        let coordinate = Coordinate::parse(gav)?;
        self.entries.insert(artifact_id.to_string(), coordinate);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CoordinateResolver for StaticCoordinateResolver {
    fn resolve(&self, artifact_id: &str) -> anyhow::Result<Coordinate> {
        self.entries.get(artifact_id).cloned().ok_or_else(|| {
            GenerateError::CoordinateNotFound {
                artifact: artifact_id.to_string(),
            }
            .into()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Dependency {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: DependencyScope,
    /// Group and version come from the resolver when the dependency is added.
    #[serde(skip)]
    pub requires_lookup: bool,
}

impl Dependency {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: Some(group_id.into()),
            artifact_id: artifact_id.into(),
            version: None,
            scope: DependencyScope::default(),
            requires_lookup: false,
        }
    }

    /// A dependency known only by artifact id.
    pub fn lookup(artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: None,
            artifact_id: artifact_id.into(),
            version: None,
            scope: DependencyScope::default(),
            requires_lookup: true,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_scope(mut self, scope: DependencyScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn compile(self) -> Self {
        self.with_scope(DependencyScope::Compile)
    }

    pub fn runtime(self) -> Self {
        self.with_scope(DependencyScope::Runtime)
    }

    pub fn test(self) -> Self {
        self.with_scope(DependencyScope::Test)
    }

    pub fn annotation_processor(self) -> Self {
        self.with_scope(DependencyScope::AnnotationProcessor)
    }

    pub fn resolved(&self, resolver: &dyn CoordinateResolver) -> anyhow::Result<Self> {
        let coordinate = resolver.resolve(&self.artifact_id)?;
        Ok(Self {
            group_id: Some(coordinate.group_id),
            artifact_id: coordinate.artifact_id,
            version: Some(coordinate.version),
            scope: self.scope,
            requires_lookup: false,
        })
    }

    fn identity(&self) -> (Option<&str>, &str, DependencyScope) {
        (self.group_id.as_deref(), &self.artifact_id, self.scope)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(group) = &self.group_id {
            write!(f, "{group}:")?;
        }
        f.write_str(&self.artifact_id)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        write!(f, " ({})", self.scope.name())
    }
}

/// Ordered dependency list of one module.
///
/// A dependency with the same group, artifact and scope as an existing one
/// is dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DependencyList {
    items: Vec<Dependency>,
}

impl DependencyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `dependency`, resolving it first when it needs a lookup.
    ///
    /// Returns `false` if an equivalent dependency was already present.
    pub fn add(
        &mut self,
        dependency: Dependency,
        resolver: &dyn CoordinateResolver,
    ) -> anyhow::Result<bool> {
        let dependency = if dependency.requires_lookup {
            dependency.resolved(resolver)?
        } else {
            dependency
        };
        if self.items.iter().any(|d| d.identity() == dependency.identity()) {
            return Ok(false);
        }
        self.items.push(dependency);
        Ok(true)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_artifact(&self, artifact_id: &str) -> bool {
        self.items.iter().any(|d| d.artifact_id == artifact_id)
    }
}

impl<'a> IntoIterator for &'a DependencyList {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> StaticCoordinateResolver {
        StaticCoordinateResolver::new().with(Coordinate::new(
            "io.micronaut.aws",
            "micronaut-aws-sdk-v2",
            "4.0.0",
        ))
    }

    #[test]
    fn duplicate_dependencies_are_dropped() {
        let mut list = DependencyList::new();
        let r = resolver();
        assert!(list.add(Dependency::new("io.micronaut", "micronaut-http"), &r).unwrap());
        assert!(!list.add(Dependency::new("io.micronaut", "micronaut-http"), &r).unwrap());
        assert!(list
            .add(Dependency::new("io.micronaut", "micronaut-http").test(), &r)
            .unwrap());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn lookup_dependencies_are_resolved_on_add() {
        let mut list = DependencyList::new();
        list.add(Dependency::lookup("micronaut-aws-sdk-v2"), &resolver())
            .unwrap();
        let dep = list.iter().next().unwrap();
        assert_eq!(dep.group_id.as_deref(), Some("io.micronaut.aws"));
        assert_eq!(dep.version.as_deref(), Some("4.0.0"));
        assert!(!dep.requires_lookup);
    }

    #[test]
    fn unresolvable_lookup_is_fatal() {
        let mut list = DependencyList::new();
        let err = list
            .add(Dependency::lookup("unknown-artifact"), &resolver())
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<GenerateError>(),
            Some(&GenerateError::CoordinateNotFound {
                artifact: "unknown-artifact".to_string()
            })
        );
        assert!(list.is_empty());
    }

    #[test]
    fn coordinate_parse_requires_three_parts() {
        assert!(Coordinate::parse("a:b:c").is_ok());
        assert!(Coordinate::parse("a:b").is_err());
        assert!(Coordinate::parse("a::c").is_err());
    }
}
