use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

/// Rewrites rendered template text.
pub trait TemplatePostProcessor {
    fn process(&self, input: &str) -> String;
}

impl<F> TemplatePostProcessor for F
where
    F: Fn(&str) -> String,
{
    fn process(&self, input: &str) -> String {
        self(input)
    }
}

type ProcessorRef = Arc<dyn TemplatePostProcessor>;

/// Post-processors keyed by template key or by a pattern on the
/// template's physical path.
#[derive(Clone, Default)]
pub struct PostProcessors {
    by_key: BTreeMap<String, Vec<ProcessorRef>>,
    by_pattern: Vec<(Regex, Vec<ProcessorRef>)>,
}

impl PostProcessors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_for_key(&mut self, key: impl Into<String>, processor: ProcessorRef) {
        self.by_key.entry(key.into()).or_default().push(processor);
    }

    pub fn add_for_pattern(&mut self, pattern: Regex, processor: ProcessorRef) {
        match self
            .by_pattern
            .iter_mut()
            .find(|(existing, _)| existing.as_str() == pattern.as_str())
        {
            Some((_, processors)) => processors.push(processor),
            None => self.by_pattern.push((pattern, vec![processor])),
        }
    }

    /// Runs key processors, then pattern processors matching `physical_path`,
    /// each in registration order.
    pub fn apply(&self, key: &str, physical_path: &str, text: String) -> String {
        let keyed = self.by_key.get(key).into_iter().flatten();
        let patterned = self
            .by_pattern
            .iter()
            .filter(|(pattern, _)| pattern.is_match(physical_path))
            .flat_map(|(_, processors)| processors);
        keyed
            .chain(patterned)
            .fold(text, |acc, processor| processor.process(&acc))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.by_key.keys().map(String::as_str)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.by_pattern.iter().map(|(p, _)| p.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty() && self.by_pattern.is_empty()
    }
}

impl fmt::Debug for PostProcessors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostProcessors")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("patterns", &self.patterns().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_then_pattern_processors_run_in_order() {
        let mut processors = PostProcessors::new();
        processors.add_for_key("buildGradle", Arc::new(|s: &str| format!("{s}+key")));
        processors.add_for_pattern(
            Regex::new(r"\.gradle$").unwrap(),
            Arc::new(|s: &str| format!("{s}+pattern")),
        );

        assert_eq!(
            processors.apply("buildGradle", "aws/build.gradle", "base".to_string()),
            "base+key+pattern"
        );
        assert_eq!(
            processors.apply("other", "aws/pom.xml", "base".to_string()),
            "base"
        );
    }

    #[test]
    fn same_pattern_shares_a_bucket() {
        let mut processors = PostProcessors::new();
        processors.add_for_pattern(Regex::new("yml").unwrap(), Arc::new(|s: &str| s.to_uppercase()));
        processors.add_for_pattern(Regex::new("yml").unwrap(), Arc::new(|s: &str| s.replace('A', "4")));
        assert_eq!(processors.patterns().count(), 1);
        assert_eq!(processors.apply("k", "root/a.yml", "abc".to_string()), "4BC");
    }
}
