//! Caller-owned cache of compiled templates and matchers

use std::collections::HashMap;
use std::sync::Arc;

use super::spec::CustomTypeRegistry;
use super::Template;
use crate::error::TemplateError;
use crate::matcher::PathMatcher;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: usize,
}

/// Compiled templates keyed by their source string
///
/// Owned by whoever needs it; there is no process-wide cache. Compile
/// errors are not cached.
#[derive(Debug, Default)]
pub struct TemplateCache {
    registry: CustomTypeRegistry,
    entries: HashMap<String, Arc<PathMatcher>>,
    hits: u64,
    misses: u64,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose templates resolve custom type specs from `registry`
    pub fn with_registry(registry: CustomTypeRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Compiled template for `source`
    pub fn template(&mut self, source: &str) -> Result<Arc<Template>, TemplateError> {
        Ok(self.matcher(source)?.template_arc())
    }

    /// Matcher for `source`, compiling it on first use
    pub fn matcher(&mut self, source: &str) -> Result<Arc<PathMatcher>, TemplateError> {
        if let Some(matcher) = self.entries.get(source) {
            self.hits += 1;
            return Ok(Arc::clone(matcher));
        }

        self.misses += 1;
        let template = Template::compile_with(source, &self.registry)?;
        let matcher = Arc::new(PathMatcher::new(template)?);
        self.entries.insert(source.to_string(), Arc::clone(&matcher));
        log::debug!("Compiled template '{source}'");

        Ok(matcher)
    }

    pub fn stats(&self) -> TemplateCacheStats {
        TemplateCacheStats {
            hits: self.hits,
            misses: self.misses,
            entry_count: self.entries.len(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_and_misses() {
        let mut cache = TemplateCache::new();
        let first = cache.template("{a}/{b}.txt").unwrap();
        let second = cache.template("{a}/{b}.txt").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        cache.matcher("{c}").unwrap();
        assert_eq!(
            cache.stats(),
            TemplateCacheStats {
                hits: 1,
                misses: 2,
                entry_count: 2
            }
        );
    }

    #[test]
    fn test_errors_not_cached() {
        let mut cache = TemplateCache::new();
        assert!(cache.template("{a").is_err());
        assert!(cache.template("{a").is_err());
        assert_eq!(cache.stats().entry_count, 0);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let mut cache = TemplateCache::new();
        cache.template("{a}").unwrap();
        cache.clear();
        assert_eq!(cache.stats().entry_count, 0);
        assert_eq!(cache.stats().misses, 1);
    }
}
