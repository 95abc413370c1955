//! Catalog builder: crawl, match and assemble

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Catalog, CatalogRow, PATH_COLUMN};
use crate::crawler::{Candidate, CrawlOptions, Crawler, TraversalWarning, slash_path};
use crate::error::{MatchError, Result};
use crate::matcher::{MatchRecord, PathMatcher};
use crate::template::{Template, TraversalPattern};

/// Result of a build: the catalog plus everything that did not make it in
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub catalog: Catalog,
    /// Candidates that no template accepted, in discovery order
    pub failures: Vec<MatchRecord>,
    /// Entries skipped during the crawl
    pub warnings: Vec<TraversalWarning>,
}

impl BuildReport {
    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }
}

/// Builds a catalog from one or more templates
///
/// Templates are crawled in order. Each candidate is matched against every
/// template in order and the first success wins.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    root: PathBuf,
    templates: Vec<Arc<Template>>,
    options: CrawlOptions,
}

impl CatalogBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            templates: Vec::new(),
            options: CrawlOptions::default(),
        }
    }

    /// Add a template
    pub fn template(mut self, template: impl Into<Arc<Template>>) -> Self {
        self.templates.push(template.into());
        self
    }

    /// Add several templates
    pub fn templates<I, T>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Arc<Template>>,
    {
        self.templates.extend(templates.into_iter().map(Into::into));
        self
    }

    pub fn options(mut self, options: CrawlOptions) -> Self {
        self.options = options;
        self
    }

    /// Crawl the root and assemble the catalog
    pub fn build(&self) -> Result<BuildReport> {
        let mut assembly = Assembly::new(&self.templates)?;
        let mut warnings = Vec::new();

        for template in &self.templates {
            let pattern = TraversalPattern::from_template(template)?;
            log::debug!(
                "Crawling {} with pattern '{}'",
                self.root.display(),
                pattern.as_str()
            );

            let mut crawler = Crawler::new(&self.root, pattern, &self.options)?;
            for candidate in crawler.by_ref() {
                let identity = fs::canonicalize(&candidate.path)
                    .map(|path| slash_path(&path))
                    .unwrap_or_else(|_| candidate.relative.clone());
                assembly.add(identity, |absolute| candidate_key(&candidate, absolute));
            }
            warnings.extend(crawler.take_warnings());
        }

        let report = assembly.finish(warnings);
        log::info!(
            "Built catalog of {} rows from {} ({} failures, {} warnings)",
            report.catalog.len(),
            self.root.display(),
            report.failures.len(),
            report.warnings.len()
        );
        Ok(report)
    }

    /// Match an explicit list of paths instead of crawling
    ///
    /// No filesystem access. Repeated paths are kept once.
    pub fn build_from_paths<I, S>(&self, paths: I) -> Result<BuildReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut assembly = Assembly::new(&self.templates)?;
        for path in paths {
            let path = path.as_ref();
            assembly.add(path.to_string(), |_| path.to_string());
        }
        Ok(assembly.finish(Vec::new()))
    }
}

/// Text a template of the given kind is matched against
fn candidate_key(candidate: &Candidate, absolute: bool) -> String {
    if !absolute {
        return candidate.relative.clone();
    }
    if candidate.key.starts_with('/') {
        return candidate.key.clone();
    }

    let mut key = std::path::absolute(&candidate.path)
        .map(|path| slash_path(&path))
        .unwrap_or_else(|_| slash_path(&candidate.path));
    if candidate.relative.ends_with('/') {
        key.push('/');
    }
    key
}

/// Rows under construction
struct Assembly {
    matchers: Vec<PathMatcher>,
    columns: Vec<String>,
    rows: Vec<CatalogRow>,
    failures: Vec<MatchRecord>,
    seen: HashSet<String>,
}

impl Assembly {
    fn new(templates: &[Arc<Template>]) -> Result<Self> {
        let matchers = templates
            .iter()
            .map(|template| PathMatcher::new(Arc::clone(template)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut columns: Vec<String> = Vec::new();
        for template in templates {
            for key in template.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        Ok(Self {
            matchers,
            columns,
            rows: Vec::new(),
            failures: Vec::new(),
            seen: HashSet::new(),
        })
    }

    /// Match one candidate; `key_for(absolute)` yields its path text
    fn add(&mut self, identity: String, key_for: impl Fn(bool) -> String) {
        if !self.seen.insert(identity) {
            return;
        }

        let mut first_failure: Option<MatchRecord> = None;
        for matcher in &self.matchers {
            let record = matcher.match_path(&key_for(matcher.template().is_absolute()));
            if let MatchRecord::Success { path, fields } = record {
                let values = self
                    .columns
                    .iter()
                    .map(|column| {
                        fields
                            .iter()
                            .find(|(name, _)| name == column)
                            .map(|(_, value)| value.clone())
                    })
                    .collect();
                self.rows.push(CatalogRow::new(vec![path], values));
                return;
            }
            first_failure.get_or_insert(record);
        }

        let Some(failure) = first_failure else {
            return;
        };
        let failure = match failure {
            MatchRecord::Failure { path, reason } if self.matchers.len() > 1 => {
                MatchRecord::Failure {
                    path,
                    reason: MatchError::NoTemplateMatched {
                        first_reason: reason.to_string(),
                    },
                }
            }
            other => other,
        };
        log::debug!(
            "No match for '{}': {}",
            failure.path(),
            failure.reason().map(ToString::to_string).unwrap_or_default()
        );
        self.failures.push(failure);
    }

    fn finish(self, warnings: Vec<TraversalWarning>) -> BuildReport {
        BuildReport {
            catalog: Catalog::from_parts(vec![PATH_COLUMN.to_string()], self.columns, self.rows),
            failures: self.failures,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    fn template(source: &str) -> Template {
        Template::compile(source).unwrap()
    }

    #[test]
    fn test_build_from_paths_matches_and_records_failures() {
        let report = CatalogBuilder::new(".")
            .template(template("{site}/{year:d}.csv"))
            .build_from_paths(["A/2020.csv", "B/xx.csv", "A/2020.csv"])
            .unwrap();

        assert_eq!(report.catalog.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0].reason(),
            Some(MatchError::NoValidSplit { .. })
        ));
    }

    #[test]
    fn test_multi_template_first_success_wins() {
        let report = CatalogBuilder::new(".")
            .template(template("{model}/{var}_{year:d}.nc"))
            .template(template("{model}/{var}.nc"))
            .build_from_paths(["cesm/tas_2000.nc", "cesm/pr.nc", "cesm/readme.md"])
            .unwrap();

        let catalog = &report.catalog;
        assert_eq!(catalog.columns(), &["model", "var", "year"]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get(0).unwrap().get("year"),
            Some(&FieldValue::Int(2000))
        );
        assert_eq!(catalog.get(1).unwrap().get("year"), None);

        assert!(matches!(
            report.failures[0].reason(),
            Some(MatchError::NoTemplateMatched { .. })
        ));
    }

    #[test]
    fn test_no_templates_gives_empty_catalog() {
        let report = CatalogBuilder::new(".").build_from_paths(["a"]).unwrap();
        assert!(report.catalog.is_empty());
        assert!(report.failures.is_empty());
    }
}
