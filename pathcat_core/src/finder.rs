//! Finder: a directory template plus a file-name template
//!
//! The path template describes directories and always ends in `/`; the file
//! template describes the file name and never contains `/`. Together they
//! form the full template used for [`Finder::find_files`], while
//! [`Finder::find_paths`] matches directories against the path template
//! alone.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::catalog::{BuildReport, Catalog, CatalogBuilder, Criteria};
use crate::crawler::CrawlOptions;
use crate::error::{QueryError, Result, TemplateError};
use crate::matcher::MatchRecord;
use crate::template::{CustomTypeRegistry, Template};
use crate::value::FieldValue;

/// What to do when a lookup finds nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnEmpty {
    #[default]
    Raise,
    Warn,
    Allow,
}

impl FromStr for OnEmpty {
    type Err = QueryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "raise" => Ok(Self::Raise),
            "warn" => Ok(Self::Warn),
            "allow" => Ok(Self::Allow),
            other => Err(QueryError::invalid_option(
                "on_empty",
                other,
                &["raise", "warn", "allow"],
            )),
        }
    }
}

/// What to do with paths the glob admits but the template rejects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnParseError {
    #[default]
    Raise,
    Warn,
    Ignore,
}

impl FromStr for OnParseError {
    type Err = QueryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "raise" => Ok(Self::Raise),
            "warn" => Ok(Self::Warn),
            "ignore" => Ok(Self::Ignore),
            other => Err(QueryError::invalid_option(
                "on_parse_error",
                other,
                &["raise", "warn", "ignore"],
            )),
        }
    }
}

/// Options for finder lookups
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Directory to crawl; defaults to the template's literal prefix for
    /// absolute templates and the working directory otherwise
    pub root: Option<PathBuf>,
    pub on_empty: OnEmpty,
    pub on_parse_error: OnParseError,
    pub crawl: CrawlOptions,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_on_empty(mut self, on_empty: OnEmpty) -> Self {
        self.on_empty = on_empty;
        self
    }

    pub fn with_on_parse_error(mut self, on_parse_error: OnParseError) -> Self {
        self.on_parse_error = on_parse_error;
        self
    }

    pub fn with_crawl(mut self, crawl: CrawlOptions) -> Self {
        self.crawl = crawl;
        self
    }
}

/// Path template and file template searched together
#[derive(Debug, Clone)]
pub struct Finder {
    path: Arc<Template>,
    file: Arc<Template>,
    full: Arc<Template>,
    test_paths: Option<Vec<String>>,
}

impl Finder {
    pub fn new(path_template: &str, file_template: &str) -> Result<Self> {
        Self::with_registry(path_template, file_template, &CustomTypeRegistry::new())
    }

    /// Finder whose templates resolve custom type specs from `registry`
    pub fn with_registry(
        path_template: &str,
        file_template: &str,
        registry: &CustomTypeRegistry,
    ) -> Result<Self> {
        if let Some(position) = file_template.find('/') {
            return Err(TemplateError::malformed(
                position,
                "file template may not contain a path separator",
            )
            .into());
        }

        let mut path_source = path_template.to_string();
        if !path_source.is_empty() && !path_source.ends_with('/') {
            path_source.push('/');
        }

        let path = Template::compile_with(&path_source, registry)?;
        let file = Template::compile_with(file_template, registry)?;
        let full = Template::compile_with(&format!("{path_source}{file_template}"), registry)?;

        Ok(Self {
            path: Arc::new(path),
            file: Arc::new(file),
            full: Arc::new(full),
            test_paths: None,
        })
    }

    /// Match an explicit list of paths instead of crawling
    pub fn with_test_paths<I, S>(mut self, paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for path in paths {
            let path = path.into();
            if unique.contains(&path) {
                return Err(QueryError::DuplicatePaths { path }.into());
            }
            unique.push(path);
        }
        self.test_paths = Some(unique);
        Ok(self)
    }

    pub fn path_template(&self) -> &Template {
        &self.path
    }

    pub fn file_template(&self) -> &Template {
        &self.file
    }

    pub fn full_template(&self) -> &Template {
        &self.full
    }

    /// All field names in order of appearance
    pub fn keys(&self) -> &[String] {
        self.full.keys()
    }

    pub fn keys_path(&self) -> &[String] {
        self.path.keys()
    }

    pub fn keys_file(&self) -> &[String] {
        self.file.keys()
    }

    pub fn create_path_name(&self, fields: &HashMap<String, FieldValue>) -> Result<String> {
        Ok(self.path.render(fields)?)
    }

    pub fn create_file_name(&self, fields: &HashMap<String, FieldValue>) -> Result<String> {
        Ok(self.file.render(fields)?)
    }

    pub fn create_full_name(&self, fields: &HashMap<String, FieldValue>) -> Result<String> {
        Ok(self.full.render(fields)?)
    }

    /// Directory the crawl starts from when no root is given
    ///
    /// The literal leading directories of an absolute template, otherwise `.`.
    pub fn default_root(&self) -> PathBuf {
        if !self.full.is_absolute() {
            return PathBuf::from(".");
        }

        let components = self.full.components();
        let prefix: Vec<String> = components
            .iter()
            .take(self.full.static_prefix_len())
            .map(|component| component.literals().collect())
            .collect();
        match prefix.join("/") {
            root if root.is_empty() => PathBuf::from("/"),
            root => PathBuf::from(root),
        }
    }

    /// Files matching the full template and `criteria`
    ///
    /// Empty criteria select every file.
    pub fn find_files(&self, criteria: &Criteria, options: &FindOptions) -> Result<Catalog> {
        let report = match &self.test_paths {
            Some(paths) => self.builder(&self.full, options).build_from_paths(paths)?,
            None => self.builder(&self.full, options).build()?,
        };
        self.finish(report, &self.full, criteria, options)
    }

    /// Directories matching the path template and `criteria`
    ///
    /// The path column shows each directory as `dir/*`.
    pub fn find_paths(&self, criteria: &Criteria, options: &FindOptions) -> Result<Catalog> {
        if self.path.source().is_empty() {
            return self.finish_empty(Catalog::empty(Vec::new()), options);
        }

        let report = match &self.test_paths {
            Some(paths) => {
                let mut dirs: Vec<&str> = Vec::new();
                for path in paths {
                    if let Some(end) = path.rfind('/') {
                        let dir = &path[..=end];
                        if !dirs.contains(&dir) {
                            dirs.push(dir);
                        }
                    }
                }
                self.builder(&self.path, options).build_from_paths(dirs)?
            }
            None => self.builder(&self.path, options).build()?,
        };

        let catalog = self.finish(report, &self.path, criteria, options)?;
        Ok(catalog.map_paths(|path| format!("{path}*")))
    }

    /// Exactly one file matching `criteria`
    pub fn find_single_file(&self, criteria: &Criteria, options: &FindOptions) -> Result<Catalog> {
        let options = FindOptions {
            on_empty: OnEmpty::Raise,
            ..options.clone()
        };
        single(self.find_files(criteria, &options)?)
    }

    /// Exactly one directory matching `criteria`
    pub fn find_single_path(&self, criteria: &Criteria, options: &FindOptions) -> Result<Catalog> {
        let options = FindOptions {
            on_empty: OnEmpty::Raise,
            ..options.clone()
        };
        single(self.find_paths(criteria, &options)?)
    }

    fn builder(&self, template: &Arc<Template>, options: &FindOptions) -> CatalogBuilder {
        let root = options.root.clone().unwrap_or_else(|| self.default_root());
        CatalogBuilder::new(root)
            .template(Arc::clone(template))
            .options(options.crawl.clone())
    }

    fn finish(
        &self,
        report: BuildReport,
        template: &Template,
        criteria: &Criteria,
        options: &FindOptions,
    ) -> Result<Catalog> {
        for failure in &report.failures {
            let error = unparsable(failure, template);
            match options.on_parse_error {
                OnParseError::Raise => return Err(error.into()),
                OnParseError::Warn => log::warn!("{error}"),
                OnParseError::Ignore => {}
            }
        }

        let catalog = report.catalog;
        catalog.ensure_unique_metadata()?;

        let catalog = if criteria.is_empty() {
            catalog
        } else {
            catalog.search(criteria)?
        };
        self.finish_empty(catalog, options)
    }

    fn finish_empty(&self, catalog: Catalog, options: &FindOptions) -> Result<Catalog> {
        if catalog.is_empty() {
            match options.on_empty {
                OnEmpty::Raise => return Err(QueryError::Empty.into()),
                OnEmpty::Warn => log::warn!("{}", QueryError::Empty),
                OnEmpty::Allow => {}
            }
        }
        Ok(catalog)
    }
}

fn unparsable(failure: &MatchRecord, template: &Template) -> QueryError {
    QueryError::Unparsable {
        path: failure.path().to_string(),
        template: template.source().to_string(),
        reason: failure
            .reason()
            .map(ToString::to_string)
            .unwrap_or_default(),
    }
}

fn single(catalog: Catalog) -> Result<Catalog> {
    match catalog.len() {
        0 => Err(QueryError::Empty.into()),
        1 => Ok(catalog),
        count => Err(QueryError::MoreThanOne { count }.into()),
    }
}

impl fmt::Display for Finder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self
            .keys()
            .iter()
            .map(|key| format!("'{key}'"))
            .collect::<Vec<_>>()
            .join(", ");

        writeln!(f, "<Finder>")?;
        writeln!(f, "path_pattern: '{}'", self.path)?;
        writeln!(f, "file_pattern: '{}'", self.file)?;
        writeln!(f)?;
        writeln!(f, "keys: {keys}")
    }
}
