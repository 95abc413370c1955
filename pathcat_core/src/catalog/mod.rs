//! Catalog of matched paths
//!
//! A catalog is a table: one row per successfully matched path, one column
//! per template field plus one or more path columns. It is assembled once by
//! the [`CatalogBuilder`] and never mutated afterwards; the query operations
//! in [`query`] return new catalogs.

mod builder;
pub mod query;

pub use builder::{BuildReport, CatalogBuilder};
pub use query::Criteria;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::error::QueryError;
use crate::value::FieldValue;

/// Name of the path column of a freshly built catalog
pub const PATH_COLUMN: &str = "path";

/// One catalog row
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    /// One entry per path column
    paths: Vec<String>,
    /// One entry per field column; `None` where the matching template lacks
    /// the field
    values: Vec<Option<FieldValue>>,
}

impl CatalogRow {
    pub(crate) fn new(paths: Vec<String>, values: Vec<Option<FieldValue>>) -> Self {
        Self { paths, values }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn values(&self) -> &[Option<FieldValue>] {
        &self.values
    }
}

/// Table of matched paths and their fields
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    path_columns: Vec<String>,
    columns: Vec<String>,
    rows: Vec<CatalogRow>,
}

impl Catalog {
    /// Empty catalog with the given field columns and a single path column
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            path_columns: vec![PATH_COLUMN.to_string()],
            columns,
            rows: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        path_columns: Vec<String>,
        columns: Vec<String>,
        rows: Vec<CatalogRow>,
    ) -> Self {
        Self {
            path_columns,
            columns,
            rows,
        }
    }

    /// Same columns, different rows
    pub(crate) fn with_rows(&self, rows: Vec<CatalogRow>) -> Self {
        Self {
            path_columns: self.path_columns.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Same rows with every path rewritten by `rewrite`
    pub(crate) fn map_paths(&self, rewrite: impl Fn(&str) -> String) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                CatalogRow::new(
                    row.paths.iter().map(|path| rewrite(path)).collect(),
                    row.values.clone(),
                )
            })
            .collect();
        self.with_rows(rows)
    }

    /// Field column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn path_columns(&self) -> &[String] {
        &self.path_columns
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Position of a field column
    pub fn column_index(&self, name: &str) -> Result<usize, QueryError> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| QueryError::unknown_field(name, &self.columns))
    }

    /// Row view at `index`
    pub fn get(&self, index: usize) -> Option<CatalogEntry<'_>> {
        self.rows.get(index).map(|row| CatalogEntry { catalog: self, row })
    }

    /// Rows in catalog order
    pub fn iter(&self) -> impl Iterator<Item = CatalogEntry<'_>> {
        self.rows.iter().map(move |row| CatalogEntry { catalog: self, row })
    }

    /// Values of the first path column
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(|row| row.paths.first().map(String::as_str))
    }

    /// Export as a plain 2-D table: path columns first, then fields
    pub fn to_table(&self) -> CatalogTable {
        let columns = self
            .path_columns
            .iter()
            .chain(self.columns.iter())
            .cloned()
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.paths
                    .iter()
                    .map(|path| Some(FieldValue::Str(path.clone())))
                    .chain(row.values.iter().cloned())
                    .collect()
            })
            .collect();

        CatalogTable { columns, rows }
    }
}

impl Serialize for Catalog {
    /// Serialized as a list of objects, one per row
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for entry in self.iter() {
            seq.serialize_element(&entry)?;
        }
        seq.end()
    }
}

/// Borrowed view of one row together with its column names
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry<'a> {
    catalog: &'a Catalog,
    row: &'a CatalogRow,
}

impl<'a> CatalogEntry<'a> {
    /// Value of the first path column
    pub fn path(&self) -> &'a str {
        self.row.paths.first().map(String::as_str).unwrap_or_default()
    }

    /// Path column values paired with their names
    pub fn paths(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.catalog
            .path_columns
            .iter()
            .zip(&self.row.paths)
            .map(|(name, path)| (name.as_str(), path.as_str()))
    }

    pub fn get(&self, field: &str) -> Option<&'a FieldValue> {
        let index = self.catalog.columns.iter().position(|c| c == field)?;
        self.row.values.get(index)?.as_ref()
    }

    /// Present fields in column order
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a FieldValue)> {
        self.catalog
            .columns
            .iter()
            .zip(&self.row.values)
            .filter_map(|(name, value)| value.as_ref().map(|value| (name.as_str(), value)))
    }

    /// Owned field map, e.g. for rendering a template
    pub fn to_map(&self) -> HashMap<String, FieldValue> {
        self.fields()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    pub fn row(&self) -> &'a CatalogRow {
        self.row
    }
}

impl Serialize for CatalogEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, path) in self.paths() {
            map.serialize_entry(name, path)?;
        }
        for (name, value) in self.catalog.columns.iter().zip(&self.row.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Plain 2-D export of a catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<FieldValue>>>,
}
