//! Catalog queries
//!
//! Every operation is pure: the receiver is left untouched and a new catalog
//! (or plain data) is returned.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::{Catalog, CatalogRow};
use crate::error::QueryError;
use crate::value::FieldValue;

/// Value that matches anything in a search
pub const WILDCARD: &str = "*";

/// Search criteria: per field, a set of accepted values
///
/// A row matches when every listed field matches one of its values. Values
/// are compared on their text, so `"1"` finds `Int(1)`; `"*"` accepts any
/// present value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    terms: Vec<(String, Vec<String>)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `value` for `field`
    pub fn with(self, field: &str, value: impl ToString) -> Self {
        self.with_any(field, [value])
    }

    /// Accept any of `values` for `field`
    pub fn with_any<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string());
        match self.terms.iter_mut().find(|(name, _)| name == field) {
            Some((_, accepted)) => accepted.extend(values),
            None => self.terms.push((field.to_string(), values.collect())),
        }
        self
    }

    /// Parse a `field=value[,value...]` term
    pub fn parse_term(self, term: &str) -> Result<Self, QueryError> {
        let Some((field, values)) = term.split_once('=') else {
            return Err(QueryError::InvalidOption {
                option: "criteria".to_string(),
                value: term.to_string(),
                allowed: "'field=value[,value...]'".to_string(),
            });
        };
        Ok(self.with_any(field.trim(), values.split(',').map(str::trim)))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[(String, Vec<String>)] {
        &self.terms
    }
}

/// Text comparison used by [`Catalog::search`]
fn value_matches(value: &FieldValue, accepted: &str) -> bool {
    if accepted == WILDCARD || value.to_string() == accepted {
        return true;
    }
    match value.inner() {
        FieldValue::Int(i) => accepted.parse::<i64>().is_ok_and(|a| a == *i),
        FieldValue::Float(f) => accepted.parse::<f64>().is_ok_and(|a| a == *f),
        _ => false,
    }
}

/// Hashable identity of a row's field values
fn value_key(values: &[Option<FieldValue>]) -> Vec<Option<String>> {
    values
        .iter()
        .map(|value| {
            value
                .as_ref()
                .map(|v| format!("{}:{}", v.type_name(), v))
        })
        .collect()
}

/// Name not yet in `taken`, numbering from 2 on collision
fn unique_name(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|name| name == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

impl Catalog {
    /// Rows whose `field` is present and satisfies `predicate`
    pub fn filter<P>(&self, field: &str, predicate: P) -> Result<Catalog, QueryError>
    where
        P: Fn(&FieldValue) -> bool,
    {
        let index = self.column_index(field)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| row.values[index].as_ref().is_some_and(&predicate))
            .cloned()
            .collect();
        Ok(self.with_rows(rows))
    }

    /// Keep only the named fields, in the given order; path columns stay
    pub fn select_fields(&self, names: &[impl AsRef<str>]) -> Result<Catalog, QueryError> {
        let mut indices = Vec::new();
        for name in names {
            let index = self.column_index(name.as_ref())?;
            if !indices.contains(&index) {
                indices.push(index);
            }
        }

        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                CatalogRow::new(
                    row.paths.clone(),
                    indices.iter().map(|&i| row.values[i].clone()).collect(),
                )
            })
            .collect();

        Ok(Catalog::from_parts(self.path_columns.clone(), columns, rows))
    }

    /// Fields present in both catalogs, in this catalog's order
    pub fn shared_fields(&self, other: &Catalog) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| other.has_column(column))
            .cloned()
            .collect()
    }

    /// Inner join on shared fields
    ///
    /// `on = None` joins on every shared field. Rows join when each join field
    /// is present and equal on both sides. Path columns of `other` are
    /// appended, and its non-join fields follow this catalog's fields; names
    /// that collide get a numeric suffix.
    pub fn combine(&self, other: &Catalog, on: Option<&[&str]>) -> Result<Catalog, QueryError> {
        let shared = self.shared_fields(other);
        let on: Vec<String> = match on {
            None => shared,
            Some(names) => {
                for name in names {
                    if !shared.iter().any(|s| s == name) {
                        return Err(QueryError::unknown_field(name, &shared));
                    }
                }
                names.iter().map(|name| name.to_string()).collect()
            }
        };
        if on.is_empty() {
            return Err(QueryError::NoSharedFields);
        }

        let left: Vec<usize> = on
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<_, _>>()?;
        let right: Vec<usize> = on
            .iter()
            .map(|name| other.column_index(name))
            .collect::<Result<_, _>>()?;

        let mut path_columns = self.path_columns.clone();
        for name in &other.path_columns {
            let renamed = unique_name(name, &path_columns);
            path_columns.push(renamed);
        }

        let mut columns = self.columns.clone();
        let mut extra = Vec::new();
        for (index, name) in other.columns.iter().enumerate() {
            if on.contains(name) {
                continue;
            }
            let renamed = unique_name(name, &columns);
            columns.push(renamed);
            extra.push(index);
        }

        let mut rows = Vec::new();
        for row in &self.rows {
            for candidate in &other.rows {
                let joined = left.iter().zip(&right).all(|(&l, &r)| {
                    match (&row.values[l], &candidate.values[r]) {
                        (Some(a), Some(b)) => a == b,
                        _ => false,
                    }
                });
                if !joined {
                    continue;
                }

                let paths = row
                    .paths
                    .iter()
                    .chain(&candidate.paths)
                    .cloned()
                    .collect();
                let values = row
                    .values
                    .iter()
                    .cloned()
                    .chain(extra.iter().map(|&i| candidate.values[i].clone()))
                    .collect();
                rows.push(CatalogRow::new(paths, values));
            }
        }

        log::debug!(
            "Combined {} and {} rows on {:?} into {}",
            self.len(),
            other.len(),
            on,
            rows.len()
        );
        Ok(Catalog::from_parts(path_columns, columns, rows))
    }

    /// Rows matching all criteria
    ///
    /// Empty criteria select nothing.
    pub fn search(&self, criteria: &Criteria) -> Result<Catalog, QueryError> {
        if criteria.is_empty() {
            return Ok(self.with_rows(Vec::new()));
        }

        let terms = criteria
            .terms()
            .iter()
            .map(|(field, accepted)| Ok((self.column_index(field)?, accepted)))
            .collect::<Result<Vec<_>, QueryError>>()?;

        let rows = self
            .rows
            .iter()
            .filter(|row| {
                terms.iter().all(|(index, accepted)| {
                    row.values[*index]
                        .as_ref()
                        .is_some_and(|value| accepted.iter().any(|a| value_matches(value, a)))
                })
            })
            .cloned()
            .collect();
        Ok(self.with_rows(rows))
    }

    /// Stable sort by the given fields; missing values sort last
    pub fn sort_by(&self, fields: &[impl AsRef<str>]) -> Result<Catalog, QueryError> {
        let indices = fields
            .iter()
            .map(|field| self.column_index(field.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            indices
                .iter()
                .map(|&i| match (&a.values[i], &b.values[i]) {
                    (Some(x), Some(y)) => x.total_cmp(y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        Ok(self.with_rows(rows))
    }

    /// Distinct present values of a field in first-appearance order
    pub fn unique_values(&self, field: &str) -> Result<Vec<FieldValue>, QueryError> {
        let index = self.column_index(field)?;
        let mut unique: Vec<FieldValue> = Vec::new();
        for value in self.rows.iter().filter_map(|row| row.values[index].as_ref()) {
            if !unique.contains(value) {
                unique.push(value.clone());
            }
        }
        Ok(unique)
    }

    /// Per row, the first path and the given fields' text joined by `sep`
    ///
    /// `keys = None` uses every field. Missing values render as empty text.
    pub fn combine_by_keys(
        &self,
        keys: Option<&[&str]>,
        sep: &str,
    ) -> Result<Vec<(String, String)>, QueryError> {
        let indices: Vec<usize> = match keys {
            None => (0..self.columns.len()).collect(),
            Some(keys) => keys
                .iter()
                .map(|key| self.column_index(key))
                .collect::<Result<_, _>>()?,
        };

        Ok(self
            .rows
            .iter()
            .map(|row| {
                let joined = indices
                    .iter()
                    .map(|&i| {
                        row.values[i]
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>()
                    .join(sep);
                (row.paths.first().cloned().unwrap_or_default(), joined)
            })
            .collect())
    }

    /// Fail if two rows carry identical values for every field
    pub fn ensure_unique_metadata(&self) -> Result<(), QueryError> {
        let mut seen: HashMap<Vec<Option<String>>, &CatalogRow> = HashMap::new();
        for row in &self.rows {
            if let Some(first) = seen.insert(value_key(&row.values), row) {
                return Err(QueryError::NonUniqueMetadata {
                    first: first.paths.first().cloned().unwrap_or_default(),
                    second: row.paths.first().cloned().unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    /// Whether every field tuple is distinct
    pub fn has_unique_metadata(&self) -> bool {
        let mut seen = HashSet::new();
        self.rows.iter().all(|row| seen.insert(value_key(&row.values)))
    }
}
