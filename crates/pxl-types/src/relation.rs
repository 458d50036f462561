//! Relations and the schema registry

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::DataType;

/// Relation construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationError {
    #[error("Duplicate column name '{0}'.")]
    DuplicateColumn(String),
}

/// Ordered list of (column name, data type) describing an operator's output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relation {
    columns: IndexMap<String, DataType>,
}

impl Relation {
    /// Create an empty relation
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (name, type) pairs. Later duplicates overwrite the type
    /// but keep the position of the first occurrence.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, DataType)>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }

    /// Append a column
    pub fn add_column(&mut self, name: impl Into<String>, data_type: DataType) {
        self.columns.insert(name.into(), data_type);
    }

    /// Append a column, failing if the name is already taken
    pub fn try_add_column(&mut self, name: impl Into<String>, data_type: DataType) -> Result<(), RelationError> {
        match self.columns.entry(name.into()) {
            Entry::Occupied(entry) => Err(RelationError::DuplicateColumn(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(data_type);
                Ok(())
            }
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    /// Type of a column by name
    pub fn column_type(&self, name: &str) -> Option<DataType> {
        self.columns.get(name).copied()
    }

    /// Column at an index
    pub fn column(&self, index: usize) -> Option<(&str, DataType)> {
        self.columns.get_index(index).map(|(n, t)| (n.as_str(), *t))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DataType)> {
        self.columns.iter().map(|(n, t)| (n.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Project onto the named columns, in the given order. Returns the names
    /// that are missing instead when any is absent.
    pub fn select<'a>(&self, names: &'a [String]) -> Result<Relation, Vec<&'a str>> {
        let missing: Vec<&str> = names
            .iter()
            .filter(|n| !self.has_column(n))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(Relation::from_columns(
            names.iter().filter_map(|n| self.column_type(n).map(|t| (n.clone(), t))),
        ))
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (name, ty)) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", name, ty)?;
        }
        write!(f, "]")
    }
}

/// Table name → relation map handed to the analyzer by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationMap {
    tables: IndexMap<String, Relation>,
}

impl RelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `{"table": {"column": "TYPE", ...}, ...}` document
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn insert(&mut self, table: impl Into<String>, relation: Relation) {
        self.tables.insert(table.into(), relation);
    }

    pub fn get(&self, table: &str) -> Option<&Relation> {
        self.tables.get(table)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}
