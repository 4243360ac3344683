/*!
 * Schema metadata snapshot
 *
 * What the completion engine knows about the live catalog:
 * - schema name -> table names
 * - the search path
 * - the session-scoped temporary schema
 */

use std::collections::{HashMap, HashSet};

/// Schema catalog snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaMetadata {
    /// Tables per schema: schema name -> table names
    pub schemas: HashMap<String, HashSet<String>>,
    /// Schemas whose tables are reachable by unqualified name, in order
    pub search_path: Vec<String>,
    /// At most one schema is temporary
    pub temporary_schema_name: String,
}

impl SchemaMetadata {
    /// Create an empty snapshot
    pub fn new(temporary_schema_name: impl Into<String>) -> Self {
        Self {
            temporary_schema_name: temporary_schema_name.into(),
            ..Self::default()
        }
    }

    /// Add (or extend) a schema with the given tables
    pub fn add_schema<I, S>(&mut self, schema: impl Into<String>, tables: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemas
            .entry(schema.into())
            .or_default()
            .extend(tables.into_iter().map(Into::into));
    }

    pub fn is_temporary(&self, schema: &str) -> bool {
        schema == self.temporary_schema_name
    }

    pub fn in_search_path(&self, schema: &str) -> bool {
        self.search_path.iter().any(|s| s == schema)
    }

    /// Schema names in byte order
    pub fn sorted_schema_names(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.schemas.keys().collect();
        names.sort();
        names
    }

    /// Tables of a schema in byte order, empty for unknown schemas
    pub fn sorted_tables(&self, schema: &str) -> Vec<&String> {
        let mut tables: Vec<&String> = self
            .schemas
            .get(schema)
            .map(|tables| tables.iter().collect())
            .unwrap_or_default();
        tables.sort();
        tables
    }

    /// Search path entries that name a schema this snapshot does not have
    pub fn unknown_search_path_entries(&self) -> Vec<&String> {
        self.search_path
            .iter()
            .filter(|s| !self.schemas.contains_key(s.as_str()))
            .collect()
    }
}
