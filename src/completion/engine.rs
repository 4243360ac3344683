/*!
 * Suggestion engine
 *
 * Core completion logic responsible for:
 * - Building schema, unqualified table and qualified table candidates
 * - Suppressing ambiguous short names across connections of the same plugin
 * - Filtering candidates by the word being typed
 */

use super::metadata::SchemaMetadata;
use super::suggestion::Suggestion;
use crate::connection::{Connection, ConnectionMap};
use crate::workspace::Workspace;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Builds the ranked candidate list for a catalog snapshot.
///
/// Output order is fixed: schema names, then unqualified table names, then
/// `schema.table` names, each group sorted by byte order. Schemas are visited
/// in sorted order so "first schema of a plugin wins" is reproducible.
#[derive(Default)]
pub struct SuggestionBuilder<'a> {
    trace_sink: Option<&'a dyn Fn(&str)>,
}

impl<'a> SuggestionBuilder<'a> {
    pub fn new() -> Self {
        Self { trace_sink: None }
    }

    /// Receive every unqualified table name once the list is complete
    pub fn with_trace_sink(mut self, sink: &'a dyn Fn(&str)) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    pub fn build(&self, metadata: &SchemaMetadata, connections: &ConnectionMap) -> Vec<Suggestion> {
        let mut schema_names: Vec<String> = Vec::new();
        let mut unqualified_tables: Vec<String> = Vec::new();
        let mut qualified_tables: Vec<String> = Vec::new();

        // plugins whose first schema already contributed unqualified names
        let mut plugins_with_unqualified_tables: HashSet<&str> = HashSet::new();

        for schema in metadata.sorted_schema_names() {
            let tables = &metadata.schemas[schema];
            let is_temporary = metadata.is_temporary(schema);
            // the temporary schema and static schemas such as `public` have no connection
            let plugin = connections
                .get(schema.as_str())
                .map(Connection::plugin_identity);

            if !is_temporary {
                schema_names.push(schema.clone());
                qualified_tables.extend(tables.iter().map(|table| format!("{}.{}", schema, table)));
            }

            // the temporary schema is never subject to plugin dedup
            let same_plugin_included = !is_temporary
                && plugin.is_some_and(|p| plugins_with_unqualified_tables.contains(p));
            let eligible = (metadata.in_search_path(schema) || is_temporary) && !same_plugin_included;

            if eligible {
                unqualified_tables.extend(tables.iter().cloned());
                if !is_temporary && !tables.is_empty() {
                    if let Some(plugin) = plugin {
                        plugins_with_unqualified_tables.insert(plugin);
                    }
                }
            }
        }

        schema_names.sort();
        unqualified_tables.sort();
        qualified_tables.sort();

        if let Some(sink) = self.trace_sink {
            for table in &unqualified_tables {
                sink(table);
            }
        }

        schema_names
            .into_iter()
            .map(Suggestion::schema)
            .chain(unqualified_tables.into_iter().map(Suggestion::table))
            .chain(qualified_tables.into_iter().map(Suggestion::table))
            .collect()
    }
}

/// Build suggestions without tracing
pub fn build_suggestions(metadata: &SchemaMetadata, connections: &ConnectionMap) -> Vec<Suggestion> {
    SuggestionBuilder::new().build(metadata, connections)
}

/// Suggestion engine over the live workspace
pub struct SuggestionEngine {
    workspace: Arc<Mutex<Workspace>>,
}

impl SuggestionEngine {
    pub fn new(workspace: Arc<Mutex<Workspace>>) -> Self {
        Self { workspace }
    }

    /// Candidates matching `word`, recomputed from the current snapshot
    pub fn get_suggestions(&self, word: &str) -> Vec<Suggestion> {
        // workspace may be mid-reload; offer nothing rather than block the editor
        let workspace = match self.workspace.try_lock() {
            Ok(workspace) => workspace,
            Err(_) => return Vec::new(),
        };

        let trace_table = |table: &str| trace!(table = table, "unqualified table suggestion");
        let suggestions = SuggestionBuilder::new()
            .with_trace_sink(&trace_table)
            .build(workspace.metadata(), workspace.connections());

        matching_suggestions(suggestions, word, workspace.max_completions())
    }
}

/// Candidates matching `word`, keeping list order, at most `limit` of them
pub fn matching_suggestions(suggestions: Vec<Suggestion>, word: &str, limit: usize) -> Vec<Suggestion> {
    suggestions
        .into_iter()
        .filter(|suggestion| suggestion.matches_prefix(word))
        .take(limit)
        .collect()
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
