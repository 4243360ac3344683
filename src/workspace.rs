/*!
 * Live workspace
 *
 * Turns the configured connections into validated, live connections and
 * builds the schema snapshot the completion engine works on. Each load is
 * one validation pass; its failures are kept so the caller can show a
 * single warning block for the pass.
 */

use crate::completion::metadata::SchemaMetadata;
use crate::config::Settings;
use crate::connection::validation::{
    build_validation_warning, format_validation_warning, validate_plugins, ValidationFailure,
    HOST_PROTOCOL_VERSION,
};
use crate::connection::{Connection, ConnectionMap, ConnectionPlugin, PluginSchema};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

/// Schema placed on the default search path ahead of any connection
pub const DEFAULT_SCHEMA: &str = "public";

#[derive(Debug, Default)]
pub struct Workspace {
    connections: ConnectionMap,
    plugins: BTreeMap<String, ConnectionPlugin>,
    metadata: SchemaMetadata,
    failures: Vec<ValidationFailure>,
    max_completions: usize,
    search_path_prefix: Vec<String>,
}

impl Workspace {
    /// Validate the configured connections against this build's protocol
    /// version and build the next workspace.
    ///
    /// `previous` is the workspace currently live, if any. A rejected
    /// connection keeps its previous registration unless the failure asks
    /// for it to be dropped.
    pub fn load(settings: &Settings, previous: Option<&Workspace>) -> Self {
        Self::load_with_protocol(settings, previous, HOST_PROTOCOL_VERSION)
    }

    pub fn load_with_protocol(
        settings: &Settings,
        previous: Option<&Workspace>,
        host_protocol_version: u32,
    ) -> Self {
        let (updates, candidates) = candidates_from_settings(settings);
        debug!(
            candidates = candidates.len(),
            host_protocol_version = host_protocol_version,
            "validating connections"
        );

        let outcome = validate_plugins(&candidates, &updates, host_protocol_version);

        let mut connections = outcome.accepted_updates;
        let mut plugins: BTreeMap<String, ConnectionPlugin> = outcome
            .accepted_plugins
            .into_iter()
            .map(|plugin| (plugin.connection_name.clone(), plugin))
            .collect();

        for failure in &outcome.failures {
            debug!(
                connection = %failure.connection_name,
                plugin = %failure.plugin,
                "connection rejected: {}",
                failure.message
            );

            let Some(previous) = previous else {
                continue;
            };
            let name = &failure.connection_name;

            if failure.should_drop_if_exists {
                if previous.connections.contains_key(name) {
                    info!(connection = %name, "dropping previously live connection");
                }
                continue;
            }

            if let (Some(connection), Some(plugin)) =
                (previous.connections.get(name), previous.plugins.get(name))
            {
                debug!(connection = %name, "keeping previous registration");
                connections.insert(name.clone(), connection.clone());
                plugins.insert(name.clone(), plugin.clone());
            }
        }

        let metadata = build_metadata(settings, &plugins);
        for entry in metadata.unknown_search_path_entries() {
            debug!(schema = %entry, "search path entry has no schema");
        }

        info!(
            live = connections.len(),
            rejected = outcome.failures.len(),
            schemas = metadata.schemas.len(),
            "workspace loaded"
        );

        Self {
            connections,
            plugins,
            metadata,
            failures: outcome.failures,
            max_completions: settings.completion.max_items,
            search_path_prefix: settings.search_path_prefix.clone(),
        }
    }

    pub fn metadata(&self) -> &SchemaMetadata {
        &self.metadata
    }

    pub fn connections(&self) -> &ConnectionMap {
        &self.connections
    }

    /// Live plugins in connection-name order
    pub fn plugins(&self) -> impl Iterator<Item = &ConnectionPlugin> {
        self.plugins.values()
    }

    /// Failures of the pass that produced this workspace
    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    pub fn max_completions(&self) -> usize {
        self.max_completions
    }

    /// Replace the search path for the rest of the session, keeping the
    /// configured prefix in front as a reload would
    pub fn set_search_path(&mut self, search_path: Vec<String>) {
        self.metadata.search_path = with_prefix(&self.search_path_prefix, &search_path);
    }

    /// Warning block for this pass, empty when nothing was rejected
    pub fn validation_warning(&self, colored: bool) -> String {
        if colored {
            build_validation_warning(&self.failures)
        } else {
            format_validation_warning(&self.failures, false)
        }
    }
}

/// Proposed updates and validation candidates, in connection-name order
fn candidates_from_settings(settings: &Settings) -> (ConnectionMap, Vec<ConnectionPlugin>) {
    let mut names: Vec<&String> = settings.connections.keys().collect();
    names.sort();

    let mut updates = ConnectionMap::new();
    let mut candidates = Vec::with_capacity(names.len());

    for name in names {
        let config = &settings.connections[name];
        let connection = Connection::new(name.clone(), config.plugin.clone());
        candidates.push(ConnectionPlugin::new(
            &connection,
            PluginSchema {
                protocol_version: config.protocol_version,
                tables: config.tables.clone(),
            },
        ));
        updates.insert(name.clone(), connection);
    }

    (updates, candidates)
}

fn build_metadata(settings: &Settings, plugins: &BTreeMap<String, ConnectionPlugin>) -> SchemaMetadata {
    let mut metadata = SchemaMetadata::new(settings.temporary_schema.name.clone());

    for (name, schema) in &settings.schemas {
        metadata.add_schema(name.clone(), schema.tables.iter().cloned());
    }
    for (name, plugin) in plugins {
        metadata.add_schema(name.clone(), plugin.schema.tables.iter().cloned());
    }
    metadata.add_schema(
        settings.temporary_schema.name.clone(),
        settings.temporary_schema.tables.iter().cloned(),
    );

    metadata.search_path = resolve_search_path(settings, plugins.keys());
    metadata
}

/// Prefix, then the configured path or `public` + live connections
fn resolve_search_path<'a>(
    settings: &'a Settings,
    live_connections: impl Iterator<Item = &'a String>,
) -> Vec<String> {
    let base: Vec<String> = match &settings.search_path {
        Some(search_path) => search_path.clone(),
        None => std::iter::once(DEFAULT_SCHEMA.to_string())
            .chain(live_connections.cloned())
            .collect(),
    };

    with_prefix(&settings.search_path_prefix, &base)
}

fn with_prefix(prefix: &[String], search_path: &[String]) -> Vec<String> {
    dedup(prefix.iter().chain(search_path.iter()))
}

fn dedup<'a>(entries: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen: HashSet<&String> = HashSet::new();
    entries
        .filter(|entry| seen.insert(*entry))
        .cloned()
        .collect()
}
