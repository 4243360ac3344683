/*!
 * Plugin-backed connections
 *
 * A connection is a named instance of a plugin and provides exactly one
 * schema's worth of tables. Plugin names may carry a trailing `@version` tag.
 */

pub mod validation;

use std::collections::HashMap;

/// Connection name (== schema name) -> connection
pub type ConnectionMap = HashMap<String, Connection>;

/// A configured connection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub name: String,
    pub plugin_name: String,
}

impl Connection {
    pub fn new(name: impl Into<String>, plugin_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plugin_name: plugin_name.into(),
        }
    }

    /// Plugin name with the version tag removed
    pub fn plugin_identity(&self) -> &str {
        strip_plugin_version(&self.plugin_name)
    }
}

/// Schema a plugin declares for a connection during its handshake
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PluginSchema {
    /// 0 means the plugin did not declare a version
    pub protocol_version: u32,
    pub tables: Vec<String>,
}

/// A candidate connection paired with its plugin's declared schema
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionPlugin {
    pub connection_name: String,
    pub plugin_name: String,
    pub schema: PluginSchema,
}

impl ConnectionPlugin {
    pub fn new(connection: &Connection, schema: PluginSchema) -> Self {
        Self {
            connection_name: connection.name.clone(),
            plugin_name: connection.plugin_name.clone(),
            schema,
        }
    }
}

/// `hub.example.io/plugins/acme/aws@latest` -> `hub.example.io/plugins/acme/aws`
pub fn strip_plugin_version(plugin_name: &str) -> &str {
    plugin_name
        .split_once('@')
        .map(|(name, _)| name)
        .unwrap_or(plugin_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_plugin_version() {
        assert_eq!(strip_plugin_version("aws@latest"), "aws");
        assert_eq!(strip_plugin_version("aws@1.2.3@beta"), "aws");
        assert_eq!(strip_plugin_version("aws"), "aws");
        assert_eq!(strip_plugin_version(""), "");
    }

    #[test]
    fn test_plugin_identity_ignores_version() {
        let a = Connection::new("aws_dev", "hub.example.io/plugins/acme/aws@latest");
        let b = Connection::new("aws_prod", "hub.example.io/plugins/acme/aws@0.9.1");
        assert_eq!(a.plugin_identity(), b.plugin_identity());
    }
}
