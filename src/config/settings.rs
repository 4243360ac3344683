/*!
 * TOML workspace configuration.
 *
 * The workspace file stands in for the connection configuration store: it
 * declares each connection's plugin together with the schema that plugin
 * reports (protocol version and tables).
 *
 * ```toml
 * search_path_prefix = ["aws"]
 * search_path = ["aws", "gcp", "public"]
 *
 * [temporary_schema]
 * name = "pg_temp"
 * tables = ["scratch"]
 *
 * [schemas.public]
 * tables = ["migrations"]
 *
 * [connections.aws]
 * plugin = "hub.example.io/plugins/acme/aws@latest"
 * protocol_version = 0
 * tables = ["aws_ec2_instance", "aws_s3_bucket"]
 *
 * [completion]
 * max_items = 50
 * ```
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default name of the session-scoped schema
pub const DEFAULT_TEMPORARY_SCHEMA: &str = "pg_temp";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Schemas placed ahead of the search path.
    pub search_path_prefix: Vec<String>,

    /// Explicit search path. When absent, `public` followed by every live
    /// connection in name order is used.
    pub search_path: Option<Vec<String>>,

    /// Session-scoped schema.
    pub temporary_schema: TemporarySchemaSettings,

    /// Schemas that exist without a backing connection.
    pub schemas: HashMap<String, StaticSchemaSettings>,

    /// Plugin-backed connections.
    pub connections: HashMap<String, ConnectionSettings>,

    /// Line-editor completion.
    pub completion: CompletionSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemporarySchemaSettings {
    pub name: String,
    pub tables: Vec<String>,
}

impl Default for TemporarySchemaSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_TEMPORARY_SCHEMA.to_string(),
            tables: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticSchemaSettings {
    pub tables: Vec<String>,
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Plugin reference, optionally tagged with `@version`.
    pub plugin: String,

    /// Protocol version the plugin declares (0 = undeclared).
    #[serde(default)]
    pub protocol_version: u32,

    /// Tables the plugin exposes.
    #[serde(default)]
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Upper bound on candidates shown per completion request.
    pub max_items: usize,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self { max_items: 50 }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and check settings from TOML text.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.temporary_schema.name.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "temporary_schema.name must not be empty".to_string(),
            ));
        }

        let mut names: Vec<&String> = self.connections.keys().collect();
        names.sort();
        for name in names {
            if self.connections[name].plugin.trim().is_empty() {
                return Err(SettingsError::InvalidConfig(format!(
                    "connection '{}' has an empty plugin name",
                    name
                )));
            }
            if self.schemas.contains_key(name) {
                return Err(SettingsError::InvalidConfig(format!(
                    "'{}' is declared both as a connection and as a schema",
                    name
                )));
            }
            if *name == self.temporary_schema.name {
                return Err(SettingsError::InvalidConfig(format!(
                    "connection '{}' uses the temporary schema name",
                    name
                )));
            }
        }

        Ok(())
    }
}
