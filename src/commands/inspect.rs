use crate::completion::metadata::SchemaMetadata;
use crate::completion::suggestion::Suggestion;
use crate::workspace::Workspace;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

/// Renders catalog state as terminal tables
pub struct CatalogPrinter;

impl CatalogPrinter {
    pub fn new() -> Self {
        CatalogPrinter
    }

    pub fn connections_table(&self, workspace: &Workspace) -> Table {
        let mut table = self.new_table(&["Connection", "Plugin", "Protocol", "Tables"]);
        for plugin in workspace.plugins() {
            let protocol = match plugin.schema.protocol_version {
                0 => "-".to_string(),
                v => v.to_string(),
            };
            table.add_row(vec![
                Cell::new(&plugin.connection_name),
                Cell::new(&plugin.plugin_name),
                Cell::new(protocol),
                Cell::new(plugin.schema.tables.len()),
            ]);
        }
        table
    }

    pub fn schemas_table(&self, workspace: &Workspace) -> Table {
        let metadata = workspace.metadata();
        let mut table = self.new_table(&["Schema", "Plugin", "Tables", "Search path"]);
        for schema in metadata.sorted_schema_names() {
            let plugin = if metadata.is_temporary(schema) {
                "(temporary)"
            } else {
                workspace
                    .connections()
                    .get(schema.as_str())
                    .map(|c| c.plugin_identity())
                    .unwrap_or("")
            };
            let position = metadata
                .search_path
                .iter()
                .position(|s| s == schema)
                .map(|i| (i + 1).to_string())
                .unwrap_or_default();
            table.add_row(vec![
                Cell::new(schema),
                Cell::new(plugin),
                Cell::new(metadata.schemas[schema].len()),
                Cell::new(position),
            ]);
        }
        table
    }

    /// Tables of one schema, or of every schema when `schema` is `None`
    pub fn tables_table(&self, metadata: &SchemaMetadata, schema: Option<&str>) -> Table {
        let mut table = self.new_table(&["Schema", "Table"]);
        let schemas: Vec<&String> = match schema {
            Some(name) => metadata
                .sorted_schema_names()
                .into_iter()
                .filter(|s| s.as_str() == name)
                .collect(),
            None => metadata.sorted_schema_names(),
        };
        for schema in schemas {
            for name in metadata.sorted_tables(schema) {
                table.add_row(vec![Cell::new(schema), Cell::new(name)]);
            }
        }
        table
    }

    pub fn search_path_table(&self, metadata: &SchemaMetadata) -> Table {
        let mut table = self.new_table(&["#", "Schema", "Known"]);
        for (i, schema) in metadata.search_path.iter().enumerate() {
            let known = if metadata.schemas.contains_key(schema) {
                "yes"
            } else {
                "no"
            };
            table.add_row(vec![Cell::new(i + 1), Cell::new(schema), Cell::new(known)]);
        }
        table
    }

    pub fn suggestions_table(&self, suggestions: &[Suggestion]) -> Table {
        let mut table = self.new_table(&["Suggestion", "Kind"]);
        for suggestion in suggestions {
            table.add_row(vec![
                Cell::new(&suggestion.text),
                Cell::new(suggestion.kind.to_string()),
            ]);
        }
        table
    }

    fn new_table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
        table
    }
}

impl Default for CatalogPrinter {
    fn default() -> Self {
        Self::new()
    }
}

/// `1 row in set` / `N rows in set`
pub fn rows_footer(count: usize) -> String {
    if count == 1 {
        format!("{} row in set", count)
    } else {
        format!("{} rows in set", count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn workspace() -> Workspace {
        let settings = Settings::parse(
            r#"
            search_path = ["aws", "azure"]

            [temporary_schema]
            tables = ["scratch"]

            [connections.aws]
            plugin = "hub.example.io/plugins/acme/aws@latest"
            protocol_version = 2
            tables = ["ec2", "s3"]
            "#,
        )
        .unwrap();
        Workspace::load_with_protocol(&settings, None, 5)
    }

    #[test]
    fn test_connections_table() {
        let rendered = CatalogPrinter::new().connections_table(&workspace()).to_string();
        assert!(rendered.contains("aws"));
        assert!(rendered.contains("hub.example.io/plugins/acme/aws@latest"));
        assert!(rendered.contains("Protocol"));
    }

    #[test]
    fn test_schemas_table_marks_temporary() {
        let rendered = CatalogPrinter::new().schemas_table(&workspace()).to_string();
        assert!(rendered.contains("(temporary)"));
        assert!(rendered.contains("pg_temp"));
    }

    #[test]
    fn test_tables_table_filters_schema() {
        let ws = workspace();
        let rendered = CatalogPrinter::new()
            .tables_table(ws.metadata(), Some("pg_temp"))
            .to_string();
        assert!(rendered.contains("scratch"));
        assert!(!rendered.contains("ec2"));
    }

    #[test]
    fn test_search_path_table_flags_unknown() {
        let ws = workspace();
        let rendered = CatalogPrinter::new()
            .search_path_table(ws.metadata())
            .to_string();
        assert!(rendered.contains("azure"));
        assert!(rendered.contains("no"));
    }

    #[test]
    fn test_rows_footer() {
        assert_eq!(rows_footer(1), "1 row in set");
        assert_eq!(rows_footer(0), "0 rows in set");
    }
}
