use crate::commands::inspect::rows_footer;
use crate::commands::{CatalogPrinter, META_COMMANDS};
use crate::completion::engine::SuggestionEngine;
use crate::completion::SchemaHelper;
use crate::config::Settings;
use crate::workspace::Workspace;
use anyhow::{anyhow, Result};
use comfy_table::Table;
use rustyline::error::ReadlineError;
use rustyline::{history::DefaultHistory, CompletionType, Config, Editor};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Where the workspace comes from and what overrides apply on every load
pub struct WorkspaceSource {
    pub config_path: PathBuf,
    pub search_path: Option<Vec<String>>,
    pub colored: bool,
}

impl WorkspaceSource {
    pub fn read_settings(&self) -> Result<Settings> {
        let mut settings = Settings::from_file(&self.config_path)?;
        if let Some(search_path) = &self.search_path {
            settings.search_path = Some(search_path.clone());
        }
        Ok(settings)
    }
}

pub struct Cli {
    source: WorkspaceSource,
    editor: Editor<SchemaHelper, DefaultHistory>,
    workspace: Arc<Mutex<Workspace>>,
    printer: CatalogPrinter,
    history_path: Option<PathBuf>,
}

impl Cli {
    pub fn new(source: WorkspaceSource) -> Result<Self> {
        let settings = source.read_settings()?;
        let workspace = Workspace::load(&settings, None);
        print_warning(&workspace, source.colored);

        println!("Welcome to schema-prompt. Meta-commands start with \\.");
        println!("Workspace: {}", source.config_path.display());
        println!(
            "{} live connections, {} schemas.",
            workspace.connections().len(),
            workspace.metadata().schemas.len()
        );
        println!();
        println!("Type '\\h' for help. Press Tab to complete schema and table names.");
        println!();

        let config = Config::builder()
            .completion_type(CompletionType::List)
            .auto_add_history(true)
            .edit_mode(rustyline::EditMode::Emacs)
            .build();

        let mut editor = Editor::with_config(config)?;
        let workspace = Arc::new(Mutex::new(workspace));
        editor.set_helper(Some(SchemaHelper::with_workspace(workspace.clone())));

        let history_path = dirs::home_dir().map(|home| home.join(".schema-prompt_history"));
        if let Some(path) = &history_path {
            if let Err(e) = editor.load_history(path) {
                debug!(path = %path.display(), "no history loaded: {}", e);
            }
        }

        Ok(Self {
            source,
            editor,
            workspace,
            printer: CatalogPrinter::new(),
            history_path,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.editor.readline("schema> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('\\') {
                        match self.handle_meta_command(line) {
                            Ok(true) => continue,
                            Ok(false) => break,
                            Err(e) => println!("Error: {}", e),
                        }
                        continue;
                    }

                    self.show_matches(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye");
                    break;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(path) = &self.history_path {
            if let Err(e) = self.editor.save_history(path) {
                warn!(path = %path.display(), "failed to save history: {}", e);
            }
        }
        Ok(())
    }

    /// Returns `Ok(false)` when the session should end
    fn handle_meta_command(&mut self, line: &str) -> Result<bool> {
        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, Some(argument.trim())),
            None => (line, None),
        };

        match command {
            "\\q" | "\\quit" | "\\exit" => {
                println!("Bye");
                return Ok(false);
            }
            "\\h" | "\\help" => self.show_help(),
            "\\c" | "\\connections" => {
                let workspace = self.lock_workspace()?;
                print_table(self.printer.connections_table(&workspace));
            }
            "\\s" | "\\schemas" => {
                let workspace = self.lock_workspace()?;
                print_table(self.printer.schemas_table(&workspace));
            }
            "\\t" | "\\tables" => {
                let table = self
                    .printer
                    .tables_table(self.lock_workspace()?.metadata(), argument);
                print_table(table);
            }
            "\\p" | "\\path" => match argument {
                Some(argument) => self.set_search_path(argument)?,
                None => {
                    let table = self
                        .printer
                        .search_path_table(self.lock_workspace()?.metadata());
                    print_table(table);
                }
            },
            "\\r" | "\\reload" => self.reload()?,
            _ => {
                println!("Unknown command: {}", command);
                println!("Type '\\h' for help.");
            }
        }
        Ok(true)
    }

    fn show_help(&self) {
        println!("Meta-commands:");
        println!();
        for (command, alias, description) in META_COMMANDS {
            println!("{:<4} ({:<13}) {}", alias, command, description);
        }
        println!();
        println!("Anything else is matched against schema and table names.");
        println!();
    }

    fn show_matches(&self, prefix: &str) {
        let suggestions = SuggestionEngine::new(self.workspace.clone()).get_suggestions(prefix);
        if suggestions.is_empty() {
            println!("No schema or table matches '{}'", prefix);
            return;
        }
        let count = suggestions.len();
        println!("{}", self.printer.suggestions_table(&suggestions));
        println!("{}", rows_footer(count));
    }

    fn set_search_path(&mut self, argument: &str) -> Result<()> {
        let search_path = parse_search_path(argument);
        if search_path.is_empty() {
            return Err(anyhow!("search path must name at least one schema"));
        }
        info!(?search_path, "search path changed");
        self.lock_workspace()?.set_search_path(search_path.clone());
        // keep the override across reloads
        self.source.search_path = Some(search_path);
        println!("Search path changed");
        Ok(())
    }

    fn reload(&mut self) -> Result<()> {
        // a broken workspace file leaves the live workspace untouched
        let settings = self.source.read_settings()?;
        let mut workspace = self.lock_workspace()?;
        let next = Workspace::load(&settings, Some(&*workspace));
        print_warning(&next, self.source.colored);
        println!(
            "Workspace reloaded: {} live connections, {} schemas.",
            next.connections().len(),
            next.metadata().schemas.len()
        );
        *workspace = next;
        Ok(())
    }

    fn lock_workspace(&self) -> Result<MutexGuard<'_, Workspace>> {
        lock(&self.workspace)
    }
}

fn lock(workspace: &Mutex<Workspace>) -> Result<MutexGuard<'_, Workspace>> {
    workspace
        .lock()
        .map_err(|_| anyhow!("workspace lock poisoned"))
}

/// Comma separated schema list, blanks dropped
pub fn parse_search_path(argument: &str) -> Vec<String> {
    argument
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Print the warning block of a validation pass, if it has one
pub fn print_warning(workspace: &Workspace, colored: bool) {
    let warning = workspace.validation_warning(colored);
    if !warning.is_empty() {
        println!("{}", warning);
    }
}

fn print_table(table: Table) {
    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_search_path() {
        assert_eq!(parse_search_path("aws, gcp,,public "), vec!["aws", "gcp", "public"]);
        assert!(parse_search_path(" , ").is_empty());
    }

    #[test]
    fn test_source_applies_search_path_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "search_path = [\"aws\"]\n[connections.gcp]\nplugin = \"gcp\"").unwrap();

        let source = WorkspaceSource {
            config_path: file.path().to_path_buf(),
            search_path: Some(vec!["gcp".to_string()]),
            colored: false,
        };
        let settings = source.read_settings().unwrap();

        assert_eq!(settings.search_path, Some(vec!["gcp".to_string()]));
    }

    #[test]
    fn test_catalog_tables_render_from_locked_workspace() {
        let settings = Settings::parse(
            "[schemas.public]\ntables = []\n[connections.aws]\nplugin = \"aws@1\"\ntables = [\"ec2\"]\n",
        )
        .unwrap();
        let shared = Arc::new(Mutex::new(Workspace::load(&settings, None)));
        let printer = CatalogPrinter::new();

        let workspace = lock(&shared).unwrap();
        let connections = printer.connections_table(&workspace).to_string();
        let schemas = printer.schemas_table(&workspace).to_string();

        assert!(connections.contains("aws@1"));
        assert!(schemas.contains("aws"));
        assert!(schemas.contains("public"));
    }

    #[test]
    fn test_source_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = WorkspaceSource {
            config_path: dir.path().join("nope.toml"),
            search_path: None,
            colored: false,
        };
        let err = source.read_settings().unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
