pub mod inspect;

pub use inspect::CatalogPrinter;

/// REPL meta-commands: (command, aliases, description)
pub const META_COMMANDS: &[(&str, &str, &str)] = &[
    ("\\connections", "\\c", "List live connections."),
    ("\\help", "\\h", "Display this help."),
    ("\\path", "\\p", "Show the search path, or set it with \\p a,b,c."),
    ("\\quit", "\\q", "Quit."),
    ("\\reload", "\\r", "Reload the workspace file and revalidate connections."),
    ("\\schemas", "\\s", "List schemas."),
    ("\\tables", "\\t", "List tables, optionally of one schema: \\t <schema>."),
];
