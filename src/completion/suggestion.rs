/*!
 * Suggestion data structures
 */

use std::fmt;

/// A completion candidate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    /// Text matched against the user's input
    pub text: String,
    pub kind: SuggestionKind,
}

/// Descriptive kind shown next to a candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SuggestionKind {
    Schema,
    Table,
}

impl Suggestion {
    pub fn schema(name: impl Into<String>) -> Self {
        Self {
            text: name.into(),
            kind: SuggestionKind::Schema,
        }
    }

    pub fn table(name: impl Into<String>) -> Self {
        Self {
            text: name.into(),
            kind: SuggestionKind::Table,
        }
    }

    /// Case-insensitive prefix match against what the user typed
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.text.to_lowercase().starts_with(&prefix.to_lowercase())
    }

    /// Display text for the completion menu
    pub fn format_display(&self) -> String {
        format!("{} {} - {}", self.kind.icon(), self.text, self.kind)
    }
}

impl SuggestionKind {
    pub fn icon(&self) -> &'static str {
        match self {
            SuggestionKind::Schema => "🗄️",
            SuggestionKind::Table => "📊",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionKind::Schema => f.write_str("Schema"),
            SuggestionKind::Table => f.write_str("Table"),
        }
    }
}
