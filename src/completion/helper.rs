/*!
 * Line-editor completion helper
 *
 * Integrates the suggestion engine with rustyline: completion, inline hints,
 * highlighting and bracket validation.
 */

use super::engine::SuggestionEngine;
use crate::commands::META_COMMANDS;
use crate::workspace::Workspace;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::{self, MatchingBracketValidator, Validator};
use rustyline::Context;
use std::borrow::Cow;
use std::sync::{Arc, Mutex};

/// Schema and table completer
pub struct SchemaCompleter {
    suggestion_engine: SuggestionEngine,
}

impl SchemaCompleter {
    pub fn with_workspace(workspace: Arc<Mutex<Workspace>>) -> Self {
        Self {
            suggestion_engine: SuggestionEngine::new(workspace),
        }
    }

    /// Start of the word under the cursor. `.` is part of a word so that
    /// qualified names complete as a whole.
    fn get_word_start(&self, line: &str, pos: usize) -> usize {
        line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',' || c == ';')
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    fn meta_command_candidates(&self, word: &str) -> Vec<Pair> {
        META_COMMANDS
            .iter()
            .filter(|(command, _, _)| command.starts_with(word))
            .map(|(command, alias, description)| Pair {
                display: format!("⚙️ {} ({}) - {}", command, alias, description),
                replacement: command.to_string(),
            })
            .collect()
    }
}

impl Completer for SchemaCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let start = self.get_word_start(line, pos);
        let word = &line[start..pos];

        if start == 0 && word.starts_with('\\') {
            return Ok((start, self.meta_command_candidates(word)));
        }

        let completions = self
            .suggestion_engine
            .get_suggestions(word)
            .into_iter()
            .map(|suggestion| Pair {
                display: suggestion.format_display(),
                replacement: suggestion.text,
            })
            .collect();

        Ok((start, completions))
    }
}

/// Schema prompt helper (integrating all functionality)
pub struct SchemaHelper {
    completer: SchemaCompleter,
    highlighter: MatchingBracketHighlighter,
    validator: MatchingBracketValidator,
    hinter: HistoryHinter,
}

impl SchemaHelper {
    pub fn with_workspace(workspace: Arc<Mutex<Workspace>>) -> Self {
        Self {
            completer: SchemaCompleter::with_workspace(workspace),
            highlighter: MatchingBracketHighlighter::new(),
            validator: MatchingBracketValidator::new(),
            hinter: HistoryHinter::new(),
        }
    }
}

impl Completer for SchemaHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Hinter for SchemaHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        if let Some(history_hint) = self.hinter.hint(line, pos, ctx) {
            return Some(history_hint);
        }

        if line.trim().is_empty() {
            return Some("💡 Type a schema or table name, or \\h for help".to_string());
        }

        let start = self.completer.get_word_start(line, pos);
        let word = &line[start..pos];
        if word.is_empty() || word.starts_with('\\') {
            return None;
        }

        // complete inline with the top candidate
        let suggestions = self.completer.suggestion_engine.get_suggestions(word);
        let top = suggestions.first()?;
        top.text
            .get(word.len()..)
            .filter(|rest| !rest.is_empty())
            .map(|rest| rest.to_string())
    }
}

impl Highlighter for SchemaHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        // meta-commands are shown in bold
        match regex::Regex::new(r"^\\[a-z]+") {
            Ok(re) if re.is_match(line) => {
                Cow::Owned(re.replace(line, "\x1b[1m$0\x1b[0m").to_string())
            }
            _ => Cow::Borrowed(line),
        }
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Cow::Borrowed(prompt)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{}\x1b[0m", hint))
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        self.highlighter.highlight_char(line, pos, forced) || line.starts_with('\\')
    }
}

impl Validator for SchemaHelper {
    fn validate(
        &self,
        ctx: &mut validate::ValidationContext,
    ) -> Result<validate::ValidationResult, ReadlineError> {
        self.validator.validate(ctx)
    }

    fn validate_while_typing(&self) -> bool {
        self.validator.validate_while_typing()
    }
}

impl rustyline::Helper for SchemaHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn completer() -> SchemaCompleter {
        let settings = Settings::parse(
            r#"
            search_path = ["aws"]

            [connections.aws]
            plugin = "aws@latest"
            tables = ["aws_ec2_instance", "aws_s3_bucket"]
            "#,
        )
        .unwrap();
        SchemaCompleter::with_workspace(Arc::new(Mutex::new(Workspace::load(&settings, None))))
    }

    #[test]
    fn test_word_start_keeps_qualified_names() {
        let c = completer();
        assert_eq!(c.get_word_start("select * from aws.aws_e", 23), 14);
        assert_eq!(c.get_word_start("count(aws", 9), 6);
        assert_eq!(c.get_word_start("aws", 3), 0);
    }

    #[test]
    fn test_meta_command_candidates() {
        let c = completer();
        let candidates: Vec<String> = c
            .meta_command_candidates("\\re")
            .into_iter()
            .map(|p| p.replacement)
            .collect();
        assert_eq!(candidates, vec!["\\reload"]);
        assert_eq!(c.meta_command_candidates("\\").len(), META_COMMANDS.len());
    }

    #[test]
    fn test_engine_candidates_for_qualified_prefix() {
        let c = completer();
        let texts: Vec<String> = c
            .suggestion_engine
            .get_suggestions("aws.aws_s")
            .into_iter()
            .map(|s| s.text)
            .collect();
        assert_eq!(texts, vec!["aws.aws_s3_bucket"]);
    }
}
