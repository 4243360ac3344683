/*!
 * Connection validation
 *
 * Gates candidate connections before they are wired into the live schema
 * catalog. Each candidate is either accepted or rejected with a single
 * failure; rejections never abort the rest of the pass.
 */

use super::{ConnectionMap, ConnectionPlugin};
use inflector::Inflector;
use owo_colors::OwoColorize;
use std::fmt;

/// Protocol version understood by this build
pub const HOST_PROTOCOL_VERSION: u32 = 20;

/// Schema names that connections may not claim
pub const RESERVED_CONNECTION_NAMES: &[&str] = &["public", "internal"];

/// Why a candidate connection was rejected
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationFailure {
    pub plugin: String,
    pub connection_name: String,
    pub message: String,
    /// Whether a previously registered connection with the same name must be torn down
    pub should_drop_if_exists: bool,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Connection: {}\nPlugin:     {}\nError:      {}",
            self.connection_name, self.plugin, self.message
        )
    }
}

/// Result of one validation pass
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub failures: Vec<ValidationFailure>,
    pub accepted_updates: ConnectionMap,
    pub accepted_plugins: Vec<ConnectionPlugin>,
}

/// Partition `candidates` into accepted and rejected connections.
///
/// Accepted candidates keep their input order. The entry for an accepted
/// candidate is copied from `updates`; a candidate with no entry there simply
/// contributes no update.
pub fn validate_plugins(
    candidates: &[ConnectionPlugin],
    updates: &ConnectionMap,
    host_protocol_version: u32,
) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    for candidate in candidates {
        let failure = validate_protocol_version(candidate, host_protocol_version)
            .or_else(|| validate_connection_name(candidate));

        match failure {
            Some(failure) => outcome.failures.push(failure),
            None => {
                if let Some(update) = updates.get(&candidate.connection_name) {
                    outcome
                        .accepted_updates
                        .insert(candidate.connection_name.clone(), update.clone());
                }
                outcome.accepted_plugins.push(candidate.clone());
            }
        }
    }

    outcome
}

fn validate_protocol_version(
    candidate: &ConnectionPlugin,
    host_protocol_version: u32,
) -> Option<ValidationFailure> {
    let plugin_protocol_version = candidate.schema.protocol_version;
    // undeclared: the plugin predates protocol versioning, so it is compatible
    if plugin_protocol_version == 0 {
        return None;
    }

    if host_protocol_version < plugin_protocol_version {
        return Some(ValidationFailure {
            plugin: candidate.plugin_name.clone(),
            connection_name: candidate.connection_name.clone(),
            message: "Incompatible plugin protocol version. Please upgrade the host.".to_string(),
            should_drop_if_exists: true,
        });
    }

    None
}

fn validate_connection_name(candidate: &ConnectionPlugin) -> Option<ValidationFailure> {
    if !RESERVED_CONNECTION_NAMES.contains(&candidate.connection_name.as_str()) {
        return None;
    }

    Some(ValidationFailure {
        plugin: candidate.plugin_name.clone(),
        connection_name: candidate.connection_name.clone(),
        message: format!(
            "Connection name cannot be one of {}",
            RESERVED_CONNECTION_NAMES.join(",")
        ),
        should_drop_if_exists: false,
    })
}

/// Render the warning block for a validation pass, with a coloured header.
///
/// Returns an empty string when there is nothing to report.
pub fn build_validation_warning(failures: &[ValidationFailure]) -> String {
    format_validation_warning(failures, true)
}

/// Same as [`build_validation_warning`] with colour made optional
pub fn format_validation_warning(failures: &[ValidationFailure], colored: bool) -> String {
    if failures.is_empty() {
        return String::new();
    }

    let header = if colored {
        "Validation Errors".red().to_string()
    } else {
        "Validation Errors".to_string()
    };

    let details = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n\n");

    let count = failures.len();
    let verb = if count == 1 { "was" } else { "were" };

    format!(
        "\n{}:\n\n{}\n\n{} {} {} not imported.\n",
        header,
        details,
        count,
        pluralize("connection", count),
        verb
    )
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        word.to_plural()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Connection, PluginSchema};
    use proptest::prelude::*;
    use rstest::rstest;

    fn candidate(name: &str, plugin: &str, protocol_version: u32) -> ConnectionPlugin {
        ConnectionPlugin {
            connection_name: name.to_string(),
            plugin_name: plugin.to_string(),
            schema: PluginSchema {
                protocol_version,
                tables: Vec::new(),
            },
        }
    }

    fn updates_for(candidates: &[ConnectionPlugin]) -> ConnectionMap {
        candidates
            .iter()
            .map(|c| {
                (
                    c.connection_name.clone(),
                    Connection::new(c.connection_name.clone(), c.plugin_name.clone()),
                )
            })
            .collect()
    }

    #[rstest]
    #[case::undeclared_against_old_host(0, 3, true)]
    #[case::undeclared_against_zero_host(0, 0, true)]
    #[case::same_version(3, 3, true)]
    #[case::older_plugin(2, 3, true)]
    #[case::newer_plugin(5, 3, false)]
    #[case::newer_than_zero_host(1, 0, false)]
    fn test_protocol_gate(#[case] plugin_version: u32, #[case] host: u32, #[case] passes: bool) {
        let candidates = vec![candidate("aws", "aws@latest", plugin_version)];
        let outcome = validate_plugins(&candidates, &updates_for(&candidates), host);

        assert_eq!(outcome.accepted_plugins.len() == 1, passes);
        if !passes {
            let failure = &outcome.failures[0];
            assert!(failure.should_drop_if_exists);
            assert_eq!(
                failure.message,
                "Incompatible plugin protocol version. Please upgrade the host."
            );
        }
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    fn test_reserved_name_rejected(#[case] plugin_version: u32) {
        let candidates = vec![candidate("public", "aws@latest", plugin_version)];
        let outcome = validate_plugins(&candidates, &updates_for(&candidates), 3);

        assert!(outcome.accepted_plugins.is_empty());
        assert!(outcome.accepted_updates.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert!(!outcome.failures[0].should_drop_if_exists);
        assert_eq!(
            outcome.failures[0].message,
            "Connection name cannot be one of public,internal"
        );
    }

    #[test]
    fn test_protocol_checked_before_name() {
        let candidates = vec![candidate("public", "aws@latest", 9)];
        let outcome = validate_plugins(&candidates, &updates_for(&candidates), 3);

        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].should_drop_if_exists);
    }

    #[test]
    fn test_accepted_updates_copied_from_proposed() {
        let candidates = vec![
            candidate("aws", "aws@latest", 0),
            candidate("gcp", "gcp@1.0", 2),
            candidate("internal", "misc", 0),
        ];
        let outcome = validate_plugins(&candidates, &updates_for(&candidates), 3);

        assert_eq!(outcome.accepted_plugins.len(), 2);
        assert_eq!(outcome.accepted_updates.len(), 2);
        assert_eq!(outcome.accepted_updates["gcp"].plugin_name, "gcp@1.0");
        assert!(!outcome.accepted_updates.contains_key("internal"));
    }

    #[test]
    fn test_missing_update_is_not_an_error() {
        let candidates = vec![candidate("aws", "aws@latest", 0)];
        let outcome = validate_plugins(&candidates, &ConnectionMap::new(), 3);

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.accepted_plugins.len(), 1);
        assert!(outcome.accepted_updates.is_empty());
    }

    #[test]
    fn test_warning_empty_for_no_failures() {
        assert_eq!(build_validation_warning(&[]), "");
        assert_eq!(format_validation_warning(&[], false), "");
    }

    #[test]
    fn test_warning_single_failure() {
        let candidates = vec![candidate("aws", "aws@latest", 7)];
        let outcome = validate_plugins(&candidates, &updates_for(&candidates), 3);
        let warning = format_validation_warning(&outcome.failures, false);

        assert_eq!(
            warning,
            "\nValidation Errors:\n\n\
             Connection: aws\n\
             Plugin:     aws@latest\n\
             Error:      Incompatible plugin protocol version. Please upgrade the host.\n\n\
             1 connection was not imported.\n"
        );
    }

    #[test]
    fn test_warning_multiple_failures() {
        let candidates = vec![
            candidate("aws", "aws@latest", 7),
            candidate("public", "gcp@latest", 0),
        ];
        let outcome = validate_plugins(&candidates, &updates_for(&candidates), 3);
        let warning = format_validation_warning(&outcome.failures, false);

        assert!(warning.contains("Connection: aws\n"));
        assert!(warning.contains("Error:      Incompatible plugin protocol version."));
        assert!(warning.contains("host.\n\nConnection: public\n"));
        assert!(warning.ends_with("\n2 connections were not imported.\n"));
    }

    #[test]
    fn test_colored_warning_keeps_content() {
        let failures = vec![ValidationFailure {
            plugin: "aws".to_string(),
            connection_name: "aws".to_string(),
            message: "boom".to_string(),
            should_drop_if_exists: true,
        }];
        let warning = build_validation_warning(&failures);

        assert!(warning.contains("Validation Errors"));
        assert!(warning.contains("\x1b["));
        assert!(warning.contains("Error:      boom"));
    }

    proptest! {
        #[test]
        fn prop_every_candidate_lands_once(
            specs in prop::collection::vec(
                (prop::sample::select(vec!["aws", "gcp", "azure", "public", "internal"]), 0u32..6),
                0..12,
            ),
            host in 0u32..6,
        ) {
            let candidates: Vec<ConnectionPlugin> = specs
                .iter()
                .map(|(name, version)| candidate(name, "plugin@1", *version))
                .collect();
            let outcome = validate_plugins(&candidates, &updates_for(&candidates), host);

            prop_assert_eq!(
                outcome.accepted_plugins.len() + outcome.failures.len(),
                candidates.len()
            );
            for accepted in &outcome.accepted_plugins {
                prop_assert!(!RESERVED_CONNECTION_NAMES.contains(&accepted.connection_name.as_str()));
                prop_assert!(accepted.schema.protocol_version == 0 || accepted.schema.protocol_version <= host);
            }
        }
    }
}
