/*!
 * Schema-aware completion module
 *
 * Provides identifier completion for the prompt, supporting:
 * - Schema name completion
 * - Unqualified table names for schemas on the search path
 * - Fully qualified `schema.table` names for every schema
 * - Inline hints and history
 */

pub mod engine;
pub mod helper;
pub mod metadata;
pub mod suggestion;

// Re-export main interfaces
pub use engine::{build_suggestions, matching_suggestions};
pub use helper::SchemaHelper;
