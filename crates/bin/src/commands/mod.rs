//! Subcommand implementations.

pub mod hash;
pub mod users;

use userstore::Document;

/// Parses a JSON object given on the command line.
pub fn parse_document(arg: &str) -> Result<Document, Box<dyn std::error::Error>> {
    serde_json::from_str(arg)
        .map_err(|e| format!("expected a JSON object, got {arg:?}: {e}").into())
}
