//! Hash commands - produce and check hash records without touching a store.

use userstore::hash::{HashProvider, Pbkdf2Hasher};

use crate::cli::StoreConfig;
use crate::output::OutputFormat;

fn hasher(config: &StoreConfig) -> Pbkdf2Hasher {
    Pbkdf2Hasher::new(config.key_length, config.iterations)
}

/// Run the hash command
pub async fn hash(
    config: &StoreConfig,
    plaintext: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = hasher(config).hash(plaintext).await?;
    match format {
        OutputFormat::Human => println!("{record}"),
        OutputFormat::Json => println!("{}", serde_json::json!({ "record": record })),
    }
    Ok(())
}

/// Run the verify command. Exits non-zero when the plaintext does not match.
pub async fn verify(
    config: &StoreConfig,
    plaintext: &str,
    record: &str,
    format: OutputFormat,
) -> Result<bool, Box<dyn std::error::Error>> {
    let matched = hasher(config).verify(plaintext, record).await?;
    match format {
        OutputFormat::Human => println!("{}", if matched { "match" } else { "no match" }),
        OutputFormat::Json => println!("{}", serde_json::json!({ "match": matched })),
    }
    Ok(matched)
}
