//! CLI argument definitions for the userstore binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// SQLite database (default)
    Sqlite,
    /// In-memory with JSON persistence (for development and scripting)
    Inmemory,
}

/// Manage a users collection from the command line
#[derive(Parser, Debug)]
#[command(name = "userstore")]
#[command(about = "userstore: a users collection with hashed fields and constraints")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    #[command(flatten)]
    pub store_config: StoreConfig,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the users live
#[derive(clap::Args, Debug, Clone)]
pub struct BackendConfig {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "USERSTORE_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores userstore.db
    /// For InMemory: stores userstore.json
    #[arg(short = 'D', long, env = "USERSTORE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// How the store is opened
#[derive(clap::Args, Debug, Clone)]
pub struct StoreConfig {
    /// JSON file describing the fields, e.g. {"Password": {"hashable": true}}
    #[arg(short, long, env = "USERSTORE_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Collection holding the users
    #[arg(short, long, default_value = "Users", env = "USERSTORE_COLLECTION")]
    pub collection: String,

    /// Iterations of the default hasher
    #[arg(long, default_value_t = 10_000, env = "USERSTORE_ITERATIONS")]
    pub iterations: u32,

    /// Derived key length of the default hasher, in bytes
    #[arg(long, default_value_t = 20, env = "USERSTORE_KEY_LENGTH")]
    pub key_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Insert a user given as a JSON object
    Add {
        user: String,
    },
    /// Print the first user matching a JSON filter
    Get {
        filter: String,
    },
    /// Set fields on the user matching a filter
    Update(UpdateArgs),
    /// Remove the users matching a filter
    Remove {
        filter: String,
    },
    /// Count the users matching a filter
    Count {
        #[arg(default_value = "{}")]
        filter: String,
    },
    /// Add memberships to the user matching a filter
    AddMembership {
        filter: String,
        #[arg(required = true)]
        memberships: Vec<String>,
    },
    /// Remove memberships from the user matching a filter
    RemoveMembership {
        filter: String,
        #[arg(required = true)]
        memberships: Vec<String>,
    },
    /// Print the hash record of a plaintext with the default hasher
    Hash {
        plaintext: String,
    },
    /// Check a plaintext against a hash record
    Verify {
        plaintext: String,
        record: String,
    },
}

/// Arguments for the update command
#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// JSON filter selecting the user
    pub filter: String,

    /// JSON object of fields to set
    pub updates: String,

    /// Add these memberships in the same update
    #[arg(long = "add", conflicts_with = "remove")]
    pub add: Vec<String>,

    /// Remove these memberships in the same update
    #[arg(long = "remove")]
    pub remove: Vec<String>,

    /// Print the updated user instead of a count
    #[arg(long)]
    pub get: bool,
}
