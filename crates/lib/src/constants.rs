//! Constants used throughout the userstore library.
//!
//! This module provides central definitions for reserved field names and the
//! defaults applied when a store is opened without explicit options.

/// Reserved field holding the primary key assigned by the backend.
pub const ID_FIELD: &str = "_id";

/// Distinguished field holding the set of groups a user belongs to.
pub const MEMBERSHIPS: &str = "Memberships";

/// Collection used when no `collection_name` option is given.
pub const DEFAULT_COLLECTION: &str = "Users";

/// Default length, in bytes, of the key derived for a hashed field.
pub const DEFAULT_KEY_LENGTH: usize = 20;

/// Default number of key derivation rounds.
pub const DEFAULT_ITERATIONS: u32 = 10_000;

/// Error code reported by document stores for a unique index violation.
pub const DUPLICATE_KEY_CODE: i32 = 11000;
