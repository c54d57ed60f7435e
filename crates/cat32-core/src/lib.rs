//! Deterministic categorization of arbitrary values into labeled buckets.
//!
//! A [`Categorizer`] canonicalizes its input with `cat32-canonical`, prefixes
//! the configured salt and namespace, hashes the result with FNV-1a 32 and
//! reduces the hash modulo the label count. Overrides pin specific inputs to
//! specific buckets without changing the reported key or hash.
//!
//! Core invariants:
//! - Assignments depend only on the input value and the configuration
//! - The label list is fixed for the lifetime of a categorizer
//! - Every assignment index lies in `0..labels.len()`
//!
#![deny(missing_docs)]

/// Categorizer and assignment types.
pub mod categorizer;
/// Configuration and override tables.
pub mod config;
/// Configuration errors.
pub mod errors;
/// FNV-1a hashing.
pub mod hash;
/// Unicode normalization modes.
pub mod normalize;

pub use categorizer::{Assignment, Categorizer};
pub use config::{
    default_labels, CategorizerConfig, OverrideKey, OverrideTarget, Overrides,
    DEFAULT_LABEL_COUNT,
};
pub use errors::ConfigError;
pub use hash::{fnv1a32, to_hex32};
pub use normalize::NormalizeMode;
