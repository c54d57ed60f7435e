//! Canonical, deterministic serialization of arbitrary runtime values.
//!
//! [`stable_stringify`] turns any [`Value`] into a canonical string: the same
//! value graph always yields the same text, structurally equal graphs built
//! from different nodes yield the same text, and values a caller expects to
//! tell apart (a set and an array, two tokens with the same description, an
//! invalid and a valid timestamp) never collide.
//!
//! The serializer is total. Cycles, failing accessors and poisoned nodes
//! degrade to typed sentinels instead of errors.
//!
#![deny(missing_docs)]

/// Byte buffers and typed views.
pub mod binary;
/// Canonical serialization walk.
pub mod canonicalizer;
/// ECMAScript-compatible number rendering.
pub mod number;
/// Sentinel vocabulary and literal escaping.
pub mod sentinel;
/// Calendar instants.
pub mod timestamp;
/// Unique tokens and their sentinel registry.
pub mod token;
/// Closed value model.
pub mod value;

pub use binary::{BinaryView, ByteBuffer, ElementKind, ViewError};
pub use canonicalizer::{stable_stringify, Canonicalizer, TextTransform};
pub use timestamp::Timestamp;
pub use token::{SentinelRecord, Token, TokenRegistry};
pub use value::{
    same_value_zero, AccessError, Accessor, BoxedScalar, KeyedMap, Pattern, Record, Sequence,
    UniqueSet, Value,
};
