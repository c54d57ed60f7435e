//! Sentinel vocabulary shared by every serialization rule.
//!
//! A sentinel is plain text that stands in for a value with no JSON literal
//! form. It is always emitted as a JSON string literal, and user text that
//! could be mistaken for one is escaped first (see [`escape_literal`]).

use std::borrow::Cow;

/// Opening marker of a typed sentinel.
pub const SENTINEL_PREFIX: &str = "\u{0}cat32:";
/// Closing marker of a typed sentinel.
pub const SENTINEL_SUFFIX: &str = "\u{0}";
/// Sentinel text for an absent (undefined) value.
pub const UNDEFINED_SENTINEL: &str = "__undefined__";
/// Prefix of timestamp sentinels.
pub const DATE_PREFIX: &str = "__date__:";
/// Payload used for every invalid timestamp.
pub const INVALID_DATE_PAYLOAD: &str = "invalid";
/// Prefix of unique-token sentinels.
pub const SYMBOL_PREFIX: &str = "__symbol__:";
/// Prefix added to user text that collides with sentinel vocabulary.
pub const STRING_LITERAL_PREFIX: &str = "__string__:";

const HOLE_PAYLOAD: &str = "__hole__";

/// Builds `\u0000cat32:<kind>:<payload>\u0000`.
pub fn type_sentinel(kind: &str, payload: &str) -> String {
    let mut out =
        String::with_capacity(SENTINEL_PREFIX.len() + kind.len() + payload.len() + 2);
    out.push_str(SENTINEL_PREFIX);
    out.push_str(kind);
    out.push(':');
    out.push_str(payload);
    out.push_str(SENTINEL_SUFFIX);
    out
}

/// Sentinel text emitted for a missing sequence slot.
pub fn hole_sentinel() -> String {
    type_sentinel("hole", HOLE_PAYLOAD)
}

/// Sentinel text for a timestamp payload (`invalid` or ISO-8601 text).
pub fn date_sentinel(payload: &str) -> String {
    format!("{DATE_PREFIX}{payload}")
}

/// Encodes text as a JSON string literal.
pub fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}

/// Returns true when user text could be read back as a sentinel.
pub fn needs_escape(text: &str) -> bool {
    text == UNDEFINED_SENTINEL
        || text.starts_with(STRING_LITERAL_PREFIX)
        || text.starts_with(DATE_PREFIX)
        || text.starts_with(SYMBOL_PREFIX)
        || text.starts_with(SENTINEL_PREFIX)
}

/// Escapes user text so it can never equal sentinel output.
///
/// Escaped text always starts with [`STRING_LITERAL_PREFIX`] and unescaped
/// text never does, so the mapping is injective.
pub fn escape_literal(text: &str) -> Cow<'_, str> {
    if needs_escape(text) {
        Cow::Owned(format!("{STRING_LITERAL_PREFIX}{text}"))
    } else {
        Cow::Borrowed(text)
    }
}
