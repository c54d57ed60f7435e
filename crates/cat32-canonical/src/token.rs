//! Unique tokens and the registry that assigns them stable sentinels.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use tracing::debug;

use crate::sentinel::{quote, SYMBOL_PREFIX};

struct TokenInner {
    description: Option<String>,
    global_key: Option<String>,
}

/// Identity-only value, the analogue of an ECMAScript symbol.
///
/// Local tokens are equal only to clones of themselves, whatever their
/// description. Global tokens (see [`Token::global`]) are equal by key.
#[derive(Clone)]
pub struct Token(Arc<TokenInner>);

impl Token {
    /// Creates a fresh local token with a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self(Arc::new(TokenInner {
            description: Some(description.into()),
            global_key: None,
        }))
    }

    /// Creates a fresh local token without a description.
    pub fn anonymous() -> Self {
        Self(Arc::new(TokenInner {
            description: None,
            global_key: None,
        }))
    }

    /// Returns the token registered under `key` in the process-wide key space.
    pub fn global(key: impl Into<String>) -> Self {
        let key = key.into();
        Self(Arc::new(TokenInner {
            description: Some(key.clone()),
            global_key: Some(key),
        }))
    }

    /// Description text, if any.
    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    /// Key of a global token; `None` for local tokens.
    pub fn global_key(&self) -> Option<&str> {
        self.0.global_key.as_deref()
    }

    /// True when both handles refer to the same allocation.
    pub fn ptr_eq(&self, other: &Token) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self.global_key(), other.global_key()) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.ptr_eq(other),
            _ => false,
        }
    }
}

impl Eq for Token {}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.global_key() {
            Some(key) => write!(f, "Token::global({key:?})"),
            None => write!(f, "Token({:?})", self.description().unwrap_or("")),
        }
    }
}

/// Identifier and sentinel text assigned to one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelRecord {
    /// Registry-local identifier (base-36 counter value for local tokens).
    pub identifier: String,
    /// Sentinel text embedded in canonical output.
    pub sentinel: String,
}

struct Entry {
    token: Weak<TokenInner>,
    record: SentinelRecord,
}

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    entries: HashMap<usize, Entry>,
}

/// Identity-keyed map from local tokens to their sentinel records.
///
/// The registry holds weak references only. An entry whose token has been
/// dropped no longer counts and is pruned on the next allocation.
#[derive(Default)]
pub struct TokenRegistry {
    state: Mutex<RegistryState>,
}

impl TokenRegistry {
    /// Creates an empty, isolated registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by [`crate::stable_stringify`].
    pub fn global() -> &'static Arc<TokenRegistry> {
        static GLOBAL: OnceLock<Arc<TokenRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(TokenRegistry::new()))
    }

    /// Returns the record for `token`, allocating one on first use.
    pub fn get_or_create(&self, token: &Token) -> SentinelRecord {
        if let Some(key) = token.global_key() {
            return global_record(key);
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = state.entries.get(&token.address()) {
            if entry.token.strong_count() > 0 {
                return entry.record.clone();
            }
        }

        state.entries.retain(|_, entry| entry.token.strong_count() > 0);
        let identifier = to_base36(state.next_id);
        state.next_id += 1;
        let record = local_record(identifier, token.description().unwrap_or(""));
        state.entries.insert(
            token.address(),
            Entry {
                token: Arc::downgrade(&token.0),
                record: record.clone(),
            },
        );
        debug!(identifier = %record.identifier, "allocated token sentinel");
        record
    }

    /// Returns the record for `token` without allocating one.
    pub fn peek(&self, token: &Token) -> Option<SentinelRecord> {
        if let Some(key) = token.global_key() {
            return Some(global_record(key));
        }
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .entries
            .get(&token.address())
            .filter(|entry| entry.token.strong_count() > 0)
            .map(|entry| entry.record.clone())
    }

    /// Number of live local tokens with a record.
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .entries
            .values()
            .filter(|entry| entry.token.strong_count() > 0)
            .count()
    }

    /// True when no live token has a record.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TokenRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRegistry")
            .field("len", &self.len())
            .finish()
    }
}

fn local_record(identifier: String, description: &str) -> SentinelRecord {
    let sentinel = format!(
        r#"{SYMBOL_PREFIX}["local","{identifier}",{}]"#,
        quote(description)
    );
    SentinelRecord {
        identifier,
        sentinel,
    }
}

fn global_record(key: &str) -> SentinelRecord {
    SentinelRecord {
        identifier: format!("global:{key}"),
        sentinel: format!(r#"{SYMBOL_PREFIX}["global",{}]"#, quote(key)),
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base36_matches_radix_rendering() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(10), "a");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn dropped_tokens_are_pruned() {
        let registry = TokenRegistry::new();
        let kept = Token::new("kept");
        {
            let dropped = Token::new("dropped");
            registry.get_or_create(&dropped);
            assert_eq!(registry.len(), 1);
        }
        assert_eq!(registry.len(), 0);
        registry.get_or_create(&kept);
        assert_eq!(registry.state.lock().unwrap().entries.len(), 1);
    }
}
