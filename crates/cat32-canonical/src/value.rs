//! Closed value model accepted by the canonicalizer.
//!
//! Composite values (`Sequence`, `Record`, `KeyedMap`, `UniqueSet`) are
//! shared, mutable nodes with identity. Cloning a handle aliases the node,
//! which is how callers build graphs with shared or cyclic members.

use std::fmt;
use std::sync::{Arc, LockResult, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::binary::BinaryView;
use crate::timestamp::Timestamp;
use crate::token::Token;

/// Error reported by a deferred accessor.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct AccessError(String);

impl AccessError {
    /// Creates an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type AccessorFn = dyn Fn() -> Result<Value, AccessError> + Send + Sync;

/// Lazily computed member, e.g. a getter that may fail.
///
/// Accessors run during canonicalization. An `Err` or a panic becomes an
/// error sentinel in the output. Panics are caught with
/// [`std::panic::catch_unwind`], which does not silence the process panic
/// hook: the default hook still reports the panic on stderr each time the
/// accessor runs. Return [`AccessError`] for expected failures, or install
/// a quieter hook with [`std::panic::set_hook`].
#[derive(Clone)]
pub struct Accessor(Arc<AccessorFn>);

impl Accessor {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Result<Value, AccessError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self) -> Result<Value, AccessError> {
        (self.0)()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Accessor({:#x})", self.identity())
    }
}

/// Object wrapper around a primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxedScalar {
    /// Boxed number.
    Number(f64),
    /// Boxed boolean.
    Bool(bool),
    /// Boxed big integer.
    BigInt(i128),
}

impl BoxedScalar {
    /// The wrapped primitive.
    pub fn primitive(&self) -> Value {
        match *self {
            BoxedScalar::Number(n) => Value::Number(n),
            BoxedScalar::Bool(b) => Value::Bool(b),
            BoxedScalar::BigInt(n) => Value::BigInt(n),
        }
    }
}

/// Regular-expression source and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Pattern source text.
    pub source: String,
    /// Flag letters, e.g. `gi`.
    pub flags: String,
}

impl Pattern {
    /// Creates a pattern.
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            flags: flags.into(),
        }
    }
}

macro_rules! node_handle {
    ($name:ident, $inner:ty, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Default)]
        pub struct $name(Arc<RwLock<$inner>>);

        impl $name {
            /// True when both handles alias the same node.
            pub fn ptr_eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }

            pub(crate) fn identity(&self) -> usize {
                Arc::as_ptr(&self.0) as usize
            }

            pub(crate) fn read(&self) -> LockResult<RwLockReadGuard<'_, $inner>> {
                self.0.read()
            }

            fn write(&self) -> RwLockWriteGuard<'_, $inner> {
                self.0.write().unwrap_or_else(PoisonError::into_inner)
            }

            fn read_lossy(&self) -> RwLockReadGuard<'_, $inner> {
                self.0.read().unwrap_or_else(PoisonError::into_inner)
            }

            /// Number of members.
            pub fn len(&self) -> usize {
                self.read_lossy().len()
            }

            /// True when the node has no members.
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.identity())
            }
        }
    };
}

node_handle!(
    Sequence,
    Vec<Option<Value>>,
    "Ordered sequence; `None` slots are holes."
);
node_handle!(
    Record,
    Vec<(String, Value)>,
    "String-keyed record that keeps insertion order."
);
node_handle!(
    KeyedMap,
    Vec<(Value, Value)>,
    "Map with arbitrary keys that keeps insertion order."
);
node_handle!(
    UniqueSet,
    Vec<Value>,
    "Set of unique values that keeps insertion order."
);

impl Sequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sequence of `len` holes.
    pub fn with_length(len: usize) -> Self {
        Self(Arc::new(RwLock::new(vec![None; len])))
    }

    /// Appends a value.
    pub fn push(&self, value: impl Into<Value>) {
        self.write().push(Some(value.into()));
    }

    /// Stores `value` at `index`, padding with holes when needed.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let mut slots = self.write();
        if index >= slots.len() {
            slots.resize(index + 1, None);
        }
        slots[index] = Some(value.into());
    }

    /// Value at `index`; `None` for holes and out-of-range indices.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.read_lossy().get(index).cloned().flatten()
    }
}

impl<V: Into<Value>> FromIterator<V> for Sequence {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let slots = iter.into_iter().map(|v| Some(v.into())).collect();
        Self(Arc::new(RwLock::new(slots)))
    }
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`; an existing key keeps its position.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut members = self.write();
        match members.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => members.push((key, value)),
        }
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.read_lossy()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.read_lossy().iter().map(|(k, _)| k.clone()).collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl KeyedMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`; an existing key (same-value-zero) keeps its position.
    pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let mut entries = self.write();
        match entries.iter_mut().find(|(k, _)| same_value_zero(k, &key)) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.read_lossy()
            .iter()
            .find(|(k, _)| same_value_zero(k, key))
            .map(|(_, v)| v.clone())
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for KeyedMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map = KeyedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl UniqueSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` unless an equal member exists. Returns true when added.
    pub fn insert(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        let mut members = self.write();
        if members.iter().any(|m| same_value_zero(m, &value)) {
            return false;
        }
        members.push(value);
        true
    }

    /// True when an equal member exists.
    pub fn contains(&self, value: &Value) -> bool {
        self.read_lossy().iter().any(|m| same_value_zero(m, value))
    }
}

impl<V: Into<Value>> FromIterator<V> for UniqueSet {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let set = UniqueSet::new();
        for v in iter {
            set.insert(v);
        }
        set
    }
}

/// Any value the canonicalizer accepts.
#[derive(Debug, Clone)]
pub enum Value {
    /// Null.
    Null,
    /// Absent value.
    Undefined,
    /// Boolean.
    Bool(bool),
    /// Double-precision number, possibly non-finite.
    Number(f64),
    /// Large integer.
    BigInt(i128),
    /// Text.
    Text(String),
    /// Object wrapper around a primitive.
    Boxed(BoxedScalar),
    /// Unique token.
    Token(Token),
    /// Byte buffer or typed view.
    Binary(BinaryView),
    /// Calendar instant.
    Timestamp(Timestamp),
    /// Regular expression.
    Pattern(Pattern),
    /// Map with arbitrary keys.
    Map(KeyedMap),
    /// Set of unique values.
    Set(UniqueSet),
    /// Ordered sequence.
    Sequence(Sequence),
    /// String-keyed record.
    Record(Record),
    /// Lazily computed member.
    Deferred(Accessor),
}

impl Value {
    /// Deferred value computed by `f` at serialization time.
    ///
    /// See [`Accessor`] for how failures and panics are reported.
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn() -> Result<Value, AccessError> + Send + Sync + 'static,
    {
        Value::Deferred(Accessor::new(f))
    }

    /// Short name of the variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::Text(_) => "string",
            Value::Boxed(_) => "boxed",
            Value::Token(_) => "symbol",
            Value::Binary(_) => "binary",
            Value::Timestamp(_) => "date",
            Value::Pattern(_) => "regexp",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Sequence(_) => "array",
            Value::Record(_) => "object",
            Value::Deferred(_) => "accessor",
        }
    }
}

/// Key equality used by maps and sets.
///
/// Primitives compare by value with `NaN` equal to itself and `+0` equal to
/// `-0`. Tokens compare by token identity, nodes by node identity. Boxed
/// scalars, timestamps, binary views, patterns and accessors never compare
/// equal because each one is a distinct object.
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::BigInt(x), Value::BigInt(y)) => x == y,
        (Value::Text(x), Value::Text(y)) => x == y,
        (Value::Token(x), Value::Token(y)) => x == y,
        (Value::Map(x), Value::Map(y)) => x.ptr_eq(y),
        (Value::Set(x), Value::Set(y)) => x.ptr_eq(y),
        (Value::Sequence(x), Value::Sequence(y)) => x.ptr_eq(y),
        (Value::Record(x), Value::Record(y)) => x.ptr_eq(y),
        _ => false,
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Number(v as f64)
                }
            }
        )*
    };
}

number_from!(f32, i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Value::BigInt(v)
    }
}

macro_rules! variant_from {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

variant_from!(
    BoxedScalar => Boxed,
    Token => Token,
    BinaryView => Binary,
    Timestamp => Timestamp,
    Pattern => Pattern,
    KeyedMap => Map,
    UniqueSet => Set,
    Sequence => Sequence,
    Record => Record,
    Accessor => Deferred
);

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Sequence(v.into_iter().collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(members) => Value::Record(
                members
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_insert_keeps_first_position() {
        let record: Record = [("a", 1), ("b", 2)].into_iter().collect();
        record.insert("a", 3);
        assert_eq!(record.keys(), vec!["a", "b"]);
        assert!(matches!(record.get("a"), Some(Value::Number(n)) if n == 3.0));
    }

    #[test]
    fn sequence_set_pads_with_holes() {
        let seq = Sequence::new();
        seq.set(2, "x");
        assert_eq!(seq.len(), 3);
        assert!(seq.get(0).is_none());
        assert!(matches!(seq.get(2), Some(Value::Text(t)) if t == "x"));
    }

    #[test]
    fn set_membership_uses_same_value_zero() {
        let set = UniqueSet::new();
        assert!(set.insert(f64::NAN));
        assert!(!set.insert(f64::NAN));
        assert!(set.insert(0.0));
        assert!(!set.insert(-0.0));
        assert!(set.insert(Token::new("t")));
        assert!(set.insert(Token::new("t")));
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn map_keys_distinguish_types() {
        let map = KeyedMap::new();
        map.insert(1, "number");
        map.insert("1", "text");
        assert_eq!(map.len(), 2);
        assert!(matches!(map.get(&Value::from("1")), Some(Value::Text(t)) if t == "text"));
    }
}
