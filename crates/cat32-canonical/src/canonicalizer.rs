use std::any::Any;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use tracing::{trace, warn};

use crate::number::format_number;
use crate::sentinel::{
    date_sentinel, escape_literal, hole_sentinel, quote, type_sentinel, INVALID_DATE_PAYLOAD,
    UNDEFINED_SENTINEL,
};
use crate::token::TokenRegistry;
use crate::value::{Accessor, KeyedMap, Pattern, Record, Sequence, UniqueSet, Value};

/// Rewrites text leaves before they are encoded (e.g. Unicode normalization).
pub trait TextTransform: Send + Sync {
    /// Returns the text to encode in place of `text`.
    fn apply<'t>(&self, text: &'t str) -> Cow<'t, str>;
}

/// Produces canonical strings for [`Value`]s.
///
/// The output of one canonicalizer depends only on the value graph and on
/// the token registry's history for the tokens it contains.
pub struct Canonicalizer<'a> {
    registry: &'a TokenRegistry,
    text: Option<&'a dyn TextTransform>,
}

impl Canonicalizer<'static> {
    /// Canonicalizer backed by the process-wide token registry.
    pub fn new() -> Self {
        Self::with_registry(TokenRegistry::global())
    }
}

impl Default for Canonicalizer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Canonicalizer<'a> {
    /// Canonicalizer backed by an explicit token registry.
    pub fn with_registry(registry: &'a TokenRegistry) -> Self {
        Self {
            registry,
            text: None,
        }
    }

    /// Applies `transform` to every text leaf.
    pub fn with_text_transform(mut self, transform: &'a dyn TextTransform) -> Self {
        self.text = Some(transform);
        self
    }

    /// Canonical string for `value`. Never fails.
    pub fn canonicalize(&self, value: &Value) -> String {
        let walk = Walk {
            canonicalizer: self,
            path: RefCell::new(HashSet::new()),
        };
        let mut out = String::new();
        walk.write(value, &mut out);
        out
    }
}

/// Canonical string for `value` using the process-wide token registry.
pub fn stable_stringify(value: &Value) -> String {
    Canonicalizer::new().canonicalize(value)
}

/// Marks a node as being on the current descent path until dropped.
struct PathGuard<'p> {
    path: &'p RefCell<HashSet<usize>>,
    id: usize,
}

impl<'p> PathGuard<'p> {
    fn enter(path: &'p RefCell<HashSet<usize>>, id: usize) -> Option<Self> {
        if path.borrow_mut().insert(id) {
            Some(Self { path, id })
        } else {
            None
        }
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.path.borrow_mut().remove(&self.id);
    }
}

/// State of one top-level canonicalization call.
struct Walk<'c, 'a> {
    canonicalizer: &'c Canonicalizer<'a>,
    path: RefCell<HashSet<usize>>,
}

impl Walk<'_, '_> {
    fn write(&self, value: &Value, out: &mut String) {
        match value {
            Value::Null => out.push_str("null"),
            Value::Undefined => out.push_str(&quote(UNDEFINED_SENTINEL)),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => write_number(*n, out),
            Value::BigInt(n) => out.push_str(&quote(&type_sentinel("bigint", &n.to_string()))),
            Value::Text(text) => self.write_text(text, out),
            Value::Boxed(boxed) => self.write(&boxed.primitive(), out),
            Value::Token(token) => {
                let record = self.canonicalizer.registry.get_or_create(token);
                out.push_str(&quote(&record.sentinel));
            }
            Value::Binary(view) => out.push_str(&quote(&view.conventional_string())),
            Value::Timestamp(ts) => {
                let iso = ts.to_iso_string();
                let payload = iso.as_deref().unwrap_or(INVALID_DATE_PAYLOAD);
                out.push_str(&quote(&date_sentinel(payload)));
            }
            Value::Pattern(pattern) => write_pattern(pattern, out),
            Value::Map(map) => self.enter(map.identity(), "map", out, |out| {
                self.write_map(map, out)
            }),
            Value::Set(set) => self.enter(set.identity(), "set", out, |out| {
                self.write_set(set, out)
            }),
            Value::Sequence(seq) => self.enter(seq.identity(), "array", out, |out| {
                self.write_sequence(seq, out)
            }),
            Value::Record(record) => self.enter(record.identity(), "object", out, |out| {
                self.write_record(record, out)
            }),
            Value::Deferred(accessor) => {
                self.enter(accessor.identity(), "accessor", out, |out| {
                    self.write_deferred(accessor, out)
                })
            }
        }
    }

    fn enter(&self, id: usize, kind: &str, out: &mut String, body: impl FnOnce(&mut String)) {
        match PathGuard::enter(&self.path, id) {
            Some(_guard) => body(out),
            None => {
                trace!(kind, "cycle detected");
                out.push_str(&quote(&type_sentinel("circular", kind)));
            }
        }
    }

    fn write_text(&self, text: &str, out: &mut String) {
        let text = match self.canonicalizer.text {
            Some(transform) => transform.apply(text),
            None => Cow::Borrowed(text),
        };
        out.push_str(&quote(&escape_literal(&text)));
    }

    fn write_sequence(&self, seq: &Sequence, out: &mut String) {
        let slots = match seq.read() {
            Ok(slots) => slots.clone(),
            Err(_) => return write_failure("array lock poisoned", out),
        };
        out.push('[');
        for (i, slot) in slots.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match slot {
                Some(item) => self.write(item, out),
                None => out.push_str(&quote(&hole_sentinel())),
            }
        }
        out.push(']');
    }

    fn write_record(&self, record: &Record, out: &mut String) {
        let members = match record.read() {
            Ok(members) => members.clone(),
            Err(_) => return write_failure("object lock poisoned", out),
        };
        out.push('{');
        for (i, (key, member)) in members.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&quote(&escape_literal(key)));
            out.push(':');
            self.write(member, out);
        }
        out.push('}');
    }

    fn write_map(&self, map: &KeyedMap, out: &mut String) {
        let entries = match map.read() {
            Ok(entries) => entries.clone(),
            Err(_) => return write_failure("map lock poisoned", out),
        };
        let mut body = String::from("{");
        for (i, (key, member)) in entries.iter().enumerate() {
            if i > 0 {
                body.push(',');
            }
            let mut key_text = String::new();
            self.write(key, &mut key_text);
            body.push_str(&quote(&key_text));
            body.push(':');
            self.write(member, &mut body);
        }
        body.push('}');
        out.push_str(&quote(&type_sentinel("map", &body)));
    }

    fn write_set(&self, set: &UniqueSet, out: &mut String) {
        let members = match set.read() {
            Ok(members) => members.clone(),
            Err(_) => return write_failure("set lock poisoned", out),
        };
        let mut body = String::from("[");
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                body.push(',');
            }
            self.write(member, &mut body);
        }
        body.push(']');
        out.push_str(&quote(&type_sentinel("set", &body)));
    }

    fn write_deferred(&self, accessor: &Accessor, out: &mut String) {
        match panic::catch_unwind(AssertUnwindSafe(|| accessor.call())) {
            Ok(Ok(value)) => self.write(&value, out),
            Ok(Err(err)) => {
                warn!(error = %err, "accessor failed during canonicalization");
                write_failure(&err.to_string(), out);
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(panic = %message, "accessor panicked during canonicalization");
                write_failure(&message, out);
            }
        }
    }
}

fn write_number(n: f64, out: &mut String) {
    if n.is_finite() {
        out.push_str(&format_number(n));
    } else {
        out.push_str(&quote(&type_sentinel("number", &format_number(n))));
    }
}

fn write_pattern(pattern: &Pattern, out: &mut String) {
    let payload = serde_json::json!([pattern.source, pattern.flags]).to_string();
    out.push_str(&quote(&type_sentinel("regexp", &payload)));
}

fn write_failure(message: &str, out: &mut String) {
    out.push_str(&quote(&type_sentinel("error", message)));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "accessor panicked".to_string()
    }
}
