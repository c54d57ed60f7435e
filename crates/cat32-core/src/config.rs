use cat32_canonical::Value;
use serde::Deserialize;

use crate::normalize::NormalizeMode;

/// Number of labels in the default label space.
pub const DEFAULT_LABEL_COUNT: usize = 32;

/// Default labels: `A`..`Z` followed by `0`..`5`.
pub fn default_labels() -> Vec<String> {
    ('A'..='Z')
        .chain('0'..='5')
        .take(DEFAULT_LABEL_COUNT)
        .map(String::from)
        .collect()
}

/// What an override matches.
#[derive(Debug, Clone)]
pub enum OverrideKey {
    /// Matches inputs whose canonical key equals this text exactly.
    Canonical(String),
    /// Matches inputs that canonicalize like this value.
    Input(Value),
}

/// Where an override routes its input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OverrideTarget {
    /// Label position.
    Index(i64),
    /// Label text.
    Label(String),
}

impl From<i64> for OverrideTarget {
    fn from(index: i64) -> Self {
        OverrideTarget::Index(index)
    }
}

impl From<i32> for OverrideTarget {
    fn from(index: i32) -> Self {
        OverrideTarget::Index(i64::from(index))
    }
}

impl From<&str> for OverrideTarget {
    fn from(label: &str) -> Self {
        OverrideTarget::Label(label.to_owned())
    }
}

impl From<String> for OverrideTarget {
    fn from(label: String) -> Self {
        OverrideTarget::Label(label)
    }
}

/// Ordered override table; a later entry for the same key wins.
///
/// When deserialized, each member name is treated as a text input and
/// members are applied in document order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "serde_json::Map<String, serde_json::Value>")]
pub struct Overrides(Vec<(OverrideKey, OverrideTarget)>);

impl Overrides {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes inputs that canonicalize like `input` to `target`.
    pub fn input(mut self, input: impl Into<Value>, target: impl Into<OverrideTarget>) -> Self {
        self.0.push((OverrideKey::Input(input.into()), target.into()));
        self
    }

    /// Routes inputs whose canonical key is exactly `key` to `target`.
    pub fn canonical(mut self, key: impl Into<String>, target: impl Into<OverrideTarget>) -> Self {
        self.0
            .push((OverrideKey::Canonical(key.into()), target.into()));
        self
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(OverrideKey, OverrideTarget)> {
        self.0.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for Overrides {
    type Error = serde_json::Error;

    fn try_from(table: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        table
            .into_iter()
            .map(|(key, target)| -> Result<_, serde_json::Error> {
                let target: OverrideTarget = serde_json::from_value(target)?;
                Ok((OverrideKey::Input(Value::Text(key)), target))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Categorizer settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategorizerConfig {
    /// Domain separation prefix.
    pub salt: Option<String>,
    /// Sub-domain separation prefix.
    pub namespace: Option<String>,
    /// Bucket labels; [`default_labels`] when absent.
    pub labels: Option<Vec<String>>,
    /// Text normalization applied before serialization.
    pub normalize: NormalizeMode,
    /// Per-input routing overrides.
    pub overrides: Overrides,
}
