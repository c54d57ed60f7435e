use std::collections::HashMap;
use std::sync::Arc;

use cat32_canonical::{Canonicalizer, TokenRegistry, Value};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{default_labels, CategorizerConfig, OverrideKey, OverrideTarget};
use crate::errors::ConfigError;
use crate::hash::{fnv1a32, to_hex32};
use crate::normalize::NormalizeMode;

/// Bucket chosen for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    /// Position of `label` in the label list.
    pub index: usize,
    /// Selected label.
    pub label: String,
    /// FNV-1a hash of the salted key, as eight hex digits.
    pub hash: String,
    /// Canonical key that was hashed (without salt).
    pub key: String,
}

/// Maps values to labeled buckets by hashing their canonical key.
///
/// The index is `hash % labels.len()`. The modulo bias this introduces for
/// label counts that do not divide 2^32 is accepted.
#[derive(Debug)]
pub struct Categorizer {
    labels: Vec<String>,
    salt_prefix: Option<String>,
    normalize: NormalizeMode,
    overrides: HashMap<String, usize>,
    registry: Arc<TokenRegistry>,
}

impl Categorizer {
    /// Builds a categorizer backed by the process-wide token registry.
    pub fn new(config: CategorizerConfig) -> Result<Self, ConfigError> {
        Self::with_registry(config, Arc::clone(TokenRegistry::global()))
    }

    /// Builds a categorizer backed by an explicit token registry.
    pub fn with_registry(
        config: CategorizerConfig,
        registry: Arc<TokenRegistry>,
    ) -> Result<Self, ConfigError> {
        let labels = config.labels.unwrap_or_else(default_labels);
        if labels.is_empty() {
            return Err(ConfigError::EmptyLabels);
        }

        let mut categorizer = Self {
            labels,
            salt_prefix: salt_prefix(config.salt.as_deref(), config.namespace.as_deref()),
            normalize: config.normalize,
            overrides: HashMap::new(),
            registry,
        };

        for (key, target) in config.overrides.iter() {
            let index = categorizer.resolve_target(target)?;
            let key = match key {
                OverrideKey::Canonical(key) => key.clone(),
                OverrideKey::Input(input) => categorizer.canonical_key(input),
            };
            categorizer.overrides.insert(key, index);
        }

        debug!(
            labels = categorizer.labels.len(),
            overrides = categorizer.overrides.len(),
            normalize = %categorizer.normalize,
            salted = categorizer.salt_prefix.is_some(),
            "categorizer configured"
        );
        Ok(categorizer)
    }

    /// Canonical key for `value` under this categorizer's normalization.
    pub fn canonical_key(&self, value: &Value) -> String {
        Canonicalizer::with_registry(&self.registry)
            .with_text_transform(&self.normalize)
            .canonicalize(value)
    }

    /// Assigns `value` to a bucket.
    pub fn assign(&self, value: &Value) -> Assignment {
        let key = self.canonical_key(value);
        let hash = fnv1a32(&self.salted(&key));
        let index = match self.overrides.get(&key) {
            Some(&pinned) => {
                trace!(index = pinned, "override matched");
                pinned
            }
            None => hash as usize % self.labels.len(),
        };
        Assignment {
            index,
            label: self.labels[index].clone(),
            hash: to_hex32(hash),
            key,
        }
    }

    /// Bucket index for `value`.
    pub fn index(&self, value: &Value) -> usize {
        self.assign(value).index
    }

    /// Bucket label for `value`.
    pub fn label_of(&self, value: &Value) -> String {
        self.assign(value).label
    }

    /// Configured labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn salted(&self, key: &str) -> String {
        match &self.salt_prefix {
            Some(prefix) => format!("{prefix}{key}"),
            None => key.to_owned(),
        }
    }

    fn resolve_target(&self, target: &OverrideTarget) -> Result<usize, ConfigError> {
        match target {
            OverrideTarget::Index(index) => usize::try_from(*index)
                .ok()
                .filter(|i| *i < self.labels.len())
                .ok_or(ConfigError::IndexOutOfRange {
                    index: *index,
                    labels: self.labels.len(),
                }),
            OverrideTarget::Label(label) => self
                .labels
                .iter()
                .position(|candidate| candidate == label)
                .ok_or_else(|| ConfigError::UnknownLabel(label.clone())),
        }
    }
}

/// Prefix prepended to every key before hashing.
fn salt_prefix(salt: Option<&str>, namespace: Option<&str>) -> Option<String> {
    let salt = salt.unwrap_or("");
    match namespace {
        None if salt.is_empty() => None,
        None => Some(format!("salt:{}|", serde_json::Value::from(salt))),
        Some(namespace) => Some(format!(
            "saltns:{}|",
            serde_json::json!([salt, namespace])
        )),
    }
}
