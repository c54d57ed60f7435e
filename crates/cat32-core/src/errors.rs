use thiserror::Error;

/// Errors raised while building a categorizer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The label list is empty.
    #[error("labels must not be empty")]
    EmptyLabels,
    /// An override index does not address a label.
    #[error("index out of range: {index} (labels: {labels})")]
    IndexOutOfRange {
        /// Requested index.
        index: i64,
        /// Number of configured labels.
        labels: usize,
    },
    /// An override names a label that is not configured.
    #[error("override label \"{0}\" not in labels")]
    UnknownLabel(String),
    /// The normalization mode is not recognised.
    #[error("normalize must be one of \"none\", \"nfc\", \"nfd\", \"nfkc\", or \"nfkd\" (got \"{0}\")")]
    UnknownNormalizeMode(String),
}
