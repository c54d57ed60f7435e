use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use cat32_canonical::TextTransform;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::errors::ConfigError;

/// Unicode normalization applied to text leaves before serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// Leave text untouched.
    None,
    /// Canonical composition.
    Nfc,
    /// Canonical decomposition.
    Nfd,
    /// Compatibility composition.
    #[default]
    Nfkc,
    /// Compatibility decomposition.
    Nfkd,
}

impl NormalizeMode {
    /// Lowercase mode name.
    pub fn as_str(self) -> &'static str {
        match self {
            NormalizeMode::None => "none",
            NormalizeMode::Nfc => "nfc",
            NormalizeMode::Nfd => "nfd",
            NormalizeMode::Nfkc => "nfkc",
            NormalizeMode::Nfkd => "nfkd",
        }
    }
}

impl fmt::Display for NormalizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(NormalizeMode::None),
            "nfc" => Ok(NormalizeMode::Nfc),
            "nfd" => Ok(NormalizeMode::Nfd),
            "nfkc" => Ok(NormalizeMode::Nfkc),
            "nfkd" => Ok(NormalizeMode::Nfkd),
            other => Err(ConfigError::UnknownNormalizeMode(other.to_string())),
        }
    }
}

impl TextTransform for NormalizeMode {
    fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        // ASCII is invariant under every normalization form.
        if text.is_ascii() {
            return Cow::Borrowed(text);
        }
        match self {
            NormalizeMode::None => Cow::Borrowed(text),
            NormalizeMode::Nfc => Cow::Owned(text.nfc().collect()),
            NormalizeMode::Nfd => Cow::Owned(text.nfd().collect()),
            NormalizeMode::Nfkc => Cow::Owned(text.nfkc().collect()),
            NormalizeMode::Nfkd => Cow::Owned(text.nfkd().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_forms_fold_fullwidth() {
        assert_eq!(NormalizeMode::Nfkc.apply("\u{ff21}"), "A");
        assert_eq!(NormalizeMode::Nfc.apply("\u{ff21}"), "\u{ff21}");
    }

    #[test]
    fn composition_forms_differ() {
        let decomposed = "e\u{301}";
        assert_eq!(NormalizeMode::Nfc.apply(decomposed), "\u{e9}");
        assert_eq!(NormalizeMode::Nfd.apply("\u{e9}"), decomposed);
        assert_eq!(NormalizeMode::None.apply(decomposed), decomposed);
    }

    #[test]
    fn none_leaves_compatibility_characters_borrowed() {
        let text = "\u{ff21}\u{fb01}";
        assert!(matches!(NormalizeMode::None.apply(text), Cow::Borrowed(t) if t == text));
        assert_eq!(NormalizeMode::Nfkd.apply(text), "Afi");
    }

    #[test]
    fn parses_known_modes_only() {
        assert_eq!("nfkd".parse::<NormalizeMode>(), Ok(NormalizeMode::Nfkd));
        assert_eq!(
            "NFC".parse::<NormalizeMode>(),
            Err(ConfigError::UnknownNormalizeMode("NFC".into()))
        );
    }
}
