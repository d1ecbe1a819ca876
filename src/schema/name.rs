//! Case-folded column names
//!
//! Every schema element (dimension or metric name) is addressed by its
//! lowercased form. `ColumnName` can only be built by lowercasing, so a value
//! of this type is always a valid lookup key.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A dimension or metric name, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnName(String);

impl ColumnName {
    /// Build a name from raw input, folding it to lowercase.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref();
        if needs_folding(raw) {
            Self(raw.to_lowercase())
        } else {
            Self(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether `raw` folds to this name.
    pub fn matches(&self, raw: &str) -> bool {
        if needs_folding(raw) {
            raw.to_lowercase() == self.0
        } else {
            raw == self.0
        }
    }
}

// Titlecase letters (U+01C5 and friends) are not uppercase but still fold.
fn needs_folding(raw: &str) -> bool {
    raw.chars().any(|c| c.to_lowercase().ne(std::iter::once(c)))
}

impl From<&str> for ColumnName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ColumnName {
    fn from(raw: String) -> Self {
        if needs_folding(&raw) {
            Self(raw.to_lowercase())
        } else {
            Self(raw)
        }
    }
}

impl From<&String> for ColumnName {
    fn from(raw: &String) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for ColumnName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ColumnName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// Decoded names are folded like any other input.
impl<'de> Deserialize<'de> for ColumnName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ColumnName::from(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_on_construction() {
        assert_eq!(ColumnName::new("Country").as_str(), "country");
        assert_eq!(ColumnName::from("PAGE_URL".to_string()).as_str(), "page_url");
        assert_eq!(ColumnName::new("clicks").as_str(), "clicks");
    }

    #[test]
    fn test_mixed_case_inputs_are_equal() {
        assert_eq!(ColumnName::new("Foo"), ColumnName::new("foo"));
        assert_eq!(ColumnName::new("FOO"), ColumnName::from("fOo"));
    }

    #[test]
    fn test_unicode_folding() {
        assert_eq!(ColumnName::new("ÜBER").as_str(), "über");
    }

    #[test]
    fn test_titlecase_folding() {
        assert_eq!(ColumnName::new("\u{01C5}x"), ColumnName::new("\u{01C4}x"));
        assert_eq!(ColumnName::new("\u{01C5}x").as_str(), "\u{01C6}x");
        assert_eq!(
            ColumnName::from("\u{1F88}".to_string()),
            ColumnName::new("\u{1F80}")
        );
        assert!(ColumnName::new("\u{01C6}x").matches("\u{01C5}X"));
    }

    #[test]
    fn test_matches() {
        let name = ColumnName::new("host");
        assert!(name.matches("Host"));
        assert!(name.matches("host"));
        assert!(!name.matches("hostname"));
    }

    #[test]
    fn test_deserialize_lowercases() {
        let name: ColumnName = serde_json::from_str("\"Region\"").unwrap();
        assert_eq!(name.as_str(), "region");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"region\"");
    }
}
