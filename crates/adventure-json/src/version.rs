//! Save format version labels.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::JsonError;

/// Version written into every document saved by this build.
pub const CURRENT_SAVE_VERSION: &str = "2.2";

/// Oldest version this build can correct. Documents with no readable
/// version are assumed to be this old.
pub const OLDEST_SAVE_VERSION: &str = "2.0";

/// Saves exported from the original Python release. Recognized, never converted.
pub const LEGACY_EXPORT_VERSION: &str = "1.5.3";

/// A dot-separated version label such as `2.0.1`.
///
/// Ordering is numeric per component, and trailing zero components are
/// insignificant: `2.0 == 2.0.0 < 2.0.1 < 2.1`.
#[derive(Debug, Clone)]
pub struct SaveVersion {
    label: String,
    parts: Vec<u32>,
}

impl SaveVersion {
    /// Parse a version label. Every component must be an unsigned integer.
    pub fn parse(label: &str) -> Result<Self, JsonError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(JsonError::InvalidVersion(label.to_string()));
        }
        let parts = label
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| JsonError::InvalidVersion(label.to_string()))?;
        Ok(Self {
            label: label.to_string(),
            parts,
        })
    }

    /// Build a version from one of the built-in constants.
    pub fn from_static(label: &'static str) -> Self {
        Self::parse(label).unwrap_or_else(|_| panic!("invalid built-in version label {label:?}"))
    }

    pub fn current() -> Self {
        Self::from_static(CURRENT_SAVE_VERSION)
    }

    pub fn oldest() -> Self {
        Self::from_static(OLDEST_SAVE_VERSION)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_current(&self) -> bool {
        *self == Self::current()
    }

    /// Whether this version is at least as new as the current one.
    pub fn is_up_to_date(&self) -> bool {
        *self >= Self::current()
    }

    fn significant(&self) -> &[u32] {
        let len = self
            .parts
            .iter()
            .rposition(|&part| part != 0)
            .map_or(0, |last| last + 1);
        &self.parts[..len]
    }
}

impl PartialEq for SaveVersion {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for SaveVersion {}

impl PartialOrd for SaveVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SaveVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.significant().cmp(other.significant())
    }
}

impl fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl FromStr for SaveVersion {
    type Err = JsonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SaveVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for SaveVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::parse(&label).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(label: &str) -> SaveVersion {
        SaveVersion::parse(label).unwrap()
    }

    #[test]
    fn numeric_component_ordering() {
        assert!(v("2.0") < v("2.0.1"));
        assert!(v("2.0.1") < v("2.1"));
        assert!(v("2.9") < v("2.10"));
        assert!(v("1.5.3") < v("2.0"));
    }

    #[test]
    fn trailing_zeros_are_equal() {
        assert_eq!(v("2.0"), v("2.0.0"));
        assert_eq!(v("2"), v("2.0"));
        assert_eq!(v("2.0").cmp(&v("2.0.0")), Ordering::Equal);
    }

    #[test]
    fn label_is_preserved() {
        assert_eq!(v(" 2.0.1 ").label(), "2.0.1");
        assert_eq!(v("2.0").to_string(), "2.0");
    }

    #[test]
    fn rejects_garbage() {
        assert!(SaveVersion::parse("").is_err());
        assert!(SaveVersion::parse("2..1").is_err());
        assert!(SaveVersion::parse("v2.0").is_err());
        assert!(SaveVersion::parse("2.0-beta").is_err());
    }

    #[test]
    fn constants_are_ordered() {
        let legacy = SaveVersion::from_static(LEGACY_EXPORT_VERSION);
        assert!(legacy < SaveVersion::oldest());
        assert!(SaveVersion::oldest() <= SaveVersion::current());
        assert!(SaveVersion::current().is_current());
        assert!(SaveVersion::current().is_up_to_date());
        assert!(!SaveVersion::oldest().is_up_to_date());
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&v("2.0.1")).unwrap();
        assert_eq!(json, "\"2.0.1\"");
        let back: SaveVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("2.0.1"));
        assert!(serde_json::from_str::<SaveVersion>("\"nope\"").is_err());
    }
}
