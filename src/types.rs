//! Core types shared across the resolution layers.

use crate::error::{PropertyError, PropertyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A validated property name: trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PropertyName(String);

impl PropertyName {
    /// Validate and normalize a raw name. `None` models an absent name.
    pub fn parse(raw: Option<&str>) -> PropertyResult<Self> {
        match raw.map(str::trim) {
            Some(trimmed) if !trimmed.is_empty() => Ok(Self(trimmed.to_string())),
            _ => Err(PropertyError::invalid_name(raw)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PropertyName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for PropertyName {
    type Error = PropertyError;

    fn try_from(value: &str) -> PropertyResult<Self> {
        Self::parse(Some(value))
    }
}

impl TryFrom<&String> for PropertyName {
    type Error = PropertyError;

    fn try_from(value: &String) -> PropertyResult<Self> {
        Self::parse(Some(value))
    }
}

impl TryFrom<String> for PropertyName {
    type Error = PropertyError;

    fn try_from(value: String) -> PropertyResult<Self> {
        Self::parse(Some(&value))
    }
}

impl TryFrom<Option<&str>> for PropertyName {
    type Error = PropertyError;

    fn try_from(value: Option<&str>) -> PropertyResult<Self> {
        Self::parse(value)
    }
}

/// Identifier of a configuration unit inside a unit tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub(crate) usize);

impl UnitId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Policy used to derive default override locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultPolicy {
    /// Current location nested by qualified name, plus the legacy location.
    #[default]
    #[serde(alias = "nested")]
    Hierarchical,
    /// Current location keyed by the flat unit name, no legacy tier.
    Flat,
}

impl std::str::FromStr for DefaultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hierarchical" | "nested" => Ok(DefaultPolicy::Hierarchical),
            "flat" => Ok(DefaultPolicy::Flat),
            _ => Err(format!(
                "Invalid policy '{}'. Valid options: hierarchical, flat",
                s
            )),
        }
    }
}

impl fmt::Display for DefaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultPolicy::Hierarchical => write!(f, "hierarchical"),
            DefaultPolicy::Flat => write!(f, "flat"),
        }
    }
}

/// A property value together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedProperty {
    pub name: PropertyName,
    pub value: String,
    /// Unit whose chain produced the value.
    pub unit: UnitId,
    /// Qualified name of that unit.
    pub unit_name: String,
    /// Identity of the resolver that answered.
    pub resolver: String,
}

/// A default location that may be moved by `migrate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverrideMove {
    pub unit_name: String,
    pub from: PathBuf,
    pub to: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_is_trimmed() {
        let name = PropertyName::try_from("  db.url \t").unwrap();
        assert_eq!(name.as_str(), "db.url");
    }

    #[test]
    fn test_blank_and_absent_names_rejected() {
        for raw in [Some(""), Some("   "), Some("\t\n"), None] {
            let err = PropertyName::parse(raw).unwrap_err();
            assert!(matches!(err, PropertyError::InvalidName { .. }));
        }
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("FLAT".parse::<DefaultPolicy>(), Ok(DefaultPolicy::Flat));
        assert_eq!("hierarchical".parse::<DefaultPolicy>(), Ok(DefaultPolicy::Hierarchical));
        assert_eq!("nested".parse::<DefaultPolicy>(), Ok(DefaultPolicy::Hierarchical));
        assert!("tiered".parse::<DefaultPolicy>().is_err());
    }
}
