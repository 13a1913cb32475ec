//! Manifest types.
//!
//! These mirror the YAML layout one-to-one; turning them into a unit tree
//! happens in the loader. Inline property values may be any YAML scalar
//! (`port: 8080`, `debug: true`); they are stored as text, and `~` is empty.

use crate::resolver::{EnvResolver, FileResolver, MapResolver, SharedResolver};
use crate::types::DefaultPolicy;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Workspace manifest (`external-properties.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Settings for default chains.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Root unit and, nested inside it, every other unit.
    pub unit: UnitConfig,
}

/// Default chain settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// How override locations are derived (default: hierarchical).
    #[serde(default)]
    pub policy: DefaultPolicy,

    /// Home directory for override locations.
    /// Takes precedence over `EXTERNAL_PROPERTIES_HOME`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,
}

/// One unit in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitConfig {
    pub name: String,

    /// Unit directory, relative to the manifest directory.
    /// Defaults to the parent's directory joined with `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Explicit resolvers, highest priority first.
    /// When empty the unit uses the default chain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolvers: Vec<ResolverConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<UnitConfig>,
}

/// A declared resolver. Exactly one of `file`, `env`, `properties` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Properties file, relative to the manifest directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Environment variable prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,

    /// Inline values.
    #[serde(
        default,
        deserialize_with = "scalar_values",
        skip_serializing_if = "Option::is_none"
    )]
    pub properties: Option<BTreeMap<String, String>>,

    /// Display label for inline values (default: the unit's qualified name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ResolverConfig {
    /// Construct the resolver this entry declares.
    ///
    /// Returns a description of the problem when the entry does not name
    /// exactly one resolver kind.
    pub fn build(&self, base_dir: &Path, unit_name: &str) -> Result<SharedResolver, String> {
        match (&self.file, &self.env, &self.properties) {
            (Some(file), None, None) => Ok(Arc::new(FileResolver::new(super::loader::resolve_path(
                base_dir, file,
            )))),
            (None, Some(prefix), None) => {
                if prefix.trim().is_empty() {
                    return Err("env resolver prefix is empty".to_string());
                }
                Ok(Arc::new(EnvResolver::new(prefix.trim())))
            }
            (None, None, Some(values)) => {
                let label = self.label.as_deref().unwrap_or(unit_name);
                Ok(Arc::new(MapResolver::new(label, values.clone())))
            }
            (None, None, None) => {
                Err("resolver entry must set one of 'file', 'env' or 'properties'".to_string())
            }
            _ => Err(
                "resolver entry must set only one of 'file', 'env' or 'properties'".to_string(),
            ),
        }
    }
}

fn scalar_values<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<BTreeMap<String, Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };
    raw.into_iter()
        .map(|(name, value)| {
            let text = match value {
                Value::String(text) => text,
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                Value::Null => String::new(),
                _ => {
                    return Err(D::Error::custom(format!(
                        "property '{}' must be a scalar value",
                        name
                    )));
                }
            };
            Ok((name, text))
        })
        .collect::<Result<_, _>>()
        .map(Some)
}
