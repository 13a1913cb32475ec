use super::PropertyResolver;
use crate::properties::PropertyMap;
use std::fmt;

/// In-memory resolver for programmatic or inline values.
#[derive(Debug, Clone)]
pub struct MapResolver {
    label: String,
    properties: PropertyMap,
}

impl MapResolver {
    pub fn new<K, V>(label: impl Into<String>, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            label: label.into(),
            properties: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PropertyResolver for MapResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn snapshot(&self) -> PropertyMap {
        self.properties.clone()
    }

    fn kind(&self) -> &'static str {
        "map"
    }
}

impl fmt::Display for MapResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapResolver({})", self.label)
    }
}
