use super::PropertyResolver;
use crate::properties::{PropertyMap, load_properties};
use std::fmt;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Resolver backed by a properties file.
///
/// The file is read on first access and cached for the lifetime of the
/// resolver. A missing, unreadable or malformed file yields an empty mapping.
pub struct FileResolver {
    path: PathBuf,
    properties: OnceLock<PropertyMap>,
}

impl FileResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            properties: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file has been read yet.
    pub fn is_loaded(&self) -> bool {
        self.properties.get().is_some()
    }

    fn properties(&self) -> &PropertyMap {
        self.properties.get_or_init(|| self.load())
    }

    fn load(&self) -> PropertyMap {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    path = %self.path.display(),
                    "Properties file not found. Continuing gracefully."
                );
                return PropertyMap::new();
            }
            Err(e) => {
                info!(
                    path = %self.path.display(),
                    error = %e,
                    "Cannot load external properties file. Continuing gracefully."
                );
                return PropertyMap::new();
            }
        };

        match load_properties(file) {
            Ok(Ok(map)) => {
                debug!(path = %self.path.display(), count = map.len(), "Loaded properties file");
                map
            }
            Ok(Err(e)) => {
                info!(
                    path = %self.path.display(),
                    error = %e,
                    "Malformed external properties file. Continuing gracefully."
                );
                PropertyMap::new()
            }
            Err(e) => {
                info!(
                    path = %self.path.display(),
                    error = %e,
                    "Cannot read external properties file. Continuing gracefully."
                );
                PropertyMap::new()
            }
        }
    }
}

impl PropertyResolver for FileResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        self.properties().get(name).cloned()
    }

    fn snapshot(&self) -> PropertyMap {
        self.properties().clone()
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}

impl fmt::Display for FileResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileResolver(file={})", self.path.display())
    }
}
