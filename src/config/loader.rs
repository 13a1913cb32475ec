//! Manifest discovery and workspace construction.

use super::types::{Manifest, UnitConfig};
use crate::defaults::DefaultLocations;
use crate::error::{PropertyError, PropertyResult};
use crate::hierarchy::HierarchyResolver;
use crate::types::UnitId;
use crate::unit::{QUALIFIED_SEPARATOR, UnitProvider, UnitSpec, UnitTree};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Environment variable naming an explicit manifest file.
pub const MANIFEST_ENV: &str = "EXTERNAL_PROPERTIES_MANIFEST";

/// Manifest file name.
pub const MANIFEST_FILE: &str = "external-properties.yaml";

/// Deprecated manifest file name.
pub const DEPRECATED_MANIFEST_FILE: &str = ".external-properties.yaml";

/// Candidate manifest locations, highest priority first.
#[derive(Debug, Clone)]
pub struct ManifestPaths {
    /// Explicit manifest (`--manifest` or `EXTERNAL_PROPERTIES_MANIFEST`).
    pub explicit: Option<PathBuf>,
    /// `external-properties.yaml` in the working directory
    pub current: PathBuf,
    /// `.external-properties.yaml` in the working directory
    pub deprecated: PathBuf,
}

impl Default for ManifestPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ManifestPaths {
    /// Discover manifest paths from the environment and working directory.
    pub fn discover() -> Self {
        let explicit = std::env::var(MANIFEST_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Self {
            explicit,
            current: PathBuf::from(MANIFEST_FILE),
            deprecated: PathBuf::from(DEPRECATED_MANIFEST_FILE),
        }
    }

    /// Create paths rooted at an explicit directory.
    pub fn with_dir(dir: &Path) -> Self {
        Self {
            explicit: None,
            current: dir.join(MANIFEST_FILE),
            deprecated: dir.join(DEPRECATED_MANIFEST_FILE),
        }
    }

    /// Override with an explicit manifest path.
    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.explicit = path;
        }
        self
    }

    /// Check if only the deprecated manifest exists.
    pub fn is_using_deprecated(&self) -> bool {
        self.explicit.is_none() && !self.current.is_file() && self.deprecated.is_file()
    }

    /// The manifest to load, if any.
    ///
    /// An explicit path that does not exist is an error; otherwise a missing
    /// manifest just means there is none.
    pub fn locate(&self) -> PropertyResult<Option<PathBuf>> {
        if let Some(explicit) = &self.explicit {
            if !explicit.is_file() {
                return Err(PropertyError::manifest(
                    explicit,
                    "manifest file does not exist",
                ));
            }
            return Ok(Some(explicit.clone()));
        }

        if self.current.is_file() {
            return Ok(Some(self.current.clone()));
        }

        if self.deprecated.is_file() {
            warn!(
                path = %self.deprecated.display(),
                "Using deprecated manifest '{}'. Rename it to '{}'.",
                DEPRECATED_MANIFEST_FILE,
                MANIFEST_FILE
            );
            return Ok(Some(self.deprecated.clone()));
        }

        Ok(None)
    }
}

/// A unit tree plus the default locations its chains use.
#[derive(Debug)]
pub struct Workspace {
    pub tree: UnitTree,
    pub locations: DefaultLocations,
    /// Manifest the workspace was built from, if any.
    pub manifest_path: Option<PathBuf>,
}

impl Workspace {
    /// Workspace with a single root unit and no declared resolvers.
    pub fn single_unit(dir: &Path) -> PropertyResult<Self> {
        let dir = normalize_path(dir);
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "root".to_string());

        Ok(Self {
            tree: UnitTree::new(UnitSpec::new(name, dir))?,
            locations: DefaultLocations::discover(),
            manifest_path: None,
        })
    }

    /// Replace the home directory used for override locations.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        if home.is_some() {
            self.locations.home = home;
        }
        self
    }

    pub fn into_resolver(self) -> HierarchyResolver {
        HierarchyResolver::new(Arc::new(self.tree), self.locations)
    }
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> PropertyResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PropertyError::io(path, e))?;
        Self::parse(&content).map_err(|e| PropertyError::manifest(path, e.to_string()))
    }

    /// Parse manifest YAML.
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Build the workspace, resolving relative paths against `base_dir`.
    pub fn build(&self, base_dir: &Path) -> PropertyResult<Workspace> {
        let base_dir = normalize_path(base_dir);

        let root_dir = match &self.unit.dir {
            Some(dir) => resolve_path(&base_dir, dir),
            None => base_dir.clone(),
        };
        let root_spec = unit_spec(&self.unit, &base_dir, root_dir.clone(), &self.unit.name)?;
        let mut tree = UnitTree::new(root_spec)?;
        let root = tree.root();
        add_units(&mut tree, root, &root_dir, &base_dir, &self.unit.units)?;

        let locations = match &self.defaults.home {
            Some(home) => DefaultLocations::with_home(Some(resolve_path(&base_dir, home))),
            None => DefaultLocations::discover(),
        }
        .with_policy(self.defaults.policy);

        debug!(
            units = tree.len(),
            policy = %locations.policy,
            home = ?locations.home,
            "Built workspace from manifest"
        );

        Ok(Workspace {
            tree,
            locations,
            manifest_path: None,
        })
    }
}

/// Locate and load the workspace.
///
/// With no manifest, the workspace is a single unit at `working_dir`.
pub fn load_workspace(paths: &ManifestPaths, working_dir: &Path) -> PropertyResult<Workspace> {
    let Some(path) = paths.locate()? else {
        debug!(
            dir = %working_dir.display(),
            "No manifest found; using a single unit"
        );
        return Workspace::single_unit(working_dir);
    };

    let manifest = Manifest::load(&path)?;
    let base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => working_dir.join(parent),
        _ => working_dir.to_path_buf(),
    };

    let mut workspace = manifest.build(&base_dir)?;
    workspace.manifest_path = Some(path);
    Ok(workspace)
}

fn add_units(
    tree: &mut UnitTree,
    parent: UnitId,
    parent_dir: &Path,
    base_dir: &Path,
    units: &[UnitConfig],
) -> PropertyResult<()> {
    for config in units {
        let dir = match &config.dir {
            Some(dir) => resolve_path(base_dir, dir),
            None => normalize_path(&parent_dir.join(&config.name)),
        };
        let qualified = format!(
            "{}{}{}",
            tree.qualified_name(parent),
            QUALIFIED_SEPARATOR,
            config.name
        );
        let spec = unit_spec(config, base_dir, dir.clone(), &qualified)?;
        let id = tree.add_child(parent, spec)?;
        add_units(tree, id, &dir, base_dir, &config.units)?;
    }
    Ok(())
}

fn unit_spec(
    config: &UnitConfig,
    base_dir: &Path,
    dir: PathBuf,
    qualified: &str,
) -> PropertyResult<UnitSpec> {
    let resolvers = config
        .resolvers
        .iter()
        .map(|r| {
            r.build(base_dir, qualified)
                .map_err(|reason| PropertyError::invalid_unit(&config.name, reason))
        })
        .collect::<PropertyResult<Vec<_>>>()?;

    Ok(UnitSpec::new(config.name.clone(), dir).with_resolvers(resolvers))
}

/// Join a relative path onto `base` and normalize it lexically.
pub(crate) fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    normalize_path(&base.join(path))
}

/// Lexically normalize a path (remove `.` and resolve `..`).
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else {
                    components.push(Component::ParentDir);
                }
            }
            other => components.push(other),
        }
    }

    if components.is_empty() {
        return PathBuf::from(".");
    }
    components.iter().collect()
}
