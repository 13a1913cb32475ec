//! Default resolver chains.
//!
//! A unit without declared resolvers gets a chain over conventional locations,
//! highest priority first:
//! 1. **Current override** - `~/.external-properties/{qualified-name}/build.properties`
//!    (or `{unit-name}` under the flat policy)
//! 2. **Legacy override** - `~/.overrides/{unit-name}/build.properties`
//!    (hierarchical policy only, deprecated)
//! 3. **Unit-local** - `{unit-dir}/build.properties`
//!
//! ## Environment Variables
//! - `EXTERNAL_PROPERTIES_HOME` - Home directory used for override locations

use crate::chain::ResolverChain;
use crate::resolver::{FileResolver, SharedResolver};
use crate::types::{DefaultPolicy, OverrideMove, UnitId};
use crate::unit::{QUALIFIED_SEPARATOR, UnitProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// File name used at every default location.
pub const PROPERTIES_FILE_NAME: &str = "build.properties";

/// Directory under home holding current overrides.
pub const OVERRIDE_DIR: &str = ".external-properties";

/// Deprecated directory under home holding legacy overrides.
pub const LEGACY_OVERRIDE_DIR: &str = ".overrides";

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "EXTERNAL_PROPERTIES_HOME";

/// Tier of a default location, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DefaultTier {
    /// Current user override
    Override = 0,
    /// Deprecated user override
    LegacyOverride = 1,
    /// File next to the unit
    UnitLocal = 2,
}

impl std::fmt::Display for DefaultTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultTier::Override => write!(f, "override"),
            DefaultTier::LegacyOverride => write!(f, "override (deprecated)"),
            DefaultTier::UnitLocal => write!(f, "unit-local"),
        }
    }
}

/// Where default chains look for files.
#[derive(Debug, Clone)]
pub struct DefaultLocations {
    /// Home directory; override tiers are skipped when unknown.
    pub home: Option<PathBuf>,
    pub policy: DefaultPolicy,
}

impl Default for DefaultLocations {
    fn default() -> Self {
        Self::discover()
    }
}

impl DefaultLocations {
    /// Discover the home directory from the environment.
    pub fn discover() -> Self {
        // Home: EXTERNAL_PROPERTIES_HOME or the platform home dir
        let home = std::env::var(HOME_ENV)
            .ok()
            .filter(|h| !h.trim().is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir);

        Self {
            home,
            policy: DefaultPolicy::default(),
        }
    }

    /// Create locations with an explicit home directory.
    pub fn with_home(home: Option<PathBuf>) -> Self {
        Self {
            home,
            policy: DefaultPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DefaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current override file for a unit.
    pub fn current_override_path<P: UnitProvider + ?Sized>(
        &self,
        units: &P,
        unit: UnitId,
    ) -> Option<PathBuf> {
        let home = self.home.as_ref()?;
        let mut path = home.join(OVERRIDE_DIR);
        match self.policy {
            DefaultPolicy::Hierarchical => {
                let qualified = units.qualified_name(unit);
                for segment in qualified
                    .trim_end_matches(QUALIFIED_SEPARATOR)
                    .split(QUALIFIED_SEPARATOR)
                {
                    path.push(segment);
                }
            }
            DefaultPolicy::Flat => path.push(units.name(unit)),
        }
        Some(path.join(PROPERTIES_FILE_NAME))
    }

    /// Deprecated override file for a unit (hierarchical policy only).
    pub fn legacy_override_path<P: UnitProvider + ?Sized>(
        &self,
        units: &P,
        unit: UnitId,
    ) -> Option<PathBuf> {
        if self.policy != DefaultPolicy::Hierarchical {
            return None;
        }
        let home = self.home.as_ref()?;
        Some(
            home.join(LEGACY_OVERRIDE_DIR)
                .join(units.name(unit))
                .join(PROPERTIES_FILE_NAME),
        )
    }

    /// File next to the unit.
    pub fn local_path<P: UnitProvider + ?Sized>(&self, units: &P, unit: UnitId) -> PathBuf {
        units.root_dir(unit).join(PROPERTIES_FILE_NAME)
    }

    /// Every default location for a unit, highest priority first.
    pub fn locations<P: UnitProvider + ?Sized>(
        &self,
        units: &P,
        unit: UnitId,
    ) -> Vec<(DefaultTier, PathBuf)> {
        let mut locations = Vec::with_capacity(3);
        if let Some(path) = self.current_override_path(units, unit) {
            locations.push((DefaultTier::Override, path));
        }
        if let Some(path) = self.legacy_override_path(units, unit) {
            locations.push((DefaultTier::LegacyOverride, path));
        }
        locations.push((DefaultTier::UnitLocal, self.local_path(units, unit)));
        locations
    }

    /// Legacy override files that exist and could be moved to the current location.
    pub fn pending_migrations<P: UnitProvider + ?Sized>(
        &self,
        units: &P,
        unit_ids: impl IntoIterator<Item = UnitId>,
    ) -> Vec<OverrideMove> {
        unit_ids
            .into_iter()
            .filter_map(|unit| {
                let from = self.legacy_override_path(units, unit)?;
                let to = self.current_override_path(units, unit)?;
                from.is_file().then(|| OverrideMove {
                    unit_name: units.qualified_name(unit),
                    from,
                    to,
                })
            })
            .collect()
    }
}

/// Builds the default chain for a unit.
#[derive(Debug, Clone, Default)]
pub struct DefaultChainBuilder {
    locations: DefaultLocations,
}

impl DefaultChainBuilder {
    pub fn new(locations: DefaultLocations) -> Self {
        Self { locations }
    }

    pub fn locations(&self) -> &DefaultLocations {
        &self.locations
    }

    /// Build the chain. Missing files become empty resolvers, never errors.
    pub fn build<P: UnitProvider + ?Sized>(&self, units: &P, unit: UnitId) -> ResolverChain {
        if self.locations.home.is_none() {
            debug!(
                unit = %units.qualified_name(unit),
                "No home directory available; skipping user override locations"
            );
        }

        let resolvers: Vec<SharedResolver> = self
            .locations
            .locations(units, unit)
            .into_iter()
            .map(|(tier, path)| {
                if tier == DefaultTier::LegacyOverride {
                    warn_if_legacy_in_use(&path, units.name(unit));
                }
                Arc::new(FileResolver::new(path)) as SharedResolver
            })
            .collect();

        ResolverChain::default_chain(resolvers)
    }
}

fn warn_if_legacy_in_use(path: &Path, unit_name: &str) {
    if path.is_file() {
        warn!(
            path = %path.display(),
            unit = %unit_name,
            "Using deprecated override location '{}/'. \
             Run 'external-properties migrate' to move it to '{}/'.",
            LEGACY_OVERRIDE_DIR,
            OVERRIDE_DIR
        );
    }
}
