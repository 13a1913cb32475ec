//! Workspace manifest.
//!
//! The manifest declares the unit tree, each unit's explicit resolvers and the
//! default chain settings. It is looked up in three places:
//! 1. **Explicit** - `--manifest` or `EXTERNAL_PROPERTIES_MANIFEST`
//! 2. **Current** - `./external-properties.yaml`
//! 3. **Deprecated** - `./.external-properties.yaml`
//!
//! Without a manifest the workspace is a single unit rooted at the working
//! directory, resolved through the default chain.
//!
//! ## Environment Variables
//! - `EXTERNAL_PROPERTIES_MANIFEST` - Explicit manifest file (overrides discovery)
//! - `EXTERNAL_PROPERTIES_HOME` - Home directory for override locations

mod loader;
mod types;

pub use loader::{
    DEPRECATED_MANIFEST_FILE, MANIFEST_ENV, MANIFEST_FILE, ManifestPaths, Workspace,
    load_workspace,
};
pub use types::*;
