//! Property resolvers.
//!
//! A resolver answers "what is the value of name X?" from one value source.
//! Built-in sources:
//! - [`FileResolver`] - a properties file, loaded lazily once
//! - [`EnvResolver`] - environment variables under a prefix
//! - [`MapResolver`] - an in-memory mapping (custom/programmatic values)
//!
//! Anything else can implement [`PropertyResolver`] directly.

mod env;
mod file;
mod map;

pub use env::EnvResolver;
pub use file::FileResolver;
pub use map::MapResolver;

use crate::properties::PropertyMap;
use std::fmt;
use std::sync::Arc;

/// A single source of property values.
///
/// `Display` must render a stable identity (kind plus source location); it is
/// what resolver listings show.
pub trait PropertyResolver: fmt::Display + Send + Sync {
    /// Resolve one property. `None` means this source does not define it.
    fn resolve(&self, name: &str) -> Option<String>;

    /// Every property this source defines, keyed by the name `resolve` accepts.
    fn snapshot(&self) -> PropertyMap;

    /// Short kind label, e.g. `"file"`.
    fn kind(&self) -> &'static str;
}

/// Resolvers are shared between a unit's registry and its chain.
pub type SharedResolver = Arc<dyn PropertyResolver>;

impl fmt::Debug for dyn PropertyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
