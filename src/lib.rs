//! External Properties Library
//!
//! Resolves named string properties for a hierarchy of configuration units.
//! Each unit consults its own resolver chain first, then its parent's, up to
//! the root. This module exports the core components for testing and
//! integration.

pub mod chain;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod format;
pub mod hierarchy;
pub mod logging;
pub mod properties;
pub mod report;
pub mod resolver;
pub mod types;
pub mod unit;

pub use chain::{ChainOrigin, ResolverChain};
pub use defaults::{DefaultChainBuilder, DefaultLocations};
pub use error::{ErrorCode, PropertyError, PropertyResult};
pub use hierarchy::{HierarchyResolver, UnitProperties};
pub use resolver::{EnvResolver, FileResolver, MapResolver, PropertyResolver, SharedResolver};
pub use types::{DefaultPolicy, PropertyName, ResolvedProperty, UnitId};
pub use unit::{ResolverRegistry, UnitProvider, UnitSpec, UnitTree};
