//! Ordered resolver chains.
//!
//! A chain belongs to one unit. Resolvers are tried in insertion order and the
//! first one that defines a name wins.

use crate::resolver::SharedResolver;
use serde::Serialize;
use std::fmt;

/// Where a unit's chain came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainOrigin {
    /// Resolvers declared for the unit.
    Explicit,
    /// Conventional locations built when nothing was declared.
    Default,
}

impl fmt::Display for ChainOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainOrigin::Explicit => write!(f, "explicit"),
            ChainOrigin::Default => write!(f, "default"),
        }
    }
}

/// Ordered resolvers for one unit, highest priority first.
#[derive(Debug, Clone)]
pub struct ResolverChain {
    resolvers: Vec<SharedResolver>,
    origin: ChainOrigin,
}

impl ResolverChain {
    pub fn explicit(resolvers: Vec<SharedResolver>) -> Self {
        Self {
            resolvers,
            origin: ChainOrigin::Explicit,
        }
    }

    pub fn default_chain(resolvers: Vec<SharedResolver>) -> Self {
        Self {
            resolvers,
            origin: ChainOrigin::Default,
        }
    }

    /// Append a resolver at the lowest priority, returning the new chain.
    pub fn with_resolver(mut self, resolver: SharedResolver) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// First value defined by any resolver, in priority order.
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.resolve_attributed(name).map(|(value, _)| value)
    }

    /// Like [`resolve`](Self::resolve), also returning the resolver that answered.
    pub fn resolve_attributed(&self, name: &str) -> Option<(String, &SharedResolver)> {
        self.resolvers
            .iter()
            .find_map(|resolver| resolver.resolve(name).map(|value| (value, resolver)))
    }

    /// Resolver identities in priority order.
    pub fn describe(&self) -> Vec<String> {
        self.resolvers.iter().map(|r| r.to_string()).collect()
    }

    pub fn origin(&self) -> ChainOrigin {
        self.origin
    }

    pub fn resolvers(&self) -> &[SharedResolver] {
        &self.resolvers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SharedResolver> {
        self.resolvers.iter()
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}
