//! Hierarchical property resolution.
//!
//! A lookup starting at a unit runs that unit's effective chain, then its
//! parent's, and so on up to the root. The first value found wins, so a unit
//! shadows every ancestor that defines the same name.
//!
//! A unit's effective chain is its declared resolvers when it has any,
//! otherwise the default chain. Chains are built on first use and cached.

use crate::chain::ResolverChain;
use crate::defaults::{DefaultChainBuilder, DefaultLocations};
use crate::error::{PropertyError, PropertyResult};
use crate::types::{PropertyName, ResolvedProperty, UnitId};
use crate::unit::{ResolverRegistry, UnitProvider, UnitTree, ancestry};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

/// Resolves properties across a unit hierarchy.
pub struct HierarchyResolver<T = UnitTree> {
    units: Arc<T>,
    defaults: DefaultChainBuilder,
    chains: RwLock<HashMap<UnitId, Arc<ResolverChain>>>,
}

impl<T> HierarchyResolver<T>
where
    T: UnitProvider + ResolverRegistry,
{
    pub fn new(units: Arc<T>, locations: DefaultLocations) -> Self {
        Self {
            units,
            defaults: DefaultChainBuilder::new(locations),
            chains: RwLock::new(HashMap::new()),
        }
    }

    pub fn units(&self) -> &T {
        &self.units
    }

    pub fn defaults(&self) -> &DefaultChainBuilder {
        &self.defaults
    }

    /// Effective chain of one unit, built on first request.
    pub fn chain(&self, unit: UnitId) -> PropertyResult<Arc<ResolverChain>> {
        self.ensure_unit(unit)?;

        if let Some(chain) = self.read_cache().get(&unit) {
            return Ok(Arc::clone(chain));
        }

        let built = Arc::new(self.build_chain(unit));
        let mut cache = self
            .chains
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another caller may have won the race; keep its chain.
        Ok(Arc::clone(cache.entry(unit).or_insert(built)))
    }

    /// Find a property and report which unit and resolver supplied it.
    pub fn lookup<N>(&self, unit: UnitId, name: N) -> PropertyResult<Option<ResolvedProperty>>
    where
        N: TryInto<PropertyName, Error = PropertyError>,
    {
        let name = name.try_into()?;
        self.lookup_name(unit, name)
    }

    /// Value of `name` as seen from `unit`; `MissingProperty` when undefined.
    pub fn get<N>(&self, unit: UnitId, name: N) -> PropertyResult<String>
    where
        N: TryInto<PropertyName, Error = PropertyError>,
    {
        let name = name.try_into()?;
        match self.lookup_name(unit, name.clone())? {
            Some(found) => Ok(found.value),
            None => Err(PropertyError::missing_property(
                name.as_str(),
                &self.units.qualified_name(unit),
            )),
        }
    }

    /// Value of `name`, or `default` when undefined. Invalid names still fail.
    pub fn get_or<N>(&self, unit: UnitId, name: N, default: impl Into<String>) -> PropertyResult<String>
    where
        N: TryInto<PropertyName, Error = PropertyError>,
    {
        Ok(self
            .lookup(unit, name)?
            .map(|found| found.value)
            .unwrap_or_else(|| default.into()))
    }

    /// Whether `name` is defined anywhere from `unit` up to the root.
    pub fn exists<N>(&self, unit: UnitId, name: N) -> PropertyResult<bool>
    where
        N: TryInto<PropertyName, Error = PropertyError>,
    {
        Ok(self.lookup(unit, name)?.is_some())
    }

    /// Caller-facing handle bound to one unit.
    pub fn scope(&self, unit: UnitId) -> PropertyResult<UnitProperties<'_, T>> {
        self.ensure_unit(unit)?;
        Ok(UnitProperties {
            resolver: self,
            unit,
        })
    }

    fn lookup_name(
        &self,
        unit: UnitId,
        name: PropertyName,
    ) -> PropertyResult<Option<ResolvedProperty>> {
        self.ensure_unit(unit)?;

        for current in ancestry(self.units.as_ref(), unit) {
            let chain = self.chain(current)?;
            if let Some((value, resolver)) = chain.resolve_attributed(name.as_str()) {
                trace!(
                    property = %name,
                    unit = %self.units.qualified_name(current),
                    resolver = %resolver,
                    "Resolved property"
                );
                return Ok(Some(ResolvedProperty {
                    value,
                    unit: current,
                    unit_name: self.units.qualified_name(current),
                    resolver: resolver.to_string(),
                    name,
                }));
            }
        }

        debug!(
            property = %name,
            unit = %self.units.qualified_name(unit),
            "Property not defined anywhere in the hierarchy"
        );
        Ok(None)
    }

    fn build_chain(&self, unit: UnitId) -> ResolverChain {
        let explicit = self.units.explicit_resolvers(unit);
        if explicit.is_empty() {
            debug!(
                unit = %self.units.qualified_name(unit),
                "No resolvers declared; using default locations"
            );
            self.defaults.build(self.units.as_ref(), unit)
        } else {
            ResolverChain::explicit(explicit)
        }
    }

    fn read_cache(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<UnitId, Arc<ResolverChain>>> {
        self.chains
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_unit(&self, unit: UnitId) -> PropertyResult<()> {
        if self.units.contains(unit) {
            Ok(())
        } else {
            Err(PropertyError::unknown_unit(unit.to_string()))
        }
    }
}

/// Properties as seen from one unit.
pub struct UnitProperties<'a, T = UnitTree> {
    resolver: &'a HierarchyResolver<T>,
    unit: UnitId,
}

impl<T> UnitProperties<'_, T>
where
    T: UnitProvider + ResolverRegistry,
{
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn get<N>(&self, name: N) -> PropertyResult<String>
    where
        N: TryInto<PropertyName, Error = PropertyError>,
    {
        self.resolver.get(self.unit, name)
    }

    pub fn get_or<N>(&self, name: N, default: impl Into<String>) -> PropertyResult<String>
    where
        N: TryInto<PropertyName, Error = PropertyError>,
    {
        self.resolver.get_or(self.unit, name, default)
    }

    pub fn exists<N>(&self, name: N) -> PropertyResult<bool>
    where
        N: TryInto<PropertyName, Error = PropertyError>,
    {
        self.resolver.exists(self.unit, name)
    }

    pub fn lookup<N>(&self, name: N) -> PropertyResult<Option<ResolvedProperty>>
    where
        N: TryInto<PropertyName, Error = PropertyError>,
    {
        self.resolver.lookup(self.unit, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainOrigin;
    use crate::resolver::{MapResolver, SharedResolver};
    use crate::unit::UnitSpec;

    fn map(label: &str, entries: &[(&str, &str)]) -> SharedResolver {
        Arc::new(MapResolver::new(label, entries.iter().copied()))
    }

    fn two_level() -> (HierarchyResolver, UnitId) {
        let mut tree = UnitTree::new(
            UnitSpec::new("root", "/nonexistent/root")
                .with_resolver(map("root", &[("x", "1"), ("only-root", "r")])),
        )
        .unwrap();
        let child = tree
            .add_child(
                tree.root(),
                UnitSpec::new("child", "/nonexistent/root/child")
                    .with_resolver(map("child", &[("x", "2")])),
            )
            .unwrap();
        (
            HierarchyResolver::new(Arc::new(tree), DefaultLocations::with_home(None)),
            child,
        )
    }

    #[test]
    fn test_child_shadows_root() {
        let (resolver, child) = two_level();
        let root = resolver.units().root();
        assert_eq!(resolver.get(child, "x").unwrap(), "2");
        assert_eq!(resolver.get(root, "x").unwrap(), "1");
        assert_eq!(resolver.get(child, "only-root").unwrap(), "r");
    }

    #[test]
    fn test_lookup_attribution() {
        let (resolver, child) = two_level();
        let found = resolver.lookup(child, "only-root").unwrap().unwrap();
        assert_eq!(found.value, "r");
        assert_eq!(found.unit, resolver.units().root());
        assert_eq!(found.unit_name, "root");
        assert_eq!(found.resolver, "MapResolver(root)");
    }

    #[test]
    fn test_missing_property_variants() {
        let (resolver, child) = two_level();
        let err = resolver.get(child, "missing").unwrap_err();
        assert!(err.is_missing());
        assert_eq!(resolver.get_or(child, "missing", "fallback").unwrap(), "fallback");
        assert!(!resolver.exists(child, "missing").unwrap());
        assert!(resolver.exists(child, "x").unwrap());
    }

    #[test]
    fn test_invalid_names_fail_in_every_variant() {
        let (resolver, child) = two_level();
        assert!(matches!(
            resolver.get(child, "   ").unwrap_err(),
            PropertyError::InvalidName { .. }
        ));
        assert!(matches!(
            resolver.get(child, None::<&str>).unwrap_err(),
            PropertyError::InvalidName { .. }
        ));
        assert!(resolver.get_or(child, "", "d").is_err());
        assert!(resolver.exists(child, "\t").is_err());
    }

    #[test]
    fn test_names_are_trimmed_before_lookup() {
        let (resolver, child) = two_level();
        assert_eq!(resolver.get(child, "  x  ").unwrap(), "2");
    }

    #[test]
    fn test_unknown_unit() {
        let (resolver, _) = two_level();
        let err = resolver.get(UnitId(99), "x").unwrap_err();
        assert!(matches!(err, PropertyError::UnknownUnit { .. }));
        assert!(resolver.scope(UnitId(99)).is_err());
    }

    #[test]
    fn test_chain_is_cached_per_unit() {
        let (resolver, child) = two_level();
        let first = resolver.chain(child).unwrap();
        let second = resolver.chain(child).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.origin(), ChainOrigin::Explicit);
    }

    #[test]
    fn test_default_chain_when_nothing_declared() {
        let tree = UnitTree::new(UnitSpec::new("root", "/nonexistent/root")).unwrap();
        let resolver = HierarchyResolver::new(Arc::new(tree), DefaultLocations::with_home(None));
        let chain = resolver.chain(resolver.units().root()).unwrap();
        assert_eq!(chain.origin(), ChainOrigin::Default);
        assert_eq!(
            chain.describe(),
            vec!["FileResolver(file=/nonexistent/root/build.properties)"]
        );
        assert!(!resolver.exists(resolver.units().root(), "a").unwrap());
    }

    #[test]
    fn test_scope_handle() {
        let (resolver, child) = two_level();
        let props = resolver.scope(child).unwrap();
        assert_eq!(props.unit(), child);
        assert_eq!(props.get("x").unwrap(), "2");
        assert_eq!(props.get_or("nope", "d").unwrap(), "d");
        assert!(props.exists("only-root").unwrap());
        assert_eq!(props.lookup("x").unwrap().unwrap().unit, child);
    }
}
