//! Resolver and property listings for display.
//!
//! Listings are plain serializable data; [`crate::format`] renders them.

use crate::chain::ChainOrigin;
use crate::error::PropertyResult;
use crate::hierarchy::HierarchyResolver;
use crate::types::{PropertyName, UnitId};
use crate::unit::{ResolverRegistry, UnitProvider, ancestry, hierarchy_string};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Resolvers consulted for a unit, in lookup order across the hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct ResolverListing {
    /// Qualified name of the unit the listing starts from.
    pub unit: String,
    pub units: Vec<UnitResolvers>,
}

/// One unit's effective chain.
#[derive(Debug, Clone, Serialize)]
pub struct UnitResolvers {
    pub unit: String,
    /// `root -> child` form.
    pub hierarchy: String,
    pub origin: ChainOrigin,
    pub resolvers: Vec<NumberedResolver>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumberedResolver {
    /// 1-based position across the whole listing.
    pub position: usize,
    pub resolver: String,
}

/// Properties defined by one unit's effective chain.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyListing {
    pub unit: String,
    pub hierarchy: String,
    pub origin: ChainOrigin,
    /// Winning value for every name, sorted by name.
    pub properties: BTreeMap<String, AttributedValue>,
    /// Winning values grouped under the resolver that supplied them, in chain order.
    pub by_resolver: Vec<ResolverProperties>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributedValue {
    pub value: String,
    pub resolver: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolverProperties {
    pub resolver: String,
    pub properties: BTreeMap<String, String>,
}

/// Every property visible from a unit, with shadowing applied.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveProperties {
    pub unit: String,
    pub properties: BTreeMap<String, EffectiveProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveProperty {
    pub value: String,
    /// Qualified name of the unit that supplied the value.
    pub unit: String,
    pub resolver: String,
}

/// List the resolvers consulted from `unit` up to the root.
pub fn resolver_listing<T>(
    resolver: &HierarchyResolver<T>,
    unit: UnitId,
) -> PropertyResult<ResolverListing>
where
    T: UnitProvider + ResolverRegistry,
{
    resolver.chain(unit)?;
    let units = resolver.units();
    let mut position = 0;
    let mut listed = Vec::new();

    for current in ancestry(units, unit) {
        let chain = resolver.chain(current)?;
        let resolvers = chain
            .describe()
            .into_iter()
            .map(|description| {
                position += 1;
                NumberedResolver {
                    position,
                    resolver: description,
                }
            })
            .collect();

        listed.push(UnitResolvers {
            unit: units.qualified_name(current),
            hierarchy: hierarchy_string(units, current),
            origin: chain.origin(),
            resolvers,
        });
    }

    Ok(ResolverListing {
        unit: units.qualified_name(unit),
        units: listed,
    })
}

/// List what one unit's own chain defines, attributed to the winning resolver.
pub fn property_listing<T>(
    resolver: &HierarchyResolver<T>,
    unit: UnitId,
) -> PropertyResult<PropertyListing>
where
    T: UnitProvider + ResolverRegistry,
{
    let units = resolver.units();
    let chain = resolver.chain(unit)?;

    // Every advertised name, answered the way a lookup would answer it.
    let names: BTreeSet<String> = chain
        .iter()
        .flat_map(|source| source.snapshot().into_keys())
        .collect();
    let winners: Vec<(String, usize, String)> = names
        .into_iter()
        .filter_map(|name| {
            let (index, value) = chain
                .iter()
                .enumerate()
                .find_map(|(index, source)| source.resolve(&name).map(|value| (index, value)))?;
            Some((name, index, value))
        })
        .collect();

    let descriptions = chain.describe();
    let mut by_resolver: Vec<ResolverProperties> = descriptions
        .iter()
        .map(|description| ResolverProperties {
            resolver: description.clone(),
            properties: BTreeMap::new(),
        })
        .collect();

    let mut properties = BTreeMap::new();
    for (name, index, value) in winners {
        by_resolver[index]
            .properties
            .insert(name.clone(), value.clone());
        properties.insert(
            name,
            AttributedValue {
                value,
                resolver: descriptions[index].clone(),
            },
        );
    }

    Ok(PropertyListing {
        unit: units.qualified_name(unit),
        hierarchy: hierarchy_string(units, unit),
        origin: chain.origin(),
        properties,
        by_resolver,
    })
}

/// Every name visible from `unit`, resolved the way a lookup would.
pub fn effective_properties<T>(
    resolver: &HierarchyResolver<T>,
    unit: UnitId,
) -> PropertyResult<EffectiveProperties>
where
    T: UnitProvider + ResolverRegistry,
{
    resolver.chain(unit)?;
    let units = resolver.units();
    let lineage: Vec<UnitId> = ancestry(units, unit).collect();

    let mut names = BTreeSet::new();
    for current in lineage {
        let chain = resolver.chain(current)?;
        names.extend(chain.iter().flat_map(|source| source.snapshot().into_keys()));
    }

    let mut properties = BTreeMap::new();
    for name in names {
        // Keys that are not valid property names cannot be looked up.
        match PropertyName::parse(Some(&name)) {
            Ok(property) if property.as_str() == name => {}
            _ => continue,
        }
        if let Some(found) = resolver.lookup(unit, name.as_str())? {
            properties.insert(
                name,
                EffectiveProperty {
                    value: found.value,
                    unit: found.unit_name,
                    resolver: found.resolver,
                },
            );
        }
    }

    Ok(EffectiveProperties {
        unit: units.qualified_name(unit),
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DefaultLocations;
    use crate::resolver::{EnvResolver, MapResolver, SharedResolver};
    use crate::unit::{UnitSpec, UnitTree};
    use std::sync::Arc;

    fn map(label: &str, entries: &[(&str, &str)]) -> SharedResolver {
        Arc::new(MapResolver::new(label, entries.iter().copied()))
    }

    fn fixture() -> (HierarchyResolver, UnitId) {
        let mut tree = UnitTree::new(
            UnitSpec::new("app", "/nonexistent/app")
                .with_resolver(map("app", &[("shared", "app"), ("root-only", "r")])),
        )
        .unwrap();
        let core = tree
            .add_child(
                tree.root(),
                UnitSpec::new("core", "/nonexistent/app/core")
                    .with_resolver(map("high", &[("shared", "high"), ("a", "1")]))
                    .with_resolver(map("low", &[("shared", "low"), ("b", "2")])),
            )
            .unwrap();
        (
            HierarchyResolver::new(Arc::new(tree), DefaultLocations::with_home(None)),
            core,
        )
    }

    #[test]
    fn test_resolver_listing_numbers_across_units() {
        let (resolver, core) = fixture();
        let listing = resolver_listing(&resolver, core).unwrap();

        assert_eq!(listing.unit, "app/core");
        assert_eq!(listing.units.len(), 2);
        assert_eq!(listing.units[0].hierarchy, "app -> core");
        assert_eq!(listing.units[1].hierarchy, "app");

        let positions: Vec<(usize, &str)> = listing
            .units
            .iter()
            .flat_map(|u| u.resolvers.iter())
            .map(|r| (r.position, r.resolver.as_str()))
            .collect();
        assert_eq!(
            positions,
            vec![
                (1, "MapResolver(high)"),
                (2, "MapResolver(low)"),
                (3, "MapResolver(app)"),
            ]
        );
    }

    #[test]
    fn test_property_listing_attributes_winner() {
        let (resolver, core) = fixture();
        let listing = property_listing(&resolver, core).unwrap();

        assert_eq!(listing.origin, ChainOrigin::Explicit);
        assert_eq!(
            listing.properties["shared"],
            AttributedValue {
                value: "high".to_string(),
                resolver: "MapResolver(high)".to_string(),
            }
        );
        assert_eq!(listing.properties["b"].resolver, "MapResolver(low)");
        // Only the unit's own chain
        assert!(!listing.properties.contains_key("root-only"));

        assert_eq!(listing.by_resolver.len(), 2);
        assert_eq!(
            listing.by_resolver[0].properties.keys().collect::<Vec<_>>(),
            vec!["a", "shared"]
        );
        assert_eq!(
            listing.by_resolver[1].properties.keys().collect::<Vec<_>>(),
            vec!["b"]
        );
    }

    #[test]
    fn test_effective_properties_apply_shadowing() {
        let (resolver, core) = fixture();
        let effective = effective_properties(&resolver, core).unwrap();

        assert_eq!(effective.properties["shared"].value, "high");
        assert_eq!(effective.properties["shared"].unit, "app/core");
        assert_eq!(effective.properties["root-only"].unit, "app");
        assert_eq!(effective.properties.len(), 4);

        // Must agree with point lookups
        for (name, property) in &effective.properties {
            assert_eq!(&resolver.get(core, name.as_str()).unwrap(), &property.value);
        }
    }

    #[test]
    fn test_listings_agree_with_env_lookups() {
        let tree = UnitTree::new(
            UnitSpec::new("app", "/nonexistent/app")
                .with_resolver(Arc::new(EnvResolver::from_vars(
                    "APP",
                    [("APP_DB_URL", "env"), ("APP_A__B", "unreachable")],
                )))
                .with_resolver(map("file", &[("db.url", "file"), ("port", "80")])),
        )
        .unwrap();
        let resolver = HierarchyResolver::new(Arc::new(tree), DefaultLocations::with_home(None));
        let root = resolver.units().root();

        let listing = property_listing(&resolver, root).unwrap();
        assert_eq!(
            listing.properties["db.url"],
            AttributedValue {
                value: "env".to_string(),
                resolver: "EnvResolver(prefix=APP)".to_string(),
            }
        );
        assert_eq!(
            listing.properties.keys().collect::<Vec<_>>(),
            vec!["db.url", "port"]
        );
        assert!(listing.by_resolver[1].properties.get("db.url").is_none());
        for (name, attributed) in &listing.properties {
            assert_eq!(resolver.get(root, name.as_str()).unwrap(), attributed.value);
        }

        let effective = effective_properties(&resolver, root).unwrap();
        assert_eq!(effective.properties.len(), 2);
        for (name, property) in &effective.properties {
            assert_eq!(resolver.get(root, name.as_str()).unwrap(), property.value);
        }
    }
}
