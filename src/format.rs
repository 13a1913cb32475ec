//! Output formatting for listings: plain text and JSON.

use crate::report::{EffectiveProperties, PropertyListing, ResolverListing};
use crate::types::ResolvedProperty;
use serde::Serialize;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format '{}'. Valid options: text, json", s)),
        }
    }
}

/// Pretty JSON for any listing.
pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Resolvers per unit, numbered across the hierarchy.
pub fn format_resolvers_text(listing: &ResolverListing) -> String {
    let mut out = String::new();

    for (i, unit) in listing.units.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("Unit: {} ({})\n", unit.hierarchy, unit.origin));
        if unit.resolvers.is_empty() {
            out.push_str("No resolvers are configured.\n");
            continue;
        }
        for resolver in &unit.resolvers {
            out.push_str(&format!("{}) {}\n", resolver.position, resolver.resolver));
        }
    }

    out
}

/// Properties of one unit's chain, grouped under each resolver.
pub fn format_properties_text(listing: &PropertyListing) -> String {
    let mut out = String::new();

    out.push_str(&format!("Unit: {} ({})\n", listing.hierarchy, listing.origin));
    for group in &listing.by_resolver {
        out.push('\n');
        out.push_str(&group.resolver);
        out.push('\n');
        out.push_str(&underline(&group.resolver));
        out.push('\n');
        for (name, value) in &group.properties {
            out.push_str(&format!("{}={}\n", name, value));
        }
    }

    out
}

/// Every visible property with the unit and resolver that supplied it.
pub fn format_effective_text(effective: &EffectiveProperties) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Effective properties for {} ({})\n",
        effective.unit,
        effective.properties.len()
    ));
    for (name, property) in &effective.properties {
        out.push_str(&format!(
            "{}={}    # {} via {}\n",
            name, property.value, property.unit, property.resolver
        ));
    }

    out
}

/// One resolved value; text is just the value so it can be captured by scripts.
pub fn format_resolved_text(resolved: &ResolvedProperty) -> String {
    resolved.value.clone()
}

fn underline(text: &str) -> String {
    "-".repeat(text.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainOrigin;
    use crate::report::{NumberedResolver, ResolverProperties, UnitResolvers};
    use std::collections::BTreeMap;

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_resolvers_text() {
        let listing = ResolverListing {
            unit: "app/core".to_string(),
            units: vec![
                UnitResolvers {
                    unit: "app/core".to_string(),
                    hierarchy: "app -> core".to_string(),
                    origin: ChainOrigin::Explicit,
                    resolvers: vec![NumberedResolver {
                        position: 1,
                        resolver: "MapResolver(a)".to_string(),
                    }],
                },
                UnitResolvers {
                    unit: "app".to_string(),
                    hierarchy: "app".to_string(),
                    origin: ChainOrigin::Default,
                    resolvers: vec![],
                },
            ],
        };

        assert_eq!(
            format_resolvers_text(&listing),
            "Unit: app -> core (explicit)\n1) MapResolver(a)\n\nUnit: app (default)\nNo resolvers are configured.\n"
        );
    }

    #[test]
    fn test_properties_text_underlines_resolver() {
        let mut props = BTreeMap::new();
        props.insert("a".to_string(), "1".to_string());
        let listing = PropertyListing {
            unit: "app".to_string(),
            hierarchy: "app".to_string(),
            origin: ChainOrigin::Explicit,
            properties: BTreeMap::new(),
            by_resolver: vec![ResolverProperties {
                resolver: "MapResolver(x)".to_string(),
                properties: props,
            }],
        };

        assert_eq!(
            format_properties_text(&listing),
            "Unit: app (explicit)\n\nMapResolver(x)\n--------------\na=1\n"
        );
    }
}
