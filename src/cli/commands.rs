//! Query subcommands: resolvers, properties, get, exists.
//!
//! Each command renders into a [`CommandOutput`]; printing and the process
//! exit status are left to the binary.

use super::{ExistsArgs, GetArgs, PropertiesArgs};
use crate::error::{PropertyError, PropertyResult};
use crate::format::{
    OutputFormat, format_effective_text, format_properties_text, format_resolved_text,
    format_resolvers_text, to_json,
};
use crate::hierarchy::HierarchyResolver;
use crate::report::{effective_properties, property_listing, resolver_listing};
use crate::types::UnitId;
use crate::unit::{UnitProvider, UnitTree};
use serde::Serialize;

/// Rendered result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    /// Exit successfully; false only when `exists` finds nothing.
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

/// Property value as reported by `get`.
#[derive(Debug, Clone, Serialize)]
pub struct GetResult {
    pub name: String,
    pub value: String,
    /// Qualified name of the supplying unit; absent when the default was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub defaulted: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ExistsResult<'a> {
    name: &'a str,
    exists: bool,
}

/// Find the unit named on the command line, or the root.
pub fn select_unit(tree: &UnitTree, qualified: Option<&str>) -> PropertyResult<UnitId> {
    match qualified {
        None => Ok(tree.root()),
        Some(name) => tree
            .find(name.trim())
            .ok_or_else(|| PropertyError::unknown_unit(name)),
    }
}

pub fn run_resolvers(
    resolver: &HierarchyResolver,
    unit: UnitId,
    format: OutputFormat,
) -> anyhow::Result<CommandOutput> {
    let listing = resolver_listing(resolver, unit)?;
    let text = match format {
        OutputFormat::Text => format_resolvers_text(&listing),
        OutputFormat::Json => to_json(&listing)?,
    };
    Ok(CommandOutput::ok(text))
}

pub fn run_properties(
    resolver: &HierarchyResolver,
    unit: UnitId,
    args: &PropertiesArgs,
    format: OutputFormat,
) -> anyhow::Result<CommandOutput> {
    let text = if args.all {
        let effective = effective_properties(resolver, unit)?;
        match format {
            OutputFormat::Text => format_effective_text(&effective),
            OutputFormat::Json => to_json(&effective)?,
        }
    } else {
        let listing = property_listing(resolver, unit)?;
        match format {
            OutputFormat::Text => format_properties_text(&listing),
            OutputFormat::Json => to_json(&listing)?,
        }
    };
    Ok(CommandOutput::ok(text))
}

/// Strict unless `--default` is given.
pub fn run_get(
    resolver: &HierarchyResolver,
    unit: UnitId,
    args: &GetArgs,
    format: OutputFormat,
) -> anyhow::Result<CommandOutput> {
    let result = match (resolver.lookup(unit, args.name.as_str())?, &args.default) {
        (Some(found), _) => {
            if format == OutputFormat::Text {
                return Ok(CommandOutput::ok(format_resolved_text(&found)));
            }
            GetResult {
                name: found.name.to_string(),
                value: found.value,
                unit: Some(found.unit_name),
                resolver: Some(found.resolver),
                defaulted: false,
            }
        }
        (None, Some(default)) => GetResult {
            name: args.name.trim().to_string(),
            value: default.clone(),
            unit: None,
            resolver: None,
            defaulted: true,
        },
        (None, None) => {
            return Err(PropertyError::missing_property(
                args.name.trim(),
                &resolver.units().qualified_name(unit),
            )
            .into());
        }
    };

    let text = match format {
        OutputFormat::Text => result.value,
        OutputFormat::Json => to_json(&result)?,
    };
    Ok(CommandOutput::ok(text))
}

pub fn run_exists(
    resolver: &HierarchyResolver,
    unit: UnitId,
    args: &ExistsArgs,
    format: OutputFormat,
) -> anyhow::Result<CommandOutput> {
    let exists = resolver.exists(unit, args.name.as_str())?;
    let text = match format {
        OutputFormat::Text => exists.to_string(),
        OutputFormat::Json => to_json(&ExistsResult {
            name: args.name.trim(),
            exists,
        })?,
    };
    Ok(CommandOutput {
        text,
        success: exists,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DefaultLocations;
    use crate::resolver::MapResolver;
    use crate::unit::UnitSpec;
    use std::sync::Arc;

    fn fixture() -> (HierarchyResolver, UnitId) {
        let mut tree = UnitTree::new(
            UnitSpec::new("app", "/nonexistent/app")
                .with_resolver(Arc::new(MapResolver::new("app", [("greeting", "hello")]))),
        )
        .unwrap();
        let core = tree
            .add_child(
                tree.root(),
                UnitSpec::new("core", "/nonexistent/app/core")
                    .with_resolver(Arc::new(MapResolver::new("core", [("port", "8080")]))),
            )
            .unwrap();
        (
            HierarchyResolver::new(Arc::new(tree), DefaultLocations::with_home(None)),
            core,
        )
    }

    fn get_args(name: &str, default: Option<&str>) -> GetArgs {
        GetArgs {
            name: name.to_string(),
            default: default.map(str::to_string),
        }
    }

    #[test]
    fn test_select_unit() {
        let (resolver, core) = fixture();
        let tree = resolver.units();
        assert_eq!(select_unit(tree, None).unwrap(), tree.root());
        assert_eq!(select_unit(tree, Some("app/core")).unwrap(), core);
        assert!(matches!(
            select_unit(tree, Some("app/web")).unwrap_err(),
            PropertyError::UnknownUnit { .. }
        ));
    }

    #[test]
    fn test_get_text_prints_bare_value() {
        let (resolver, core) = fixture();
        let out = run_get(&resolver, core, &get_args("greeting", None), OutputFormat::Text).unwrap();
        assert_eq!(out.text, "hello");
        assert!(out.success);
    }

    #[test]
    fn test_get_missing_without_default_fails() {
        let (resolver, core) = fixture();
        let err = run_get(&resolver, core, &get_args("nope", None), OutputFormat::Text).unwrap_err();
        let err = err.downcast::<PropertyError>().unwrap();
        assert!(err.is_missing());
    }

    #[test]
    fn test_get_default_json() {
        let (resolver, core) = fixture();
        let out = run_get(
            &resolver,
            core,
            &get_args("nope", Some("fallback")),
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out.text).unwrap();
        assert_eq!(value["value"], "fallback");
        assert_eq!(value["defaulted"], true);
        assert!(value.get("resolver").is_none());
    }

    #[test]
    fn test_get_json_attribution() {
        let (resolver, core) = fixture();
        let out = run_get(&resolver, core, &get_args("greeting", None), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out.text).unwrap();
        assert_eq!(value["unit"], "app");
        assert_eq!(value["resolver"], "MapResolver(app)");
        assert!(value.get("defaulted").is_none());
    }

    #[test]
    fn test_exists_sets_success() {
        let (resolver, core) = fixture();
        let yes = run_exists(
            &resolver,
            core,
            &ExistsArgs {
                name: "port".to_string(),
            },
            OutputFormat::Text,
        )
        .unwrap();
        assert_eq!(yes.text, "true");
        assert!(yes.success);

        let no = run_exists(
            &resolver,
            resolver.units().root(),
            &ExistsArgs {
                name: "port".to_string(),
            },
            OutputFormat::Text,
        )
        .unwrap();
        assert_eq!(no.text, "false");
        assert!(!no.success);
    }

    #[test]
    fn test_invalid_name_is_an_error_not_false() {
        let (resolver, core) = fixture();
        let result = run_exists(
            &resolver,
            core,
            &ExistsArgs {
                name: "  ".to_string(),
            },
            OutputFormat::Text,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_properties_all_includes_ancestors() {
        let (resolver, core) = fixture();
        let own = run_properties(&resolver, core, &PropertiesArgs { all: false }, OutputFormat::Text)
            .unwrap();
        assert!(own.text.contains("port=8080"));
        assert!(!own.text.contains("greeting"));

        let all = run_properties(&resolver, core, &PropertiesArgs { all: true }, OutputFormat::Text)
            .unwrap();
        assert!(all.text.contains("greeting=hello"));
        assert!(all.text.contains("port=8080"));
    }

    #[test]
    fn test_resolvers_json() {
        let (resolver, core) = fixture();
        let out = run_resolvers(&resolver, core, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out.text).unwrap();
        assert_eq!(value["unit"], "app/core");
        assert_eq!(value["units"][0]["resolvers"][0]["resolver"], "MapResolver(core)");
        assert_eq!(value["units"][1]["resolvers"][0]["position"], 2);
    }
}
