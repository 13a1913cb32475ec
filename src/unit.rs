//! Configuration units.
//!
//! Units form a strict tree: one root, every other unit has exactly one parent.
//! The resolution core only sees units through [`UnitProvider`] and
//! [`ResolverRegistry`]; [`UnitTree`] is the in-memory implementation the
//! application wires up from its manifest.

use crate::error::{PropertyError, PropertyResult};
use crate::resolver::SharedResolver;
use crate::types::UnitId;
use std::path::{Path, PathBuf};

/// Separator used in qualified unit names.
pub const QUALIFIED_SEPARATOR: &str = "/";

/// Read-only view of the unit hierarchy.
pub trait UnitProvider {
    /// Parent of `unit`, or `None` for the root.
    fn parent(&self, unit: UnitId) -> Option<UnitId>;

    fn name(&self, unit: UnitId) -> &str;

    /// Names from root to `unit` joined with `/`.
    fn qualified_name(&self, unit: UnitId) -> String;

    /// Directory holding the unit's local files.
    fn root_dir(&self, unit: UnitId) -> &Path;

    fn contains(&self, unit: UnitId) -> bool;
}

/// Resolvers declared for each unit, in priority order.
pub trait ResolverRegistry {
    /// Declared resolvers for `unit`; empty when nothing was declared.
    fn explicit_resolvers(&self, unit: UnitId) -> Vec<SharedResolver>;
}

/// Declaration of a unit before it is placed in a tree.
#[derive(Debug, Clone)]
pub struct UnitSpec {
    pub name: String,
    pub dir: PathBuf,
    pub resolvers: Vec<SharedResolver>,
}

impl UnitSpec {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            resolvers: Vec::new(),
        }
    }

    /// Append an explicit resolver at the lowest priority.
    pub fn with_resolver(mut self, resolver: SharedResolver) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn with_resolvers(mut self, resolvers: impl IntoIterator<Item = SharedResolver>) -> Self {
        self.resolvers.extend(resolvers);
        self
    }
}

#[derive(Debug)]
struct UnitNode {
    spec: UnitSpec,
    parent: Option<UnitId>,
    children: Vec<UnitId>,
}

/// Arena-backed unit tree.
#[derive(Debug)]
pub struct UnitTree {
    nodes: Vec<UnitNode>,
}

impl UnitTree {
    /// Create a tree containing only the root unit.
    pub fn new(root: UnitSpec) -> PropertyResult<Self> {
        validate_unit_name(&root.name)?;
        Ok(Self {
            nodes: vec![UnitNode {
                spec: root,
                parent: None,
                children: Vec::new(),
            }],
        })
    }

    pub fn root(&self) -> UnitId {
        UnitId(0)
    }

    /// Add a child under `parent`. Sibling names must be unique.
    pub fn add_child(&mut self, parent: UnitId, spec: UnitSpec) -> PropertyResult<UnitId> {
        validate_unit_name(&spec.name)?;
        let parent_node = self
            .nodes
            .get(parent.0)
            .ok_or_else(|| PropertyError::unknown_unit(parent.to_string()))?;

        if parent_node
            .children
            .iter()
            .any(|c| self.nodes[c.0].spec.name == spec.name)
        {
            return Err(PropertyError::invalid_unit(
                &spec.name,
                format!("duplicate unit name under '{}'", self.qualified_name(parent)),
            ));
        }

        let id = UnitId(self.nodes.len());
        self.nodes.push(UnitNode {
            spec,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn children(&self, unit: UnitId) -> &[UnitId] {
        self.nodes
            .get(unit.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// `unit` followed by each ancestor up to the root.
    pub fn ancestry(&self, unit: UnitId) -> Ancestry<'_, Self> {
        ancestry(self, unit)
    }

    /// Display form of a unit's position, e.g. `app -> core -> io`.
    pub fn hierarchy_string(&self, unit: UnitId) -> String {
        hierarchy_string(self, unit)
    }

    /// Look a unit up by qualified name (`app/core`).
    pub fn find(&self, qualified: &str) -> Option<UnitId> {
        let qualified = qualified.trim_end_matches(QUALIFIED_SEPARATOR);
        let mut segments = qualified.split(QUALIFIED_SEPARATOR);
        let root = self.root();
        if segments.next()? != self.nodes[root.0].spec.name {
            return None;
        }
        segments.try_fold(root, |current, segment| {
            self.children(current)
                .iter()
                .copied()
                .find(|c| self.nodes[c.0].spec.name == segment)
        })
    }

    /// All units in insertion order (parents before children).
    pub fn iter(&self) -> impl Iterator<Item = UnitId> + '_ {
        (0..self.nodes.len()).map(UnitId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, unit: UnitId) -> &UnitNode {
        &self.nodes[unit.0]
    }
}

impl UnitProvider for UnitTree {
    fn parent(&self, unit: UnitId) -> Option<UnitId> {
        self.nodes.get(unit.0).and_then(|n| n.parent)
    }

    fn name(&self, unit: UnitId) -> &str {
        &self.node(unit).spec.name
    }

    fn qualified_name(&self, unit: UnitId) -> String {
        let mut names: Vec<&str> = ancestry(self, unit).map(|u| self.name(u)).collect();
        names.reverse();
        names.join(QUALIFIED_SEPARATOR)
    }

    fn root_dir(&self, unit: UnitId) -> &Path {
        &self.node(unit).spec.dir
    }

    fn contains(&self, unit: UnitId) -> bool {
        unit.0 < self.nodes.len()
    }
}

impl ResolverRegistry for UnitTree {
    fn explicit_resolvers(&self, unit: UnitId) -> Vec<SharedResolver> {
        self.nodes
            .get(unit.0)
            .map(|n| n.spec.resolvers.clone())
            .unwrap_or_default()
    }
}

/// Iterator from a unit up to the root.
pub struct Ancestry<'a, P: UnitProvider + ?Sized> {
    provider: &'a P,
    next: Option<UnitId>,
}

impl<P: UnitProvider + ?Sized> Iterator for Ancestry<'_, P> {
    type Item = UnitId;

    fn next(&mut self) -> Option<UnitId> {
        let current = self.next?;
        self.next = self.provider.parent(current);
        Some(current)
    }
}

/// Walk from `unit` to the root of any provider.
pub fn ancestry<P: UnitProvider + ?Sized>(provider: &P, unit: UnitId) -> Ancestry<'_, P> {
    Ancestry {
        provider,
        next: provider.contains(unit).then_some(unit),
    }
}

/// `root -> child -> grandchild` for any provider.
pub fn hierarchy_string<P: UnitProvider + ?Sized>(provider: &P, unit: UnitId) -> String {
    let mut names: Vec<&str> = ancestry(provider, unit).map(|u| provider.name(u)).collect();
    names.reverse();
    names.join(" -> ")
}

fn validate_unit_name(name: &str) -> PropertyResult<()> {
    if name.trim().is_empty() {
        return Err(PropertyError::invalid_unit(name, "unit name is empty"));
    }
    if name.contains(QUALIFIED_SEPARATOR) {
        return Err(PropertyError::invalid_unit(
            name,
            format!("unit name must not contain '{}'", QUALIFIED_SEPARATOR),
        ));
    }
    Ok(())
}
