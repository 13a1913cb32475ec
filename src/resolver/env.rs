use super::PropertyResolver;
use crate::properties::PropertyMap;
use heck::ToShoutySnakeCase;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// Resolver over environment variables sharing a prefix.
///
/// Property `db.url` under prefix `APP` is read from `APP_DB_URL`. Matching
/// variables are captured on first access and never re-read.
pub struct EnvResolver {
    prefix: String,
    vars: OnceLock<PropertyMap>,
}

impl EnvResolver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().to_shouty_snake_case(),
            vars: OnceLock::new(),
        }
    }

    /// Build from an explicit variable set instead of the process environment.
    pub fn from_vars<K, V>(prefix: impl Into<String>, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let resolver = Self::new(prefix);
        let captured = resolver.capture(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        let _ = resolver.vars.set(captured);
        resolver
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Environment variable name for a property.
    pub fn var_name(&self, property: &str) -> String {
        let suffix = property.to_shouty_snake_case();
        if self.prefix.is_empty() {
            suffix
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }

    fn capture(&self, vars: impl Iterator<Item = (String, String)>) -> PropertyMap {
        let marker = format!("{}_", self.prefix);
        let captured: PropertyMap = vars
            .filter(|(k, _)| self.prefix.is_empty() || k.starts_with(&marker))
            .collect();
        debug!(prefix = %self.prefix, count = captured.len(), "Captured environment properties");
        captured
    }

    fn vars(&self) -> &PropertyMap {
        self.vars.get_or_init(|| self.capture(std::env::vars()))
    }

    /// Property name read from a captured variable, if the mapping is reversible.
    ///
    /// `APP_DB_URL` becomes `db.url`. Variables whose name would not map back
    /// to themselves (`APP_A__B`) are unreachable through [`resolve`] and
    /// yield `None`.
    ///
    /// [`resolve`]: PropertyResolver::resolve
    pub fn property_name(&self, var: &str) -> Option<String> {
        let suffix = if self.prefix.is_empty() {
            var
        } else {
            var.strip_prefix(&self.prefix)?.strip_prefix('_')?
        };
        let name = suffix.to_lowercase().replace('_', ".");
        (!name.is_empty() && self.var_name(&name) == var).then_some(name)
    }
}

impl PropertyResolver for EnvResolver {
    fn resolve(&self, name: &str) -> Option<String> {
        self.vars().get(&self.var_name(name)).cloned()
    }

    /// Keys are property names, so each one resolves to its value here.
    fn snapshot(&self) -> PropertyMap {
        self.vars()
            .iter()
            .filter_map(|(var, value)| Some((self.property_name(var)?, value.clone())))
            .collect()
    }

    fn kind(&self) -> &'static str {
        "env"
    }
}

impl fmt::Display for EnvResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnvResolver(prefix={})", self.prefix)
    }
}
