//! Environment resolution.
//!
//! # Responsibilities
//! - Declare required and optional-with-default variable names
//! - Read each declared name from an `EnvSource`
//! - Collect every missing required name before failing
//!
//! No coercion happens here; see `loader.rs`.

use std::collections::{BTreeMap, HashMap};

use crate::config::validation::ConfigError;

/// A source of environment values.
pub trait EnvSource {
    /// Look up a variable. `None` when unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Declared environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvSchema {
    required: Vec<&'static str>,
    optional: Vec<(&'static str, String)>,
}

impl EnvSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable whose absence is fatal.
    pub fn required(mut self, name: &'static str) -> Self {
        self.required.push(name);
        self
    }

    /// Declare a variable replaced by `default` when absent.
    pub fn optional(mut self, name: &'static str, default: impl Into<String>) -> Self {
        self.optional.push((name, default.into()));
        self
    }
}

/// Every declared name mapped to its value. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnv {
    values: BTreeMap<&'static str, String>,
}

impl ResolvedEnv {
    /// Value of a declared name. Undeclared names yield `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of a declared name, or the empty string.
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }
}

fn present(source: &dyn EnvSource, name: &str) -> Option<String> {
    source.var(name).filter(|v| !v.trim().is_empty())
}

/// Resolve `schema` against `source`.
///
/// Required names are checked in declaration order and every missing one is
/// reported together. Empty or whitespace-only values count as absent.
pub fn resolve(schema: &EnvSchema, source: &dyn EnvSource) -> Result<ResolvedEnv, ConfigError> {
    let mut values = BTreeMap::new();
    let mut missing = Vec::new();

    for &name in &schema.required {
        match present(source, name) {
            Some(value) => {
                values.insert(name, value);
            }
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(ConfigError::Missing(missing));
    }

    let mut defaulted = Vec::new();
    for (name, default) in &schema.optional {
        let value = match present(source, name) {
            Some(value) => value,
            None => {
                defaulted.push(*name);
                default.clone()
            }
        };
        values.insert(*name, value);
    }

    tracing::debug!(defaulted = ?defaulted, "Optional variables defaulted");
    Ok(ResolvedEnv { values })
}
