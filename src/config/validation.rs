//! Configuration validation.
//!
//! # Responsibilities
//! - Coerce resolved strings into typed values
//! - Validate value ranges (ports non-zero, intervals > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs before config is accepted into the system

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::config::resolver::ResolvedEnv;

/// A value that failed coercion or a range check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    pub name: String,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}='{}': {}", self.name, self.value, self.reason)
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors produced while resolving configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Required variables absent from the environment.
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    /// Values present but malformed.
    #[error("invalid configuration: {}", join(.0))]
    Invalid(Vec<InvalidValue>),
}

impl ConfigError {
    /// Names of every variable involved in the error.
    pub fn names(&self) -> Vec<&str> {
        match self {
            ConfigError::Missing(names) => names.iter().map(String::as_str).collect(),
            ConfigError::Invalid(values) => values.iter().map(|v| v.name.as_str()).collect(),
        }
    }
}

/// Accumulates coercion failures across a whole `ResolvedEnv`.
pub struct Coercer<'a> {
    env: &'a ResolvedEnv,
    errors: Vec<InvalidValue>,
}

impl<'a> Coercer<'a> {
    pub fn new(env: &'a ResolvedEnv) -> Self {
        Self {
            env,
            errors: Vec::new(),
        }
    }

    /// Raw string value.
    pub fn string(&self, name: &str) -> String {
        self.env.value(name).trim().to_string()
    }

    /// Parse a value with `FromStr`.
    pub fn parse<T>(&mut self, name: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let env = self.env;
        let raw = env.value(name).trim();
        match raw.parse::<T>() {
            Ok(v) => Some(v),
            Err(e) => {
                self.reject(name, raw, e.to_string());
                None
            }
        }
    }

    /// Parse a value where the empty string means "unset".
    pub fn parse_optional<T>(&mut self, name: &str) -> Option<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        if self.env.value(name).trim().is_empty() {
            return Some(None);
        }
        self.parse(name).map(Some)
    }

    /// Parse an integer that must be strictly positive.
    pub fn positive<T>(&mut self, name: &str) -> Option<T>
    where
        T: FromStr + PartialOrd + Default,
        T::Err: fmt::Display,
    {
        let env = self.env;
        let value = self.parse::<T>(name)?;
        if value <= T::default() {
            self.reject(name, env.value(name), "must be greater than zero");
            return None;
        }
        Some(value)
    }

    /// Record a failed semantic check.
    pub fn check(&mut self, name: &str, ok: bool, reason: &str) {
        if !ok {
            let env = self.env;
            self.reject(name, env.value(name), reason);
        }
    }

    fn reject(&mut self, name: &str, value: &str, reason: impl Into<String>) {
        self.errors.push(InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        });
    }

    /// Fail with every collected error, if any.
    pub fn finish(self) -> Result<(), ConfigError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(self.errors))
        }
    }
}
