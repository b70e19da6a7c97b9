//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment (EnvSource)
//!     → resolver.rs (required / optional-with-default presence checks)
//!     → ResolvedEnv (every declared name has a value)
//!     → loader.rs + validation.rs (typed coercion, semantic checks)
//!     → BootstrapConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is resolved once, before any other phase, and never mutated
//! - Every missing required name is reported in one error
//! - Presence checks are separated from type coercion
//! - Empty values count as absent (`${VAR:?}` / `${VAR:-default}`)

pub mod loader;
pub mod resolver;
pub mod schema;
pub mod validation;

pub use loader::load_config;
pub use resolver::{resolve, EnvSchema, EnvSource, ProcessEnv, ResolvedEnv};
pub use schema::{
    ApplicationConfig, AssetConfig, BackoffKind, BootstrapConfig, DependencyConfig, HandoffMode,
    PreparationConfig, ProbeKind,
};
pub use validation::{ConfigError, InvalidValue};
