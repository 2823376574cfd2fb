//! Configuration loading, env substitution, and validation for quiver.
//!
//! Config files: `quiver.toml`, `quiver.yaml`, `quiver.yml` or `quiver.json`.
//! Searched in `./` then in the user config directory.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw file.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod template;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, data_dir, discover_and_load, find_config_file,
        load_config,
    },
    schema::{CacheConfig, DiscoveryMode, QuiverConfig, RemoteConfig, SkillsConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};
