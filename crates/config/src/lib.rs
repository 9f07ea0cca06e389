//! Configuration loading, validation and env substitution.
//!
//! Config files: `notifeed.toml`, `notifeed.yaml`, or `notifeed.json`
//! Searched in `./` then `~/.config/notifeed/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file text.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, config_dir, data_dir, discover_and_load, load_config, watermark_dir,
    },
    schema::{FeedConfig, GitHubConfig, NotifeedConfig, PersistenceConfig, ServerConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
