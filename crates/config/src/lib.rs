//! Configuration: schema, file discovery/loading, `${ENV_VAR}` substitution,
//! and environment fallbacks for secrets.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{apply_env_overrides, discover_and_load, load_config, validate},
    schema::RelayConfig,
};
