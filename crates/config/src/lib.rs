//! Configuration loading, validation and env substitution.
//!
//! Config files: `chatbridge.toml`, `chatbridge.yaml` or `chatbridge.json`,
//! searched in `./` then the user config directory (`~/.config/chatbridge/`).
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in the raw
//! file before parsing, so secrets can stay out of the file.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config, parse_config},
    schema::{
        BotConfig, BridgeConfig, FriendConfig, GroupConfig, HubConfig, RelayConfig,
        DEFAULT_RECONNECT_DELAY_SECS,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
