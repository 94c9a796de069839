//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/mapwire/config.toml` (XDG) or platform config dir
//! 2. Project config: `.mapwire.toml`
//! 3. Environment variables: `MAPWIRE_*` (nested keys separated by `__`)
//!
//! # Intended Usage
//!
//! **Project config** (`.mapwire.toml`):
//! ```toml
//! [mappers.users]
//! interface = "UserMapper"
//!
//! [mappers.audit]
//! interface = "app::audit::AuditMapper"
//! add_to_config = false
//! ```
//!
//! Each entry configures one provider. `interface` names the mapper trait,
//! either by its simple name or by its full path; `add_to_config` defaults to
//! true. The container-style spellings `mapperInterface` and `addToConfig`
//! are accepted as well.
//!
//! The environment override for the example above is
//! `MAPWIRE_MAPPERS__AUDIT__ADD_TO_CONFIG=true`.

use std::collections::BTreeMap;
use std::ops::Deref;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

impl From<ConfigError> for figment::Error {
    fn from(err: ConfigError) -> Self {
        *err.0
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Provider settings keyed by provider name.
    #[serde(default)]
    pub mappers: BTreeMap<String, MapperSettings>,
}

/// Property surface of a single mapper provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapperSettings {
    /// Mapper trait name (simple or fully qualified). Required by `configure()`.
    #[serde(default, alias = "mapperInterface")]
    pub interface: Option<String>,
    /// Register the interface when the registry does not know it yet.
    #[serde(default = "default_add_to_config", alias = "addToConfig")]
    pub add_to_config: bool,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            interface: None,
            add_to_config: default_add_to_config(),
        }
    }
}

/// Serde default for `add_to_config`.
pub fn default_add_to_config() -> bool {
    true
}

impl Config {
    /// Load config with layered resolution (user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        let user_config = Self::user_config_path();

        Self::figment(
            Figment::new()
                // Layer 1: User config (lowest priority)
                .merge(Toml::file(user_config))
                // Layer 2: Project config
                .merge(Toml::file(".mapwire.toml")),
        )
    }

    /// Parse config from a TOML string, still honoring `MAPWIRE_*` overrides.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::figment(Figment::new().merge(Toml::string(toml)))
    }

    /// Settings for the provider named `name`, if configured.
    pub fn mapper(&self, name: &str) -> Option<&MapperSettings> {
        self.mappers.get(name)
    }

    fn figment(base: Figment) -> Result<Self, ConfigError> {
        base
            // Environment variables (highest priority)
            .merge(Env::prefixed("MAPWIRE_").split("__"))
            .extract()
            .map_err(ConfigError::from)
    }

    /// User config path: ~/.config/mapwire/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("mapwire").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        // Fall back to platform-specific config dir
        dirs::config_dir()
            .map(|p| p.join("mapwire").join("config.toml"))
            .unwrap_or_default()
    }
}
