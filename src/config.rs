//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/hiertree/hiertree.toml`
//! 3. Local config: `<dir>/.hiertree.toml`
//! 4. Environment variables: `HIERTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{
    ListOptions, TreeConfig, DEFAULT_KEY_FIELD, DEFAULT_PARENT_KEY_FIELD, DEFAULT_PREFIX,
};

pub const DEFAULT_LABEL_FIELD: &str = "title";
pub const LOCAL_CONFIG_NAME: &str = ".hiertree.toml";

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub key_field: Option<String>,
    pub parent_key_field: Option<String>,
    pub value_field: Option<String>,
    pub label_field: Option<String>,
    pub prefix: Option<String>,
}

/// Unified configuration for hiertree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Record field holding the primary key (default: "id")
    pub key_field: String,
    /// Record field holding the parent's primary key (default: "parent_id")
    pub parent_key_field: String,
    /// Field used as listing key (default: the key field)
    pub value_field: Option<String>,
    /// Field used as listing label (default: "title")
    pub label_field: String,
    /// Indentation unit for listings; empty disables indentation
    pub prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_field: DEFAULT_KEY_FIELD.into(),
            parent_key_field: DEFAULT_PARENT_KEY_FIELD.into(),
            value_field: None,
            label_field: DEFAULT_LABEL_FIELD.into(),
            prefix: DEFAULT_PREFIX.into(),
        }
    }
}

/// Get the XDG config directory for hiertree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hiertree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("hiertree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_NAME)
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Tree field configuration derived from these settings.
    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig::new(&self.key_field, &self.parent_key_field)
    }

    /// Listing key field, falling back to the primary key field.
    pub fn value_field(&self) -> &str {
        self.value_field.as_deref().unwrap_or(&self.key_field)
    }

    pub fn list_options(&self) -> ListOptions {
        if self.prefix.is_empty() {
            ListOptions::plain()
        } else {
            ListOptions::plain().with_prefix(self.prefix.clone())
        }
    }

    /// Overlay wins wherever it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            key_field: overlay
                .key_field
                .clone()
                .unwrap_or_else(|| self.key_field.clone()),
            parent_key_field: overlay
                .parent_key_field
                .clone()
                .unwrap_or_else(|| self.parent_key_field.clone()),
            value_field: overlay
                .value_field
                .clone()
                .or_else(|| self.value_field.clone()),
            label_field: overlay
                .label_field
                .clone()
                .unwrap_or_else(|| self.label_field.clone()),
            prefix: overlay.prefix.clone().unwrap_or_else(|| self.prefix.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.hiertree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply HIERTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(Environment::with_prefix("HIERTREE").separator("__"))
            .build()
            .map_err(config_err)?;

        let raw = RawSettings {
            key_field: config.get_string("key_field").ok(),
            parent_key_field: config.get_string("parent_key_field").ok(),
            value_field: config.get_string("value_field").ok(),
            label_field: config.get_string("label_field").ok(),
            prefix: config.get_string("prefix").ok(),
        };
        Ok(settings.merge_with(&raw))
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# hiertree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/hiertree/hiertree.toml
#   Local:  ./.hiertree.toml
#   Env:    HIERTREE_* environment variables (e.g. HIERTREE_LABEL_FIELD=name)

# Record field holding the primary key
# key_field = "id"

# Record field holding the parent's primary key
# parent_key_field = "parent_id"

# Listing key field (defaults to key_field)
# value_field = "id"

# Listing label field
# label_field = "title"

# Indentation unit, repeated (level - 1) times; "" disables indentation
# prefix = "- "
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
