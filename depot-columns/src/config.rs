//! Registry configuration loaded with Figment.
//!
//! A host may keep a small config file next to its sheets:
//!
//! ```yaml
//! overrides_dir: depot/columns
//! default_column_width: 180
//! ```
//!
//! Values missing from the file fall back to `RegistryConfig::default()`.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::defaults::{builtin_defaults, ColumnDefaults, DEFAULT_COLUMN_WIDTH};
use crate::error::Result;
use crate::registry::ColumnRegistry;

/// How to build a host's column registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory of `.yaml` descriptors layered over the built-ins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides_dir: Option<PathBuf>,
    /// Width, in pixels, of newly created columns.
    #[serde(default = "default_column_width")]
    pub default_column_width: u32,
}

fn default_column_width() -> u32 {
    DEFAULT_COLUMN_WIDTH
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            overrides_dir: None,
            default_column_width: DEFAULT_COLUMN_WIDTH,
        }
    }
}

impl RegistryConfig {
    /// Load from a TOML, YAML or JSON file, chosen by extension.
    ///
    /// A relative `overrides_dir` is resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let figment = Figment::new().merge(Serialized::defaults(RegistryConfig::default()));
        let figment = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Yaml::file(path)),
        };

        let mut config: RegistryConfig = figment.extract()?;
        if let (Some(dir), Some(base)) = (&config.overrides_dir, path.parent()) {
            if dir.is_relative() {
                config.overrides_dir = Some(base.join(dir));
            }
        }

        debug!(?path, ?config, "loaded registry config");
        Ok(config)
    }

    /// Build a registry: built-ins, then overrides from `overrides_dir`.
    pub fn build_registry(&self) -> Result<ColumnRegistry> {
        let mut builder = ColumnRegistry::builder()
            .with_defaults(builtin_defaults())
            .with_column_width(self.default_column_width);

        if let Some(dir) = &self.overrides_dir {
            let overrides = ColumnDefaults::load_dir(dir)?;
            info!(
                dir = %dir.display(),
                columns = overrides.columns().len(),
                "applying column overrides"
            );
            builder = builder.with_overrides(overrides);
        }

        builder.build()
    }
}
