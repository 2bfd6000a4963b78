// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Declarative overlay construction.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. TOML files and strings, in the order added
//! 3. <PREFIX>_* env vars
//! 4. explicit overrides (ConfigLoader::set)
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! ENVSTACK_LOGGING__CONSOLE_LEVEL=4    → logging.console_level = 4
//! ENVSTACK_LOGGING__LOG_FILE=env.log   → logging.log_file = "env.log"
//! ```
//!
//! # Layers
//!
//! ```toml
//! [[layers]]
//! name = "locals"
//! vars = ["PS1=$ "]
//!
//! [[layers]]
//! name = "exports"
//! exporter = true
//! vars = ["DEBIAN_FRONTEND=noninteractive"]
//!
//! [[layers]]
//! name = "program"
//! kind = "program"
//! ```
//!
//! Layers are searched in declaration order, so the first `[[layers]]`
//! entry is where new variables are created.

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::env::pair::split_pair;
use crate::env::{EnvWriter, LocalEnv, LocalEnvOption, OverlayEnv, ProgramEnv, SharedEnv, shared};
use crate::error::{ConfigError, Result};

pub use loader::ConfigLoader;
pub use types::{LayerConfig, LayerKind, LoggingConfig};

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvConfig {
    /// Logging options for hosts that use [`init_logging`](crate::logging::init_logging).
    pub logging: LoggingConfig,
    /// Overlay layers, first searched first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerConfig>,
}

impl EnvConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use envstack::config::EnvConfig;
    ///
    /// let config = EnvConfig::builder()
    ///     .add_toml_file("envstack.toml")
    ///     .add_toml_file_optional("envstack.local.toml")
    ///     .with_env_prefix("ENVSTACK")
    ///     .build()?;
    /// let built = config.build_overlay()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not describe a valid configuration.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not describe
    /// a valid configuration.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Checks the layer list.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidValue`] for an empty name, or for local-only
    ///   options on a `program` layer
    /// - [`ConfigError::DuplicateLayer`] if two layers share a name
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (index, layer) in self.layers.iter().enumerate() {
            if layer.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    section: format!("layers.{index}"),
                    key: "name".to_string(),
                    message: "layer name must not be empty".to_string(),
                }
                .into());
            }
            if !seen.insert(layer.name.as_str()) {
                return Err(ConfigError::DuplicateLayer {
                    name: layer.name.clone(),
                }
                .into());
            }
            if layer.kind == LayerKind::Program {
                let local_only = [
                    ("exporter", layer.exporter),
                    ("copy_program_env", layer.copy_program_env),
                    ("vars", !layer.vars.is_empty()),
                ];
                if let Some((key, _)) = local_only.iter().find(|(_, used)| *used) {
                    return Err(ConfigError::InvalidValue {
                        section: format!("layers.{index}"),
                        key: (*key).to_string(),
                        message: format!(
                            "only local layers accept '{key}'; '{}' is a program layer",
                            layer.name
                        ),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Returns the layer called `name`.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&LayerConfig> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Creates every layer in declaration order and stacks them.
    ///
    /// # Errors
    ///
    /// Returns the validation error, or the store error raised while seeding
    /// a layer's `vars`.
    pub fn build_overlay(&self) -> Result<BuiltOverlay> {
        self.validate()?;

        let mut layers = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let env = build_layer(layer)
                .with_context(|| format!("failed to build layer '{}'", layer.name))?;
            debug!(name = %layer.name, kind = %layer.kind, "built layer");
            layers.push((layer.name.clone(), env));
        }

        let overlay = OverlayEnv::new(layers.iter().map(|(_, env)| env.clone()).collect());
        Ok(BuiltOverlay { overlay, layers })
    }

    /// Format configuration options for display.
    ///
    /// Output is deterministically ordered using `BTreeMap`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_logging_options(&mut options);
        self.format_layer_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_logging_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "logging.console_level".into(),
            self.logging.console_level.as_u8().to_string(),
        );
        options.insert(
            "logging.file_level".into(),
            self.logging.file_level.as_u8().to_string(),
        );
        if let Some(log_file) = &self.logging.log_file {
            options.insert("logging.log_file".into(), log_file.display().to_string());
        }
        options.insert("logging.json".into(), self.logging.json.to_string());
    }

    fn format_layer_options(&self, options: &mut BTreeMap<String, String>) {
        for (index, layer) in self.layers.iter().enumerate() {
            let prefix = format!("layers.{index}");
            options.insert(format!("{prefix}.name"), layer.name.clone());
            options.insert(format!("{prefix}.kind"), layer.kind.to_string());
            if layer.kind == LayerKind::Program {
                continue;
            }
            options.insert(format!("{prefix}.exporter"), layer.exporter.to_string());
            options.insert(
                format!("{prefix}.copy_program_env"),
                layer.copy_program_env.to_string(),
            );
            options.insert(format!("{prefix}.vars"), layer.vars.len().to_string());
        }
    }
}

fn build_layer(layer: &LayerConfig) -> Result<SharedEnv> {
    match layer.kind {
        LayerKind::Program => Ok(shared(ProgramEnv::new())),
        LayerKind::Local => {
            let mut options = Vec::with_capacity(2);
            if layer.copy_program_env {
                options.push(LocalEnvOption::CopyProgramEnv);
            }
            if layer.exporter {
                options.push(LocalEnvOption::Exporter);
            }

            let mut env = LocalEnv::with_options(options);
            for pair in &layer.vars {
                let (key, value) = split_pair(pair);
                env.set(key, value)?;
            }
            Ok(shared(env))
        }
    }
}

/// An overlay built from an [`EnvConfig`], with its layers kept by name.
pub struct BuiltOverlay {
    overlay: OverlayEnv,
    layers: Vec<(String, SharedEnv)>,
}

impl std::fmt::Debug for BuiltOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltOverlay")
            .field("layers", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl BuiltOverlay {
    #[must_use]
    pub const fn overlay(&self) -> &OverlayEnv {
        &self.overlay
    }

    pub const fn overlay_mut(&mut self) -> &mut OverlayEnv {
        &mut self.overlay
    }

    #[must_use]
    pub fn into_overlay(self) -> OverlayEnv {
        self.overlay
    }

    /// Returns the layer declared as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLayer`] if no layer has that name.
    pub fn layer(&self, name: &str) -> std::result::Result<SharedEnv, ConfigError> {
        self.layers
            .iter()
            .find(|(layer_name, _)| layer_name == name)
            .map(|(_, env)| env.clone())
            .ok_or_else(|| ConfigError::UnknownLayer {
                name: name.to_string(),
            })
    }

    /// Layer names in search order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|(name, _)| name.as_str())
    }
}
