// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types.
//!
//! ```text
//! EnvConfig: LoggingConfig, [LayerConfig]
//! LayerKind: Local (default) | Program
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::logging::{LogConfig, LogLevel};

/// The kind of store a layer is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// An in-memory [`LocalEnv`](crate::env::LocalEnv).
    #[default]
    Local,
    /// The program's own environment, [`ProgramEnv`](crate::env::ProgramEnv).
    Program,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Program => write!(f, "program"),
        }
    }
}

impl std::str::FromStr for LayerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "program" => Ok(Self::Program),
            _ => Err(ConfigError::InvalidValue {
                section: "layers".to_string(),
                key: "kind".to_string(),
                message: format!("expected 'local' or 'program', got '{s}'"),
            }),
        }
    }
}

/// One `[[layers]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayerConfig {
    /// Unique, non-empty name used to find the layer after building.
    pub name: String,
    pub kind: LayerKind,
    /// Local layers only.
    pub exporter: bool,
    /// Local layers only: seed with a copy of the program environment.
    pub copy_program_env: bool,
    /// Local layers only: `KEY=VALUE` pairs set in order after seeding.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vars: Vec<String>,
}

/// The `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for stderr output (0-6).
    pub console_level: LogLevel,
    /// Level for the log file (0-6).
    pub file_level: LogLevel,
    /// Log file path; no file is written when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Write the log file as JSON lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: LogLevel::WARN,
            file_level: LogLevel::DEBUG,
            log_file: None,
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Converts the table into a [`LogConfig`] for
    /// [`init_logging`](crate::logging::init_logging).
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig::builder()
            .with_console_level(self.console_level)
            .with_file_level(self.file_level)
            .maybe_with_log_file(
                self.log_file
                    .as_ref()
                    .map(|path| path.display().to_string()),
            )
            .with_json_file(self.json)
            .build()
    }
}
