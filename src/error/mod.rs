// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!  EnvError (store operations, EnvResult<T>)
//!    EmptyKey        set() with "" or whitespace-only key
//!    NoStore         write through an absent (None) store
//!    EmptyOverlay    write / top-most query on a zero-layer overlay
//!    NoExporterEnv   export() with no exporting layer
//!    InvalidKey      key the process environment cannot hold
//!    InvalidValue    value the process environment cannot hold
//!    Other           failure raised by a caller-defined store
//!
//!  ConfigError (configuration loading, wrapped in anyhow)
//!    InvalidValue, DuplicateLayer, UnknownLayer
//! ```
//!
//! Read operations never fail. Errors are returned to the caller as-is and
//! are never logged on the way out.

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`EnvError`].
pub type EnvResult<T> = std::result::Result<T, EnvError>;

/// Errors raised by environment store write operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// The key is zero-length or only contains whitespace.
    #[error("zero-length key, or key only contains whitespace")]
    EmptyKey,

    /// A write was attempted through an absent store or overlay.
    #[error("nil pointer to environment store passed to {method}")]
    NoStore { method: &'static str },

    /// The overlay has no layers to work with.
    #[error("overlay env is empty; {method}")]
    EmptyOverlay { method: &'static str },

    /// No layer of the overlay is an exporter.
    #[error("no exporting environment in overlay env passed to {method}")]
    NoExporterEnv { method: &'static str },

    /// The process environment cannot hold this key.
    #[error("invalid key '{key}' for the program environment: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// The process environment cannot hold this value.
    #[error("invalid value for '{key}' in the program environment: contains NUL")]
    InvalidValue { key: String },

    /// Failure reported by a caller-defined store.
    #[error("{0}")]
    Other(Box<str>),
}

impl EnvError {
    /// Create an [`EnvError::Other`] from any message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into().into_boxed_str())
    }
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    /// Two layers share the same name.
    #[error("duplicate layer name '{name}'")]
    DuplicateLayer { name: String },

    /// A layer name was requested that the configuration does not define.
    #[error("unknown layer '{name}'")]
    UnknownLayer { name: String },
}
