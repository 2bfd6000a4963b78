// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shell-style string expansion backed by an environment store.
//!
//! # Architecture
//!
//! ```text
//!  caller --expand("${HOME}/bin")--> ExpansionBridge<S: EnvStore>
//!                                       |  implements ExpansionCallbacks
//!                                       v
//!                                   Expander (ShellExpander or your own)
//!                                       |
//!        assign_var / lookup_var / match_var_names / lookup_home_dir
//!                                       |
//!                                       v
//!                                   the store S
//!
//!  engine Ok(s)   --> s
//!  engine Err(_)  --> the input, unchanged
//! ```

pub mod engine;


use thiserror::Error;
use tracing::debug;

use crate::env::EnvStore;
use crate::error::{EnvError, EnvResult};

pub use engine::ShellExpander;

/// Errors an expansion engine can report.
///
/// [`ExpansionBridge`] never surfaces these; they reach callers only when an
/// [`Expander`] is driven directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// A `${` without its closing `}`.
    #[error("unterminated parameter expansion")]
    Unterminated,

    /// A `${...}` form the engine does not understand.
    #[error("{0}: bad substitution")]
    BadSubstitution(String),

    /// `${NAME:?message}` on an unset or empty variable.
    #[error("{name}: {message}")]
    ParameterUnset { name: String, message: String },

    /// `${NAME:=word}` could not write to the store.
    #[error("assignment failed: {0}")]
    Assign(#[from] EnvError),
}

/// What an expansion engine may ask of the environment.
pub trait ExpansionCallbacks {
    /// Assigns a variable, for `${NAME:=word}`.
    ///
    /// # Errors
    ///
    /// Whatever the underlying store's `set` returns.
    fn assign_var(&mut self, key: &str, value: &str) -> EnvResult<()>;

    /// Looks a variable up; `None` means unset.
    fn lookup_var(&self, key: &str) -> Option<String>;

    /// Lists variable names starting with `prefix`, for `${!prefix*}`.
    fn match_var_names(&self, prefix: &str) -> Vec<String>;

    /// Resolves a user's home directory; an empty name means the current user.
    fn lookup_home_dir(&self, username: &str) -> Option<String>;
}

/// An expansion engine.
pub trait Expander {
    /// Expands `input`, reading and writing variables through `callbacks`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExpandError`] for malformed input, for `${NAME?}` on an
    /// unset variable, or if an assignment fails.
    fn expand(
        &self,
        input: &str,
        callbacks: &mut dyn ExpansionCallbacks,
    ) -> Result<String, ExpandError>;
}

/// Connects an [`EnvStore`] to an [`Expander`].
///
/// ```
/// use envstack::env::{EnvReader, EnvWriter, LocalEnv};
/// use envstack::expand::ExpansionBridge;
///
/// let mut env = LocalEnv::new();
/// env.set("NAME", "world")?;
///
/// let mut bridge = ExpansionBridge::new(&mut env);
/// assert_eq!(bridge.expand("hello ${NAME} ${GREETING:=hi}"), "hello world hi");
/// assert_eq!(bridge.expand("broken ${NAME"), "broken ${NAME");
/// assert_eq!(env.get("GREETING"), "hi");
/// # Ok::<(), envstack::error::EnvError>(())
/// ```
pub struct ExpansionBridge<'a, S: ?Sized> {
    env: &'a mut S,
}

impl<'a, S: EnvStore + ?Sized> ExpansionBridge<'a, S> {
    pub fn new(env: &'a mut S) -> Self {
        Self { env }
    }

    /// Expands `input` with the built-in [`ShellExpander`].
    pub fn expand(&mut self, input: &str) -> String {
        self.expand_with(&ShellExpander::new(), input)
    }

    /// Expands `input` with `engine`, returning `input` unchanged if the
    /// engine fails.
    ///
    /// [`ShellExpander`] writes `:=` assignments only once the whole input
    /// has expanded. Other engines may already have written to the store
    /// when they fail.
    pub fn expand_with<E: Expander + ?Sized>(&mut self, engine: &E, input: &str) -> String {
        match engine.expand(input, self) {
            Ok(expanded) => expanded,
            Err(err) => {
                debug!(input, error = %err, "expansion failed, keeping input");
                input.to_owned()
            }
        }
    }
}

impl<S: EnvStore + ?Sized> ExpansionCallbacks for ExpansionBridge<'_, S> {
    fn assign_var(&mut self, key: &str, value: &str) -> EnvResult<()> {
        self.env.set(key, value)
    }

    fn lookup_var(&self, key: &str) -> Option<String> {
        self.env.lookup(key)
    }

    fn match_var_names(&self, prefix: &str) -> Vec<String> {
        self.env.match_prefix(prefix)
    }

    fn lookup_home_dir(&self, username: &str) -> Option<String> {
        self.env.lookup_home_dir(username)
    }
}
