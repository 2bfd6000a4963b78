// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Environment variable stores.
//!
//! # Architecture
//!
//! ```text
//!            EnvReader + EnvWriter = EnvStore
//!                         |
//!      +------------------+------------------+
//!      v                  v                  v
//!   LocalEnv          ProgramEnv         OverlayEnv
//!   pairs: Vec       std::env::*        layers: Vec<SharedEnv>
//!   cache: key->idx  always exporter    first hit wins
//! ```
//!
//! - **Pairs are authoritative**: `KEY=VALUE` strings, ready for a child process
//! - **Keys are literal**: case-sensitive, a leading `$` is part of the key
//! - **Single-threaded**: stores are shared through `Rc<RefCell<_>>`

pub mod local;
pub mod overlay;
pub mod pair;
pub mod program;


use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{EnvError, EnvResult};
use crate::expand::ExpansionBridge;

pub use local::{LocalEnv, LocalEnvOption};
pub use overlay::{OverlayEnv, OverlayEnvBuilder, OverlayOps};
pub use program::ProgramEnv;

/// Read access to a key/value store.
pub trait EnvReader {
    /// Returns a copy of all entries in the form `KEY=VALUE`.
    fn environ(&self) -> Vec<String>;

    /// Returns the value of `key`, or an empty string if it is not set.
    fn get(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_default()
    }

    /// Returns the value of `key`, distinguishing "unset" from "set to empty".
    fn lookup(&self, key: &str) -> Option<String>;

    /// Whether the variables in this store are handed to child processes.
    fn is_exporter(&self) -> bool;

    /// Returns the keys whose `KEY=VALUE` pair starts with `prefix`.
    ///
    /// The match is a case-sensitive byte prefix of the whole pair, so a
    /// prefix longer than a key can reach into its value.
    fn match_prefix(&self, prefix: &str) -> Vec<String>;
}

/// Write access to a key/value store.
pub trait EnvWriter {
    /// Creates or updates a variable.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::EmptyKey`] if `key` is empty or whitespace, or any
    /// error the underlying store raises.
    fn set(&mut self, key: &str, value: &str) -> EnvResult<()>;

    /// Deletes a variable. Unknown keys are ignored.
    fn unset(&mut self, key: &str);

    /// Deletes every variable.
    fn clear(&mut self);
}

/// A readable, writable store that can drive shell-style expansion.
pub trait EnvStore: EnvReader + EnvWriter {
    /// Replaces `$VAR`, `${VAR}`, `~` and friends in `input`.
    ///
    /// If expansion fails, `input` is returned unchanged.
    fn expand(&mut self, input: &str) -> String {
        ExpansionBridge::new(self).expand(input)
    }

    /// Looks up a user's home directory; an empty name means the current user.
    fn lookup_home_dir(&self, username: &str) -> Option<String> {
        program::lookup_home_dir(username)
    }
}

/// A store shared between the caller and one or more overlays.
pub type SharedEnv = Rc<RefCell<dyn EnvStore>>;

/// Wraps a store so it can be kept by the caller and handed to an overlay.
///
/// ```
/// use envstack::env::{shared, EnvReader, EnvWriter, LocalEnv, OverlayEnv};
///
/// let locals = shared(LocalEnv::new());
/// let overlay = OverlayEnv::builder().with_layer(locals.clone()).build();
///
/// locals.borrow_mut().set("GREETING", "hello")?;
/// assert_eq!(overlay.get("GREETING"), "hello");
/// # Ok::<(), envstack::error::EnvError>(())
/// ```
pub fn shared<S: EnvStore>(store: S) -> Rc<RefCell<S>> {
    Rc::new(RefCell::new(store))
}

impl<S: EnvReader> EnvReader for Option<S> {
    fn environ(&self) -> Vec<String> {
        self.as_ref().map(EnvReader::environ).unwrap_or_default()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.as_ref().and_then(|env| env.lookup(key))
    }

    fn is_exporter(&self) -> bool {
        self.as_ref().is_some_and(EnvReader::is_exporter)
    }

    fn match_prefix(&self, prefix: &str) -> Vec<String> {
        self.as_ref()
            .map(|env| env.match_prefix(prefix))
            .unwrap_or_default()
    }
}

impl<S: EnvWriter> EnvWriter for Option<S> {
    fn set(&mut self, key: &str, value: &str) -> EnvResult<()> {
        match self {
            Some(env) => env.set(key, value),
            None => Err(EnvError::NoStore {
                method: "Option::set",
            }),
        }
    }

    fn unset(&mut self, key: &str) {
        if let Some(env) = self {
            env.unset(key);
        }
    }

    fn clear(&mut self) {
        if let Some(env) = self {
            env.clear();
        }
    }
}

impl<S: EnvStore> EnvStore for Option<S> {
    fn expand(&mut self, input: &str) -> String {
        match self {
            Some(env) => env.expand(input),
            None => input.to_owned(),
        }
    }
}
