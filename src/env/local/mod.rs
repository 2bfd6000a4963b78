// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory environment store.
//!
//! # Architecture
//!
//! ```text
//! LocalEnv
//!   pairs:     Vec<String>              "KEY=VALUE", insertion order (authoritative)
//!   pair_keys: RefCell<HashMap<_, usize>> key -> index, filled on lookup
//!   exporter:  bool                     fixed at construction
//!
//! lookup(k): cache hit + verify --> index
//!            miss --> linear scan for "k=" --> cache
//! unset(k):  remove index i, evict k, decrement cached indices > i
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::trace;

use super::pair::{key_from_pair, make_pair, pair_has_key, value_from_pair};
use super::{EnvReader, EnvStore, EnvWriter};
use crate::error::{EnvError, EnvResult};

/// Construction options for [`LocalEnv`], applied in the order given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalEnvOption {
    /// Seed the store with a copy of the program's environment.
    CopyProgramEnv,
    /// Mark the store as an exporter.
    Exporter,
}

/// An ordered set of environment variables held in memory.
///
/// Changes never touch the program's real environment; use
/// [`EnvReader::environ`] to hand the variables to a child process.
///
/// # Thread Safety
/// `LocalEnv` is `Send` but not `Sync`: lookups update an internal cache.
#[derive(Debug, Clone, Default)]
pub struct LocalEnv {
    pairs: Vec<String>,
    /// Lookup cache into `pairs`; never the source of truth
    pair_keys: RefCell<HashMap<String, usize>>,
    exporter: bool,
}

impl LocalEnv {
    /// Creates an empty, non-exporting store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store and applies `options` in order.
    ///
    /// ```
    /// use envstack::env::{EnvReader, LocalEnv, LocalEnvOption};
    ///
    /// let env = LocalEnv::with_options([LocalEnvOption::Exporter]);
    /// assert!(env.is_exporter());
    /// assert!(env.is_empty());
    /// ```
    #[must_use]
    pub fn with_options(options: impl IntoIterator<Item = LocalEnvOption>) -> Self {
        let mut env = Self::new();
        for option in options {
            env.apply(option);
        }
        env
    }

    fn apply(&mut self, option: LocalEnvOption) {
        match option {
            LocalEnvOption::CopyProgramEnv => {
                for (key, value) in super::program::program_vars() {
                    // blank keys such as " " are rejected by `set` and skipped
                    let _ = self.set(&key, &value);
                }
            }
            LocalEnvOption::Exporter => self.exporter = true,
        }
    }

    /// Returns the live `KEY=VALUE` sequence, in insertion order.
    #[must_use]
    pub fn pairs(&self) -> &[String] {
        &self.pairs
    }

    /// Returns the number of variables stored.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no variables are set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn find_pair_index(&self, key: &str) -> Option<usize> {
        let cached = self.pair_keys.borrow().get(key).copied();
        if let Some(i) = cached
            && self.pairs.get(i).is_some_and(|pair| pair_has_key(pair, key))
        {
            trace!(key, index = i, "pair cache hit");
            return Some(i);
        }

        let i = self.pairs.iter().position(|pair| pair_has_key(pair, key))?;
        trace!(key, index = i, "pair cache miss");
        self.pair_keys.borrow_mut().insert(key.to_owned(), i);
        Some(i)
    }
}

impl EnvReader for LocalEnv {
    fn environ(&self) -> Vec<String> {
        self.pairs.clone()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.find_pair_index(key)
            .map(|i| value_from_pair(&self.pairs[i]).to_owned())
    }

    fn is_exporter(&self) -> bool {
        self.exporter
    }

    fn match_prefix(&self, prefix: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|pair| pair.starts_with(prefix))
            .map(|pair| key_from_pair(pair).to_owned())
            .collect()
    }
}

impl EnvWriter for LocalEnv {
    fn set(&mut self, key: &str, value: &str) -> EnvResult<()> {
        if key.trim().is_empty() {
            return Err(EnvError::EmptyKey);
        }

        let pair = make_pair(key, value);
        match self.find_pair_index(key) {
            Some(i) => self.pairs[i] = pair,
            None => {
                self.pairs.push(pair);
                self.pair_keys
                    .get_mut()
                    .insert(key.to_owned(), self.pairs.len() - 1);
            }
        }

        Ok(())
    }

    fn unset(&mut self, key: &str) {
        let Some(i) = self.find_pair_index(key) else {
            return;
        };

        self.pairs.remove(i);

        let pair_keys = self.pair_keys.get_mut();
        pair_keys.remove(key);
        for index in pair_keys.values_mut() {
            if *index > i {
                *index -= 1;
            }
        }
    }

    fn clear(&mut self) {
        self.pairs.clear();
        self.pair_keys.get_mut().clear();
    }
}

impl EnvStore for LocalEnv {}
