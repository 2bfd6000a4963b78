// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Several stores presented as one.
//!
//! # Resolution Rules
//!
//! ```text
//! layers: [0] --> [1] --> ... --> [n-1]     (fixed at construction)
//!
//! get / lookup   first layer holding the key wins
//! set            layer already holding the key, else layer [0]
//! unset / clear  every layer
//! environ        exporting layers only, first key wins, sorted
//! match_prefix   every layer, deduplicated, sorted
//! is_exporter    any layer is an exporter
//! export         every layer holding the key or exporting,
//!                stopping after the first exporter
//! ```
//!
//! An `OverlayEnv` is itself an [`EnvStore`], so overlays nest.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use super::pair::key_from_pair;
use super::{EnvReader, EnvStore, EnvWriter, SharedEnv};
use crate::error::{EnvError, EnvResult};

/// A single logical environment built from an ordered list of stores.
///
/// The overlay does not own its layers' data: the caller may keep a handle
/// on any layer and change it directly, and the overlay sees the change on
/// the next read.
#[derive(Clone, Default)]
pub struct OverlayEnv {
    envs: Vec<SharedEnv>,
}

impl fmt::Debug for OverlayEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayEnv")
            .field("layers", &self.envs.len())
            .finish()
    }
}

impl OverlayEnv {
    /// Builds an overlay from `envs`. Their order is the search order.
    #[must_use]
    pub const fn new(envs: Vec<SharedEnv>) -> Self {
        Self { envs }
    }

    /// Create a new overlay builder.
    ///
    /// # Example
    ///
    /// ```
    /// use envstack::env::{
    ///     shared, EnvReader, EnvWriter, LocalEnv, LocalEnvOption, OverlayEnv,
    /// };
    ///
    /// let locals = shared(LocalEnv::new());
    /// let exports = shared(LocalEnv::with_options([LocalEnvOption::Exporter]));
    ///
    /// let mut overlay = OverlayEnv::builder()
    ///     .with_layer(locals.clone())
    ///     .with_layer(exports.clone())
    ///     .build();
    ///
    /// overlay.set("SCRATCH", "not exported")?;
    /// overlay.export("DEBIAN_FRONTEND", "noninteractive")?;
    ///
    /// assert_eq!(overlay.environ(), vec!["DEBIAN_FRONTEND=noninteractive"]);
    /// assert_eq!(locals.borrow().get("SCRATCH"), "not exported");
    /// # Ok::<(), envstack::error::EnvError>(())
    /// ```
    #[must_use]
    pub fn builder() -> OverlayEnvBuilder {
        OverlayEnvBuilder::new()
    }

    /// Returns the number of layers.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.envs.len()
    }

    /// Returns true if the overlay has no layers.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }

    /// Returns the layer at `id`; `0` is the first layer given at construction.
    #[must_use]
    pub fn get_env_by_id(&self, id: usize) -> Option<SharedEnv> {
        self.envs.get(id).cloned()
    }

    /// Returns the first layer, where new variables are created.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::EmptyOverlay`] if the overlay has no layers.
    pub fn get_top_most_env(&self) -> EnvResult<SharedEnv> {
        self.envs.first().cloned().ok_or(EnvError::EmptyOverlay {
            method: "OverlayEnv::get_top_most_env",
        })
    }

    /// Emulates the shell's `export KEY=VALUE`.
    ///
    /// Walks the layers in order and writes `value` into every layer that
    /// already holds `key` or is an exporter, stopping after the first
    /// exporter. Layers past that exporter are never touched.
    ///
    /// # Errors
    ///
    /// - [`EnvError::EmptyOverlay`] if there are no layers
    /// - [`EnvError::NoExporterEnv`] if no layer is an exporter; nothing is changed
    /// - the first error a layer's `set` returns, unchanged; earlier layers
    ///   keep the new value
    pub fn export(&mut self, key: &str, value: &str) -> EnvResult<()> {
        if self.envs.is_empty() {
            return Err(EnvError::EmptyOverlay {
                method: "OverlayEnv::export",
            });
        }
        if !self.is_exporter() {
            return Err(EnvError::NoExporterEnv {
                method: "OverlayEnv::export",
            });
        }

        for (id, env) in self.envs.iter().enumerate() {
            let mut env = env.borrow_mut();
            let is_exporter = env.is_exporter();
            if is_exporter || env.lookup(key).is_some() {
                debug!(key, layer = id, is_exporter, "export writing layer");
                env.set(key, value)?;
            }
            if is_exporter {
                break;
            }
        }

        Ok(())
    }
}

impl EnvReader for OverlayEnv {
    fn environ(&self) -> Vec<String> {
        let mut found: BTreeMap<String, String> = BTreeMap::new();
        for env in &self.envs {
            let env = env.borrow();
            if !env.is_exporter() {
                continue;
            }
            for pair in env.environ() {
                found
                    .entry(key_from_pair(&pair).to_owned())
                    .or_insert(pair);
            }
        }

        let mut pairs: Vec<String> = found.into_values().collect();
        pairs.sort_unstable();
        pairs
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.envs.iter().find_map(|env| env.borrow().lookup(key))
    }

    fn is_exporter(&self) -> bool {
        self.envs.iter().any(|env| env.borrow().is_exporter())
    }

    fn match_prefix(&self, prefix: &str) -> Vec<String> {
        let keys: BTreeSet<String> = self
            .envs
            .iter()
            .flat_map(|env| env.borrow().match_prefix(prefix))
            .collect();
        keys.into_iter().collect()
    }
}

impl EnvWriter for OverlayEnv {
    fn set(&mut self, key: &str, value: &str) -> EnvResult<()> {
        let Some(first) = self.envs.first() else {
            return Err(EnvError::EmptyOverlay {
                method: "OverlayEnv::set",
            });
        };

        for (id, env) in self.envs.iter().enumerate() {
            if env.borrow().lookup(key).is_some() {
                debug!(key, layer = id, "updating existing variable");
                return env.borrow_mut().set(key, value);
            }
        }

        debug!(key, layer = 0, "creating variable in first layer");
        first.borrow_mut().set(key, value)
    }

    fn unset(&mut self, key: &str) {
        for env in &self.envs {
            env.borrow_mut().unset(key);
        }
    }

    fn clear(&mut self) {
        warn!(layers = self.envs.len(), "clearing every overlay layer");
        for env in &self.envs {
            env.borrow_mut().clear();
        }
    }
}

impl EnvStore for OverlayEnv {}

/// Builder for [`OverlayEnv`].
#[derive(Default)]
pub struct OverlayEnvBuilder {
    envs: Vec<SharedEnv>,
}

impl OverlayEnvBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer the caller keeps a typed handle on.
    #[must_use]
    pub fn with_layer<S: EnvStore + 'static>(mut self, env: Rc<RefCell<S>>) -> Self {
        self.envs.push(env);
        self
    }

    /// Appends an already type-erased layer.
    #[must_use]
    pub fn with_shared(mut self, env: SharedEnv) -> Self {
        self.envs.push(env);
        self
    }

    /// Appends a layer the caller has no other handle on.
    ///
    /// It stays reachable through [`OverlayEnv::get_env_by_id`].
    #[must_use]
    pub fn with_owned<S: EnvStore + 'static>(self, env: S) -> Self {
        self.with_layer(Rc::new(RefCell::new(env)))
    }

    #[must_use]
    pub fn build(self) -> OverlayEnv {
        OverlayEnv::new(self.envs)
    }
}

/// The overlay-only operations, for code that may hold an absent overlay.
///
/// Through `None`, `export` and `get_top_most_env` fail with
/// [`EnvError::NoStore`] and `get_env_by_id` finds nothing, matching how
/// the [`Option`] store impls treat `set`.
pub trait OverlayOps {
    /// See [`OverlayEnv::export`].
    ///
    /// # Errors
    ///
    /// As [`OverlayEnv::export`], or [`EnvError::NoStore`] if absent.
    fn export(&mut self, key: &str, value: &str) -> EnvResult<()>;

    /// See [`OverlayEnv::get_top_most_env`].
    ///
    /// # Errors
    ///
    /// As [`OverlayEnv::get_top_most_env`], or [`EnvError::NoStore`] if
    /// absent.
    fn get_top_most_env(&self) -> EnvResult<SharedEnv>;

    fn get_env_by_id(&self, id: usize) -> Option<SharedEnv>;
}

impl OverlayOps for OverlayEnv {
    fn export(&mut self, key: &str, value: &str) -> EnvResult<()> {
        Self::export(self, key, value)
    }

    fn get_top_most_env(&self) -> EnvResult<SharedEnv> {
        Self::get_top_most_env(self)
    }

    fn get_env_by_id(&self, id: usize) -> Option<SharedEnv> {
        Self::get_env_by_id(self, id)
    }
}

impl OverlayOps for Option<OverlayEnv> {
    fn export(&mut self, key: &str, value: &str) -> EnvResult<()> {
        match self {
            Some(overlay) => overlay.export(key, value),
            None => Err(EnvError::NoStore {
                method: "OverlayEnv::export",
            }),
        }
    }

    fn get_top_most_env(&self) -> EnvResult<SharedEnv> {
        self.as_ref()
            .ok_or(EnvError::NoStore {
                method: "OverlayEnv::get_top_most_env",
            })
            .and_then(OverlayEnv::get_top_most_env)
    }

    fn get_env_by_id(&self, id: usize) -> Option<SharedEnv> {
        self.as_ref().and_then(|overlay| overlay.get_env_by_id(id))
    }
}
