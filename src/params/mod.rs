// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shell positional parameters kept in an environment store.
//!
//! ```text
//! script.sh alpha beta    -->    $1=alpha  $2=beta  $#=2
//! shift 1                 -->    $1=beta            $#=1
//! ```
//!
//! The parameters are ordinary variables whose keys start with `$`, so any
//! [`EnvStore`] can hold them and the expansion engine finds them as `$1`
//! and `$#`.


use crate::env::EnvStore;
use crate::error::EnvResult;

const COUNT_KEY: &str = "$#";

fn param_key(position: usize) -> String {
    format!("${position}")
}

/// The position of a `$N` key, if `key` is one.
fn param_position(key: &str) -> Option<usize> {
    key.strip_prefix('$')?.parse().ok()
}

/// Positional parameter operations for every [`EnvStore`].
pub trait PositionalParams: EnvStore {
    /// Returns `$#`, or 0 if it is missing or not a number.
    fn positional_param_count(&self) -> usize {
        self.lookup(COUNT_KEY)
            .and_then(|count| count.parse().ok())
            .unwrap_or(0)
    }

    /// Returns `$1` to `$#` in order, like `"$@"`.
    ///
    /// Stops at the highest `$N` the store holds when `$#` claims more;
    /// missing positions below that read as `""`.
    fn positional_params(&self) -> Vec<String> {
        let mut params = Vec::new();
        for position in 1..=self.highest_positional_param() {
            params.push(self.get(&param_key(position)));
        }
        params
    }

    /// Returns `$#`, capped by the highest `$N` key present in the store.
    fn highest_positional_param(&self) -> usize {
        let stored = self
            .match_prefix("$")
            .iter()
            .filter_map(|key| param_position(key))
            .max()
            .unwrap_or(0);
        self.positional_param_count().min(stored)
    }

    /// Writes `values` to `$1`, `$2`, ... and returns the new `$#`.
    ///
    /// Parameters past `values.len()` are kept, and `$#` only ever grows.
    ///
    /// # Errors
    ///
    /// Returns the first error the store raises.
    fn set_positional_params<V: AsRef<str>>(&mut self, values: &[V]) -> EnvResult<usize> {
        for (index, value) in values.iter().enumerate() {
            self.set(&param_key(index + 1), value.as_ref())?;
        }

        let count = self.positional_param_count();
        if count >= values.len() {
            return Ok(count);
        }
        self.set(COUNT_KEY, &values.len().to_string())?;
        Ok(values.len())
    }

    /// Makes `values` the only positional parameters.
    ///
    /// # Errors
    ///
    /// Returns the first error the store raises.
    fn replace_positional_params<V: AsRef<str>>(&mut self, values: &[V]) -> EnvResult<usize> {
        self.reset_positional_params()?;
        self.set_positional_params(values)
    }

    /// Removes every positional parameter and sets `$#` to 0.
    ///
    /// # Errors
    ///
    /// Returns the error the store raises when writing `$#`.
    fn reset_positional_params(&mut self) -> EnvResult<()> {
        for position in 1..=self.highest_positional_param() {
            self.unset(&param_key(position));
        }
        self.set(COUNT_KEY, "0")
    }

    /// Discards the first `amount` parameters, like the shell's `shift`.
    ///
    /// # Errors
    ///
    /// Returns the first error the store raises.
    fn shift_positional_params(&mut self, amount: usize) -> EnvResult<()> {
        let params = self.positional_params();
        if amount >= params.len() {
            return self.reset_positional_params();
        }
        self.replace_positional_params(&params[amount..])?;
        Ok(())
    }
}

impl<S: EnvStore + ?Sized> PositionalParams for S {}
