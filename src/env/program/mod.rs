// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Passthrough to the program's real environment.
//!
//! ```text
//! ProgramEnv (zero-sized, always an exporter)
//!   environ / lookup / match_prefix  --> std::env::vars_os / var_os
//!   set / unset                      --> std::env::set_var / remove_var
//!   clear                            --> remove every variable (process-wide!)
//!   restore_environment(snapshot)    --> set each pair, no clear first
//!
//! lookup_home_dir("")      --> dirs::home_dir()
//! lookup_home_dir("alice") --> getpwnam_r (Unix)
//! ```
//!
//! The program environment is global to the process. Nothing here takes a
//! lock; callers must not touch it from more than one thread at a time.

use std::ffi::OsStr;

use tracing::{trace, warn};

use super::pair::{make_pair, split_pair};
use super::{EnvReader, EnvStore, EnvWriter};
use crate::error::{EnvError, EnvResult};

/// Reads and writes the program's environment directly.
///
/// Every write is visible to the whole process and to any child process
/// spawned afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramEnv;

impl ProgramEnv {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Writes a snapshot taken with [`EnvReader::environ`] back into the
    /// program's environment.
    ///
    /// Variables set since the snapshot are left alone; pair this with
    /// [`EnvWriter::clear`] for a full restore.
    ///
    /// # Errors
    ///
    /// Every pair is attempted; the first failure is returned.
    pub fn restore_environment<S: AsRef<str>>(&mut self, pairs: &[S]) -> EnvResult<()> {
        let mut first_error = None;
        for pair in pairs {
            let (key, value) = split_pair(pair.as_ref());
            if let Err(err) = self.set(key, value) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl EnvReader for ProgramEnv {
    fn environ(&self) -> Vec<String> {
        program_vars()
            .into_iter()
            .map(|(key, value)| make_pair(&key, &value))
            .collect()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if !is_host_key(OsStr::new(key)) {
            return None;
        }
        std::env::var(key).ok()
    }

    fn is_exporter(&self) -> bool {
        true
    }

    fn match_prefix(&self, prefix: &str) -> Vec<String> {
        program_vars()
            .into_iter()
            .filter(|(key, value)| {
                let pair = make_pair(key, value);
                pair.starts_with(prefix)
            })
            .map(|(key, _)| key)
            .collect()
    }
}

impl EnvWriter for ProgramEnv {
    fn set(&mut self, key: &str, value: &str) -> EnvResult<()> {
        if key.trim().is_empty() {
            return Err(EnvError::EmptyKey);
        }
        if key.contains('=') {
            return Err(EnvError::InvalidKey {
                key: key.to_owned(),
                reason: "contains '='",
            });
        }
        if key.contains('\0') {
            return Err(EnvError::InvalidKey {
                key: key.to_owned(),
                reason: "contains NUL",
            });
        }
        if value.contains('\0') {
            return Err(EnvError::InvalidValue {
                key: key.to_owned(),
            });
        }

        // SAFETY: key and value were checked above, and the crate is
        // single-threaded by contract; no other thread reads the environment.
        unsafe { std::env::set_var(key, value) };
        Ok(())
    }

    fn unset(&mut self, key: &str) {
        if !is_host_key(OsStr::new(key)) {
            return;
        }
        // SAFETY: see `set`
        unsafe { std::env::remove_var(key) };
    }

    fn clear(&mut self) {
        warn!("clearing the program environment");
        for (key, _) in std::env::vars_os() {
            if !is_host_key(&key) {
                trace!(key = ?key, "leaving variable the host cannot remove");
                continue;
            }
            // SAFETY: see `set`
            unsafe { std::env::remove_var(&key) };
        }
    }
}

impl EnvStore for ProgramEnv {}

/// Returns the UTF-8 variables of the program's environment, in host order.
pub(crate) fn program_vars() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                trace!(key = ?key, "skipping non UTF-8 environment entry");
                None
            }
        })
        .collect()
}

/// Whether `std::env` accepts `key` without panicking.
fn is_host_key(key: &OsStr) -> bool {
    let bytes = key.as_encoded_bytes();
    !bytes.is_empty() && !bytes.contains(&b'=') && !bytes.contains(&0)
}

/// Looks up a user's home directory.
///
/// An empty `username` means the current user. Returns `None` if the user
/// does not exist or has no home directory.
#[must_use]
pub fn lookup_home_dir(username: &str) -> Option<String> {
    if username.is_empty() {
        return dirs::home_dir().map(|path| path.to_string_lossy().into_owned());
    }
    passwd_home_dir(username)
}

#[cfg(unix)]
fn passwd_home_dir(username: &str) -> Option<String> {
    use std::ffi::{CStr, CString};

    const MAX_BUFFER: usize = 1 << 20;

    let name = CString::new(username).ok()?;
    let mut buf: Vec<libc::c_char> = vec![0; 4096];
    // SAFETY: `passwd` is a plain C struct; all-zero is a valid bit pattern.
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    loop {
        // SAFETY: every pointer refers to a live local, and `buf.len()` is the
        // real size of `buf`.
        let rc = unsafe {
            libc::getpwnam_r(
                name.as_ptr(),
                &raw mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &raw mut result,
            )
        };
        if rc == libc::ERANGE && buf.len() < MAX_BUFFER {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() || pwd.pw_dir.is_null() {
            return None;
        }
        break;
    }

    // SAFETY: getpwnam_r succeeded, so `pw_dir` points to a NUL-terminated
    // string inside `buf`, which is still alive.
    let dir = unsafe { CStr::from_ptr(pwd.pw_dir) };
    Some(dir.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn passwd_home_dir(_username: &str) -> Option<String> {
    None
}

#[cfg(test)]
mod tests;
