// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `KEY=VALUE` pair encoding.
//!
//! ```text
//! "PATH=/usr/bin"      key "PATH"  value "/usr/bin"
//! "EMPTY="             key "EMPTY" value ""
//! "OPTS=a=b"           key "OPTS"  value "a=b"
//! "=C:=C:\\Windows"    key "=C:"   value "C:\\Windows"
//! ```
//!
//! The key ends at the first `=` after the first character, so keys that
//! start with `=` (as Windows drive-letter variables do) survive a round trip.

/// Builds the `KEY=VALUE` form of a variable.
#[must_use]
pub fn make_pair(key: &str, value: &str) -> String {
    let mut pair = String::with_capacity(key.len() + value.len() + 1);
    pair.push_str(key);
    pair.push('=');
    pair.push_str(value);
    pair
}

/// Returns the key part of a pair. A pair without a delimiter is all key.
#[must_use]
pub fn key_from_pair(pair: &str) -> &str {
    let skip = pair.chars().next().map_or(0, char::len_utf8);
    pair[skip..]
        .find('=')
        .map_or(pair, |pos| &pair[..skip + pos])
}

/// Returns the value part of a pair, or `""` when there is no delimiter.
#[must_use]
pub fn value_from_pair(pair: &str) -> &str {
    split_pair(pair).1
}

/// Splits a pair into its key and value.
#[must_use]
pub fn split_pair(pair: &str) -> (&str, &str) {
    let key = key_from_pair(pair);
    let value = pair.get(key.len() + 1..).unwrap_or("");
    (key, value)
}

/// Whether `pair` holds exactly `key`.
pub(crate) fn pair_has_key(pair: &str, key: &str) -> bool {
    !key.is_empty()
        && pair.len() > key.len()
        && pair.starts_with(key)
        && pair.as_bytes()[key.len()] == b'='
}
