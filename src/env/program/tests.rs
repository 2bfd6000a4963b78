// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the program environment passthrough.
//!
//! Every test uses its own `ENVSTACK_PROGRAM_*` keys because the program
//! environment is shared by all test threads.

use super::{ProgramEnv, lookup_home_dir};
use crate::env::{EnvReader, EnvWriter};
use crate::error::EnvError;

#[test]
fn test_program_env_is_an_exporter() {
    assert!(ProgramEnv::new().is_exporter());
}

#[test]
fn test_program_env_set_updates_the_process() {
    let key = "ENVSTACK_PROGRAM_SET";
    let mut env = ProgramEnv::new();

    env.set(key, "from envstack").unwrap();

    assert_eq!(std::env::var(key).as_deref(), Ok("from envstack"));
    assert_eq!(env.get(key), "from envstack");
    assert_eq!(env.lookup(key).as_deref(), Some("from envstack"));
    assert!(env.environ().contains(&format!("{key}=from envstack")));

    env.unset(key);
    assert!(std::env::var(key).is_err());
    assert_eq!(env.lookup(key), None);
    assert_eq!(env.get(key), "");
}

#[test]
fn test_program_env_lookup_missing_variable() {
    let env = ProgramEnv::new();
    assert_eq!(env.lookup("ENVSTACK_PROGRAM_NEVER_SET"), None);
    assert_eq!(env.lookup(""), None);
    assert_eq!(env.lookup("ENVSTACK=BROKEN"), None);
}

#[test]
fn test_program_env_rejects_keys_the_host_cannot_hold() {
    let mut env = ProgramEnv::new();

    insta::assert_debug_snapshot!(
        vec![
            env.set("", "x"),
            env.set("  ", "x"),
            env.set("ENVSTACK_PROGRAM=BAD", "x"),
            env.set("ENVSTACK_PROGRAM\0BAD", "x"),
            env.set("ENVSTACK_PROGRAM_NUL_VALUE", "a\0b"),
        ],
        @r#"
    [
        Err(
            EmptyKey,
        ),
        Err(
            EmptyKey,
        ),
        Err(
            InvalidKey {
                key: "ENVSTACK_PROGRAM=BAD",
                reason: "contains '='",
            },
        ),
        Err(
            InvalidKey {
                key: "ENVSTACK_PROGRAM\0BAD",
                reason: "contains NUL",
            },
        ),
        Err(
            InvalidValue {
                key: "ENVSTACK_PROGRAM_NUL_VALUE",
            },
        ),
    ]
    "#
    );
    assert!(std::env::var("ENVSTACK_PROGRAM_NUL_VALUE").is_err());
}

#[test]
fn test_program_env_match_prefix() {
    let mut env = ProgramEnv::new();
    env.set("ENVSTACK_PROGRAM_MATCH_ONE", "1").unwrap();
    env.set("ENVSTACK_PROGRAM_MATCH_TWO", "2").unwrap();

    let mut keys = env.match_prefix("ENVSTACK_PROGRAM_MATCH_");
    keys.sort();

    env.unset("ENVSTACK_PROGRAM_MATCH_ONE");
    env.unset("ENVSTACK_PROGRAM_MATCH_TWO");

    assert_eq!(
        keys,
        ["ENVSTACK_PROGRAM_MATCH_ONE", "ENVSTACK_PROGRAM_MATCH_TWO"]
    );
}

#[test]
fn test_program_env_restore_environment() {
    let mut env = ProgramEnv::new();

    env.restore_environment(&[
        "ENVSTACK_PROGRAM_RESTORE_A=alpha",
        "ENVSTACK_PROGRAM_RESTORE_B=beta=gamma",
        "ENVSTACK_PROGRAM_RESTORE_C=",
    ])
    .unwrap();

    let restored = [
        env.lookup("ENVSTACK_PROGRAM_RESTORE_A"),
        env.lookup("ENVSTACK_PROGRAM_RESTORE_B"),
        env.lookup("ENVSTACK_PROGRAM_RESTORE_C"),
    ];
    for key in ["A", "B", "C"] {
        env.unset(&format!("ENVSTACK_PROGRAM_RESTORE_{key}"));
    }

    assert_eq!(
        restored,
        [
            Some("alpha".to_string()),
            Some("beta=gamma".to_string()),
            Some(String::new()),
        ]
    );
}

#[test]
fn test_program_env_restore_reports_first_error() {
    let mut env = ProgramEnv::new();

    let result = env.restore_environment(&[
        " =blank",
        "ENVSTACK_PROGRAM_RESTORE_AFTER_ERROR=still set",
    ]);
    let survived = env.lookup("ENVSTACK_PROGRAM_RESTORE_AFTER_ERROR");
    env.unset("ENVSTACK_PROGRAM_RESTORE_AFTER_ERROR");

    assert_eq!(result, Err(EnvError::EmptyKey));
    assert_eq!(survived.as_deref(), Some("still set"));
}

#[test]
fn test_lookup_home_dir_current_user() {
    let home = lookup_home_dir("");
    assert_eq!(
        home,
        dirs::home_dir().map(|p| p.to_string_lossy().into_owned())
    );
}

#[test]
#[cfg(unix)]
fn test_lookup_home_dir_root_user() {
    let home = lookup_home_dir("root").expect("root should have a home directory");
    assert!(home.starts_with('/'), "{home}");
}

#[test]
fn test_lookup_home_dir_unknown_user() {
    assert_eq!(lookup_home_dir("envstack-no-such-user-8e1f"), None);
    assert_eq!(lookup_home_dir("bad\0name"), None);
}
