// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for stacked stores.
//!
//! Tests a shell-like stack: local variables, exported variables and the
//! program environment, driven through the public API only.

use envstack::env::{
    EnvReader, EnvStore, EnvWriter, LocalEnv, LocalEnvOption, OverlayEnv, ProgramEnv, SharedEnv,
    shared,
};
use envstack::error::EnvError;
use envstack::params::PositionalParams;

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[test]
fn local_env_does_not_touch_program_env() {
    let before = ProgramEnv::new().lookup("DEBIAN_FRONTEND");

    let mut env = LocalEnv::new();
    env.set("DEBIAN_FRONTEND", "noninteractive").unwrap();

    assert_eq!(env.environ(), ["DEBIAN_FRONTEND=noninteractive"]);
    assert_eq!(ProgramEnv::new().lookup("DEBIAN_FRONTEND"), before);
}

#[test]
fn overlay_environ_merges_exporters_sorted() {
    let local_a = shared(LocalEnv::with_options([LocalEnvOption::Exporter]));
    let local_b = shared(LocalEnv::with_options([LocalEnvOption::Exporter]));
    let overlay = OverlayEnv::builder()
        .with_layer(local_a.clone())
        .with_layer(local_b.clone())
        .build();

    local_b.borrow_mut().set("PARAM2.1", "trout").unwrap();
    local_a.borrow_mut().set("PARAM1.2", "world").unwrap();
    local_a.borrow_mut().set("PARAM1.1", "hello").unwrap();

    insta::assert_debug_snapshot!(overlay.environ(), @r#"
    [
        "PARAM1.1=hello",
        "PARAM1.2=world",
        "PARAM2.1=trout",
    ]
    "#);
}

#[test]
fn overlay_unset_reaches_every_layer() {
    let a = shared(LocalEnv::new());
    let b = shared(LocalEnv::new());
    a.borrow_mut().set("K", "a").unwrap();
    b.borrow_mut().set("K", "b").unwrap();
    let mut overlay = OverlayEnv::builder()
        .with_layer(a.clone())
        .with_layer(b.clone())
        .build();

    overlay.unset("K");

    assert_eq!(a.borrow().lookup("K"), None);
    assert_eq!(b.borrow().lookup("K"), None);
}

// =============================================================================
// Shell-like stack
// =============================================================================

struct Shell {
    locals: std::rc::Rc<std::cell::RefCell<LocalEnv>>,
    exports: std::rc::Rc<std::cell::RefCell<LocalEnv>>,
    env: OverlayEnv,
}

impl Shell {
    fn new() -> Self {
        let locals = shared(LocalEnv::new());
        let exports = shared(LocalEnv::with_options([LocalEnvOption::Exporter]));
        let program: SharedEnv = shared(ProgramEnv::new());
        let env = OverlayEnv::builder()
            .with_layer(locals.clone())
            .with_layer(exports.clone())
            .with_shared(program)
            .build();
        Self {
            locals,
            exports,
            env,
        }
    }
}

#[test]
fn shell_assignments_stay_local() {
    let mut shell = Shell::new();

    shell.env.set("ENVSTACK_IT_LOCAL", "1").unwrap();

    assert_eq!(shell.locals.borrow().get("ENVSTACK_IT_LOCAL"), "1");
    assert!(
        !shell
            .env
            .environ()
            .contains(&"ENVSTACK_IT_LOCAL=1".to_string())
    );
    assert!(std::env::var("ENVSTACK_IT_LOCAL").is_err());
}

#[test]
fn shell_export_stops_before_program_env() {
    let mut shell = Shell::new();
    shell.env.set("ENVSTACK_IT_EXPORT", "local").unwrap();

    shell.env.export("ENVSTACK_IT_EXPORT", "exported").unwrap();

    assert_eq!(shell.locals.borrow().get("ENVSTACK_IT_EXPORT"), "exported");
    assert_eq!(shell.exports.borrow().get("ENVSTACK_IT_EXPORT"), "exported");
    assert!(
        std::env::var("ENVSTACK_IT_EXPORT").is_err(),
        "layers past the first exporter are untouched"
    );
    assert!(
        shell
            .env
            .environ()
            .contains(&"ENVSTACK_IT_EXPORT=exported".to_string())
    );
}

#[test]
fn shell_reads_fall_through_to_program_env() {
    let key = "ENVSTACK_IT_FROM_PROGRAM";
    let mut program = ProgramEnv::new();
    program.set(key, "host value").unwrap();

    let mut shell = Shell::new();
    let seen = shell.env.get(key);
    let listed = shell.env.match_prefix("ENVSTACK_IT_FROM_");
    let expanded = shell.env.expand("[${ENVSTACK_IT_FROM_PROGRAM}]");

    program.unset(key);

    assert_eq!(seen, "host value");
    assert_eq!(listed, [key]);
    assert_eq!(expanded, "[host value]");
}

#[test]
fn shell_updates_program_env_only_for_keys_it_holds() {
    let key = "ENVSTACK_IT_PROGRAM_UPDATE";
    let mut program = ProgramEnv::new();
    program.set(key, "old").unwrap();

    let mut shell = Shell::new();
    let result = shell.env.set(key, "new");
    let after = std::env::var(key);
    let local = shell.locals.borrow().lookup(key);

    program.unset(key);

    assert_eq!(result, Ok(()));
    assert_eq!(after.as_deref(), Ok("new"));
    assert_eq!(local, None);
}

#[test]
fn shell_invalid_program_key_surfaces_verbatim() {
    let mut overlay = OverlayEnv::builder().with_owned(ProgramEnv::new()).build();

    assert_eq!(
        overlay.export("ENVSTACK=IT", "x"),
        Err(EnvError::InvalidKey {
            key: "ENVSTACK=IT".to_string(),
            reason: "contains '='",
        })
    );
}

#[test]
fn shell_script_session() {
    let mut shell = Shell::new();

    shell
        .env
        .replace_positional_params(&["build", "--release"])
        .unwrap();
    shell.env.set("ENVSTACK_IT_TARGET", "${1}").unwrap();
    let target = shell.env.expand("${ENVSTACK_IT_MODE:=debug}-$1-$#");

    assert_eq!(target, "debug-build-2");
    assert_eq!(shell.locals.borrow().get("ENVSTACK_IT_MODE"), "debug");
    assert_eq!(
        shell.env.get("ENVSTACK_IT_TARGET"),
        "${1}",
        "values are stored verbatim"
    );

    shell.env.shift_positional_params(1).unwrap();
    assert_eq!(shell.env.positional_params(), ["--release"]);
    assert_eq!(shell.env.expand("$1 ${2:-none}"), "--release none");
}

#[test]
fn overlay_get_env_by_id_allows_direct_edits() {
    let overlay = OverlayEnv::builder()
        .with_owned(LocalEnv::new())
        .with_owned(LocalEnv::with_options([LocalEnvOption::Exporter]))
        .build();

    let exports = overlay.get_env_by_id(1).unwrap();
    exports.borrow_mut().set("ENVSTACK_IT_BY_ID", "1").unwrap();

    assert_eq!(overlay.environ(), ["ENVSTACK_IT_BY_ID=1"]);
    assert!(overlay.get_env_by_id(2).is_none());
    assert!(
        overlay
            .get_top_most_env()
            .unwrap()
            .borrow()
            .environ()
            .is_empty()
    );
}
