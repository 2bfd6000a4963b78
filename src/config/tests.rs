// envstack: Layered Environment Variable Stores
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{ConfigLoader, EnvConfig, LayerConfig, LayerKind, LoggingConfig};
use crate::config::loader::SourceKind;
use crate::env::{EnvReader, EnvWriter};
use crate::error::{ConfigError, EnvError};
use crate::logging::LogLevel;
use std::path::PathBuf;

const STACK: &str = r#"
[logging]
console_level = 1
log_file = "logs/envstack.log"

[[layers]]
name = "locals"
vars = ["PS1=$ ", "OPTS=a=b"]

[[layers]]
name = "exports"
exporter = true
vars = ["DEBIAN_FRONTEND=noninteractive", "EDITOR=vi"]

[[layers]]
name = "program"
kind = "program"
"#;

#[test]
fn test_default_config() {
    let config = EnvConfig::default();

    assert!(config.layers.is_empty());
    assert_eq!(config.logging, LoggingConfig::default());
    insta::assert_debug_snapshot!(config.format_options(), @r#"
    [
        "logging.console_level = 2",
        "logging.file_level    = 4",
        "logging.json          = false",
    ]
    "#);
}

#[test]
fn test_layer_kind_display_and_parse() {
    assert_eq!(LayerKind::Local.to_string(), "local");
    assert_eq!(LayerKind::Program.to_string(), "program");
    assert_eq!("Program".parse::<LayerKind>().unwrap(), LayerKind::Program);
    insta::assert_snapshot!(
        "shared".parse::<LayerKind>().unwrap_err().to_string(),
        @"invalid value for 'kind' in section '[layers]': expected 'local' or 'program', got 'shared'"
    );
}

#[test]
fn test_config_parse() {
    let config = EnvConfig::parse(STACK).unwrap();

    assert_eq!(config.logging.console_level, LogLevel::ERROR);
    assert_eq!(config.logging.file_level, LogLevel::DEBUG);
    assert_eq!(
        config.logging.log_file,
        Some(PathBuf::from("logs/envstack.log"))
    );
    assert_eq!(
        config.layer("exports"),
        Some(&LayerConfig {
            name: "exports".to_string(),
            kind: LayerKind::Local,
            exporter: true,
            copy_program_env: false,
            vars: vec![
                "DEBIAN_FRONTEND=noninteractive".to_string(),
                "EDITOR=vi".to_string(),
            ],
        })
    );
    assert_eq!(config.layer("missing"), None);
}

#[test]
fn test_format_options() {
    let config = EnvConfig::parse(STACK).unwrap();

    insta::assert_debug_snapshot!(config.format_options(), @r#"
    [
        "layers.0.copy_program_env = false",
        "layers.0.exporter         = false",
        "layers.0.kind             = local",
        "layers.0.name             = locals",
        "layers.0.vars             = 2",
        "layers.1.copy_program_env = false",
        "layers.1.exporter         = true",
        "layers.1.kind             = local",
        "layers.1.name             = exports",
        "layers.1.vars             = 2",
        "layers.2.kind             = program",
        "layers.2.name             = program",
        "logging.console_level     = 1",
        "logging.file_level        = 4",
        "logging.json              = false",
        "logging.log_file          = logs/envstack.log",
    ]
    "#);
}

#[test]
fn test_unknown_fields_are_rejected() {
    let err = EnvConfig::parse("[[layers]]\nname = \"a\"\nexport = true\n").unwrap_err();
    assert!(err.to_string().contains("export"), "{err}");

    assert!(EnvConfig::parse("[shell]\nname = \"sh\"\n").is_err());
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let err = EnvConfig::parse("[logging]\nconsole_level = 9\n").unwrap_err();
    assert!(err.to_string().contains("log level must be 0-6"), "{err}");
}

#[test]
fn test_duplicate_layer_names() {
    let err = EnvConfig::parse(
        r#"
[[layers]]
name = "locals"

[[layers]]
name = "locals"
exporter = true
"#,
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::DuplicateLayer { name }) if name == "locals"
    ));
}

#[test]
fn test_empty_layer_name() {
    let err = EnvConfig::parse("[[layers]]\nexporter = true\n").unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'name' in section '[layers.0]': layer name must not be empty"
    );
}

#[test]
fn test_program_layer_rejects_local_options() {
    let err = EnvConfig::parse(
        r#"
[[layers]]
name = "locals"

[[layers]]
name = "host"
kind = "program"
vars = ["A=1"]
"#,
    )
    .unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'vars' in section '[layers.1]': only local layers accept 'vars'; 'host' is a program layer"
    );
}

#[test]
fn test_build_overlay() {
    let config = EnvConfig::parse(STACK).unwrap();
    let mut built = config.build_overlay().unwrap();

    assert_eq!(built.names().collect::<Vec<_>>(), ["locals", "exports", "program"]);
    assert_eq!(built.overlay().len(), 3);
    assert_eq!(built.overlay().get("PS1"), "$ ");
    assert_eq!(built.overlay().get("OPTS"), "a=b");

    built.overlay_mut().set("ENVSTACK_CONFIG_SCRATCH", "1").unwrap();
    let locals = built.layer("locals").unwrap();
    assert_eq!(locals.borrow().get("ENVSTACK_CONFIG_SCRATCH"), "1");

    let exports = built.layer("exports").unwrap();
    assert!(exports.borrow().is_exporter());
    assert_eq!(
        exports.borrow().environ(),
        ["DEBIAN_FRONTEND=noninteractive", "EDITOR=vi"]
    );

    insta::assert_snapshot!(format!("{built:?}"), @r#"BuiltOverlay { layers: ["locals", "exports", "program"] }"#);
}

#[test]
fn test_built_overlay_unknown_layer() {
    let built = EnvConfig::parse(STACK).unwrap().build_overlay().unwrap();
    let err = built.layer("nope").err().unwrap();
    insta::assert_snapshot!(err.to_string(), @"unknown layer 'nope'");
}

#[test]
fn test_build_overlay_reports_bad_vars() {
    let config = EnvConfig {
        layers: vec![LayerConfig {
            name: "locals".to_string(),
            vars: vec!["  =blank key".to_string()],
            ..LayerConfig::default()
        }],
        ..EnvConfig::default()
    };

    let err = config.build_overlay().unwrap_err();

    assert_eq!(err.to_string(), "failed to build layer 'locals'");
    assert_eq!(err.downcast_ref::<EnvError>(), Some(&EnvError::EmptyKey));
}

#[test]
fn test_build_overlay_without_layers() {
    let built = EnvConfig::default().build_overlay().unwrap();
    assert!(built.overlay().is_empty());
    assert_eq!(built.names().count(), 0);
}

#[test]
fn test_logging_to_log_config() {
    let logging = LoggingConfig {
        console_level: LogLevel::SILENT,
        file_level: LogLevel::TRACE,
        log_file: Some(PathBuf::from("envstack.jsonl")),
        json: true,
    };

    let log_config = logging.to_log_config();

    assert_eq!(log_config.console_level(), LogLevel::SILENT);
    assert_eq!(log_config.file_level(), LogLevel::TRACE);
    assert_eq!(log_config.log_file(), Some("envstack.jsonl"));
    assert!(log_config.json_file());
    assert_eq!(LoggingConfig::default().to_log_config().log_file(), None);
}

#[test]
fn test_loader_overrides() {
    let config = ConfigLoader::new()
        .add_toml_str(STACK)
        .set("logging.console_level", 5)
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.logging.console_level, LogLevel::TRACE);
}

#[test]
fn test_loader_later_sources_win() {
    let config = ConfigLoader::new()
        .add_toml_str(STACK)
        .add_toml_str("[logging]\nfile_level = 6\n")
        .build()
        .unwrap();

    assert_eq!(config.logging.console_level, LogLevel::ERROR);
    assert_eq!(config.logging.file_level, LogLevel::DUMP);
    assert_eq!(config.layers.len(), 3);
}

#[test]
fn test_loader_env_overrides() {
    // SAFETY: the prefix is unique to this test
    unsafe {
        std::env::set_var("ENVSTACKCFGTEST_LOGGING__CONSOLE_LEVEL", "4");
        std::env::set_var("ENVSTACKCFGTEST_LOGGING__JSON", "true");
    }

    let result = ConfigLoader::new()
        .add_toml_str(STACK)
        .with_env_prefix("ENVSTACKCFGTEST")
        .build();

    // SAFETY: see above
    unsafe {
        std::env::remove_var("ENVSTACKCFGTEST_LOGGING__CONSOLE_LEVEL");
        std::env::remove_var("ENVSTACKCFGTEST_LOGGING__JSON");
    }

    let config = result.unwrap();
    assert_eq!(config.logging.console_level, LogLevel::DEBUG);
    assert!(config.logging.json);
}

#[test]
fn test_loader_missing_required_file() {
    let result = ConfigLoader::new()
        .add_toml_file("/nonexistent/envstack.toml")
        .build();
    assert!(result.is_err());
}

#[test]
fn test_loader_tracks_sources() {
    let loader = ConfigLoader::new()
        .add_toml_file("/etc/envstack.toml")
        .add_toml_file_optional("/nonexistent/envstack.local.toml")
        .add_toml_str("");

    assert_eq!(
        loader.loaded_files(),
        [
            (SourceKind::File, PathBuf::from("/etc/envstack.toml")),
            (SourceKind::String, PathBuf::from("<string>")),
        ]
    );
    insta::assert_debug_snapshot!(loader.format_loaded_files(), @r#"
    [
        "1. [file] /etc/envstack.toml",
        "2. [string] <string>",
    ]
    "#);
}
