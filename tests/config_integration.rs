//! Integration tests for the TOML rule file layer: loading, validation,
//! and compilation into executable rules.

use std::fs;
use tagmend::config::{compile, load_from_path, load_from_str, ConfigError};
use tagmend::pipeline::{run, Document};
use tempfile::TempDir;

const FULL_RULE_FILE: &str = r#"
[meta]
name = "tsx-cleanup"
description = "Remove scaffolding left by the page generator"

[[rules]]
id = "bump-accent"

[rules.matcher]
type = "pattern"
pattern = 'accent-(?P<scale>[a-z]+)-300'

[rules.action]
type = "replace"
text = "accent-$scale-400"

[[rules]]
id = "drop-placeholder"

[rules.matcher]
type = "shape"

[[rules.matcher.steps]]
kind = "self-close"
tag = "Placeholder"

[rules.action]
type = "delete"

[[rules]]
id = "unwrap-legacy"

[rules.matcher]
type = "shape"

[[rules.matcher.steps]]
kind = "open"
tag = "div"
attr = "className"
contains = "legacy-shell"

[rules.action]
type = "unwrap"
"#;

#[test]
fn load_full_rule_file() {
    let config = load_from_str(FULL_RULE_FILE).unwrap();
    assert_eq!(config.meta.name, "tsx-cleanup");
    assert_eq!(config.rules.len(), 3);
    assert_eq!(config.rules[0].id, "bump-accent");
}

#[test]
fn load_compile_and_apply() {
    let config = load_from_str(FULL_RULE_FILE).unwrap();
    let rules = compile(&config).unwrap();
    assert_eq!(rules.len(), 3);

    let doc = Document::new(
        "home.tsx",
        concat!(
            r#"<div className="legacy-shell">"#,
            r#"<p className="accent-teal-300">hi</p>"#,
            r#"<Placeholder />"#,
            "</div>",
        ),
    );
    let (text, report) = run(&doc, &rules);

    assert_eq!(text, r#"<p className="accent-teal-400">hi</p>"#);
    assert_eq!(report.applied_count(), 3);
    assert!(report.is_balanced());
}

#[test]
fn empty_rule_list_is_rejected() {
    let err = load_from_str("[meta]\nname = \"empty\"\n").unwrap_err();
    let ConfigError::Validation { source, .. } = err else {
        panic!("expected validation error, got {err}");
    };
    assert!(source.to_string().contains("no rules"));
}

#[test]
fn unwrap_with_text_matcher_is_rejected() {
    let toml = r#"
[[rules]]
id = "bad-unwrap"

[rules.matcher]
type = "text"
search = "<div>"

[rules.action]
type = "unwrap"
"#;
    let err = load_from_str(toml).unwrap_err();
    assert!(err.to_string().contains("bad-unwrap"));
    assert!(err.to_string().contains("open tag"));
}

#[test]
fn step_with_capture_requires_attr() {
    let toml = r#"
[[rules]]
id = "capture-no-attr"

[rules.matcher]
type = "shape"

[[rules.matcher.steps]]
kind = "open"
tag = "div"
capture = "cls"

[rules.action]
type = "delete"
"#;
    let err = load_from_str(toml).unwrap_err();
    assert!(err.to_string().contains("capture requires attr"));
}

#[test]
fn malformed_regex_fails_at_compile_not_match_time() {
    let toml = r#"
[[rules]]
id = "broken-regex"

[rules.matcher]
type = "pattern"
pattern = "(?P<open"

[rules.action]
type = "replace"
text = "x"
"#;
    let config = load_from_str(toml).unwrap();
    let err = compile(&config).unwrap_err();
    assert!(err.to_string().contains("broken-regex") || err.to_string().contains("(?P<open"));
}

#[test]
fn syntax_error_reports_the_file_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.toml");
    fs::write(&path, "[[rules]\nid = broken").unwrap();

    let err = load_from_path(&path).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("rules.toml"), "message was: {message}");
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_from_path("/nonexistent/rules.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn load_from_path_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cleanup.toml");
    fs::write(&path, FULL_RULE_FILE).unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.rules.len(), 3);
    assert!(compile(&config).is_ok());
}
