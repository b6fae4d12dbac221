//! Integration tests for the phiz binary.
//!
//! These tests exercise the full CLI, with route tables written to
//! temporary directories.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const POSTS_ROUTES: &str = r#"
[[routes]]
pattern = 'posts ([0-9]{4}) :params'
name = "posts"
description = "Posts by year"
paths = { task = "posts", action = "show", year = 1 }
"#;

/// Get a command for running phiz, isolated from the user's config.
fn phiz(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("phiz").unwrap();
    cmd.env_remove("PHIZ_ROUTES")
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"));
    cmd
}

fn write_routes(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let file = dir.child("routes.toml");
    file.write_str(contents).unwrap();
    file.path().to_path_buf()
}

#[test]
fn version_flag_works() {
    let home = TempDir::new().unwrap();
    phiz(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("phiz"));
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    phiz(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("match"))
        .stdout(predicate::str::contains("routes"))
        .stdout(predicate::str::contains("run"));
}

// =============================================================================
// match
// =============================================================================

#[test]
fn match_uses_builtin_routes() {
    let home = TempDir::new().unwrap();
    phiz(&home)
        .args(["match", "echo", "hello", "world"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matched  yes (route #1"))
        .stdout(predicate::str::contains("task     echo"))
        .stdout(predicate::str::contains("action   hello"))
        .stdout(predicate::str::contains("params   [world]"));
}

#[test]
fn match_reports_options() {
    let home = TempDir::new().unwrap();
    phiz(&home)
        .args(["match", "echo", "hello", "--verbose", "--level=3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("options  [verbose=true, level=3]"));
}

#[test]
fn match_parts_skips_routes() {
    let home = TempDir::new().unwrap();
    phiz(&home)
        .args(["match", "--parts", "echo", "hello", "x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matched  n/a (parts given)"))
        .stdout(predicate::str::contains("params   [x]"));
}

#[test]
fn match_json() {
    let home = TempDir::new().unwrap();
    let output = phiz(&home)
        .args(["--json", "match", "echo", "hello", "a", "b"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["matched"], true);
    assert_eq!(json["task"], "echo");
    assert_eq!(json["action"], "hello");
    assert_eq!(json["params"], serde_json::json!(["a", "b"]));
}

#[test]
fn match_custom_route_from_config() {
    let home = TempDir::new().unwrap();
    let config = write_routes(&home, POSTS_ROUTES);

    phiz(&home)
        .arg("--config")
        .arg(&config)
        .args(["match", "posts", "2010", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matched  yes (route #2 posts)"))
        .stdout(predicate::str::contains("task     posts"))
        .stdout(predicate::str::contains("params   [hello, year=2010]"));
}

#[test]
fn match_config_from_environment() {
    let home = TempDir::new().unwrap();
    let config = write_routes(&home, POSTS_ROUTES);

    phiz(&home)
        .env("PHIZ_ROUTES", &config)
        .args(["match", "posts", "1999"])
        .assert()
        .success()
        .stdout(predicate::str::contains("task     posts"));
}

#[test]
fn match_applies_config_defaults() {
    let home = TempDir::new().unwrap();
    let config = write_routes(
        &home,
        r#"
default_routes = false

[defaults]
task = "main"
action = "help"
"#,
    );

    phiz(&home)
        .arg("--config")
        .arg(&config)
        .args(["match", "echo", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matched  no (defaults applied)"))
        .stdout(predicate::str::contains("task     main"))
        .stdout(predicate::str::contains("action   help"));
}

// =============================================================================
// routes
// =============================================================================

#[test]
fn routes_lists_table() {
    let home = TempDir::new().unwrap();
    let config = write_routes(&home, POSTS_ROUTES);

    phiz(&home)
        .arg("--config")
        .arg(&config)
        .arg("routes")
        .assert()
        .success()
        .stdout(predicate::str::contains("#0 -"))
        .stdout(predicate::str::contains("#2 posts  posts ([0-9]{4}) :params"))
        .stdout(predicate::str::contains("Posts by year"));
}

#[test]
fn routes_empty_table() {
    let home = TempDir::new().unwrap();
    let config = write_routes(&home, "default_routes = false\n");

    phiz(&home)
        .arg("--config")
        .arg(&config)
        .arg("routes")
        .assert()
        .success()
        .stdout(predicate::str::contains("No routes defined."));
}

#[test]
fn routes_json() {
    let home = TempDir::new().unwrap();
    let output = phiz(&home).args(["--json", "routes"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let routes = json.as_array().unwrap();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[1]["id"], 1);
}

// =============================================================================
// run
// =============================================================================

#[test]
fn run_echo() {
    let home = TempDir::new().unwrap();
    phiz(&home)
        .args(["run", "echo", "main", "hi", "there", "--case=upper"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HI THERE"));
}

#[test]
fn run_defaults_to_main() {
    let home = TempDir::new().unwrap();
    phiz(&home)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Available tasks:"));
}

#[test]
fn run_unknown_task_fails() {
    let home = TempDir::new().unwrap();
    phiz(&home)
        .args(["run", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NopeTask handler class cannot be loaded"));
}

#[test]
fn run_unknown_action_fails() {
    let home = TempDir::new().unwrap();
    phiz(&home)
        .args(["run", "echo", "shout"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("action 'shout' was not found"));
}

// =============================================================================
// Config errors
// =============================================================================

#[test]
fn missing_explicit_config_fails() {
    let home = TempDir::new().unwrap();
    phiz(&home)
        .args(["--config", "/nonexistent/routes.toml", "routes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load route config"));
}

#[test]
fn invalid_delimiter_fails() {
    let home = TempDir::new().unwrap();
    let config = write_routes(&home, "delimiter = \"ab\"\n");

    phiz(&home)
        .arg("--config")
        .arg(&config)
        .arg("routes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("delimiter"));
}

#[test]
fn invalid_route_pattern_fails() {
    let home = TempDir::new().unwrap();
    let config = write_routes(
        &home,
        "[[routes]]\npattern = \"show {id:[0-9]+\"\n",
    );

    phiz(&home)
        .arg("--config")
        .arg(&config)
        .arg("routes")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid route #1"));
}

// =============================================================================
// completion
// =============================================================================

#[test]
fn completion_bash() {
    let home = TempDir::new().unwrap();
    phiz(&home)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("phiz"));
}
