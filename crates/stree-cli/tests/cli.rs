//! Command-line behavior

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn stree() -> Command {
    let mut cmd = Command::cargo_bin("stree").unwrap();
    cmd.env_remove("RUST_LOG").arg("--no-color");
    cmd
}

#[test]
fn formats_a_snippet() {
    stree()
        .args(["format", "-e", "x=1"])
        .assert()
        .success()
        .stdout("x = 1\n");
}

#[test]
fn formats_standard_input() {
    stree()
        .arg("format")
        .write_stdin("foo(1,2)\n")
        .assert()
        .success()
        .stdout("foo(1, 2)\n");
}

#[test]
fn quote_override_applies() {
    stree()
        .args(["--quote", "single", "format", "-e", "\"hi\""])
        .assert()
        .success()
        .stdout("'hi'\n");
}

#[test]
fn parse_errors_fail_with_a_report() {
    stree()
        .args(["format", "-e", "def foo("])
        .assert()
        .failure()
        .stderr(predicate::str::contains("-e"));
}

#[test]
fn check_lists_unformatted_files() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("good.rb"), "x = 1\n").unwrap();
    fs::write(temp_dir.path().join("bad.rb"), "x=1\n").unwrap();

    stree()
        .arg("check")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("bad.rb"))
        .stdout(predicate::str::contains("good.rb").not());
}

#[test]
fn check_shows_diffs() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("bad.rb");
    fs::write(&file, "x=1\n").unwrap();

    stree()
        .args(["check", "--diff"])
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("-x=1"))
        .stdout(predicate::str::contains("+x = 1"));
}

#[test]
fn write_formats_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("app.rb");
    fs::write(&file, "if a then b end\n").unwrap();

    stree().arg("write").arg(temp_dir.path()).assert().success();
    assert_eq!(fs::read_to_string(&file).unwrap(), "if a\n  b\nend\n");

    stree().arg("check").arg(temp_dir.path()).assert().success();
}

#[test]
fn configuration_files_are_discovered() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("stree.json"),
        r#"{"formatter": {"preferredQuote": "'"}}"#,
    )
    .unwrap();
    let file = temp_dir.path().join("app.rb");
    fs::write(&file, "puts \"hi\"\n").unwrap();

    stree()
        .arg("format")
        .arg(&file)
        .assert()
        .success()
        .stdout("puts 'hi'\n");
}

#[test]
fn dumps_the_tree() {
    stree()
        .args(["ast", "-e", "x = 1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("(program"));

    stree()
        .args(["json", "-e", "x = 1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"assign\""));

    stree()
        .args(["doc", "-e", "x = 1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("group"));
}

#[test]
fn prints_the_config_schema() {
    stree()
        .args(["config", "schema"])
        .assert()
        .success()
        .stdout(predicate::str::contains("printWidth"));
}

#[test]
fn config_init_writes_defaults() {
    let temp_dir = TempDir::new().unwrap();
    stree()
        .current_dir(temp_dir.path())
        .args(["config", "init"])
        .assert()
        .success();
    let written = fs::read_to_string(temp_dir.path().join(".streerc.toml")).unwrap();
    assert!(written.contains("printWidth = 80"));

    stree()
        .current_dir(temp_dir.path())
        .args(["config", "init"])
        .assert()
        .failure();
}

#[test]
fn generates_completions() {
    stree()
        .args(["--generate-completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stree"));
}
