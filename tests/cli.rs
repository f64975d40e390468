use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn tansy_run_hello_demo() {
    let mut cmd = Command::cargo_bin("tansy").expect("binary exists");
    cmd.arg("run").arg("demos/hello.tn");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hello from Tansy!"));
}

#[test]
fn tansy_run_fib_demo() {
    let mut cmd = Command::cargo_bin("tansy").expect("binary exists");
    cmd.arg("run").arg("demos/fib.tn");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("fib(10) = 55"));
}

#[test]
fn tansy_eval_prints_result() {
    let mut cmd = Command::cargo_bin("tansy").expect("binary exists");
    cmd.arg("eval").arg("1 + 2 + 3");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("6"));
}

#[test]
fn tansy_eval_reports_parse_errors() {
    let mut cmd = Command::cargo_bin("tansy").expect("binary exists");
    cmd.arg("eval").arg("let = 3");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Parser"));
}

#[test]
fn tansy_run_reports_runtime_errors() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("broken.tn");
    fs::write(&script, "undefined_name\n").expect("write script");

    let mut cmd = Command::cargo_bin("tansy").expect("binary exists");
    cmd.arg("run").arg(&script);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("UndefinedIdentifier"));
}

#[test]
fn tansy_run_script_from_disk() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("sum.tn");
    fs::write(
        &script,
        "let total = 0\nfor n in collections.range(1, 11) {\n    total = total + n\n}\nfmt.println(\"total:\", total)\n",
    )
    .expect("write script");

    let mut cmd = Command::cargo_bin("tansy").expect("binary exists");
    cmd.arg("run").arg(&script);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("total: 55"));
}
