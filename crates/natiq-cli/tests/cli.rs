//! End-to-end CLI behavior: exit codes and stdout/stderr shape.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn natiq() -> Command {
    Command::cargo_bin("natiq").unwrap()
}

#[test]
fn run_prints_script_output_and_exits_zero() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "اطبع_سطر(2 + 2)").unwrap();

    natiq()
        .arg("run")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("4"));
}

#[test]
fn run_on_missing_file_exits_with_io_error_code() {
    natiq().arg("run").arg("/no/such/file.ntq").assert().code(2);
}

#[test]
fn run_on_script_error_exits_with_code_one() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "اطبع_سطر(10 / 0)").unwrap();

    natiq()
        .arg("run")
        .arg(file.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("division by zero"));
}
