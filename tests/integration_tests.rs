use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

fn sml() -> Command {
    let mut cmd = Command::cargo_bin("sml").unwrap();
    cmd.env_remove("SML_STRICT").env_remove("SML_MAX_STEPS");
    cmd
}

#[test]
fn runs_without_arguments() {
    sml().assert().success().stdout(contains("Welcome to sml"));
}

#[test]
fn runs_countdown() {
    sml()
        .arg("run")
        .arg("tests/files/countdown.sml")
        .arg("--minimal")
        .assert()
        .success()
        .stdout(contains("3\n2\n1\n"))
        .stdout(contains("------ Registers ------"))
        .stdout(contains("r1: "));
}

#[test]
fn runs_path_shorthand() {
    sml()
        .arg("tests/files/factorial.sml")
        .assert()
        .success()
        .stdout(contains("720\n"))
        .stdout(contains("Completed"));
}

#[test]
fn minimal_hides_status() {
    sml()
        .arg("run")
        .arg("tests/files/factorial.sml")
        .arg("--minimal")
        .assert()
        .success()
        .stdout(contains("Translating").not())
        .stdout(contains("Completed").not());
}

#[test]
fn missing_file() {
    sml()
        .arg("run")
        .arg("tests/files/does_not_exist.sml")
        .assert()
        .failure()
        .stderr(contains("File not found"));
}

#[test]
fn duplicate_label_fails() {
    sml()
        .arg("run")
        .arg("tests/files/duplicate.sml")
        .arg("--minimal")
        .assert()
        .failure()
        .stdout(contains("Registers").not())
        .stderr(contains("Duplicate label"));
}

#[test]
fn bad_lines_are_skipped() {
    sml()
        .arg("run")
        .arg("tests/files/bad_lines.sml")
        .arg("--minimal")
        .assert()
        .success()
        .stdout(contains("5\n"))
        .stderr(contains("Unknown instruction"))
        .stderr(contains("Expected register"));
}

#[test]
fn skipped_lines_are_announced() {
    sml()
        .arg("run")
        .arg("tests/files/bad_lines.sml")
        .assert()
        .success()
        .stdout(contains("Skipped"))
        .stdout(contains("Completed"));
}

#[test]
fn strict_aborts_on_bad_line() {
    sml()
        .arg("run")
        .arg("tests/files/bad_lines.sml")
        .arg("--strict")
        .assert()
        .failure()
        .stderr(contains("Unknown instruction"))
        .stderr(contains("Expected register").not());

    sml()
        .env("SML_STRICT", "1")
        .arg("run")
        .arg("tests/files/bad_lines.sml")
        .assert()
        .failure();
}

#[test]
fn check_reports_errors() {
    sml()
        .arg("check")
        .arg("tests/files/bad_lines.sml")
        .assert()
        .failure();

    sml()
        .arg("check")
        .arg("tests/files/countdown.sml")
        .assert()
        .success()
        .stdout(contains("no errors found!"));
}

#[test]
fn division_by_zero_fails_with_registers() {
    sml()
        .arg("run")
        .arg("tests/files/divzero.sml")
        .arg("--minimal")
        .assert()
        .failure()
        .stdout(contains(".10\n"))
        .stderr(contains("division by zero"));
}

#[test]
fn unknown_label_fails_at_runtime() {
    sml()
        .arg("run")
        .arg("tests/files/unknown_label.sml")
        .arg("--minimal")
        .assert()
        .failure()
        .stdout(contains("------ Registers ------"))
        .stderr(contains("is never declared"))
        .stderr(contains("unknown label"));
}

#[test]
fn check_warns_about_unknown_label() {
    sml()
        .arg("check")
        .arg("tests/files/unknown_label.sml")
        .assert()
        .success()
        .stderr(contains("is never declared"));
}

#[test]
fn step_limit_stops_infinite_loop() {
    sml()
        .arg("run")
        .arg("tests/files/spin.sml")
        .arg("--max-steps")
        .arg("1000")
        .assert()
        .failure()
        .stderr(contains("did not halt"));

    sml()
        .env("SML_MAX_STEPS", "50")
        .arg("tests/files/spin.sml")
        .assert()
        .failure();
}

#[test]
fn lists_labels() {
    sml()
        .arg("labels")
        .arg("tests/files/factorial.sml")
        .assert()
        .success()
        .stdout(contains("start -> 0"))
        .stdout(contains("loop -> 3"))
        .stdout(contains("   5  jnz r1 loop"));
}
