//! Runs the `inox` binary on modules written to a temporary directory.

use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn inox(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_inox"))
        .args(args)
        .arg("--no-color")
        .output()
        .expect("failed to run inox")
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

#[test]
fn test_check_valid_module() {
    let dir = project(&[
        ("main.ix", "manifest {}\nimport ./dep.ix\nf()"),
        ("dep.ix", "includable-file\nfn f() {}"),
    ]);
    let main = dir.path().join("main.ix");

    let output = inox(&["check", main.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains(": ok"));
}

#[test]
fn test_check_reports_static_errors() {
    let dir = project(&[("main.ix", "manifest {}\n$r = 1..0")]);
    let main = dir.path().join("main.ix");

    let output = inox(&["check", main.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("lower bound"), "{}", stderr);
    assert!(stderr.contains("1 error(s)"), "{}", stderr);
}

#[test]
fn test_resolve_prints_the_inclusion_tree() {
    let dir = project(&[
        ("main.ix", "manifest {}\nimport ./a.ix\nimport lib ./lib.ix {}"),
        ("a.ix", "includable-file"),
        ("lib.ix", "manifest {}"),
    ]);
    let main = dir.path().join("main.ix");

    let output = inox(&["resolve", main.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("include"), "{}", stdout);
    assert!(stdout.contains("a.ix"), "{}", stdout);
    assert!(stdout.contains("lib.ix"), "{}", stdout);
}

#[test]
fn test_resolve_missing_inclusion_fails() {
    let dir = project(&[("main.ix", "manifest {}\nimport ./missing.ix")]);
    let main = dir.path().join("main.ix");

    let output = inox(&["resolve", main.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn test_verbose_logs_resolution_and_check() {
    let dir = project(&[("main.ix", "manifest {}")]);
    let main = dir.path().join("main.ix");

    let output = inox(&["check", "--verbose", main.to_str().unwrap()]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("module resolved"), "{}", stderr);
    assert!(stderr.contains("static check finished"), "{}", stderr);
}
