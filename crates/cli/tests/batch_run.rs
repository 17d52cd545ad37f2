use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn doctest() -> Command {
    Command::cargo_bin("doctest").expect("doctest binary")
}

#[test]
fn fresh_directive_is_annotated_and_succeeds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("math.rs");
    fs::write(&path, "// >>> 2 + 3\nfn main() {}\n").unwrap();

    doctest()
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(">>> 2 + 3"))
        .stdout(predicate::str::contains("DOCTESTS SUCCEEDED WITH NO FAILURES"));

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "// >>> 2 + 3\n// 5\nfn main() {}\n"
    );
}

#[test]
fn regression_fails_with_was_now_output() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("math.rs");
    fs::write(&path, "// >>> 2 + 3\n// 6\nfn main() {}\n").unwrap();

    doctest()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("WAS 6"))
        .stdout(predicate::str::contains("NOW 5"))
        .stdout(predicate::str::contains("DOCTESTS FAILED"));

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "// >>> 2 + 3\n// WAS 6\n// NOW 5\nfn main() {}\n"
    );
}

#[test]
fn second_run_rewrites_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("math.rs");
    fs::write(&path, "// >>> 2 + 3\nfn main() {}\n").unwrap();

    doctest().arg("run").arg(&path).assert().success();
    let first = fs::read_to_string(&path).unwrap();

    doctest().arg("run").arg(&path).assert().success();
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn directories_are_walked() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.rs"), "// >>> 1 + 1\nfn a() {}\n").unwrap();
    fs::write(dir.path().join("b.py"), "# >>> 2 * 2\ndef b():\n    pass\n").unwrap();

    doctest().arg("run").arg(dir.path()).assert().success();

    assert!(fs::read_to_string(dir.path().join("a.rs"))
        .unwrap()
        .contains("// 2\n"));
    assert!(fs::read_to_string(dir.path().join("b.py"))
        .unwrap()
        .contains("# 4\n"));
}

#[test]
fn evaluation_errors_exit_nonzero() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.rs");
    fs::write(&path, "// >>> undefined_symbol\nfn main() {}\n").unwrap();

    doctest()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("undefined_symbol"))
        .stdout(predicate::str::contains("DOCTESTS FAILED"));

    // The file is left untouched.
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "// >>> undefined_symbol\nfn main() {}\n"
    );
}

#[test]
fn json_report_is_machine_readable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("math.rs");
    fs::write(&path, "// >>> 2 + 3\nfn main() {}\n").unwrap();

    let output = doctest()
        .arg("run")
        .arg("--json")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["outcomes"][0]["current"], "5");
    assert_eq!(report["outcomes"][0]["status"], "fresh");
    assert_eq!(report["files_rewritten"], 1);
}

#[test]
fn no_supported_files_is_an_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

    doctest()
        .arg("run")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no supported source files"));
}
