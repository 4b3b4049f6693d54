use std::{
    fs,
    io::Write,
    path::Path,
    process::{Command, Output, Stdio},
};

const BIN: &str = env!("CARGO_BIN_EXE_lox-lang");

fn lox() -> Command {
    let mut cmd = Command::new(BIN);
    cmd.env_remove("LOX_DIAGNOSTICS")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn run_script(dir: &Path, name: &str, source: &str) -> Output {
    let path = dir.join(name);
    fs::write(&path, source).expect("failed to write script");
    lox().arg(&path).output().expect("failed to run lox-lang")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn script_runs_and_exits_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_script(
        dir.path(),
        "ok.lox",
        "var a = 1; { var a = 2; print a; } print a;",
    );
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output), "2\n1\n");
}

#[test]
fn syntax_errors_exit_65_without_running() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_script(dir.path(), "bad.lox", "print \"ran\";\nprint (1;\nvar = 2;");
    assert_eq!(output.status.code(), Some(65));
    assert_eq!(stdout(&output), "");
    let errors = stderr(&output);
    assert!(
        errors.contains("[line 2] Error at ';': Expect ')' after expression."),
        "{errors}"
    );
    assert!(
        errors.contains("[line 3] Error at '=': Expect variable name."),
        "{errors}"
    );
}

#[test]
fn runtime_fault_exits_70_after_partial_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = run_script(dir.path(), "fault.lox", "print 1;\nprint -\"x\";\nprint 2;");
    assert_eq!(output.status.code(), Some(70));
    assert_eq!(stdout(&output), "1\n");
    assert!(
        stderr(&output).contains("Operand must be a number.\n[line 2]"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn extra_arguments_are_a_usage_error() {
    let output = lox().args(["a.lox", "b.lox"]).output().expect("run");
    assert_eq!(output.status.code(), Some(64));
    assert!(stderr(&output).contains("Usage: lox-lang"), "{}", stderr(&output));
}

#[test]
fn missing_script_exits_66() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = lox()
        .arg(dir.path().join("missing.lox"))
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn print_ast_dumps_instead_of_running() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ast.lox");
    fs::write(&path, "print 1 + 2 * 3;").expect("write");
    let output = lox().arg("--print-ast").arg(&path).output().expect("run");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "(print (+ 1 (* 2 3)))\n");
}

#[test]
fn prompt_keeps_state_and_survives_errors() {
    let mut child = lox().stdin(Stdio::piped()).spawn().expect("spawn");
    child
        .stdin
        .as_mut()
        .expect("child stdin missing")
        .write_all(b"var x = 40;\nprint x +;\nprint y;\nprint x + 2;\n")
        .expect("failed to write stdin");
    let output = child.wait_with_output().expect("wait");
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output), "> > > > 42\n> ");
    let errors = stderr(&output);
    assert!(errors.contains("Expect expression."), "{errors}");
    assert!(errors.contains("Undefined variable 'y'."), "{errors}");
}

#[test]
fn fancy_diagnostics_name_the_script() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fancy.lox");
    fs::write(&path, "print (1;").expect("write");
    let output = lox()
        .env("LOX_DIAGNOSTICS", "fancy")
        .arg(&path)
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(65));
    let errors = stderr(&output);
    assert!(errors.contains("Expect ')' after expression."), "{errors}");
    assert!(errors.contains("fancy.lox"), "{errors}");
}
