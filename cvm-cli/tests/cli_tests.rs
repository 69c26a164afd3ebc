//! Integration tests for the CVM CLI.
//!
//! These tests invoke the `cvm` binary as a subprocess and check
//! exit codes, stdout, and stderr.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(deprecated)]
fn cvm() -> Command {
    Command::cargo_bin("cvm").unwrap()
}

/// Return the workspace root (parent of cvm-cli/).
fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

/// Return the absolute path to a test program file.
fn test_program(name: &str) -> PathBuf {
    workspace_root().join("tests/programs").join(name)
}

/// Helper: write program text to a temp file and return its path.
fn write_program(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("program.cvm");
    fs::write(&path, text).unwrap();
    path
}

// ---- Usage ----

#[test]
fn no_args_prints_usage_and_exits_1() {
    cvm()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage: cvm"));
}

#[test]
fn extra_args_exit_1() {
    cvm()
        .args(["a.cvm", "b.cvm"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage: cvm"));
}

#[test]
fn help_flag_exits_0() {
    cvm()
        .arg("--help")
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("Usage: cvm"));
}

// ---- Input errors ----

#[test]
fn missing_file_exits_1() {
    cvm()
        .arg("/nonexistent/program.cvm")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn empty_file_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "; nothing here\n");
    cvm()
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("word count"));
}

#[test]
fn short_program_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = write_program(&dir, "6\n12\n0\n5\n");
    cvm()
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stdout("");
}

// ---- Translation errors ----

#[test]
fn illegal_opcode_exits_2_without_output() {
    cvm()
        .arg(test_program("illegal.cvm"))
        .assert()
        .failure()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("illegal opcode 99"));
}

#[test]
fn jump_into_operand_exits_2() {
    let dir = TempDir::new().unwrap();
    // JMP 3 lands on MOV's immediate.
    let path = write_program(&dir, "6\n22\n3\n12\n0\n5\n0\n");
    cvm()
        .arg(&path)
        .assert()
        .failure()
        .code(2)
        .stdout("");
}

// ---- Native execution ----

#[cfg(all(unix, target_arch = "x86_64"))]
mod native {
    use super::*;

    #[test]
    fn mov_display_halt() {
        cvm()
            .arg(test_program("mov_display.cvm"))
            .assert()
            .success()
            .stdout("5\n");
    }

    #[test]
    fn add_pop_display() {
        cvm()
            .arg(test_program("add.cvm"))
            .assert()
            .success()
            .stdout("10\n");
    }

    #[test]
    fn division_by_zero_terminates() {
        cvm()
            .arg(test_program("div_zero.cvm"))
            .assert()
            .failure()
            .stdout("");
    }

    #[test]
    fn countdown_loop() {
        cvm()
            .arg(test_program("countdown.cvm"))
            .assert()
            .success()
            .stdout("3\n2\n1\n");
    }

    #[test]
    fn call_and_return() {
        cvm()
            .arg(test_program("call.cvm"))
            .assert()
            .success()
            .stdout("42\n");
    }

    #[test]
    fn print_stack_lists_top_first() {
        cvm()
            .arg(test_program("print_stack.cvm"))
            .assert()
            .success()
            .stdout("[0] 9\n[1] 7\n");
    }

    #[test]
    fn print_stack_stops_at_live_words() {
        let dir = TempDir::new().unwrap();
        // MOV r0,7; PUSH r0; MOV r1,9; PUSH r1; PRINT_STACK 5; HALT
        let path = write_program(&dir, "13\n12\n0\n7\n10\n0\n12\n1\n9\n10\n1\n2\n5\n0\n");
        cvm()
            .arg(&path)
            .assert()
            .success()
            .stdout("[0] 9\n[1] 7\n");
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_program(
            &dir,
            "; header comment\n\n6\n12 ; MOV\n0\n\n8\n1\n0\n0 ; HALT\n",
        );
        cvm().arg(&path).assert().success().stdout("8\n");
    }

    #[test]
    fn missing_final_newline() {
        let dir = TempDir::new().unwrap();
        let path = write_program(&dir, "6\n12\n0\n5\n1\n0\n0");
        cvm().arg(&path).assert().success().stdout("5\n");
    }

    #[test]
    fn trailing_literals_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = write_program(&dir, "6\n12\n0\n5\n1\n0\n0\n99\n99\n");
        cvm()
            .arg(&path)
            .assert()
            .success()
            .stdout("5\n")
            .stderr(predicate::str::contains("ignoring 2 literal"));
    }

    #[test]
    fn debug_logging_stays_off_stdout() {
        cvm()
            .arg(test_program("mov_display.cvm"))
            .env("RUST_LOG", "debug")
            .assert()
            .success()
            .stdout("5\n")
            .stderr(predicate::str::contains("DEBUG"));
    }
}
