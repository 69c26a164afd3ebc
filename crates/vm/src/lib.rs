//! CVM reference interpreter: executes word streams without native code.
//!
//! The interpreter implements the same instruction semantics as the native
//! translator, with two deliberate differences:
//! - Traps (division by zero, stack underflow, RET without CALL) come back
//!   as [`RuntimeError`] values instead of terminating the process.
//! - The operand stack and the return stack are separate.
//!
//! # Usage
//!
//! ```
//! use cvm_common::Program;
//! use cvm_vm::run_with_output;
//!
//! // MOV r0,7; MOV r1,3; ADD r0,r1; POP r2; DISPLAY r2; HALT
//! let program = Program::new(vec![12, 0, 7, 12, 1, 3, 30, 0, 1, 11, 2, 1, 2, 0]);
//!
//! let mut out = Vec::new();
//! let registers = run_with_output(&program, &mut out).unwrap();
//! assert_eq!(registers[2], 10);
//! assert_eq!(out, b"10\n");
//! ```

pub mod error;
pub mod execute;
pub mod machine;

pub use error::RuntimeError;
pub use machine::VM;

use std::io::{self, Write};

use cvm_common::{Program, REGISTER_COUNT};

/// Execute a program, writing its output to stdout.
///
/// Returns the register file as it stood at HALT.
///
/// # Errors
///
/// Returns [`RuntimeError`] if the program cannot be decoded or traps.
pub fn run(program: &Program) -> Result<[i32; REGISTER_COUNT], RuntimeError> {
    run_with_output(program, io::stdout().lock())
}

/// Execute a program, writing its output to `out`.
pub fn run_with_output<W: Write>(
    program: &Program,
    out: W,
) -> Result<[i32; REGISTER_COUNT], RuntimeError> {
    let mut vm = VM::new(program, out)?;
    vm.execute()
}
