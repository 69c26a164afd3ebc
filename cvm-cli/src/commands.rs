//! CLI command implementation.

use std::fs;

use cvm_jit::JitError;

/// Read, translate and execute the program at `path`.
pub fn run(path: &str) -> Result<(), i32> {
    let text = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;

    let program = cvm_reader::read_program(&text).map_err(|e| {
        eprintln!("error: {path}: {e}");
        1
    })?;

    let registers = cvm_jit::run(&program).map_err(|e| {
        eprintln!("error: {e}");
        exit_code(&e)
    })?;

    log::debug!("final registers: {registers:?}");
    Ok(())
}

/// Exit code for a translation or execution failure.
fn exit_code(err: &JitError) -> i32 {
    match err {
        JitError::AllocationFailure { .. }
        | JitError::ProtectionFailure { .. }
        | JitError::UnsupportedHost => 3,
        JitError::Decode(_)
        | JitError::CodeTooLarge { .. }
        | JitError::UnresolvedTarget { .. }
        | JitError::DisplacementOverflow { .. }
        | JitError::LengthMismatch { .. } => 2,
    }
}
