//! Driving a program through layout, encoding, sealing and execution.

use log::debug;

use cvm_common::{Program, REGISTER_COUNT};

use crate::buffer::CodeBuffer;
use crate::encoder::{encode, BaseRegister, EncodeContext, RuntimeRoutines};
use crate::error::JitError;
use crate::layout::resolve;

/// Default size of the executable code region.
pub const CODE_CAPACITY: usize = 0x1000;

/// Tunables for a JIT run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitOptions {
    /// Bytes mapped for generated code, prologue included.
    pub code_capacity: usize,
}

impl Default for JitOptions {
    fn default() -> Self {
        Self {
            code_capacity: CODE_CAPACITY,
        }
    }
}

/// Translate `program` for the placement described by `ctx` without
/// touching executable memory.
///
/// Fails with [`JitError::CodeTooLarge`] before encoding if the laid-out
/// code would not fit in `capacity` bytes.
pub fn compile(
    program: &Program,
    ctx: &EncodeContext,
    capacity: usize,
) -> Result<CodeBuffer, JitError> {
    let table = resolve(program, ctx.code_base)?;
    if table.code_len() > capacity {
        return Err(JitError::CodeTooLarge {
            needed: table.code_len(),
            capacity,
        });
    }
    encode(program, &table, ctx)
}

/// Translate and execute `program` with default options.
///
/// Returns the register file as it stood when the program halted.
pub fn run(program: &Program) -> Result<[i32; REGISTER_COUNT], JitError> {
    run_with_options(program, &JitOptions::default())
}

/// Translate `program` at a placeholder placement.
///
/// Relative layout does not depend on the base, so every translation error
/// a real placement would hit is reported here, before anything is mapped.
fn check(program: &Program, options: &JitOptions) -> Result<(), JitError> {
    let ctx = EncodeContext {
        base_register: BaseRegister::RBX,
        code_base: 0,
        register_file: 0,
        runtime: RuntimeRoutines::host(),
    };
    compile(program, &ctx, options.code_capacity)?;
    Ok(())
}

/// Translate and execute `program`.
///
/// No memory is mapped unless translation succeeds.
#[cfg(all(unix, target_arch = "x86_64"))]
pub fn run_with_options(
    program: &Program,
    options: &JitOptions,
) -> Result<[i32; REGISTER_COUNT], JitError> {
    use crate::memory::{RegisterFile, StagingCode};

    check(program, options)?;

    let registers = RegisterFile::allocate()?;
    let mut staging = StagingCode::allocate(options.code_capacity)?;

    let ctx = EncodeContext {
        base_register: BaseRegister::RBX,
        code_base: staging.base(),
        register_file: registers.base(),
        runtime: RuntimeRoutines::host(),
    };
    let code = compile(program, &ctx, staging.capacity())?;
    debug!("translated {} words into {} bytes", program.len(), code.len());

    staging.write(code.as_bytes())?;
    let sealed = staging.seal()?;

    debug!("entering generated code at {:#x}", sealed.entry());
    // The code was produced by `encode` for this region and register file,
    // both of which outlive the call.
    unsafe { sealed.invoke() };
    debug!("generated code returned");

    Ok(registers.snapshot())
}

/// Native execution needs an x86-64 Unix host. Translation errors are still
/// reported ahead of [`JitError::UnsupportedHost`].
#[cfg(not(all(unix, target_arch = "x86_64")))]
pub fn run_with_options(
    program: &Program,
    options: &JitOptions,
) -> Result<[i32; REGISTER_COUNT], JitError> {
    check(program, options)?;
    debug!("refusing to run {} words on this host", program.len());
    Err(JitError::UnsupportedHost)
}
