//! The fixed prologue placed before every translated program.
//!
//! ```text
//! offset  0  entry:        push base; call body; pop base; ret
//! offset  8  display shim: align stack, call the display routine
//! offset 33  stack shim:   align stack, call the stack-dump routine
//! offset 58  body:         push rbp; mov rbp, rsp; sub rsp, STACK_RESERVE;
//!                          mov base, register_file
//! offset 79  first translated instruction
//! ```
//!
//! The entry trampoline keeps the host's copy of the base register intact.
//! HALT unwinds the body frame with `leave; ret`, which lands back in the
//! trampoline. Runtime calls go through the shims so the Rust routines
//! always see a 16-byte aligned stack, whatever the VM stack depth.

use crate::buffer::CodeBuffer;
use crate::encoder::{BaseRegister, EncodeContext};

/// Length of the entry trampoline.
pub const ENTRY_LEN: usize = 8;

/// Length of one runtime shim.
pub const SHIM_LEN: usize = 25;

/// Offset of the display shim from the code base.
pub const DISPLAY_SHIM: usize = ENTRY_LEN;

/// Offset of the stack-dump shim from the code base.
pub const PRINT_STACK_SHIM: usize = DISPLAY_SHIM + SHIM_LEN;

/// Offset of the body frame setup from the code base.
pub const BODY_OFFSET: usize = PRINT_STACK_SHIM + SHIM_LEN;

/// Length of the body frame setup.
pub const FRAME_SETUP_LEN: usize = 21;

/// Bytes before the first translated instruction.
pub const PROLOGUE_LEN: usize = BODY_OFFSET + FRAME_SETUP_LEN;

/// Native stack bytes the body frame reserves below its frame pointer.
pub const STACK_RESERVE: u32 = 0x4000;

/// Emit the full prologue at the start of `buf`.
pub(crate) fn emit_prologue(buf: &mut CodeBuffer, ctx: &EncodeContext) {
    emit_entry(buf, ctx.base_register);
    emit_shim(buf, ctx.runtime.display);
    emit_shim(buf, ctx.runtime.print_stack);
    emit_frame_setup(buf, ctx.base_register, ctx.register_file);
}

fn emit_entry(buf: &mut CodeBuffer, base: BaseRegister) {
    buf.push(0x50 + base.code()); // push base
    buf.push(0xE8); // call body
    let call_end = buf.len() + 4;
    buf.push_u32((BODY_OFFSET - call_end) as u32);
    buf.push(0x58 + base.code()); // pop base
    buf.push(0xC3); // ret
}

fn emit_shim(buf: &mut CodeBuffer, routine: usize) {
    buf.extend(&[0x48, 0x89, 0xEA]); // mov rdx, rbp
    buf.push(0x55); // push rbp
    buf.extend(&[0x48, 0x89, 0xE5]); // mov rbp, rsp
    buf.extend(&[0x48, 0x83, 0xE4, 0xF0]); // and rsp, -16
    buf.extend(&[0x48, 0xB8]); // mov rax, routine
    buf.push_u64(routine as u64);
    buf.extend(&[0xFF, 0xD0]); // call rax
    buf.push(0xC9); // leave
    buf.push(0xC3); // ret
}

fn emit_frame_setup(buf: &mut CodeBuffer, base: BaseRegister, register_file: usize) {
    buf.push(0x55); // push rbp
    buf.extend(&[0x48, 0x89, 0xE5]); // mov rbp, rsp
    buf.extend(&[0x48, 0x81, 0xEC]); // sub rsp, STACK_RESERVE
    buf.push_u32(STACK_RESERVE);
    buf.extend(&[0x48, 0xB8 + base.code()]); // mov base, register_file
    buf.push_u64(register_file as u64);
}
