//! Host routines that generated code calls for DISPLAY and PRINT_STACK.
//!
//! Both are reached through the prologue shims, which hand over an aligned
//! stack and the body frame pointer.

use std::io::{self, Write};

use crate::encoder::RuntimeRoutines;
use crate::prologue::STACK_RESERVE;

/// Print one register value followed by a newline.
pub extern "C" fn cvm_display(value: i32) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{value}");
    let _ = out.flush();
}

/// Print up to `count` VM stack words, top first.
///
/// `sp` is the native stack pointer at the PRINT_STACK instruction and
/// `frame` the body frame pointer. Only words pushed since the body frame
/// was set up are printed.
///
/// # Safety
///
/// `sp` and `frame` must be the values passed by the stack-dump shim, so
/// that every word between them is readable.
pub unsafe extern "C" fn cvm_print_stack(sp: *const u64, count: i32, frame: *const u64) {
    let mut out = io::stdout().lock();
    let _ = write_stack(&mut out, sp, count, frame);
    let _ = out.flush();
}

/// Write the stack listing for [`cvm_print_stack`] to `out`.
///
/// # Safety
///
/// Every word from `sp` up to `frame - STACK_RESERVE` must be readable.
pub(crate) unsafe fn write_stack<W: Write>(
    out: &mut W,
    sp: *const u64,
    count: i32,
    frame: *const u64,
) -> io::Result<()> {
    let floor = (frame as usize).saturating_sub(STACK_RESERVE as usize);
    let live = floor.saturating_sub(sp as usize) / 8;
    let shown = usize::try_from(count).unwrap_or(0).min(live);

    for i in 0..shown {
        let word = std::ptr::read(sp.add(i));
        writeln!(out, "[{i}] {}", word as u32 as i32)?;
    }
    Ok(())
}

impl RuntimeRoutines {
    /// Addresses of this process's runtime routines.
    pub fn host() -> Self {
        Self {
            display: cvm_display as *const () as usize,
            print_stack: cvm_print_stack as *const () as usize,
        }
    }
}
