//! CVM native translator: CVM word streams to x86-64 machine code.
//!
//! Translation is two passes over the same decoding walk:
//!
//! 1. **Layout** ([`layout::resolve`]): compute every instruction's final
//!    address from [`layout::encoded_len`] alone.
//! 2. **Encoding** ([`encoder::encode`]): emit each instruction's template,
//!    resolving branch and call targets through the offset table.
//!
//! The bytes are then copied into a writable region, sealed read+execute and
//! called as a zero-argument C function. HALT returns to the host; the
//! register file is read back afterwards.
//!
//! # Usage
//!
//! ```
//! use cvm_common::Program;
//! use cvm_jit::{compile, encoded_len, BaseRegister, EncodeContext, RuntimeRoutines, PROLOGUE_LEN};
//!
//! // MOV r0,5; DISPLAY r0; HALT
//! let program = Program::new(vec![12, 0, 5, 1, 0, 0]);
//! let ctx = EncodeContext {
//!     base_register: BaseRegister::RBX,
//!     code_base: 0x1000_0000,
//!     register_file: 0x2000_0000,
//!     runtime: RuntimeRoutines::host(),
//! };
//!
//! let code = compile(&program, &ctx, 0x1000).unwrap();
//! let body: usize = program.decode().unwrap().iter().map(|(_, i)| encoded_len(i)).sum();
//! assert_eq!(code.len(), PROLOGUE_LEN + body);
//! ```
//!
//! Generated code that divides by zero, or returns without a matching call,
//! terminates the whole process. Use `cvm-vm` where traps must be
//! recoverable.

pub mod buffer;
pub mod encoder;
pub mod error;
pub mod layout;
#[cfg(unix)]
pub mod memory;
pub mod prologue;
pub mod runtime;
pub mod session;

pub use buffer::CodeBuffer;
pub use encoder::{encode, BaseRegister, EncodeContext, RuntimeRoutines};
pub use error::JitError;
pub use layout::{encoded_len, resolve, OffsetTable};
pub use prologue::{PROLOGUE_LEN, STACK_RESERVE};
pub use session::{compile, run, run_with_options, JitOptions, CODE_CAPACITY};
