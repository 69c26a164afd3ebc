//! Decode errors for CVM word streams.

use thiserror::Error;

/// Errors that occur while walking a word stream into instructions.
///
/// Every variant carries the pc (`at`) of the instruction being decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The opcode word is outside the fixed opcode set.
    #[error("illegal opcode {opcode} at pc {at}")]
    IllegalOpcode { at: usize, opcode: i32 },

    /// The stream ends before all operand words of an instruction.
    #[error("truncated {opcode} instruction at pc {at}")]
    TruncatedInstruction { at: usize, opcode: &'static str },

    /// A register operand is outside the register file.
    #[error("register {register} out of range at pc {at}")]
    RegisterOutOfRange { at: usize, register: i32 },

    /// A branch or call target word is negative.
    #[error("invalid target {target} at pc {at}")]
    InvalidTarget { at: usize, target: i32 },
}
