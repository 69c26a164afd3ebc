//! Runtime errors for the CVM reference interpreter.
//!
//! Natively compiled code turns these conditions into hardware faults. The
//! interpreter reports them as values instead. Every error includes the pc
//! (`at`) of the instruction that raised it.

use cvm_common::DecodeError;
use thiserror::Error;

/// Errors that occur while interpreting a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The word stream could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// DIV with a zero divisor.
    #[error("division by zero at pc {at}")]
    DivisionByZero { at: usize },

    /// DIV of `i32::MIN` by `-1`, whose quotient does not fit in a word.
    #[error("division overflow at pc {at}")]
    DivisionOverflow { at: usize },

    /// Pop on an empty operand stack.
    #[error("stack underflow at pc {at}")]
    StackUnderflow { at: usize },

    /// Push past the operand stack limit.
    #[error("stack overflow at pc {at}")]
    StackOverflow { at: usize },

    /// CALL nested past the return stack limit.
    #[error("call depth exceeded at pc {at}")]
    CallDepthExceeded { at: usize },

    /// RET with no matching CALL.
    #[error("RET without CALL at pc {at}")]
    ReturnWithoutCall { at: usize },

    /// A branch or call target that is not the start of an instruction.
    #[error("unresolved target {target} at pc {at}")]
    UnresolvedTarget { at: usize, target: usize },

    /// Execution ran past the last instruction without a HALT.
    #[error("ran off the end of the program at pc {at}")]
    RanOffEnd { at: usize },

    /// Writing DISPLAY or PRINT_STACK output failed.
    #[error("output failed: {0}")]
    Output(String),
}
