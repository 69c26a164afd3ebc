//! Translation and execution errors.
//!
//! Every variant is fatal for the current invocation. Nothing is executed
//! once one of these has been returned.

use cvm_common::DecodeError;
use thiserror::Error;

/// Errors raised while laying out, encoding, mapping or invoking a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JitError {
    /// The word stream could not be decoded (includes illegal opcodes).
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A memory region could not be mapped.
    #[error("cannot allocate {region} region: {reason}")]
    AllocationFailure { region: &'static str, reason: String },

    /// The code region could not be switched to read+execute.
    #[error("cannot seal code region: {reason}")]
    ProtectionFailure { reason: String },

    /// The generated code does not fit the code region.
    #[error("generated code needs {needed} bytes, capacity is {capacity}")]
    CodeTooLarge { needed: usize, capacity: usize },

    /// A branch or call target is not the start of an instruction.
    #[error("unresolved target {target} at pc {at}")]
    UnresolvedTarget { at: usize, target: usize },

    /// A relative displacement does not fit in 32 bits.
    #[error("displacement out of range at pc {at}")]
    DisplacementOverflow { at: usize },

    /// The encoder emitted a different length than the layout predicted.
    #[error("length mismatch at pc {at}: laid out {predicted} bytes, emitted {emitted}")]
    LengthMismatch {
        at: usize,
        predicted: usize,
        emitted: usize,
    },

    /// Native execution needs a unix x86-64 host.
    #[error("native execution is not supported on this host")]
    UnsupportedHost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats() {
        assert_eq!(
            JitError::CodeTooLarge {
                needed: 5000,
                capacity: 4096
            }
            .to_string(),
            "generated code needs 5000 bytes, capacity is 4096"
        );
        assert_eq!(
            JitError::AllocationFailure {
                region: "code",
                reason: "out of memory".to_string()
            }
            .to_string(),
            "cannot allocate code region: out of memory"
        );
        assert_eq!(
            JitError::UnresolvedTarget { at: 6, target: 7 }.to_string(),
            "unresolved target 7 at pc 6"
        );
    }

    #[test]
    fn illegal_opcode_is_transparent() {
        let e: JitError = DecodeError::IllegalOpcode { at: 0, opcode: 99 }.into();
        assert_eq!(e.to_string(), "illegal opcode 99 at pc 0");
    }
}
