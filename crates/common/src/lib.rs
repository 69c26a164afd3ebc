//! CVM common types and word-stream decoding.
//!
//! This crate provides the foundational data structures for CVM programs:
//!
//! - [`Opcode`]: the sixteen opcodes and their wire values
//! - [`Register`]: a validated index into the register file
//! - [`Instruction`]: a decoded instruction with typed operands
//! - [`Program`]: the flat word stream and its decoding walk
//! - [`DecodeError`]: errors from walking a word stream
//!
//! # Dependencies
//!
//! This crate uses `thiserror` and has no other dependencies.

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;

// Re-export commonly used types at the crate root.
pub use error::DecodeError;
pub use instruction::{Instruction, Register, REGISTER_COUNT};
pub use opcode::Opcode;
pub use program::{Instructions, Program};

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_register() -> impl Strategy<Value = Register> {
        (0..REGISTER_COUNT).prop_map(|i| Register::new(i).unwrap())
    }

    /// Strategy that generates a random well-formed Instruction.
    fn arb_instruction() -> impl Strategy<Value = Instruction> {
        prop_oneof![
            Just(Instruction::Halt),
            Just(Instruction::Ret),
            arb_register().prop_map(Instruction::Display),
            any::<i32>().prop_map(Instruction::PrintStack),
            arb_register().prop_map(Instruction::Push),
            arb_register().prop_map(Instruction::Pop),
            (arb_register(), any::<i32>()).prop_map(|(r, v)| Instruction::Mov(r, v)),
            (0usize..1000).prop_map(Instruction::Call),
            (0usize..1000).prop_map(Instruction::Jmp),
            (0usize..1000).prop_map(Instruction::Jz),
            (0usize..1000).prop_map(Instruction::Jpos),
            (0usize..1000).prop_map(Instruction::Jneg),
            (arb_register(), arb_register()).prop_map(|(a, b)| Instruction::Add(a, b)),
            (arb_register(), arb_register()).prop_map(|(a, b)| Instruction::Sub(a, b)),
            (arb_register(), arb_register()).prop_map(|(a, b)| Instruction::Mul(a, b)),
            (arb_register(), arb_register()).prop_map(|(a, b)| Instruction::Div(a, b)),
        ]
    }

    proptest! {
        /// Walking an encoded program yields the original instructions at
        /// pcs that advance by each instruction's width.
        #[test]
        fn walk_recovers_instructions(
            instrs in prop::collection::vec(arb_instruction(), 0..50)
        ) {
            let program = Program::from_instructions(instrs.clone());
            let decoded = program.decode().unwrap();
            prop_assert_eq!(decoded.len(), instrs.len());

            let mut expected_pc = 0;
            for ((pc, got), want) in decoded.iter().zip(&instrs) {
                prop_assert_eq!(*pc, expected_pc);
                prop_assert_eq!(got, want);
                expected_pc += want.width();
            }
            prop_assert_eq!(expected_pc, program.len());
        }

        /// Any word stream either decodes completely or stops at a
        /// specific DecodeError; the walk never panics.
        #[test]
        fn random_words_never_panic(words in prop::collection::vec(-5i32..40, 0..40)) {
            let program = Program::new(words);
            match program.decode() {
                Ok(decoded) => {
                    let total: usize = decoded.iter().map(|(_, i)| i.width()).sum();
                    prop_assert_eq!(total, program.len());
                }
                Err(e) => match e {
                    DecodeError::IllegalOpcode { .. }
                    | DecodeError::TruncatedInstruction { .. }
                    | DecodeError::RegisterOutOfRange { .. }
                    | DecodeError::InvalidTarget { .. } => {}
                },
            }
        }
    }
}
