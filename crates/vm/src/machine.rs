//! VM state management: registers, operand stack, return stack.

use std::io::Write;

use crate::error::RuntimeError;
use cvm_common::{Instruction, Program, REGISTER_COUNT};

/// Maximum operand stack depth, in words.
///
/// Matches the 0x4000-byte native stack reservation at 8 bytes per slot.
pub const MAX_STACK_DEPTH: usize = 2048;

/// Maximum number of outstanding CALLs.
pub const MAX_CALL_DEPTH: usize = 2048;

/// The CVM reference interpreter.
///
/// Unlike native code, the operand stack and the return stack are kept
/// apart, so an unbalanced PUSH before a CALL cannot redirect a RET.
pub struct VM<W: Write> {
    /// Decoded instructions indexed by pc; `None` where no instruction starts.
    pub(crate) code: Vec<Option<Instruction>>,
    /// The register file, shared across all call frames.
    pub(crate) registers: [i32; REGISTER_COUNT],
    /// Operand stack.
    pub(crate) stack: Vec<i32>,
    /// Return pcs pushed by CALL.
    pub(crate) call_stack: Vec<usize>,
    /// Program counter (word index).
    pub(crate) pc: usize,
    /// Sink for DISPLAY and PRINT_STACK output.
    pub(crate) out: W,
}

impl<W: Write> VM<W> {
    /// Decode `program` and prepare to run it, writing output to `out`.
    pub fn new(program: &Program, out: W) -> Result<Self, RuntimeError> {
        let mut code = vec![None; program.len()];
        for item in program.instructions() {
            let (pc, instr) = item?;
            code[pc] = Some(instr);
        }

        Ok(Self {
            code,
            registers: [0; REGISTER_COUNT],
            stack: Vec::new(),
            call_stack: Vec::new(),
            pc: 0,
            out,
        })
    }

    /// Current register values.
    pub fn registers(&self) -> &[i32; REGISTER_COUNT] {
        &self.registers
    }

    /// Consume the VM, returning its output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Push a value onto the operand stack, checking for overflow.
    pub(crate) fn push(&mut self, value: i32) -> Result<(), RuntimeError> {
        if self.stack.len() >= MAX_STACK_DEPTH {
            return Err(RuntimeError::StackOverflow { at: self.pc });
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop a value from the operand stack.
    pub(crate) fn pop(&mut self) -> Result<i32, RuntimeError> {
        self.stack
            .pop()
            .ok_or(RuntimeError::StackUnderflow { at: self.pc })
    }

    /// Fetch the instruction at the current pc.
    pub(crate) fn fetch(&self) -> Result<Instruction, RuntimeError> {
        match self.code.get(self.pc) {
            Some(Some(instr)) => Ok(*instr),
            // Only reachable by falling through, since jumps are checked.
            _ => Err(RuntimeError::RanOffEnd { at: self.pc }),
        }
    }

    /// Transfer control to `target`, which must start an instruction.
    pub(crate) fn jump(&mut self, target: usize) -> Result<(), RuntimeError> {
        match self.code.get(target) {
            Some(Some(_)) => {
                self.pc = target;
                Ok(())
            }
            _ => Err(RuntimeError::UnresolvedTarget {
                at: self.pc,
                target,
            }),
        }
    }
}
