//! Program representation for CVM word streams.
//!
//! A program is a flat sequence of 32-bit words. Instructions are packed
//! contiguously with no padding, and an instruction is identified by the
//! index of its opcode word (its pc).

use crate::error::DecodeError;
use crate::instruction::Instruction;

/// A CVM program: the flattened instruction stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    words: Vec<i32>,
}

impl Program {
    /// Wrap a word stream. The words are not decoded until walked.
    pub fn new(words: Vec<i32>) -> Self {
        Self { words }
    }

    /// Build a program by encoding a sequence of instructions.
    pub fn from_instructions<I>(instructions: I) -> Self
    where
        I: IntoIterator<Item = Instruction>,
    {
        let mut words = Vec::new();
        for instr in instructions {
            instr.encode_into(&mut words);
        }
        Self { words }
    }

    /// The raw word stream.
    pub fn words(&self) -> &[i32] {
        &self.words
    }

    /// Number of words in the stream.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if the stream has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Walk the stream in program order, yielding `(pc, instruction)`.
    ///
    /// Every consumer of the stream walks it through this iterator, so they
    /// all agree on where each instruction starts. The walk stops after the
    /// first decode error.
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            words: &self.words,
            pc: 0,
            failed: false,
        }
    }

    /// Decode the whole stream, failing on the first bad instruction.
    pub fn decode(&self) -> Result<Vec<(usize, Instruction)>, DecodeError> {
        self.instructions().collect()
    }
}

/// Iterator over the instructions of a [`Program`].
#[derive(Debug, Clone)]
pub struct Instructions<'a> {
    words: &'a [i32],
    pc: usize,
    failed: bool,
}

impl Iterator for Instructions<'_> {
    type Item = Result<(usize, Instruction), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pc >= self.words.len() {
            return None;
        }

        let pc = self.pc;
        match Instruction::decode(self.words, pc) {
            Ok(instr) => {
                self.pc += instr.width();
                Some(Ok((pc, instr)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Register;

    fn r(i: usize) -> Register {
        Register::new(i).unwrap()
    }

    #[test]
    fn empty_program() {
        let program = Program::new(vec![]);
        assert!(program.is_empty());
        assert_eq!(program.len(), 0);
        assert_eq!(program.decode(), Ok(vec![]));
    }

    #[test]
    fn walk_assigns_word_pcs() {
        // MOV r0,5; DISPLAY r0; HALT
        let program = Program::new(vec![12, 0, 5, 1, 0, 0]);
        let decoded = program.decode().unwrap();
        assert_eq!(
            decoded,
            vec![
                (0, Instruction::Mov(r(0), 5)),
                (3, Instruction::Display(r(0))),
                (5, Instruction::Halt),
            ]
        );
    }

    #[test]
    fn walk_stops_after_first_error() {
        let program = Program::new(vec![0, 99, 0, 77]);
        let items: Vec<_> = program.instructions().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok((0, Instruction::Halt)));
        assert_eq!(
            items[1],
            Err(DecodeError::IllegalOpcode { at: 1, opcode: 99 })
        );
    }

    #[test]
    fn decode_reports_illegal_opcode_anywhere() {
        let program = Program::new(vec![12, 0, 5, 99, 0]);
        assert_eq!(
            program.decode(),
            Err(DecodeError::IllegalOpcode { at: 3, opcode: 99 })
        );
    }

    #[test]
    fn from_instructions_roundtrip() {
        let instrs = vec![
            Instruction::Mov(r(0), 7),
            Instruction::Mov(r(1), 3),
            Instruction::Add(r(0), r(1)),
            Instruction::Pop(r(2)),
            Instruction::Display(r(2)),
            Instruction::Halt,
        ];
        let program = Program::from_instructions(instrs.clone());
        assert_eq!(
            program.words(),
            &[12, 0, 7, 12, 1, 3, 30, 0, 1, 11, 2, 1, 2, 0]
        );
        let decoded: Vec<_> = program
            .decode()
            .unwrap()
            .into_iter()
            .map(|(_, i)| i)
            .collect();
        assert_eq!(decoded, instrs);
    }
}
