//! Opcode definitions for the CVM instruction set.
//!
//! The numeric values are the wire-level constants used in program files and
//! are stable.

/// Identifies the operation to perform.
///
/// The `#[repr(u8)]` attribute pins each variant to its wire value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // VM control
    /// Stop and return control to the host.
    Halt = 0,
    /// Print a register in decimal, newline-terminated.
    Display = 1,
    /// Debug dump of recent stack words. arg1 = word count.
    PrintStack = 2,

    // Stack and registers
    /// Push a register's value.
    Push = 10,
    /// Pop the top of stack into a register.
    Pop = 11,
    /// Store a 32-bit immediate into a register.
    Mov = 12,

    // Control flow
    /// Push the return address and jump to arg1.
    Call = 20,
    /// Pop a return address and jump to it.
    Ret = 21,
    /// Unconditional jump to arg1.
    Jmp = 22,
    /// Pop; jump to arg1 if zero.
    Jz = 23,
    /// Pop; jump to arg1 if positive.
    Jpos = 24,
    /// Pop; jump to arg1 if negative.
    Jneg = 25,

    // Arithmetic: all push their result, none write a register.
    /// Push reg[arg1] + reg[arg2].
    Add = 30,
    /// Push reg[arg1] - reg[arg2].
    Sub = 31,
    /// Push reg[arg1] * reg[arg2].
    Mul = 32,
    /// Push reg[arg1] / reg[arg2], truncating toward zero.
    Div = 33,
}

/// All valid opcodes, in wire order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 16] = [
    Opcode::Halt,
    Opcode::Display,
    Opcode::PrintStack,
    Opcode::Push,
    Opcode::Pop,
    Opcode::Mov,
    Opcode::Call,
    Opcode::Ret,
    Opcode::Jmp,
    Opcode::Jz,
    Opcode::Jpos,
    Opcode::Jneg,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
];

impl Opcode {
    /// Look up an opcode by its wire value.
    ///
    /// Returns `None` for any word outside the fixed opcode set.
    pub fn from_word(word: i32) -> Option<Self> {
        let op = match word {
            0 => Opcode::Halt,
            1 => Opcode::Display,
            2 => Opcode::PrintStack,
            10 => Opcode::Push,
            11 => Opcode::Pop,
            12 => Opcode::Mov,
            20 => Opcode::Call,
            21 => Opcode::Ret,
            22 => Opcode::Jmp,
            23 => Opcode::Jz,
            24 => Opcode::Jpos,
            25 => Opcode::Jneg,
            30 => Opcode::Add,
            31 => Opcode::Sub,
            32 => Opcode::Mul,
            33 => Opcode::Div,
            _ => return None,
        };
        Some(op)
    }

    /// The wire value of this opcode.
    pub fn word(self) -> i32 {
        self as u8 as i32
    }

    /// Number of operand words that follow the opcode word.
    pub fn operand_count(self) -> usize {
        match self {
            Opcode::Halt | Opcode::Ret => 0,
            Opcode::Display
            | Opcode::PrintStack
            | Opcode::Push
            | Opcode::Pop
            | Opcode::Call
            | Opcode::Jmp
            | Opcode::Jz
            | Opcode::Jpos
            | Opcode::Jneg => 1,
            Opcode::Mov | Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => 2,
        }
    }

    /// Width of an instruction with this opcode, in words.
    pub fn width(self) -> usize {
        1 + self.operand_count()
    }

    /// The canonical uppercase mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Halt => "HALT",
            Opcode::Display => "DISPLAY",
            Opcode::PrintStack => "PRINT_STACK",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Mov => "MOV",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Jmp => "JMP",
            Opcode::Jz => "JZ",
            Opcode::Jpos => "JPOS",
            Opcode::Jneg => "JNEG",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_roundtrip_all_opcodes() {
        for &op in &ALL_OPCODES {
            assert_eq!(Opcode::from_word(op.word()), Some(op), "{op:?}");
        }
    }

    #[test]
    fn unknown_words_rejected() {
        for word in [3, 9, 13, 19, 26, 29, 34, 99, -1, i32::MAX] {
            assert_eq!(Opcode::from_word(word), None, "word {word}");
        }
    }

    #[test]
    fn wire_values_are_stable() {
        assert_eq!(Opcode::Halt.word(), 0);
        assert_eq!(Opcode::PrintStack.word(), 2);
        assert_eq!(Opcode::Mov.word(), 12);
        assert_eq!(Opcode::Jneg.word(), 25);
        assert_eq!(Opcode::Div.word(), 33);
    }

    #[test]
    fn widths() {
        assert_eq!(Opcode::Halt.width(), 1);
        assert_eq!(Opcode::Ret.width(), 1);
        assert_eq!(Opcode::Display.width(), 2);
        assert_eq!(Opcode::Jz.width(), 2);
        assert_eq!(Opcode::Mov.width(), 3);
        assert_eq!(Opcode::Div.width(), 3);
    }

    #[test]
    fn mnemonics_unique() {
        let mut seen = std::collections::HashSet::new();
        for &op in &ALL_OPCODES {
            assert!(seen.insert(op.mnemonic()), "duplicate {}", op.mnemonic());
        }
    }
}
