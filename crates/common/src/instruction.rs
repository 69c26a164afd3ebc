//! The decoded instruction model.
//!
//! An instruction occupies 1 to 3 consecutive words of the stream:
//! ```text
//! word pc:     opcode
//! word pc + 1: operand1 (if the opcode takes one)
//! word pc + 2: operand2 (if the opcode takes two)
//! ```
//! Arity is determined by the opcode alone.

use std::fmt;

use crate::error::DecodeError;
use crate::opcode::Opcode;

/// Number of addressable registers in the register file.
///
/// Every register's byte displacement (`index * 4`) fits a signed 8-bit
/// field, which the native encoding relies on.
pub const REGISTER_COUNT: usize = 32;

/// Index of a slot in the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(u8);

impl Register {
    /// Create a register index, or `None` if it is outside the register file.
    pub fn new(index: usize) -> Option<Self> {
        if index < REGISTER_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    fn from_operand(word: i32, at: usize) -> Result<Self, DecodeError> {
        usize::try_from(word)
            .ok()
            .and_then(Register::new)
            .ok_or(DecodeError::RegisterOutOfRange { at, register: word })
    }

    /// The register's index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Byte offset of this register from the start of the register file.
    pub fn byte_offset(self) -> u8 {
        self.0 * 4
    }

    /// Register 0 sits at the file base and needs no displacement byte.
    pub fn is_base(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// A single decoded CVM instruction.
///
/// Branch and call targets are word indices (pcs) and are not checked
/// against the stream here; that is a precondition of the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Halt,
    Display(Register),
    /// Dump up to this many stack words (debug only).
    PrintStack(i32),
    Push(Register),
    Pop(Register),
    Mov(Register, i32),
    Call(usize),
    Ret,
    Jmp(usize),
    Jz(usize),
    Jpos(usize),
    Jneg(usize),
    Add(Register, Register),
    Sub(Register, Register),
    Mul(Register, Register),
    Div(Register, Register),
}

impl Instruction {
    /// Decode the instruction starting at word index `pc`.
    pub fn decode(words: &[i32], pc: usize) -> Result<Self, DecodeError> {
        let word = words[pc];
        let opcode = Opcode::from_word(word).ok_or(DecodeError::IllegalOpcode {
            at: pc,
            opcode: word,
        })?;

        let operands = words
            .get(pc + 1..pc + opcode.width())
            .ok_or(DecodeError::TruncatedInstruction {
                at: pc,
                opcode: opcode.mnemonic(),
            })?;
        let reg = |i: usize| Register::from_operand(operands[i], pc);
        let target = |i: usize| {
            usize::try_from(operands[i]).map_err(|_| DecodeError::InvalidTarget {
                at: pc,
                target: operands[i],
            })
        };

        Ok(match opcode {
            Opcode::Halt => Instruction::Halt,
            Opcode::Display => Instruction::Display(reg(0)?),
            Opcode::PrintStack => Instruction::PrintStack(operands[0]),
            Opcode::Push => Instruction::Push(reg(0)?),
            Opcode::Pop => Instruction::Pop(reg(0)?),
            Opcode::Mov => Instruction::Mov(reg(0)?, operands[1]),
            Opcode::Call => Instruction::Call(target(0)?),
            Opcode::Ret => Instruction::Ret,
            Opcode::Jmp => Instruction::Jmp(target(0)?),
            Opcode::Jz => Instruction::Jz(target(0)?),
            Opcode::Jpos => Instruction::Jpos(target(0)?),
            Opcode::Jneg => Instruction::Jneg(target(0)?),
            Opcode::Add => Instruction::Add(reg(0)?, reg(1)?),
            Opcode::Sub => Instruction::Sub(reg(0)?, reg(1)?),
            Opcode::Mul => Instruction::Mul(reg(0)?, reg(1)?),
            Opcode::Div => Instruction::Div(reg(0)?, reg(1)?),
        })
    }

    /// Append this instruction's words to `out`.
    pub fn encode_into(&self, out: &mut Vec<i32>) {
        out.push(self.opcode().word());
        match *self {
            Instruction::Halt | Instruction::Ret => {}
            Instruction::Display(r) | Instruction::Push(r) | Instruction::Pop(r) => {
                out.push(r.index() as i32)
            }
            Instruction::PrintStack(n) => out.push(n),
            Instruction::Mov(r, imm) => out.extend_from_slice(&[r.index() as i32, imm]),
            Instruction::Call(t)
            | Instruction::Jmp(t)
            | Instruction::Jz(t)
            | Instruction::Jpos(t)
            | Instruction::Jneg(t) => out.push(t as i32),
            Instruction::Add(a, b)
            | Instruction::Sub(a, b)
            | Instruction::Mul(a, b)
            | Instruction::Div(a, b) => out.extend_from_slice(&[a.index() as i32, b.index() as i32]),
        }
    }

    /// The opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Halt => Opcode::Halt,
            Instruction::Display(_) => Opcode::Display,
            Instruction::PrintStack(_) => Opcode::PrintStack,
            Instruction::Push(_) => Opcode::Push,
            Instruction::Pop(_) => Opcode::Pop,
            Instruction::Mov(..) => Opcode::Mov,
            Instruction::Call(_) => Opcode::Call,
            Instruction::Ret => Opcode::Ret,
            Instruction::Jmp(_) => Opcode::Jmp,
            Instruction::Jz(_) => Opcode::Jz,
            Instruction::Jpos(_) => Opcode::Jpos,
            Instruction::Jneg(_) => Opcode::Jneg,
            Instruction::Add(..) => Opcode::Add,
            Instruction::Sub(..) => Opcode::Sub,
            Instruction::Mul(..) => Opcode::Mul,
            Instruction::Div(..) => Opcode::Div,
        }
    }

    /// Width of this instruction in words.
    pub fn width(&self) -> usize {
        self.opcode().width()
    }

    /// The branch or call target, if this instruction transfers control.
    pub fn target(&self) -> Option<usize> {
        match *self {
            Instruction::Call(t)
            | Instruction::Jmp(t)
            | Instruction::Jz(t)
            | Instruction::Jpos(t)
            | Instruction::Jneg(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.opcode().mnemonic();
        match *self {
            Instruction::Halt | Instruction::Ret => f.write_str(mnemonic),
            Instruction::Display(r) | Instruction::Push(r) | Instruction::Pop(r) => {
                write!(f, "{mnemonic} {r}")
            }
            Instruction::PrintStack(n) => write!(f, "{mnemonic} {n}"),
            Instruction::Mov(r, imm) => write!(f, "{mnemonic} {r}, {imm}"),
            Instruction::Call(t)
            | Instruction::Jmp(t)
            | Instruction::Jz(t)
            | Instruction::Jpos(t)
            | Instruction::Jneg(t) => write!(f, "{mnemonic} @{t}"),
            Instruction::Add(a, b)
            | Instruction::Sub(a, b)
            | Instruction::Mul(a, b)
            | Instruction::Div(a, b) => write!(f, "{mnemonic} {a}, {b}"),
        }
    }
}
