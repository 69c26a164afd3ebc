//! Layout resolution: every instruction's final address, before any byte
//! is written.
//!
//! The lengths here are an independent statement of what the encoder emits.
//! Branch displacements are computed from this table alone, so a length that
//! disagrees with the encoder shifts every later target.

use log::{debug, trace};

use cvm_common::{DecodeError, Instruction, Program};

use crate::prologue::PROLOGUE_LEN;

/// Mapping from pc to the absolute address of that instruction's first byte
/// in the final code mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    base: usize,
    entries: Vec<Option<usize>>,
    end: usize,
}

impl OffsetTable {
    /// Address of the instruction starting at `pc`, or `None` if no
    /// instruction starts there.
    pub fn address_of(&self, pc: usize) -> Option<usize> {
        self.entries.get(pc).copied().flatten()
    }

    /// Base address of the code mapping.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Address one past the last instruction's last byte.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Total bytes of prologue plus translated instructions.
    pub fn code_len(&self) -> usize {
        self.end - self.base
    }

    /// `(pc, address)` for every instruction, in program order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(pc, addr)| addr.map(|a| (pc, a)))
    }
}

/// Bytes the encoder emits for `instr`.
///
/// Register 0 sits at the register-file base and needs no displacement
/// byte; every other register costs one.
pub fn encoded_len(instr: &Instruction) -> usize {
    let disp = |r: cvm_common::Register| usize::from(!r.is_base());

    match *instr {
        Instruction::Halt => 2,
        Instruction::Ret => 1,
        Instruction::Display(r) => 15 + disp(r),
        Instruction::PrintStack(_) => 21,
        Instruction::Push(r) => if r.is_base() { 3 } else { 5 },
        Instruction::Pop(r) => 3 + disp(r),
        Instruction::Mov(r, _) => 6 + disp(r),
        Instruction::Call(_) | Instruction::Jmp(_) => 5,
        Instruction::Jz(_) | Instruction::Jpos(_) | Instruction::Jneg(_) => 9,
        Instruction::Add(a, b) | Instruction::Sub(a, b) => (3 + disp(a)) + (2 + disp(b)),
        Instruction::Mul(a, b) => (3 + disp(a)) + (3 + disp(b)),
        Instruction::Div(a, b) => (5 + disp(a)) + (2 + disp(b)),
    }
}

/// Compute the offset table for `program` placed at `base`.
///
/// This is a pure function of its inputs. It aborts on the first
/// instruction that does not decode, so no partial table escapes.
pub fn resolve(program: &Program, base: usize) -> Result<OffsetTable, DecodeError> {
    let mut entries = vec![None; program.len()];
    let mut addr = base + PROLOGUE_LEN;

    for item in program.instructions() {
        let (pc, instr) = item?;
        trace!("{pc:>5}  {addr:#x}  {instr}");
        entries[pc] = Some(addr);
        addr += encoded_len(&instr);
    }

    debug!(
        "laid out {} words into {} bytes at {base:#x}",
        program.len(),
        addr - base
    );

    Ok(OffsetTable {
        base,
        entries,
        end: addr,
    })
}
