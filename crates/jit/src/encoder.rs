//! Instruction encoding: CVM instructions to x86-64 machine code.
//!
//! Each instruction becomes a fixed byte template parameterized by its
//! operands. Register operands are memory operands relative to the base
//! register, which the prologue loads with the register-file address.
//! Every template's length must equal [`encoded_len`].

use log::debug;

use cvm_common::{Instruction, Program, Register};

use crate::buffer::CodeBuffer;
use crate::error::JitError;
use crate::layout::{encoded_len, OffsetTable};
use crate::prologue::{emit_prologue, DISPLAY_SHIM, PRINT_STACK_SHIM, PROLOGUE_LEN};

/// The callee-saved native register pinned to the register-file base.
///
/// Only registers whose memory operands need neither a REX prefix nor a SIB
/// byte nor a forced displacement keep the template lengths; of the
/// callee-saved registers that is `rbx` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseRegister {
    code: u8,
}

impl BaseRegister {
    /// `rbx`.
    pub const RBX: BaseRegister = BaseRegister { code: 3 };

    /// The register number used in ModRM, SIB and `+rd` opcode fields.
    pub fn code(self) -> u8 {
        self.code
    }
}

/// Native addresses of the Runtime Support Library routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeRoutines {
    pub display: usize,
    pub print_stack: usize,
}

/// Everything the encoder needs to know about where the code will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeContext {
    pub base_register: BaseRegister,
    /// Address the code will be copied to.
    pub code_base: usize,
    /// Address of the register file.
    pub register_file: usize,
    pub runtime: RuntimeRoutines,
}

// ModRM `reg` field values for the registers the templates use.
const EAX: u8 = 0;
const EDI: u8 = 7;
// `/digit` opcode extensions.
const MOV_IMM: u8 = 0;
const IDIV: u8 = 7;
// rm = 100 selects a SIB byte; SIB index = 100 means no index.
const RM_SIB: u8 = 4;
const NO_INDEX: u8 = 4;

fn modrm(mode: u8, reg: u8, rm: u8) -> u8 {
    (mode << 6) | (reg << 3) | rm
}

fn sib(scale: u8, index: u8, base: u8) -> u8 {
    (scale << 6) | (index << 3) | base
}

/// Emits instruction templates into the staging buffer.
struct Emitter<'a> {
    buf: &'a mut CodeBuffer,
    ctx: &'a EncodeContext,
    table: &'a OffsetTable,
}

impl Emitter<'_> {
    /// `opcode /reg` with a `[base + slot]` operand; 0 or 1 displacement bytes.
    fn slot(&mut self, opcode: &[u8], reg: u8, slot: Register) {
        let base = self.ctx.base_register.code();
        self.buf.extend(opcode);
        if slot.is_base() {
            self.buf.push(modrm(0b00, reg, base));
        } else {
            self.buf.push(modrm(0b01, reg, base));
            self.buf.push(slot.byte_offset());
        }
    }

    /// Same operand as [`Emitter::slot`] in its SIB form, one byte longer.
    fn slot_sib(&mut self, opcode: &[u8], reg: u8, slot: Register) {
        let base = self.ctx.base_register.code();
        self.buf.extend(opcode);
        if slot.is_base() {
            self.buf.push(modrm(0b00, reg, RM_SIB));
            self.buf.push(sib(0, NO_INDEX, base));
        } else {
            self.buf.push(modrm(0b01, reg, RM_SIB));
            self.buf.push(sib(0, NO_INDEX, base));
            self.buf.push(slot.byte_offset());
        }
    }

    /// `mov rax, routine; call rax`
    fn call_absolute(&mut self, routine: usize) {
        self.buf.extend(&[0x48, 0xB8]);
        self.buf.push_u64(routine as u64);
        self.buf.extend(&[0xFF, 0xD0]);
    }

    /// A rel32 to the instruction at `target`, measured from the end of
    /// the instruction at `pc`.
    fn rel32(&mut self, pc: usize, target: usize, len: usize) -> Result<(), JitError> {
        let from = self
            .table
            .address_of(pc)
            .ok_or(JitError::UnresolvedTarget { at: pc, target: pc })?;
        let to = self
            .table
            .address_of(target)
            .ok_or(JitError::UnresolvedTarget { at: pc, target })?;

        let disp = to as i64 - from as i64 - len as i64;
        let disp = i32::try_from(disp).map_err(|_| JitError::DisplacementOverflow { at: pc })?;
        self.buf.push_i32(disp);
        Ok(())
    }

    /// `pop rax; test eax, eax; jcc rel32`
    fn pop_and_branch(&mut self, pc: usize, cc: u8, target: usize) -> Result<(), JitError> {
        self.buf.extend(&[0x58, 0x85, 0xC0, 0x0F, cc]);
        self.rel32(pc, target, 9)
    }

    fn instruction(&mut self, pc: usize, instr: Instruction) -> Result<(), JitError> {
        match instr {
            Instruction::Halt => {
                // leave; ret
                self.buf.extend(&[0xC9, 0xC3]);
            }
            Instruction::Display(r) => {
                // movsxd rdi, [base + r]; call display shim
                self.slot(&[0x48, 0x63], EDI, r);
                self.call_absolute(self.ctx.code_base + DISPLAY_SHIM);
            }
            Instruction::PrintStack(count) => {
                // lea rdi, [rsp]; mov esi, count; call stack-dump shim
                self.buf.extend(&[0x48, 0x8D, 0x3C, 0x24]);
                self.buf.push(0xBE);
                self.buf.push_i32(count);
                self.call_absolute(self.ctx.code_base + PRINT_STACK_SHIM);
            }
            Instruction::Push(r) => {
                // mov eax, [base + r]; push rax
                if r.is_base() {
                    self.slot(&[0x8B], EAX, r);
                } else {
                    self.slot_sib(&[0x8B], EAX, r);
                }
                self.buf.push(0x50);
            }
            Instruction::Pop(r) => {
                // pop rax; mov [base + r], eax
                self.buf.push(0x58);
                self.slot(&[0x89], EAX, r);
            }
            Instruction::Mov(r, imm) => {
                // mov dword [base + r], imm
                self.slot(&[0xC7], MOV_IMM, r);
                self.buf.push_i32(imm);
            }
            Instruction::Call(target) => {
                self.buf.push(0xE8);
                self.rel32(pc, target, 5)?;
            }
            Instruction::Ret => self.buf.push(0xC3),
            Instruction::Jmp(target) => {
                self.buf.push(0xE9);
                self.rel32(pc, target, 5)?;
            }
            Instruction::Jz(target) => self.pop_and_branch(pc, 0x84, target)?,
            Instruction::Jpos(target) => self.pop_and_branch(pc, 0x8F, target)?,
            Instruction::Jneg(target) => self.pop_and_branch(pc, 0x8C, target)?,
            Instruction::Add(a, b) => {
                // mov eax, [base + a]; add eax, [base + b]; push rax
                self.slot(&[0x8B], EAX, a);
                self.slot(&[0x03], EAX, b);
                self.buf.push(0x50);
            }
            Instruction::Sub(a, b) => {
                // mov eax, [base + a]; sub eax, [base + b]; push rax
                self.slot(&[0x8B], EAX, a);
                self.slot(&[0x2B], EAX, b);
                self.buf.push(0x50);
            }
            Instruction::Mul(a, b) => {
                // mov eax, [base + a]; imul eax, [base + b]; push rax
                self.slot(&[0x8B], EAX, a);
                self.slot(&[0x0F, 0xAF], EAX, b);
                self.buf.push(0x50);
            }
            Instruction::Div(a, b) => {
                // mov eax, [base + a]; cdq; idiv dword [base + b]; push rax
                // idiv divides edx:eax, so the dividend is sign-extended first.
                self.slot_sib(&[0x8B], EAX, a);
                self.buf.push(0x99);
                self.slot(&[0xF7], IDIV, b);
                self.buf.push(0x50);
            }
        }
        Ok(())
    }
}

/// Encode the prologue and every instruction of `program` into a new
/// staging buffer, resolving targets through `table`.
///
/// `table` must come from [`crate::layout::resolve`] for the same program
/// at `ctx.code_base`.
pub fn encode(
    program: &Program,
    table: &OffsetTable,
    ctx: &EncodeContext,
) -> Result<CodeBuffer, JitError> {
    let mut buf = CodeBuffer::with_capacity(table.code_len());
    emit_prologue(&mut buf, ctx);
    debug_assert_eq!(buf.len(), PROLOGUE_LEN);

    let mut emitter = Emitter {
        buf: &mut buf,
        ctx,
        table,
    };

    for item in program.instructions() {
        let (pc, instr) = item?;
        let start = emitter.buf.len();
        emitter.instruction(pc, instr)?;

        let emitted = emitter.buf.len() - start;
        let predicted = encoded_len(&instr);
        if emitted != predicted {
            return Err(JitError::LengthMismatch {
                at: pc,
                predicted,
                emitted,
            });
        }
    }

    debug!("encoded {} bytes", buf.len());
    Ok(buf)
}
