//! Main execution loop and opcode dispatch for the CVM interpreter.

use std::io::Write;

use crate::error::RuntimeError;
use crate::machine::{MAX_CALL_DEPTH, VM};
use cvm_common::{Instruction, Register, REGISTER_COUNT};

impl<W: Write> VM<W> {
    /// Execute from pc 0 until HALT or error, returning the final registers.
    pub fn execute(&mut self) -> Result<[i32; REGISTER_COUNT], RuntimeError> {
        loop {
            let instr = self.fetch()?;
            let next = self.pc + instr.width();

            match instr {
                // VM control
                Instruction::Halt => return Ok(self.registers),
                Instruction::Display(r) => self.exec_display(r)?,
                Instruction::PrintStack(n) => self.exec_print_stack(n)?,

                // Stack and registers
                Instruction::Push(r) => self.push(self.registers[r.index()])?,
                Instruction::Pop(r) => {
                    let value = self.pop()?;
                    self.registers[r.index()] = value;
                }
                Instruction::Mov(r, imm) => self.registers[r.index()] = imm,

                // Control flow
                Instruction::Call(target) => {
                    if self.call_stack.len() >= MAX_CALL_DEPTH {
                        return Err(RuntimeError::CallDepthExceeded { at: self.pc });
                    }
                    self.call_stack.push(next);
                    self.jump(target)?;
                    continue;
                }
                Instruction::Ret => {
                    self.pc = self
                        .call_stack
                        .pop()
                        .ok_or(RuntimeError::ReturnWithoutCall { at: self.pc })?;
                    continue;
                }
                Instruction::Jmp(target) => {
                    self.jump(target)?;
                    continue;
                }
                Instruction::Jz(target) => {
                    if self.exec_test(|v| v == 0)? {
                        self.jump(target)?;
                        continue;
                    }
                }
                Instruction::Jpos(target) => {
                    if self.exec_test(|v| v > 0)? {
                        self.jump(target)?;
                        continue;
                    }
                }
                Instruction::Jneg(target) => {
                    if self.exec_test(|v| v < 0)? {
                        self.jump(target)?;
                        continue;
                    }
                }

                // Arithmetic: push the result, never write a register.
                Instruction::Add(a, b) => self.exec_binary_arith(a, b, i32::wrapping_add)?,
                Instruction::Sub(a, b) => self.exec_binary_arith(a, b, i32::wrapping_sub)?,
                Instruction::Mul(a, b) => self.exec_binary_arith(a, b, i32::wrapping_mul)?,
                Instruction::Div(a, b) => self.exec_div(a, b)?,
            }

            self.pc = next;
        }
    }

    fn exec_display(&mut self, r: Register) -> Result<(), RuntimeError> {
        let value = self.registers[r.index()];
        writeln!(self.out, "{value}").map_err(|e| RuntimeError::Output(e.to_string()))
    }

    /// Dump up to `count` operand stack words, top first.
    fn exec_print_stack(&mut self, count: i32) -> Result<(), RuntimeError> {
        let count = usize::try_from(count).unwrap_or(0);
        for (i, value) in self.stack.iter().rev().take(count).enumerate() {
            writeln!(self.out, "[{i}] {value}").map_err(|e| RuntimeError::Output(e.to_string()))?;
        }
        Ok(())
    }

    fn exec_test(&mut self, taken: impl Fn(i32) -> bool) -> Result<bool, RuntimeError> {
        let value = self.pop()?;
        Ok(taken(value))
    }

    fn exec_binary_arith(
        &mut self,
        a: Register,
        b: Register,
        op: impl Fn(i32, i32) -> i32,
    ) -> Result<(), RuntimeError> {
        let result = op(self.registers[a.index()], self.registers[b.index()]);
        self.push(result)
    }

    fn exec_div(&mut self, a: Register, b: Register) -> Result<(), RuntimeError> {
        let dividend = self.registers[a.index()];
        let divisor = self.registers[b.index()];

        if divisor == 0 {
            return Err(RuntimeError::DivisionByZero { at: self.pc });
        }
        let quotient = dividend
            .checked_div(divisor)
            .ok_or(RuntimeError::DivisionOverflow { at: self.pc })?;

        self.push(quotient)
    }
}
