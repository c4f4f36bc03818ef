//! Execution unit for the RV32I subset.
//!
//! `execute` applies one decoded instruction to the register file and
//! (for loads/stores) data memory, and returns the next PC. It never keeps
//! a reference to either.

use super::regs::RegisterFile;
use crate::bits::{
    reverse_endian, reverse_endian_half, shift_right_arithmetic, sign_extend, signed_less_than,
    unsigned_less_than,
};
use crate::isa::{DecodedInstr, Format, Instruction};
use crate::memory::{byte_shift, MemError, WordMemory};

/// Fatal conditions raised while executing a single instruction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    #[error("unknown instruction 0x{raw:08x}")]
    UnknownInstruction { raw: u32 },

    #[error("`{instr}` cannot be executed as a {format:?}-format instruction")]
    FormatMismatch { instr: Instruction, format: Format },

    #[error("`{instr}` accesses memory but no memory was supplied")]
    MissingMemory { instr: Instruction },

    #[error("register x{reg} is not modeled")]
    RegisterOutOfRange { reg: u8 },

    #[error(transparent)]
    Memory(#[from] MemError),
}

/// Execute one decoded instruction at `pc`, returning the next PC.
///
/// Source registers are read before `rd` is written, so `rd == rs1`/`rs2`
/// is well defined.
pub fn execute(
    decoded: &DecodedInstr,
    regs: &mut RegisterFile,
    memory: Option<&mut dyn WordMemory>,
    pc: u32,
) -> Result<u32, ExecError> {
    validate(decoded)?;

    let instr = decoded.instr;
    let mismatch = ExecError::FormatMismatch {
        instr,
        format: decoded.format,
    };
    let a = regs.read(decoded.rs1);
    let b = regs.read(decoded.rs2);
    let next_pc = pc.wrapping_add(4);

    match decoded.format {
        Format::R => {
            regs.write(decoded.rd, alu(instr, a, b).ok_or(mismatch)?);
            Ok(next_pc)
        }
        Format::I => match instr {
            Instruction::Lb | Instruction::Lh | Instruction::Lw | Instruction::Lbu | Instruction::Lhu => {
                let addr = a.wrapping_add(decoded.imm_i as u32);
                let Some(mem) = memory else {
                    return Err(ExecError::MissingMemory { instr });
                };
                regs.write(decoded.rd, load(instr, &*mem, addr));
                Ok(next_pc)
            }
            Instruction::Jalr => {
                let target = a.wrapping_add(decoded.imm_i as u32) & !1;
                regs.write(decoded.rd, next_pc);
                Ok(target)
            }
            _ => {
                regs.write(decoded.rd, alu(instr, a, decoded.imm_i as u32).ok_or(mismatch)?);
                Ok(next_pc)
            }
        },
        Format::S => {
            let addr = a.wrapping_add(decoded.imm_s as u32);
            let Some(mem) = memory else {
                return Err(ExecError::MissingMemory { instr });
            };
            store(instr, mem, addr, b)?;
            Ok(next_pc)
        }
        Format::B => {
            if branch_taken(instr, a, b).ok_or(mismatch)? {
                Ok(pc.wrapping_add(decoded.imm_b as u32))
            } else {
                Ok(next_pc)
            }
        }
        Format::U => {
            let value = match instr {
                Instruction::Auipc => decoded.imm_u.wrapping_add(pc),
                _ => decoded.imm_u,
            };
            regs.write(decoded.rd, value);
            Ok(next_pc)
        }
        Format::J => {
            regs.write(decoded.rd, next_pc);
            Ok(pc.wrapping_add(decoded.imm_j as u32))
        }
        Format::Unknown => Err(ExecError::UnknownInstruction { raw: decoded.raw }),
    }
}

/// Reject records that must not reach the datapath.
fn validate(decoded: &DecodedInstr) -> Result<(), ExecError> {
    if !decoded.is_known() {
        return Err(ExecError::UnknownInstruction { raw: decoded.raw });
    }
    if decoded.instr.format() != decoded.format {
        return Err(ExecError::FormatMismatch {
            instr: decoded.instr,
            format: decoded.format,
        });
    }

    let used: &[u8] = match decoded.format {
        Format::R => &[decoded.rd, decoded.rs1, decoded.rs2],
        Format::I => &[decoded.rd, decoded.rs1],
        Format::S | Format::B => &[decoded.rs1, decoded.rs2],
        Format::U | Format::J => &[decoded.rd],
        Format::Unknown => &[],
    };
    match used.iter().find(|&&reg| !RegisterFile::contains(reg)) {
        Some(&reg) => Err(ExecError::RegisterOutOfRange { reg }),
        None => Ok(()),
    }
}

/// Register/immediate arithmetic. Shift amounts use the low 5 bits of `b`.
///
/// `None` for instructions that are not ALU operations.
fn alu(instr: Instruction, a: u32, b: u32) -> Option<u32> {
    use Instruction::*;
    let value = match instr {
        Add | Addi => a.wrapping_add(b),
        Sub => a.wrapping_sub(b),
        Sll | Slli => a << (b & 0x1F),
        Srl | Srli => a >> (b & 0x1F),
        Sra | Srai => shift_right_arithmetic(a, b),
        Slt | Slti => signed_less_than(a, b) as u32,
        Sltu | Sltiu => unsigned_less_than(a, b) as u32,
        Xor | Xori => a ^ b,
        Or | Ori => a | b,
        And | Andi => a & b,
        _ => return None,
    };
    Some(value)
}

fn branch_taken(instr: Instruction, a: u32, b: u32) -> Option<bool> {
    use Instruction::*;
    let taken = match instr {
        Beq => a == b,
        Bne => a != b,
        Blt => signed_less_than(a, b),
        Bge => !signed_less_than(a, b),
        Bltu => unsigned_less_than(a, b),
        Bgeu => !unsigned_less_than(a, b),
        _ => return None,
    };
    Some(taken)
}

// ========== 访存：存储字中按 (3 - (addr & 3)) / (2 - (addr & 2)) 选择字节/半字 ==========

#[inline]
fn half_shift(addr: u32) -> u32 {
    (2 - (addr & 2)) * 8
}

fn load(instr: Instruction, mem: &dyn WordMemory, addr: u32) -> u32 {
    let word = mem.get_word(addr);
    match instr {
        Instruction::Lb => sign_extend((word >> byte_shift(addr)) & 0xFF, 7),
        Instruction::Lbu => (word >> byte_shift(addr)) & 0xFF,
        Instruction::Lh => {
            let half = reverse_endian_half((word >> half_shift(addr)) as u16);
            sign_extend(half as u32, 15)
        }
        Instruction::Lhu => reverse_endian_half((word >> half_shift(addr)) as u16) as u32,
        _ => reverse_endian(word),
    }
}

fn store(instr: Instruction, mem: &mut dyn WordMemory, addr: u32, value: u32) -> Result<(), MemError> {
    let word = match instr {
        Instruction::Sb => {
            let shift = byte_shift(addr);
            (mem.get_word(addr) & !(0xFF << shift)) | ((value & 0xFF) << shift)
        }
        Instruction::Sh => {
            let shift = half_shift(addr);
            let half = reverse_endian_half(value as u16) as u32;
            (mem.get_word(addr) & !(0xFFFF << shift)) | (half << shift)
        }
        _ => reverse_endian(value),
    };
    mem.set_word(addr, word)
}
