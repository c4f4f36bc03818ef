//! RISC-V RV32I 子集的 ISA 抽象与解码
//!
//! - `Instruction` / `Format`: 指令标识与编码格式
//! - `DecodedInstr`: 一次性提取全部字段的解码记录
//! - `InstrDef`: 统一的指令定义，同时用于解码和冲突检测
//! - `RV32I_INSTRS`: 表驱动解码使用的定义表

mod instr;
mod fields;
mod instr_def;
mod rv32i;

pub use instr::{DecodedInstr, Format, Instruction};
pub use fields::*;
pub use instr_def::{InstrDef, find_conflicts, lookup};
pub use rv32i::RV32I_INSTRS;

/// 解码一条 32-bit 指令（体系结构字节序）
///
/// 所有字段与五种立即数无论格式如何都会被计算；
/// 无法识别的编码得到 `Instruction::Unknown` / `Format::Unknown`，不会报错。
pub fn decode(raw: u32) -> DecodedInstr {
    let (instr, format) = match lookup(RV32I_INSTRS, raw) {
        Some(def) => (def.instr, def.format()),
        None => (Instruction::Unknown, Format::Unknown),
    };

    DecodedInstr {
        raw,
        opcode: fields::opcode(raw),
        funct3: fields::funct3(raw),
        funct7: fields::funct7(raw),
        rd: fields::rd(raw),
        rs1: fields::rs1(raw),
        rs2: fields::rs2(raw),
        imm_i: fields::imm_i(raw),
        imm_s: fields::imm_s(raw),
        imm_b: fields::imm_b(raw),
        imm_u: fields::imm_u(raw),
        imm_j: fields::imm_j(raw),
        instr,
        format,
    }
}
