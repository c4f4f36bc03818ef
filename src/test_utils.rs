//! 测试辅助：RV32I 指令编码器与写入工具
//!
//! 编码器按体系结构字节序生成指令字；`write_instr` 负责转换为存储序后写入。

use crate::bits::reverse_endian;
use crate::isa::{OP_BRANCH, OP_IMM, OP_JAL, OP_JALR, OP_LOAD, OP_REG, OP_STORE};
use crate::memory::WordMemory;

pub fn enc_r(funct7: u32, rs2: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    (funct7 << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

pub fn enc_i(imm: i32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
    (((imm as u32) & 0xFFF) << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

pub fn enc_s(imm: i32, rs2: u32, rs1: u32, funct3: u32, opcode: u32) -> u32 {
    let u = imm as u32;
    (((u >> 5) & 0x7F) << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | ((u & 0x1F) << 7) | opcode
}

pub fn enc_b(imm: i32, rs2: u32, rs1: u32, funct3: u32, opcode: u32) -> u32 {
    let u = imm as u32;
    (((u >> 12) & 1) << 31)
        | (((u >> 5) & 0x3F) << 25)
        | (rs2 << 20)
        | (rs1 << 15)
        | (funct3 << 12)
        | (((u >> 1) & 0xF) << 8)
        | (((u >> 11) & 1) << 7)
        | opcode
}

pub fn enc_u(upper20: u32, rd: u32, opcode: u32) -> u32 {
    ((upper20 & 0xF_FFFF) << 12) | (rd << 7) | opcode
}

pub fn enc_j(imm: i32, rd: u32, opcode: u32) -> u32 {
    let u = imm as u32;
    (((u >> 20) & 1) << 31)
        | (((u >> 1) & 0x3FF) << 21)
        | (((u >> 11) & 1) << 20)
        | (((u >> 12) & 0xFF) << 12)
        | (rd << 7)
        | opcode
}

// ========== 常用指令的便捷编码 ==========

pub fn add(rd: u32, rs1: u32, rs2: u32) -> u32 {
    enc_r(0, rs2, rs1, 0b000, rd, OP_REG)
}

pub fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    enc_i(imm, rs1, 0b000, rd, OP_IMM)
}

pub fn lw(rd: u32, rs1: u32, imm: i32) -> u32 {
    enc_i(imm, rs1, 0b010, rd, OP_LOAD)
}

pub fn sw(rs2: u32, rs1: u32, imm: i32) -> u32 {
    enc_s(imm, rs2, rs1, 0b010, OP_STORE)
}

pub fn bne(rs1: u32, rs2: u32, imm: i32) -> u32 {
    enc_b(imm, rs2, rs1, 0b001, OP_BRANCH)
}

pub fn jal(rd: u32, imm: i32) -> u32 {
    enc_j(imm, rd, OP_JAL)
}

pub fn jalr(rd: u32, rs1: u32, imm: i32) -> u32 {
    enc_i(imm, rs1, 0b000, rd, OP_JALR)
}

/// 将体系结构序的指令字按存储序写入 `addr`
pub fn write_instr<M: WordMemory + ?Sized>(mem: &mut M, addr: u32, word: u32) {
    mem.set_word(addr, reverse_endian(word))
        .expect("instruction address should be in range");
}

/// 从 `base` 开始连续写入一段程序
pub fn write_program<M: WordMemory + ?Sized>(mem: &mut M, base: u32, program: &[u32]) {
    for (i, &word) in program.iter().enumerate() {
        write_instr(mem, base + (i as u32) * 4, word);
    }
}
