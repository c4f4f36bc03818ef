//! RV32I 基础指令集定义表
//!
//! 基于表驱动的解码实现

use crate::isa::fields::*;
use crate::isa::instr::Instruction;
use crate::isa::instr_def::{
    InstrDef,
    R_TYPE_MASK, I_TYPE_MASK, S_TYPE_MASK, B_TYPE_MASK,
    U_TYPE_MASK, J_TYPE_MASK, SHIFT_IMM_MASK,
    r_match, i_match,
};

/// RV32I 指令定义表
pub static RV32I_INSTRS: &[InstrDef] = &[
    // ========== U-type ==========
    InstrDef::new(Instruction::Lui, U_TYPE_MASK, OP_LUI),
    InstrDef::new(Instruction::Auipc, U_TYPE_MASK, OP_AUIPC),

    // ========== J-type ==========
    InstrDef::new(Instruction::Jal, J_TYPE_MASK, OP_JAL),

    // ========== I-type (JALR) ==========
    InstrDef::new(Instruction::Jalr, I_TYPE_MASK, i_match(0b000, OP_JALR)),

    // ========== B-type ==========
    InstrDef::new(Instruction::Beq, B_TYPE_MASK, i_match(0b000, OP_BRANCH)),
    InstrDef::new(Instruction::Bne, B_TYPE_MASK, i_match(0b001, OP_BRANCH)),
    InstrDef::new(Instruction::Blt, B_TYPE_MASK, i_match(0b100, OP_BRANCH)),
    InstrDef::new(Instruction::Bge, B_TYPE_MASK, i_match(0b101, OP_BRANCH)),
    InstrDef::new(Instruction::Bltu, B_TYPE_MASK, i_match(0b110, OP_BRANCH)),
    InstrDef::new(Instruction::Bgeu, B_TYPE_MASK, i_match(0b111, OP_BRANCH)),

    // ========== Load ==========
    InstrDef::new(Instruction::Lb, I_TYPE_MASK, i_match(0b000, OP_LOAD)),
    InstrDef::new(Instruction::Lh, I_TYPE_MASK, i_match(0b001, OP_LOAD)),
    InstrDef::new(Instruction::Lw, I_TYPE_MASK, i_match(0b010, OP_LOAD)),
    InstrDef::new(Instruction::Lbu, I_TYPE_MASK, i_match(0b100, OP_LOAD)),
    InstrDef::new(Instruction::Lhu, I_TYPE_MASK, i_match(0b101, OP_LOAD)),

    // ========== Store ==========
    InstrDef::new(Instruction::Sb, S_TYPE_MASK, i_match(0b000, OP_STORE)),
    InstrDef::new(Instruction::Sh, S_TYPE_MASK, i_match(0b001, OP_STORE)),
    InstrDef::new(Instruction::Sw, S_TYPE_MASK, i_match(0b010, OP_STORE)),

    // ========== I-type ALU ==========
    InstrDef::new(Instruction::Addi, I_TYPE_MASK, i_match(0b000, OP_IMM)),
    InstrDef::new(Instruction::Slti, I_TYPE_MASK, i_match(0b010, OP_IMM)),
    InstrDef::new(Instruction::Sltiu, I_TYPE_MASK, i_match(0b011, OP_IMM)),
    InstrDef::new(Instruction::Xori, I_TYPE_MASK, i_match(0b100, OP_IMM)),
    InstrDef::new(Instruction::Ori, I_TYPE_MASK, i_match(0b110, OP_IMM)),
    InstrDef::new(Instruction::Andi, I_TYPE_MASK, i_match(0b111, OP_IMM)),

    // ========== Shift immediate ==========
    InstrDef::new(Instruction::Slli, SHIFT_IMM_MASK, r_match(0b0000000, 0b001, OP_IMM)),
    InstrDef::new(Instruction::Srli, SHIFT_IMM_MASK, r_match(0b0000000, 0b101, OP_IMM)),
    InstrDef::new(Instruction::Srai, SHIFT_IMM_MASK, r_match(0b0100000, 0b101, OP_IMM)),

    // ========== R-type ==========
    InstrDef::new(Instruction::Add, R_TYPE_MASK, r_match(0b0000000, 0b000, OP_REG)),
    InstrDef::new(Instruction::Sub, R_TYPE_MASK, r_match(0b0100000, 0b000, OP_REG)),
    InstrDef::new(Instruction::Sll, R_TYPE_MASK, r_match(0b0000000, 0b001, OP_REG)),
    InstrDef::new(Instruction::Slt, R_TYPE_MASK, r_match(0b0000000, 0b010, OP_REG)),
    InstrDef::new(Instruction::Sltu, R_TYPE_MASK, r_match(0b0000000, 0b011, OP_REG)),
    InstrDef::new(Instruction::Xor, R_TYPE_MASK, r_match(0b0000000, 0b100, OP_REG)),
    InstrDef::new(Instruction::Srl, R_TYPE_MASK, r_match(0b0000000, 0b101, OP_REG)),
    InstrDef::new(Instruction::Sra, R_TYPE_MASK, r_match(0b0100000, 0b101, OP_REG)),
    InstrDef::new(Instruction::Or, R_TYPE_MASK, r_match(0b0000000, 0b110, OP_REG)),
    InstrDef::new(Instruction::And, R_TYPE_MASK, r_match(0b0000000, 0b111, OP_REG)),
];
