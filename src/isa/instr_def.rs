//! 指令定义结构
//!
//! 统一的指令定义，同时用于解码和冲突检测

use super::instr::{Format, Instruction};

/// 指令定义
///
/// 一处定义，两处使用：
/// - 解码：通过 mask/match 匹配后得到指令标识
/// - 冲突检测：通过 mask/match 判断两条指令是否可能冲突
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct InstrDef {
    /// 指令标识
    pub instr: Instruction,
    /// 匹配掩码：哪些位需要检查
    pub mask: u32,
    /// 匹配值：这些位应该是什么
    pub match_val: u32,
}

impl InstrDef {
    /// 创建新的指令定义
    pub const fn new(instr: Instruction, mask: u32, match_val: u32) -> Self {
        Self {
            instr,
            mask,
            match_val,
        }
    }

    /// 检查指令是否匹配此定义
    #[inline]
    pub fn matches(&self, raw: u32) -> bool {
        (raw & self.mask) == self.match_val
    }

    /// 指令的编码格式
    #[inline]
    pub fn format(&self) -> Format {
        self.instr.format()
    }

    /// 检查两个指令定义是否冲突
    ///
    /// 两个定义冲突当且仅当存在某个指令字同时匹配两者
    pub fn conflicts_with(&self, other: &InstrDef) -> bool {
        let common_mask = self.mask & other.mask;
        (self.match_val & common_mask) == (other.match_val & common_mask)
    }
}

impl std::fmt::Debug for InstrDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrDef")
            .field("instr", &self.instr)
            .field("mask", &format_args!("0x{:08X}", self.mask))
            .field("match_val", &format_args!("0x{:08X}", self.match_val))
            .finish()
    }
}

/// 在定义表中查找第一条匹配的定义
pub fn lookup(table: &[InstrDef], raw: u32) -> Option<&InstrDef> {
    table.iter().find(|def| def.matches(raw))
}

/// 列出定义表中所有互相冲突的定义对
pub fn find_conflicts(table: &[InstrDef]) -> Vec<(Instruction, Instruction)> {
    let mut conflicts = Vec::new();
    for (i, a) in table.iter().enumerate() {
        for b in &table[i + 1..] {
            if a.conflicts_with(b) {
                conflicts.push((a.instr, b.instr));
            }
        }
    }
    conflicts
}

// ========== 类型掩码常量 ==========

/// R-type 指令的 mask（检查 opcode + funct3 + funct7）
pub const R_TYPE_MASK: u32 = 0xFE00707F;

/// I-type 指令的 mask（检查 opcode + funct3）
pub const I_TYPE_MASK: u32 = 0x707F;

/// S-type 指令的 mask（检查 opcode + funct3）
pub const S_TYPE_MASK: u32 = 0x707F;

/// B-type 指令的 mask（检查 opcode + funct3）
pub const B_TYPE_MASK: u32 = 0x707F;

/// U-type 指令的 mask（只检查 opcode）
pub const U_TYPE_MASK: u32 = 0x7F;

/// J-type 指令的 mask（只检查 opcode）
pub const J_TYPE_MASK: u32 = 0x7F;

/// Shift-imm 指令的 mask（RV32 的 shamt 只有 5 位，funct7 全部参与匹配）
pub const SHIFT_IMM_MASK: u32 = 0xFE00707F;

/// 所有定义只会检查这些位：opcode、funct3、funct7
pub const CLASSIFY_MASK: u32 = 0xFE00707F;

// ========== 辅助函数：构造 match 值 ==========

/// 构造 R-type（以及 shift-imm）的 match 值
#[inline]
pub const fn r_match(funct7: u32, funct3: u32, opcode: u32) -> u32 {
    (funct7 << 25) | (funct3 << 12) | opcode
}

/// 构造 I/S/B-type 的 match 值
#[inline]
pub const fn i_match(funct3: u32, opcode: u32) -> u32 {
    (funct3 << 12) | opcode
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::rv32i::RV32I_INSTRS;

    fn def_of(instr: Instruction) -> &'static InstrDef {
        RV32I_INSTRS
            .iter()
            .find(|d| d.instr == instr)
            .expect("instruction should be defined")
    }

    #[test]
    fn test_instr_def_matches() {
        let add_def = def_of(Instruction::Add);

        // add x3, x1, x2: funct7=0, rs2=2, rs1=1, funct3=0, rd=3, op=0110011
        let add_raw = 0x002081B3;
        assert!(add_def.matches(add_raw));

        // sub x3, x1, x2: funct7=0100000
        let sub_raw = 0x402081B3;
        assert!(!add_def.matches(sub_raw));
        assert!(def_of(Instruction::Sub).matches(sub_raw));
    }

    #[test]
    fn test_lookup() {
        let def = lookup(RV32I_INSTRS, 0x02A00093).expect("addi x1, x0, 42");
        assert_eq!(def.instr, Instruction::Addi);
        assert_eq!(def.format(), Format::I);
        assert!(lookup(RV32I_INSTRS, 0x0000_0000).is_none());
    }

    #[test]
    fn test_conflict_detection() {
        let def1 = InstrDef::new(Instruction::Addi, I_TYPE_MASK, 0x0013);
        let def2 = InstrDef::new(Instruction::Slli, SHIFT_IMM_MASK, r_match(0, 0b000, 0x13));
        assert!(def1.conflicts_with(&def2));

        let srli = def_of(Instruction::Srli);
        let srai = def_of(Instruction::Srai);
        assert!(!srli.conflicts_with(srai));
    }

    #[test]
    fn test_rv32i_table_conflict_free() {
        assert!(find_conflicts(RV32I_INSTRS).is_empty());
    }

    #[test]
    fn test_rv32i_coverage() {
        assert_eq!(RV32I_INSTRS.len(), 37, "RV32I 子集应该有 37 条指令");
    }

    #[test]
    fn test_masks_only_cover_classifying_fields() {
        for def in RV32I_INSTRS {
            assert_eq!(def.mask & !CLASSIFY_MASK, 0, "{:?}", def);
            assert_eq!(def.match_val & !def.mask, 0, "{:?}", def);
        }
    }
}
