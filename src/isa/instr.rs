//! 定义指令标识、编码格式与解码记录，用于解码、执行和反汇编

use std::fmt;

/// 指令编码格式
///
/// 决定执行阶段使用哪一个立即数以及如何更新 PC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Unknown,
    R,
    I,
    S,
    B,
    U,
    J,
}

/// RV32I 子集的指令助记符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Instruction {
    /// 无法识别的编码
    #[default]
    Unknown,

    // ========== R-type ==========
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,

    // ========== I-type 立即数运算 ==========
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,

    // ========== Load ==========
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,

    // ========== Store ==========
    Sb,
    Sh,
    Sw,

    // ========== Branch ==========
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,

    // ========== U/J-type 与跳转 ==========
    Lui,
    Auipc,
    Jal,
    Jalr,
}

impl Instruction {
    /// 小写助记符
    pub fn mnemonic(self) -> &'static str {
        use Instruction::*;
        match self {
            Unknown => "unknown",
            Add => "add",
            Sub => "sub",
            Sll => "sll",
            Slt => "slt",
            Sltu => "sltu",
            Xor => "xor",
            Srl => "srl",
            Sra => "sra",
            Or => "or",
            And => "and",
            Addi => "addi",
            Slti => "slti",
            Sltiu => "sltiu",
            Xori => "xori",
            Ori => "ori",
            Andi => "andi",
            Slli => "slli",
            Srli => "srli",
            Srai => "srai",
            Lb => "lb",
            Lh => "lh",
            Lw => "lw",
            Lbu => "lbu",
            Lhu => "lhu",
            Sb => "sb",
            Sh => "sh",
            Sw => "sw",
            Beq => "beq",
            Bne => "bne",
            Blt => "blt",
            Bge => "bge",
            Bltu => "bltu",
            Bgeu => "bgeu",
            Lui => "lui",
            Auipc => "auipc",
            Jal => "jal",
            Jalr => "jalr",
        }
    }

    /// 指令所属的编码格式
    pub fn format(self) -> Format {
        use Instruction::*;
        match self {
            Unknown => Format::Unknown,
            Add | Sub | Sll | Slt | Sltu | Xor | Srl | Sra | Or | And => Format::R,
            Addi | Slti | Sltiu | Xori | Ori | Andi | Slli | Srli | Srai => Format::I,
            Lb | Lh | Lw | Lbu | Lhu | Jalr => Format::I,
            Sb | Sh | Sw => Format::S,
            Beq | Bne | Blt | Bge | Bltu | Bgeu => Format::B,
            Lui | Auipc => Format::U,
            Jal => Format::J,
        }
    }

    /// 立即数移位指令，反汇编时只显示 shamt
    fn is_shift_imm(self) -> bool {
        matches!(self, Instruction::Slli | Instruction::Srli | Instruction::Srai)
    }

    /// 以 `imm(base)` 形式寻址的 I-type 指令
    fn is_based_addressing(self) -> bool {
        use Instruction::*;
        matches!(self, Lb | Lh | Lw | Lbu | Lhu | Jalr)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// 已解码的指令
///
/// 解码阶段一次性提取全部字段并计算五种立即数，
/// 执行阶段按 `format` 选用对应的立即数。
/// `instr`/`format` 只取决于 opcode、funct3 和 funct7。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodedInstr {
    /// 原始 32-bit 指令编码（体系结构字节序）
    pub raw: u32,
    pub opcode: u8,
    pub funct3: u8,
    pub funct7: u8,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    /// 12 位，符号扩展
    pub imm_i: i32,
    /// 12 位，符号扩展
    pub imm_s: i32,
    /// 13 位，符号扩展，字节偏移
    pub imm_b: i32,
    /// 高 20 位，低 12 位为 0
    pub imm_u: u32,
    /// 21 位，符号扩展，字节偏移
    pub imm_j: i32,
    pub instr: Instruction,
    pub format: Format,
}

impl DecodedInstr {
    /// 是否为可执行的已知指令
    pub fn is_known(&self) -> bool {
        self.instr != Instruction::Unknown && self.format != Format::Unknown
    }
}

/// 反汇编文本，仅用于跟踪输出
impl fmt::Display for DecodedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.instr.mnemonic();
        match self.format {
            Format::R => write!(f, "{name} x{},x{},x{}", self.rd, self.rs1, self.rs2),
            Format::I if self.instr.is_shift_imm() => {
                write!(f, "{name} x{},x{},{}", self.rd, self.rs1, self.imm_i & 0x1F)
            }
            Format::I if self.instr.is_based_addressing() => {
                write!(f, "{name} x{},({})x{}", self.rd, self.imm_i, self.rs1)
            }
            Format::I => write!(f, "{name} x{},x{},{}", self.rd, self.rs1, self.imm_i),
            Format::S => write!(f, "{name} x{},({})x{}", self.rs2, self.imm_s, self.rs1),
            Format::B => write!(f, "{name} x{},x{},{}", self.rs1, self.rs2, self.imm_b),
            Format::U => write!(
                f,
                "{name} x{},0x{:05X} # 0x{:08X}",
                self.rd,
                self.imm_u >> 12,
                self.imm_u
            ),
            Format::J => write!(f, "{name} x{},{}", self.rd, self.imm_j),
            Format::Unknown => write!(f, "unknown 0x{:08x}", self.raw),
        }
    }
}
