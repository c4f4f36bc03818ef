//! rv32i_sim: RV32I 子集单线程指令集仿真库
//!
//! 本库实现了一个 RV32I 整数指令子集的仿真引擎：
//! 取指、解码、执行，寄存器文件与可寻址的字内存。
//!
//! # 模块结构
//!
//! - `bits`: 位域工具（掩码、符号扩展、字节序翻转、比较与移位）
//! - `isa`: RISC-V 指令定义、解码与反汇编
//! - `cpu`: 虚拟机、寄存器文件与执行引擎
//! - `memory`: 字内存抽象（稠密/稀疏实现、镜像文本格式）
//! - `sim_env`: 仿真环境（配置、ELF/镜像加载、有界运行）

pub mod bits;
pub mod cpu;
pub mod isa;
pub mod memory;
pub mod sim_env;

#[cfg(test)]
mod test_utils;
