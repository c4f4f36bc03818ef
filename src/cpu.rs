//! CPU 核心：虚拟机与执行引擎
//!
//! 本模块定义了单线程 RV32I 子集虚拟机 `VirtualMachine`，
//! 包含寄存器文件、程序计数器、停机状态以及对数据内存的所有权。

use crate::bits::reverse_endian;
use crate::isa::{self, DecodedInstr};
use crate::memory::WordMemory;

mod exu;
pub mod regs;

pub use exu::{ExecError, execute};
pub use regs::{GenericRegFile, NUM_REGS, RegisterFile, abi_name};

/// 虚拟机执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    /// 正常运行中
    Running,
    /// 取到全零指令字后停机
    Halted,
}

/// 虚拟机级别的致命错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    #[error("virtual machine is halted")]
    Halted,

    #[error("misaligned program counter 0x{pc:08x}")]
    MisalignedPc { pc: u32 },

    #[error("execution failed at pc 0x{pc:08x}")]
    Exec { pc: u32, source: ExecError },
}

pub type VmResult<T> = Result<T, VmError>;

/// 单线程虚拟机
///
/// 包含 RV32I 子集的最小状态：
/// - 16 个 32-bit 通用寄存器 x0..x15（x0 恒为 0）
/// - 32-bit 程序计数器，始终 4 字节对齐
/// - 运行/停机状态
///
/// 设计约定：
/// - 创建时 sp (x2) 预置为内存的字节容量（截断到 32 位，4 GiB 即为 0）
/// - PC 与状态只通过 `step` 改变（`set_pc` 供测试与加载器使用）
/// - 执行出错时 PC、状态保持不变
pub struct VirtualMachine<M: WordMemory> {
    regs: RegisterFile,
    memory: M,
    pc: u32,
    state: VmState,
    /// 已退休（成功执行）的指令数
    steps: u64,
}

impl<M: WordMemory> VirtualMachine<M> {
    /// 创建一个新的虚拟机
    ///
    /// # 示例
    ///
    /// ```
    /// use rv32i_sim::cpu::{VirtualMachine, VmState};
    /// use rv32i_sim::memory::FlatMemory;
    ///
    /// let vm = VirtualMachine::new(FlatMemory::new(4096), 0x100);
    /// assert_eq!(vm.pc(), 0x100);
    /// assert_eq!(vm.state(), VmState::Running);
    /// assert_eq!(vm.regs().read(2), 4096);
    /// ```
    pub fn new(memory: M, entry_pc: u32) -> Self {
        let mut regs = RegisterFile::new();
        regs.write(regs::SP, memory.size_in_bytes() as u32);
        VirtualMachine {
            regs,
            memory,
            pc: entry_pc,
            state: VmState::Running,
            steps: 0,
        }
    }

    /// 获取当前程序计数器值
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// 设置程序计数器
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == VmState::Halted
    }

    /// 已成功执行的指令数（停机哨兵不计入）
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// 取回内存，结束虚拟机
    pub fn into_memory(self) -> M {
        self.memory
    }

    /// 清空数据内存，寄存器与 PC 不变
    pub fn clear_memory(&mut self) {
        log::debug!("clearing memory ({} bytes)", self.memory.size_in_bytes());
        self.memory.clear();
    }

    /// 取指并转换为体系结构字节序
    fn fetch(&self, addr: u32) -> u32 {
        reverse_endian(self.memory.get_word(addr))
    }

    /// 执行单步指令
    ///
    /// # 流程
    ///
    /// 1. 检查 PC 对齐
    /// 2. 从 PC 处取指并翻转字节序
    /// 3. 指令字为 0 时停机，不做其他修改
    /// 4. 解码、执行，提交新的 PC
    ///
    /// # 返回
    ///
    /// 本步之后的状态；在已停机的虚拟机上调用返回 `VmError::Halted`
    pub fn step(&mut self) -> VmResult<VmState> {
        if self.state == VmState::Halted {
            return Err(VmError::Halted);
        }

        let pc = self.pc;
        if !pc.is_multiple_of(4) {
            return Err(VmError::MisalignedPc { pc });
        }

        let raw = self.fetch(pc);
        if raw == 0 {
            log::debug!("halted at pc 0x{pc:08x} after {} instructions", self.steps);
            self.state = VmState::Halted;
            return Ok(self.state);
        }

        let decoded = isa::decode(raw);
        log::trace!("0x{pc:08x}: {raw:08x}  {decoded}");

        let next_pc = exu::execute(&decoded, &mut self.regs, Some(&mut self.memory), pc)
            .map_err(|source| VmError::Exec { pc, source })?;

        self.pc = next_pc;
        self.steps += 1;
        Ok(self.state)
    }

    /// 运行最多 `max_steps` 条指令
    ///
    /// # 返回
    ///
    /// 本次执行的指令数和最终状态
    ///
    /// # 停止条件
    ///
    /// - 达到最大指令数
    /// - 取到全零指令字（停机）
    /// - 任何致命错误
    pub fn run(&mut self, max_steps: u64) -> VmResult<(u64, VmState)> {
        let mut executed = 0;
        while executed < max_steps {
            if self.step()? == VmState::Halted {
                break;
            }
            executed += 1;
        }
        Ok((executed, self.state))
    }

    /// 解码 `addr` 处的指令
    pub fn decode_at(&self, addr: u32) -> DecodedInstr {
        isa::decode(self.fetch(addr))
    }

    /// 反汇编 PC 前后若干条指令，当前 PC 所在行以 `=>` 标记
    pub fn disassemble_around_pc(&self, before: u32, after: u32) -> Vec<String> {
        let first = self.pc.saturating_sub(before.saturating_mul(4));
        let last = self.pc.saturating_add(after.saturating_mul(4));
        (first..=last)
            .step_by(4)
            .map(|addr| {
                let marker = if addr == self.pc { "=>" } else { "  " };
                let decoded = self.decode_at(addr);
                format!("{marker} 0x{addr:08x}: {:08x}  {decoded}", decoded.raw)
            })
            .collect()
    }
}
