//! 仿真环境初始化模块
//!
//! 本模块负责：
//! - 读取并校验仿真配置
//! - 解析 ELF 文件或内存镜像文本
//! - 初始化内存和虚拟机
//! - 将程序加载到内存并按步数上限运行
//!
//! # 示例
//!
//! ```no_run
//! use rv32i_sim::sim_env::{SimConfig, SimEnv};
//!
//! let config = SimConfig::default()
//!     .with_image_path("program.hex")
//!     .with_memory_size(64 * 1024)
//!     .with_max_steps(10_000);
//!
//! let mut env = SimEnv::from_config(config).expect("Failed to create sim env");
//! let outcome = env.run_until_halt().expect("program faulted");
//! println!("{} steps, {:?}", outcome.steps, outcome.state);
//! ```

use std::fs;
use std::io;
use std::path::Path;

use elf::abi::{EM_RISCV, PF_W, PF_X, PT_LOAD};
use elf::endian::AnyEndian;
use elf::ElfBytes;

use crate::cpu::{VirtualMachine, VmError, VmState};
use crate::memory::{FlatMemory, MemError, SparseMemory, WordMemory};

/// 32 位地址空间的字节数
const ADDRESS_SPACE: u64 = 1 << 32;

/// ELF 文件魔数
const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

/// 仿真环境错误
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("ELF parse error: {0}")]
    ElfParse(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Memory(#[from] MemError),

    #[error(transparent)]
    Vm(#[from] VmError),
}

/// 内存实现的选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryKind {
    /// 稠密数组
    #[default]
    Flat,
    /// 哈希表，只为写过的字分配存储
    Sparse,
}

/// 内存配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    pub kind: MemoryKind,
    /// 声明容量（字节）
    pub size: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            kind: MemoryKind::Flat,
            size: 64 * 1024, // 默认 64KB
        }
    }
}

impl MemoryConfig {
    pub fn flat(size: u64) -> Self {
        Self {
            kind: MemoryKind::Flat,
            size,
        }
    }

    /// 稀疏内存，默认覆盖完整的 4 GiB 地址空间
    pub fn sparse() -> Self {
        Self {
            kind: MemoryKind::Sparse,
            size: ADDRESS_SPACE,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.size > ADDRESS_SPACE {
            return Err(SimError::Config(format!(
                "memory size 0x{:x} exceeds the 32-bit address space",
                self.size
            )));
        }
        if self.kind == MemoryKind::Flat && self.size == 0 {
            return Err(SimError::Config("flat memory size must be non-zero".into()));
        }
        if !self.size.is_multiple_of(4) {
            return Err(SimError::Config(format!(
                "memory size {} must be a multiple of 4",
                self.size
            )));
        }
        Ok(())
    }

    /// 按配置创建内存
    pub fn build(&self) -> Result<Box<dyn WordMemory>, SimError> {
        self.validate()?;
        Ok(match self.kind {
            MemoryKind::Flat => {
                let words = usize::try_from(self.size / 4)
                    .map_err(|_| SimError::Config(format!("memory size 0x{:x} too large for host", self.size)))?;
                Box::new(FlatMemory::with_words(words))
            }
            MemoryKind::Sparse => Box::new(SparseMemory::with_capacity_bytes(self.size)),
        })
    }
}

/// 仿真配置
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    /// 内存镜像文本文件路径（可选）
    pub image_path: Option<String>,
    /// ELF 文件路径（可选，与 image_path 互斥）
    pub elf_path: Option<String>,
    /// 入口点 PC（默认取 ELF 入口，其次为镜像的首地址，否则为 0）
    pub entry_pc: Option<u32>,
    /// 内存配置
    pub memory: MemoryConfig,
    /// 最大执行指令数（0 表示无限制）
    pub max_steps: u64,
}

impl SimConfig {
    /// 创建新配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置内存镜像文件路径
    pub fn with_image_path(mut self, path: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    /// 设置 ELF 文件路径
    pub fn with_elf_path(mut self, path: impl Into<String>) -> Self {
        self.elf_path = Some(path.into());
        self
    }

    /// 设置入口 PC
    pub fn with_entry_pc(mut self, pc: u32) -> Self {
        self.entry_pc = Some(pc);
        self
    }

    /// 设置内存大小，保持当前内存类型
    pub fn with_memory_size(mut self, size: u64) -> Self {
        self.memory.size = size;
        self
    }

    /// 设置内存配置
    pub fn with_memory(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    /// 设置最大执行指令数
    pub fn with_max_steps(mut self, max: u64) -> Self {
        self.max_steps = max;
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.image_path.is_some() && self.elf_path.is_some() {
            return Err(SimError::Config(
                "image_path and elf_path are mutually exclusive".into(),
            ));
        }
        self.memory.validate()
    }
}

/// ELF 程序段信息
#[derive(Debug, Clone)]
pub struct ElfSegment {
    /// 虚拟地址
    pub vaddr: u32,
    /// 文件中的大小
    pub file_size: usize,
    /// 内存中的大小
    pub mem_size: usize,
    /// 段数据
    pub data: Vec<u8>,
    /// 是否可执行
    pub executable: bool,
    /// 是否可写
    pub writable: bool,
}

/// ELF 文件解析结果
#[derive(Debug, Clone)]
pub struct ElfInfo {
    /// 入口点地址
    pub entry: u32,
    /// 可加载段（PT_LOAD）
    pub segments: Vec<ElfSegment>,
    /// 机器类型（应为 RISC-V = 0xF3）
    pub machine: u16,
}

impl ElfInfo {
    /// 解析 ELF 文件
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let data = fs::read(path.as_ref())?;
        Self::parse_bytes(&data)
    }

    /// 从字节数组解析 ELF（使用 elf crate）
    ///
    /// 只接受 32 位小端序 RISC-V 文件
    pub fn parse_bytes(data: &[u8]) -> Result<Self, SimError> {
        let elf_file = ElfBytes::<AnyEndian>::minimal_parse(data)
            .map_err(|e| SimError::ElfParse(format!("Failed to parse ELF: {}", e)))?;

        let header = &elf_file.ehdr;

        if header.e_machine != EM_RISCV {
            return Err(SimError::ElfParse(format!(
                "Not a RISC-V ELF (machine type: 0x{:x}, expected 0x{:x})",
                header.e_machine, EM_RISCV
            )));
        }
        if header.class != elf::file::Class::ELF32 {
            return Err(SimError::ElfParse("Only 32-bit ELF is supported".into()));
        }
        if header.endianness != AnyEndian::Little {
            return Err(SimError::ElfParse("Only little-endian ELF is supported".into()));
        }

        let mut segments = Vec::new();
        if let Some(phdrs) = elf_file.segments() {
            for phdr in phdrs.iter().filter(|p| p.p_type == PT_LOAD) {
                let data = elf_file
                    .segment_data(&phdr)
                    .map_err(|e| SimError::ElfParse(format!("Failed to read segment data: {}", e)))?
                    .to_vec();

                segments.push(ElfSegment {
                    vaddr: phdr.p_vaddr as u32,
                    file_size: phdr.p_filesz as usize,
                    mem_size: phdr.p_memsz as usize,
                    data,
                    executable: (phdr.p_flags & PF_X) != 0,
                    writable: (phdr.p_flags & PF_W) != 0,
                });
            }
        }

        Ok(ElfInfo {
            entry: header.e_entry as u32,
            segments,
            machine: header.e_machine,
        })
    }

    /// 获取程序使用的最小和最大地址（半开区间）
    pub fn address_range(&self) -> Option<(u32, u64)> {
        let min_addr = self.segments.iter().map(|s| s.vaddr).min()?;
        let max_addr = self
            .segments
            .iter()
            .map(|s| s.vaddr as u64 + s.mem_size as u64)
            .max()?;
        Some((min_addr, max_addr))
    }
}

/// 按字节写入 ELF 段，`mem_size > file_size` 的部分（BSS）清零
pub fn load_segments<M: WordMemory + ?Sized>(memory: &mut M, segments: &[ElfSegment]) -> Result<(), SimError> {
    for seg in segments {
        let capacity = memory.size_in_bytes();
        let end = seg.vaddr as u64 + seg.mem_size as u64;
        if end > capacity {
            return Err(MemError::OutOfRange { addr: end - 1, capacity }.into());
        }

        let file_bytes = seg.data.iter().copied().take(seg.file_size.min(seg.mem_size));
        let bss = std::iter::repeat(0u8).take(seg.mem_size.saturating_sub(seg.file_size));
        for (i, byte) in file_bytes.chain(bss).enumerate() {
            memory.set_byte(seg.vaddr.wrapping_add(i as u32), byte)?;
        }
    }
    Ok(())
}

/// 从文件载入内存镜像文本，返回第一个写入的地址
pub fn load_image_file<M: WordMemory + ?Sized, P: AsRef<Path>>(memory: &mut M, path: P) -> Result<u32, SimError> {
    let text = fs::read_to_string(path.as_ref())?;
    Ok(memory.load_image(&text)?)
}

/// 根据魔数判断文件是否为 ELF
pub fn is_elf_file<P: AsRef<Path>>(path: P) -> Result<bool, SimError> {
    let data = fs::read(path.as_ref())?;
    Ok(data.starts_with(&ELF_MAGIC))
}

/// 一次运行的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// 本次执行的指令数
    pub steps: u64,
    /// 最终状态
    pub state: VmState,
}

/// 仿真环境
///
/// 封装了虚拟机、内存和仿真配置，提供统一的仿真接口
pub struct SimEnv {
    vm: VirtualMachine<Box<dyn WordMemory>>,
    config: SimConfig,
    entry_pc: u32,
}

impl SimEnv {
    /// 从配置创建仿真环境
    pub fn from_config(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;

        // 1. 创建内存
        let mut memory = config.memory.build()?;

        // 2. 加载程序并确定入口 PC
        let loaded_entry = Self::load_program(&config, memory.as_mut())?;
        let entry_pc = config.entry_pc.or(loaded_entry).unwrap_or(0);

        // 3. 创建虚拟机
        log::info!("vm initialized at pc 0x{entry_pc:08x}");
        let vm = VirtualMachine::new(memory, entry_pc);

        Ok(SimEnv { vm, config, entry_pc })
    }

    /// 载入配置中的程序，返回程序自带的入口（ELF 入口或镜像首地址）
    fn load_program(config: &SimConfig, memory: &mut dyn WordMemory) -> Result<Option<u32>, SimError> {
        if let Some(ref elf_path) = config.elf_path {
            let elf = ElfInfo::parse(elf_path)?;
            log::info!(
                "loaded ELF {}: entry 0x{:08x}, {} segments",
                elf_path,
                elf.entry,
                elf.segments.len()
            );
            for (i, seg) in elf.segments.iter().enumerate() {
                log::debug!(
                    "  segment {}: vaddr=0x{:08x}, size=0x{:x}, flags={}{}",
                    i,
                    seg.vaddr,
                    seg.mem_size,
                    if seg.executable { "X" } else { "-" },
                    if seg.writable { "W" } else { "R" },
                );
            }
            load_segments(memory, &elf.segments)?;
            Ok(Some(elf.entry))
        } else if let Some(ref image_path) = config.image_path {
            let start = load_image_file(memory, image_path)?;
            log::info!("loaded memory image {}: first address 0x{:08x}", image_path, start);
            Ok(Some(start))
        } else {
            Ok(None)
        }
    }

    /// 执行单步
    pub fn step(&mut self) -> Result<VmState, SimError> {
        Ok(self.vm.step()?)
    }

    /// 运行至多 `max_steps` 条指令
    pub fn run(&mut self, max_steps: u64) -> Result<RunOutcome, SimError> {
        let (steps, state) = self.vm.run(max_steps)?;
        Ok(RunOutcome { steps, state })
    }

    /// 运行直到停机或达到配置的最大指令数
    pub fn run_until_halt(&mut self) -> Result<RunOutcome, SimError> {
        let max = if self.config.max_steps > 0 {
            self.config.max_steps
        } else {
            u64::MAX
        };
        self.run(max)
    }

    /// 清空内存并重新加载程序，寄存器与 PC 恢复初始值
    pub fn reset(&mut self) -> Result<(), SimError> {
        let mut memory = self.config.memory.build()?;
        Self::load_program(&self.config, memory.as_mut())?;
        self.vm = VirtualMachine::new(memory, self.entry_pc);
        Ok(())
    }

    pub fn vm(&self) -> &VirtualMachine<Box<dyn WordMemory>> {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut VirtualMachine<Box<dyn WordMemory>> {
        &mut self.vm
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn entry_pc(&self) -> u32 {
        self.entry_pc
    }

    /// 自创建（或 reset）以来执行的指令数
    pub fn steps_executed(&self) -> u64 {
        self.vm.steps()
    }
}
