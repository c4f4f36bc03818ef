//! rv32i_sim CLI 入口
//!
//! 用法：`rv32i_sim_cli <program> [max_steps]`
//!
//! `program` 为 ELF 文件或内存镜像文本；以稀疏内存运行直到停机、
//! 出错或达到 `max_steps`（省略或为 0 时不限制）。

use std::env;
use std::error::Error;
use std::process::ExitCode;

use rv32i_sim::cpu::VmState;
use rv32i_sim::sim_env::{self, MemoryConfig, SimConfig, SimEnv, SimError};

fn usage() -> ExitCode {
    eprintln!("用法: rv32i_sim_cli <program> [max_steps]");
    ExitCode::from(2)
}

fn run(program: &str, max_steps: u64) -> Result<(), SimError> {
    let config = SimConfig::new()
        .with_memory(MemoryConfig::sparse())
        .with_max_steps(max_steps);
    let config = if sim_env::is_elf_file(program)? {
        config.with_elf_path(program)
    } else {
        config.with_image_path(program)
    };

    let mut env = SimEnv::from_config(config)?;
    println!("程序已加载: {program}，入口 PC = 0x{:08x}", env.entry_pc());
    println!();

    let result = env.run_until_halt();

    let vm = env.vm();
    match &result {
        Ok(outcome) => {
            println!("执行指令数: {}", outcome.steps);
            println!(
                "最终状态: {}",
                match outcome.state {
                    VmState::Running => "运行中（达到最大指令数）",
                    VmState::Halted => "已停机",
                }
            );
        }
        Err(_) => {
            println!("执行指令数: {}", vm.steps());
            println!("执行出错，PC 附近的指令:");
            for line in vm.disassemble_around_pc(2, 2) {
                println!("  {line}");
            }
        }
    }
    println!("PC = 0x{:08x}", vm.pc());
    println!();
    println!("最终寄存器状态:");
    print!("{}", vm.regs());

    result.map(|_| ())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let (program, max_steps) = match args.as_slice() {
        [_, program] => (program, 0),
        [_, program, steps] => match steps.parse::<u64>() {
            Ok(n) => (program, n),
            Err(_) => {
                eprintln!("无效的 max_steps: {steps}");
                return usage();
            }
        },
        _ => return usage(),
    };

    println!("=== rv32i_sim: RV32I 单线程 ISA 仿真器 ===\n");

    match run(program, max_steps) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("错误: {e}");
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  原因: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
