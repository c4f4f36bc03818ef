//! 内存镜像文本格式
//!
//! 以空白分隔的 token 序列：
//! - `@XXXX`：设置当前写地址（十六进制，无前缀）
//! - `bb`：一或两位十六进制字节，写入当前地址后地址加 1
//!
//! 允许出现多个 `@` 块，后写入的字节覆盖先写入的。

use std::fmt::Write as _;

use super::{MemError, MemResult, WordMemory};

/// 载入内存镜像，返回第一个写入字节的地址（没有任何字节时为 0）
pub fn load_image<M: WordMemory + ?Sized>(mem: &mut M, text: &str) -> MemResult<u32> {
    let capacity = mem.size_in_bytes();
    let mut address: u64 = 0;
    let mut start = None;

    for token in text.split_whitespace() {
        if let Some(hex) = token.strip_prefix('@') {
            address = parse_hex(hex, 8, token)? as u64;
            continue;
        }

        let value = parse_hex(token, 2, token)? as u8;
        if address >= capacity {
            return Err(MemError::OutOfRange {
                addr: address,
                capacity,
            });
        }
        // capacity <= 4 GiB，此处 address 必然落在 u32 内
        let addr = address as u32;
        start.get_or_insert(addr);
        mem.set_byte(addr, value)?;
        address += 1;
    }

    let start = start.unwrap_or(0);
    log::debug!("loaded memory image, first address 0x{start:08x}");
    Ok(start)
}

/// 以 `@XXXX bb bb ...` 格式导出 `count` 个字节
///
/// `addr + count <= 0xFFFF` 时地址用 4 位十六进制，否则用 8 位。
pub fn dump_image<M: WordMemory + ?Sized>(mem: &M, addr: u32, count: u32) -> String {
    let mut out = String::with_capacity(10 + count as usize * 3);
    if addr as u64 + count as u64 <= 0xFFFF {
        let _ = write!(out, "@{addr:04X}");
    } else {
        let _ = write!(out, "@{addr:08X}");
    }
    for i in 0..count {
        let _ = write!(out, " {:02X}", mem.get_byte(addr.wrapping_add(i)));
    }
    out
}

fn parse_hex(digits: &str, max_len: usize, token: &str) -> MemResult<u32> {
    let malformed = || MemError::MalformedToken {
        token: token.to_string(),
    };
    if digits.is_empty()
        || digits.len() > max_len
        || !digits.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(malformed());
    }
    u32::from_str_radix(digits, 16).map_err(|_| malformed())
}
