//! 位域运算辅助函数
//!
//! 提供字段提取、符号扩展、字节序翻转、有/无符号比较以及算术右移。
//! 位序号一律从 0（最低位）到 31（最高位）。

/// 宽度为 `width` 的低位掩码，`width` 取 0..=32
#[inline]
pub const fn mask(width: u32) -> u32 {
    if width >= 32 { u32::MAX } else { (1u32 << width) - 1 }
}

/// 提取 `word[high:low]`（闭区间）并右对齐
///
/// 要求 `low <= high <= 31`
#[inline]
pub const fn bits(word: u32, high: u32, low: u32) -> u32 {
    debug_assert!(low <= high && high <= 31);
    (word >> low) & mask(high - low + 1)
}

/// 提取单个位 `word[n]`
#[inline]
pub const fn bit(word: u32, n: u32) -> u32 {
    bits(word, n, n)
}

/// 以 `msb` 为符号位做符号扩展
///
/// 符号位为 1 时 `msb` 以上全部置 1，否则只保留 `msb..0`。
/// 常用的 `msb`：字节 7，I/S 立即数 11，B 立即数 12，半字 15，J 立即数 20。
#[inline]
pub const fn sign_extend(word: u32, msb: u32) -> u32 {
    debug_assert!(msb <= 31);
    if bit(word, msb) != 0 {
        word | (u32::MAX << msb)
    } else {
        word & mask(msb + 1)
    }
}

/// 32 位字节序翻转（存储序 <-> 体系结构序）
#[inline]
pub const fn reverse_endian(word: u32) -> u32 {
    word.swap_bytes()
}

/// 16 位字节序翻转
#[inline]
pub const fn reverse_endian_half(half: u16) -> u16 {
    half.swap_bytes()
}

/// 无符号比较 `a < b`（SLTU/SLTIU/BLTU/BGEU）
#[inline]
pub const fn unsigned_less_than(a: u32, b: u32) -> bool {
    a < b
}

/// 有符号比较 `a < b`（SLT/SLTI/BLT/BGE）
#[inline]
pub const fn signed_less_than(a: u32, b: u32) -> bool {
    (a as i32) < (b as i32)
}

/// 算术右移：空出的高位复制符号位
///
/// 只使用 `amount` 的低 5 位
#[inline]
pub const fn shift_right_arithmetic(value: u32, amount: u32) -> u32 {
    ((value as i32) >> (amount & 0x1F)) as u32
}
