//! 稀疏内存实现

use std::collections::HashMap;

use super::{MemError, MemResult, WordMemory};

/// 默认容量：完整的 32 位地址空间
pub const DEFAULT_SPARSE_CAPACITY: u64 = 1 << 32;

/// 以字地址为键的稀疏内存
///
/// 只为写过的字分配存储，适合代码、数据、栈相距很远的程序。
/// 未写过的字读出为 0。
#[derive(Debug, Clone)]
pub struct SparseMemory {
    words: HashMap<u32, u32>,
    capacity: u64,
}

impl SparseMemory {
    /// 覆盖完整 4 GiB 地址空间的稀疏内存
    pub fn new() -> Self {
        Self::with_capacity_bytes(DEFAULT_SPARSE_CAPACITY)
    }

    /// 指定声明容量（字节），向下取整到 4 的倍数
    pub fn with_capacity_bytes(capacity: u64) -> Self {
        SparseMemory {
            words: HashMap::new(),
            capacity: capacity & !3,
        }
    }

    /// 当前实际占用存储的字数
    pub fn populated_words(&self) -> usize {
        self.words.len()
    }
}

impl Default for SparseMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl WordMemory for SparseMemory {
    fn get_word(&self, addr: u32) -> u32 {
        self.words.get(&(addr >> 2)).copied().unwrap_or(0)
    }

    fn set_word(&mut self, addr: u32, value: u32) -> MemResult<()> {
        let index = addr >> 2;
        if index as u64 >= self.capacity >> 2 {
            return Err(MemError::OutOfRange {
                addr: addr as u64,
                capacity: self.capacity,
            });
        }
        if value == 0 {
            self.words.remove(&index);
        } else {
            self.words.insert(index, value);
        }
        Ok(())
    }

    fn clear(&mut self) {
        log::debug!("clearing {} populated words of sparse memory", self.words.len());
        self.words.clear();
    }

    fn size_in_bytes(&self) -> u64 {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_default_covers_address_space() {
        let mut mem = SparseMemory::new();
        assert_eq!(mem.size_in_bytes(), 0x1_0000_0000);
        mem.set_word(0xFFFF_FFFC, 0x0102_0304).unwrap();
        mem.set_word(0x0000_0000, 0xA0B0_C0D0).unwrap();
        assert_eq!(mem.get_word(0xFFFF_FFFF), 0x0102_0304);
        assert_eq!(mem.get_word(0), 0xA0B0_C0D0);
        assert_eq!(mem.populated_words(), 2);
    }

    #[test]
    fn test_zero_writes_release_storage() {
        let mut mem = SparseMemory::with_capacity_bytes(4096);
        mem.set_word(0x100, 7).unwrap();
        assert_eq!(mem.populated_words(), 1);
        mem.set_word(0x100, 0).unwrap();
        assert_eq!(mem.populated_words(), 0);
        assert_eq!(mem.get_word(0x100), 0);
    }

    #[test]
    fn test_capacity_rounded_to_whole_words() {
        let mut mem = SparseMemory::with_capacity_bytes(1023);
        assert_eq!(mem.size_in_bytes(), 1020);
        mem.set_byte(1019, 0xAB).unwrap();
        assert_eq!(
            mem.set_byte(1020, 0xAB),
            Err(MemError::OutOfRange { addr: 1020, capacity: 1020 })
        );
    }

    #[test]
    fn test_clear_empties_map() {
        let mut mem = SparseMemory::new();
        mem.set_byte(0x8000_0001, 0x55).unwrap();
        mem.clear();
        assert_eq!(mem.populated_words(), 0);
        assert_eq!(mem.get_byte(0x8000_0001), 0);
    }
}
