//! 稠密内存实现

use super::{MemError, MemResult, WordMemory};

/// 简单线性内存实现
///
/// 使用 `Vec<u32>` 按字存储整个工作集，适合地址集中、体积较小的程序。
/// 容量在创建时确定，不可增长。
#[derive(Debug, Clone)]
pub struct FlatMemory {
    words: Vec<u32>,
}

impl FlatMemory {
    /// 创建指定字节大小的内存，大小向下取整到 4 的倍数
    ///
    /// ```
    /// use rv32i_sim::memory::{FlatMemory, WordMemory};
    ///
    /// // 64KB，起始地址为 0
    /// let mem = FlatMemory::new(64 * 1024);
    /// assert_eq!(mem.size_in_bytes(), 64 * 1024);
    /// ```
    pub fn new(size_bytes: usize) -> Self {
        Self::with_words(size_bytes / 4)
    }

    /// 创建包含 `len` 个字的内存
    pub fn with_words(len: usize) -> Self {
        FlatMemory {
            words: vec![0; len],
        }
    }

    /// 字的个数
    pub fn len_words(&self) -> usize {
        self.words.len()
    }
}

impl WordMemory for FlatMemory {
    fn get_word(&self, addr: u32) -> u32 {
        self.words.get((addr >> 2) as usize).copied().unwrap_or(0)
    }

    fn set_word(&mut self, addr: u32, value: u32) -> MemResult<()> {
        let capacity = self.size_in_bytes();
        match self.words.get_mut((addr >> 2) as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(MemError::OutOfRange {
                addr: addr as u64,
                capacity,
            }),
        }
    }

    fn clear(&mut self) {
        log::debug!("clearing {} words of flat memory", self.words.len());
        self.words.fill(0);
    }

    fn size_in_bytes(&self) -> u64 {
        self.words.len() as u64 * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_memory_size() {
        assert_eq!(FlatMemory::new(1024).size_in_bytes(), 1024);
        assert_eq!(FlatMemory::new(1023).size_in_bytes(), 1020);
        assert_eq!(FlatMemory::with_words(16).len_words(), 16);
        assert_eq!(FlatMemory::with_words(0).size_in_bytes(), 0);
    }

    #[test]
    fn test_flat_memory_basic() {
        let mut mem = FlatMemory::new(64);
        mem.set_word(0, 0x1234_5678).unwrap();
        mem.set_word(60, 0xDEAD_BEEF).unwrap();
        assert_eq!(mem.get_word(0), 0x1234_5678);
        assert_eq!(mem.get_word(60), 0xDEAD_BEEF);
        assert_eq!(mem.get_byte(60), 0xDE);
        assert_eq!(mem.get_byte(63), 0xEF);
    }

    #[test]
    fn test_empty_memory_rejects_writes() {
        let mut mem = FlatMemory::with_words(0);
        assert_eq!(mem.get_word(0), 0);
        assert!(matches!(
            mem.set_word(0, 1),
            Err(MemError::OutOfRange { addr: 0, capacity: 0 })
        ));
    }
}
