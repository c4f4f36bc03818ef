//! 内存抽象层
//!
//! 本模块定义了字寻址内存的统一接口 `WordMemory` trait，
//! 以及两种实现：稠密的 `FlatMemory` 与稀疏的 `SparseMemory`。
//!
//! 存储序：字节地址 A 所在字的 bit[31:24] 保存 A 处的字节，
//! 与体系结构的小端序相反，因此取指和半字/字访存都需要翻转字节序。

mod flat;
mod image;
mod sparse;

pub use flat::FlatMemory;
pub use image::{dump_image, load_image};
pub use sparse::SparseMemory;

/// 内存访问错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemError {
    /// 写入地址超出声明容量
    #[error("write at 0x{addr:08x} beyond memory capacity of {capacity} bytes")]
    OutOfRange { addr: u64, capacity: u64 },

    /// 内存镜像文本中的非法 token
    #[error("malformed memory image token `{token}`")]
    MalformedToken { token: String },
}

pub type MemResult<T> = Result<T, MemError>;

/// 字寻址内存的统一接口
///
/// 地址一律为字节地址，访问时隐式截断到所在字（`addr >> 2`）。
/// 越界读返回 0，越界写返回 `MemError::OutOfRange`。
/// 稠密与稀疏实现在声明容量内的行为完全一致。
pub trait WordMemory {
    /// 读取 `addr` 所在的字（存储序）
    fn get_word(&self, addr: u32) -> u32;

    /// 写入 `addr` 所在的字（存储序）
    fn set_word(&mut self, addr: u32, value: u32) -> MemResult<()>;

    /// 清零（或清空）全部存储
    fn clear(&mut self);

    /// 声明的字节容量
    fn size_in_bytes(&self) -> u64;

    /// 读取单个字节
    fn get_byte(&self, addr: u32) -> u8 {
        (self.get_word(addr) >> byte_shift(addr)) as u8
    }

    /// 写入单个字节，不影响同一字中的其余 3 个字节
    fn set_byte(&mut self, addr: u32, value: u8) -> MemResult<()> {
        let shift = byte_shift(addr);
        let word = self.get_word(addr) & !(0xFF << shift);
        self.set_word(addr, word | (value as u32) << shift)
    }

    /// 载入文本格式的内存镜像，返回第一个写入的地址（无数据时为 0）
    fn load_image(&mut self, text: &str) -> MemResult<u32> {
        image::load_image(self, text)
    }

    /// 以内存镜像文本格式导出 `[addr, addr + count)`
    fn dump_image(&self, addr: u32, count: u32) -> String {
        image::dump_image(self, addr, count)
    }
}

/// 字节在存储字中的位移：`(3 - (addr & 3)) * 8`
#[inline]
pub fn byte_shift(addr: u32) -> u32 {
    (3 - (addr & 3)) * 8
}

impl<M: WordMemory + ?Sized> WordMemory for &mut M {
    fn get_word(&self, addr: u32) -> u32 {
        (**self).get_word(addr)
    }

    fn set_word(&mut self, addr: u32, value: u32) -> MemResult<()> {
        (**self).set_word(addr, value)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn size_in_bytes(&self) -> u64 {
        (**self).size_in_bytes()
    }
}

impl<M: WordMemory + ?Sized> WordMemory for Box<M> {
    fn get_word(&self, addr: u32) -> u32 {
        (**self).get_word(addr)
    }

    fn set_word(&mut self, addr: u32, value: u32) -> MemResult<()> {
        (**self).set_word(addr, value)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn size_in_bytes(&self) -> u64 {
        (**self).size_in_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both() -> [Box<dyn WordMemory>; 2] {
        [
            Box::new(FlatMemory::new(1024)),
            Box::new(SparseMemory::with_capacity_bytes(1024)),
        ]
    }

    #[test]
    fn test_byte_round_trip_keeps_neighbours() {
        for mut mem in both() {
            mem.set_word(0x40, 0x1122_3344).unwrap();
            mem.set_byte(0x41, 0xAB).unwrap();
            assert_eq!(mem.get_byte(0x41), 0xAB);
            assert_eq!(mem.get_word(0x40), 0x11AB_3344);
            assert_eq!(mem.get_byte(0x40), 0x11);
            assert_eq!(mem.get_byte(0x42), 0x33);
            assert_eq!(mem.get_byte(0x43), 0x44);
        }
    }

    #[test]
    fn test_byte_order_in_word() {
        for mut mem in both() {
            for (i, b) in [0xDE, 0xAD, 0xBE, 0xEF].into_iter().enumerate() {
                mem.set_byte(0x10 + i as u32, b).unwrap();
            }
            assert_eq!(mem.get_word(0x10), 0xDEAD_BEEF);
        }
    }

    #[test]
    fn test_word_address_truncated() {
        for mut mem in both() {
            mem.set_word(0x22, 0xCAFE_F00D).unwrap();
            assert_eq!(mem.get_word(0x20), 0xCAFE_F00D);
            assert_eq!(mem.get_word(0x23), 0xCAFE_F00D);
        }
    }

    #[test]
    fn test_out_of_range() {
        for mut mem in both() {
            assert_eq!(mem.get_word(4096), 0);
            assert_eq!(mem.get_byte(1024), 0);
            let err = mem.set_word(1024, 1).unwrap_err();
            assert_eq!(err, MemError::OutOfRange { addr: 1024, capacity: 1024 });
            assert!(mem.set_byte(1025, 1).is_err());
            assert!(mem.set_word(1020, 1).is_ok());
        }
    }

    #[test]
    fn test_unaligned_capacity_agrees() {
        let mut flat = FlatMemory::new(1023);
        let mut sparse = SparseMemory::with_capacity_bytes(1023);
        assert_eq!(flat.size_in_bytes(), sparse.size_in_bytes());
        for mem in [&mut flat as &mut dyn WordMemory, &mut sparse] {
            assert_eq!(mem.size_in_bytes(), 1020);
            assert_eq!(mem.load_image("@03F8 01 02 03 04"), Ok(0x3F8));
            assert_eq!(
                mem.load_image("@03FC 01"),
                Err(MemError::OutOfRange { addr: 0x3FC, capacity: 1020 })
            );
            assert!(mem.set_byte(1020, 0xAB).is_err());
        }
        assert_eq!(flat.dump_image(0x3F8, 8), "@03F8 01 02 03 04 00 00 00 00");
        assert_eq!(flat.dump_image(0x3F8, 8), sparse.dump_image(0x3F8, 8));
    }

    #[test]
    fn test_clear() {
        for mut mem in both() {
            mem.set_word(0, 0xFFFF_FFFF).unwrap();
            mem.set_word(1020, 0x1234_5678).unwrap();
            mem.clear();
            assert_eq!(mem.get_word(0), 0);
            assert_eq!(mem.get_word(1020), 0);
            assert_eq!(mem.size_in_bytes(), 1024);
        }
    }

    #[test]
    fn test_forwarding_impls() {
        let mut flat = FlatMemory::new(64);
        {
            let borrowed: &mut FlatMemory = &mut flat;
            borrowed.set_byte(3, 0x7F).unwrap();
            assert_eq!(WordMemory::size_in_bytes(&borrowed), 64);
        }
        assert_eq!(flat.get_word(0), 0x0000_007F);
    }
}
