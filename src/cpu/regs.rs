//! CPU architectural state: the integer register file.

use std::fmt;

/// Generic register file with configurable count, element type, and zero-hardwire behavior.
///
/// - `N`: number of registers
/// - `T`: element type (u32, u64, etc.)
/// - `ZERO_HARDWIRE`: if true, register 0 always reads as zero and writes are ignored
///
/// Indices at or beyond `N` read as `T::default()`; writes to them are discarded.
#[derive(Clone, PartialEq, Eq)]
pub struct GenericRegFile<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> {
    regs: [T; N],
}

impl<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> GenericRegFile<N, T, ZERO_HARDWIRE> {
    pub fn new() -> Self {
        Self { regs: [T::default(); N] }
    }

    /// Number of modeled registers.
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Whether `reg` names a modeled register.
    #[inline]
    pub const fn contains(reg: u8) -> bool {
        (reg as usize) < N
    }

    #[inline]
    pub fn read(&self, reg: u8) -> T {
        if ZERO_HARDWIRE && reg == 0 {
            return T::default();
        }
        self.regs.get(reg as usize).copied().unwrap_or_default()
    }

    #[inline]
    pub fn write(&mut self, reg: u8, value: T) {
        if ZERO_HARDWIRE && reg == 0 {
            return;
        }
        match self.regs.get_mut(reg as usize) {
            Some(slot) => *slot = value,
            None => log::warn!("discarding write to unmodeled register x{reg}"),
        }
    }

    pub fn snapshot(&self) -> [T; N] {
        self.regs
    }
}

impl<const N: usize, T: Copy + Default, const ZERO_HARDWIRE: bool> Default for GenericRegFile<N, T, ZERO_HARDWIRE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, T: Copy + Default + fmt::Debug, const ZERO_HARDWIRE: bool> fmt::Debug
    for GenericRegFile<N, T, ZERO_HARDWIRE>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.regs.iter()).finish()
    }
}

/// Number of integer registers modeled (x0..x15).
pub const NUM_REGS: usize = 16;

/// Integer register file x0..x15. x0 is hard-wired to zero.
pub type RegisterFile = GenericRegFile<NUM_REGS, u32, true>;

// ABI register indices
pub const ZERO: u8 = 0;
pub const RA: u8 = 1;
pub const SP: u8 = 2;
pub const GP: u8 = 3;
pub const TP: u8 = 4;
pub const T0: u8 = 5;
pub const T1: u8 = 6;
pub const T2: u8 = 7;
pub const S0: u8 = 8;
pub const FP: u8 = S0;
pub const S1: u8 = 9;
pub const A0: u8 = 10;
pub const A1: u8 = 11;
pub const A2: u8 = 12;
pub const A3: u8 = 13;
pub const A4: u8 = 14;
pub const A5: u8 = 15;

const ABI_NAMES: [&str; NUM_REGS] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2",
    "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5",
];

/// ABI name of a modeled register, e.g. `abi_name(2) == Some("sp")`.
pub fn abi_name(reg: u8) -> Option<&'static str> {
    ABI_NAMES.get(reg as usize).copied()
}

/// Four registers per row: `x2 (sp  ) = 0x00010000`.
impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in ABI_NAMES.iter().enumerate() {
            let reg = i as u8;
            write!(f, "x{reg:<2} ({name:<4}) = 0x{:08x}", self.read(reg))?;
            if i % 4 == 3 {
                writeln!(f)?;
            } else {
                f.write_str("  ")?;
            }
        }
        Ok(())
    }
}
