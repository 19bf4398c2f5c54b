use std::ptr::{self, NonNull};
use std::time::{Duration, Instant};

use super::{IdeReg, Registers};
use crate::error::{Error, Result};

/// Volatile overlay of an IDE register block at a fixed address.
///
/// Registers are spaced 4 bytes apart, with the interrupt status and
/// alternate status registers in a second bank at `base + 0x1000`:
///
/// | offset   | register                              |
/// |----------|---------------------------------------|
/// | `0x0000` | Data (16 bit)                         |
/// | `0x0004` | Error / Features                      |
/// | `0x0008` | Sector Count                          |
/// | `0x000c` | Sector Number                         |
/// | `0x0010` | Cylinder Low                          |
/// | `0x0014` | Cylinder High                         |
/// | `0x0018` | Device Head                           |
/// | `0x001c` | Status / Command                      |
/// | `0x1000` | Interrupt Status                      |
/// | `0x1018` | AltStatus / Device Control            |
/// | `0x101c` | Drive Address                         |
///
/// The handle is neither `Send` nor `Sync`: the register block
/// has a single owner.
#[derive(Debug)]
pub struct Mmio {
    base: NonNull<u8>,
}

impl Mmio {
    /// Where the controller's register block is usually mapped.
    pub const DEFAULT_BASE: usize = 0x00da_4000;

    /// Length of the register block, in bytes.
    pub const BLOCK_LEN: usize = 0x1020;

    const SETTLE: Duration = Duration::from_micros(1);

    /// Overlay the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point at a live IDE register block of at least
    /// [`Mmio::BLOCK_LEN`] bytes that stays mapped for as long as the returned
    /// handle exists, and nothing else may access that block in the meantime.
    pub unsafe fn new(base: usize) -> Result<Mmio> {
        let base = NonNull::new(base as *mut u8).ok_or(Error::NullBase)?;
        if base.as_ptr() as usize % 4 != 0 {
            return Err(Error::MisalignedBase(base.as_ptr() as usize));
        }
        Ok(Mmio { base })
    }

    pub fn base(&self) -> usize {
        self.base.as_ptr() as usize
    }

    fn offset(reg: IdeReg) -> usize {
        use IdeReg::*;
        match reg {
            Data => 0x0000,
            Error | Features => 0x0004,
            SectorCount => 0x0008,
            SectorNo => 0x000c,
            CylinderLo => 0x0010,
            CylinderHi => 0x0014,
            DeviceHead => 0x0018,
            Status | Command => 0x001c,
            IntStatus => 0x1000,
            AltStatus | DevControl => 0x1018,
            DriveAddr => 0x101c,
        }
    }

    fn reg_ptr(&self, reg: IdeReg) -> *mut u8 {
        // SAFETY: every offset lies within the BLOCK_LEN bytes guaranteed by
        // the caller of `new`.
        unsafe { self.base.as_ptr().add(Self::offset(reg)) }
    }
}

impl Registers for Mmio {
    fn read8(&mut self, reg: IdeReg) -> u8 {
        // SAFETY: see `Mmio::new`
        unsafe { ptr::read_volatile(self.reg_ptr(reg)) }
    }

    fn write8(&mut self, reg: IdeReg, val: u8) {
        // SAFETY: see `Mmio::new`
        unsafe { ptr::write_volatile(self.reg_ptr(reg), val) }
    }

    fn read16(&mut self, reg: IdeReg) -> u16 {
        match reg {
            // SAFETY: see `Mmio::new`. The data register is at offset 0 of a
            // 4-byte aligned block, so the 16-bit access is aligned.
            IdeReg::Data => unsafe { ptr::read_volatile(self.reg_ptr(reg) as *const u16) },
            _ => self.read8(reg) as u16,
        }
    }

    fn settle(&mut self) {
        let start = Instant::now();
        while start.elapsed() < Self::SETTLE {
            std::hint::spin_loop();
        }
    }
}
