//! Register-level access to a single IDE channel.

pub mod mmio;
pub mod sim;

pub use mmio::Mmio;
pub use sim::SimController;

/// IDE Device (either 0 or 1)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdeIdx {
    IDE0,
    IDE1,
}

impl From<bool> for IdeIdx {
    fn from(b: bool) -> IdeIdx {
        match b {
            false => IdeIdx::IDE0,
            true => IdeIdx::IDE1,
        }
    }
}

impl IdeIdx {
    /// Only the low bit is significant: a channel addresses two drives.
    pub fn from_index(idx: u8) -> IdeIdx {
        (idx & 1 != 0).into()
    }

    pub fn bit(self) -> u8 {
        match self {
            IdeIdx::IDE0 => 0,
            IdeIdx::IDE1 => 1,
        }
    }
}

impl std::fmt::Display for IdeIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdeIdx::IDE0 => write!(f, "master"),
            IdeIdx::IDE1 => write!(f, "slave"),
        }
    }
}

/// IDE Register to access.
///
/// Registers which share an address are aliases for one another (e.g: calling
/// `read8(IdeReg::Features)` is equivalent to calling `read8(IdeReg::Error)`).
/// Which name is used only documents the direction of the access.
///
/// The LBA bytes live in the CHS registers: `SectorNo` holds LBA bits 0..=7,
/// `CylinderLo` bits 8..=15, and `CylinderHi` bits 16..=23.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdeReg {
    Data,
    Error,
    Features,
    SectorCount,
    SectorNo,
    CylinderLo,
    CylinderHi,
    DeviceHead,
    Status,
    Command,
    IntStatus,
    AltStatus,
    DevControl,
    DriveAddr,
}

/// Raw register access to an IDE channel.
///
/// Every call is an observable access to the device: implementations must
/// never cache, merge, reorder or skip them. Reading `Status` may have side
/// effects (e.g: acknowledging a pending IRQ).
pub trait Registers {
    /// Read a byte from an 8-bit register.
    fn read8(&mut self, reg: IdeReg) -> u8;

    /// Write a byte to an 8-bit register.
    fn write8(&mut self, reg: IdeReg, val: u8);

    /// Perform a 16-bit read. Only `Data` is 16 bits wide; any other register
    /// reads as its 8-bit value.
    fn read16(&mut self, reg: IdeReg) -> u16;

    /// Wait out the ~1us it takes the status register to become stable after
    /// a drive select or command write.
    fn settle(&mut self);
}

impl<R: Registers + ?Sized> Registers for &mut R {
    fn read8(&mut self, reg: IdeReg) -> u8 {
        (**self).read8(reg)
    }

    fn write8(&mut self, reg: IdeReg, val: u8) {
        (**self).write8(reg, val)
    }

    fn read16(&mut self, reg: IdeReg) -> u16 {
        (**self).read16(reg)
    }

    fn settle(&mut self) {
        (**self).settle()
    }
}
