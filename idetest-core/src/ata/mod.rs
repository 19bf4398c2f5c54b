//! ATA register-level definitions shared by the probe and the channels.

pub mod reg;

use num_enum::TryFromPrimitive;

/// ATA command codes.
///
/// The probe only ever issues [`AtaCmd::IdentifyDevice`]. The rest are listed
/// so that a channel can recognise (and refuse) them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum AtaCmd {
    Recalibrate = 0x10,
    ReadSectors = 0x20,
    ReadSectorsExt = 0x24,
    ReadMultipleExt = 0x29,
    WriteSectors = 0x30,
    WriteSectorsExt = 0x34,
    WriteMultipleExt = 0x39,
    ReadVerifySectors = 0x40,
    ReadVerifySectorsExt = 0x42,
    Format = 0x50,
    Seek = 0x70,
    Diagnostics = 0x90,
    InitParameters = 0x91,
    ReadMultiple = 0xc4,
    WriteMultiple = 0xc5,
    SetMultipleMode = 0xc6,
    FlushCache = 0xe7,
    IdentifyDevice = 0xec,
    SetFeatures = 0xef,
}

/// Number of bytes returned by IDENTIFY DEVICE.
pub const IDENTIFY_LEN: usize = 512;

/// Number of 16-bit data register reads needed to drain IDENTIFY DEVICE.
pub const IDENTIFY_WORDS: usize = IDENTIFY_LEN / 2;
