use bytemuck::{Pod, Zeroable};

/// IDENTIFY DEVICE response, as laid out in the ATA-6 word map.
///
/// Only the words a simple PIO drive fills in are broken out. Everything else
/// is reserved / vendor specific and left zeroed.
#[derive(Copy, Clone)]
#[repr(C)]
pub struct DriveId {
    pub config: u16,           // word 0
    pub cyls: u16,             // word 1
    pub reserved2: u16,        // word 2
    pub heads: u16,            // word 3
    pub obsolete4_5: [u16; 2], // words 4-5
    pub sectors: u16,          // word 6
    pub vendor7_9: [u16; 3],   // words 7-9
    pub serial_no: [u8; 20],   // words 10-19
    pub retired20_22: [u16; 3],
    pub fw_rev: [u8; 8],     // words 23-26
    pub model: [u8; 40],     // words 27-46
    pub max_multsect: u16,   // word 47
    pub reserved48: u16,     // word 48
    pub capability: u16,     // word 49
    pub words50_59: [u16; 10],
    pub lba_capacity: [u16; 2], // words 60-61, low word first
    pub words62_82: [u16; 21],
    pub command_set_2: u16, // word 83
    pub words84_99: [u16; 16],
    pub lba_capacity_2: [u16; 4], // words 100-103, low word first
    pub words104_255: [u16; 152],
}

const_assert_eq!(std::mem::size_of::<DriveId>(), 512);

// SAFETY: `repr(C)`, only integer fields, and no padding (asserted above)
unsafe impl Zeroable for DriveId {}
unsafe impl Pod for DriveId {}

impl std::fmt::Debug for DriveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        write!(f, "DriveId: {{ ... }}")
    }
}

/// word 0: fixed device
const CONFIG_FIXED: u16 = 1 << 6;
/// word 49: LBA supported
const CAP_LBA: u16 = 1 << 9;
/// word 49: DMA supported
const CAP_DMA: u16 = 1 << 8;
/// word 83: bit 14 shall be one
const CMDSET2_VALID: u16 = 1 << 14;
/// word 83: 48-bit Address feature set
const CMDSET2_LBA48: u16 = 1 << 10;

/// Largest sector count that fits a 28-bit LBA.
const LBA28_MAX: u64 = 0x0fff_ffff;

/// IDE Drive Metadata.
///
/// `serial`, `fw_version`, and `model` should be ASCII.
pub struct IdeDriveMeta<'a> {
    /// i.e: (size in bytes) / 512
    pub total_sectors: u64,

    pub cylinders: u16,
    pub heads: u16,
    pub sectors: u16,
    pub serial: &'a [u8],
    pub fw_version: &'a [u8],
    pub model: &'a [u8],
}

impl IdeDriveMeta<'_> {
    /// Populate a `DriveId` using the provided metadata.
    pub fn to_drive_id(&self) -> DriveId {
        let lba28 = self.total_sectors.min(LBA28_MAX) as u32;

        let mut command_set_2 = CMDSET2_VALID;
        if self.total_sectors > LBA28_MAX {
            command_set_2 |= CMDSET2_LBA48;
        }

        // words go out low byte first, whatever the host's byte order
        let mut id = DriveId {
            config: CONFIG_FIXED.to_le(),
            cyls: self.cylinders.to_le(),
            heads: self.heads.to_le(),
            sectors: self.sectors.to_le(),
            max_multsect: 0x8000u16.to_le(),
            capability: (CAP_LBA | CAP_DMA).to_le(),
            lba_capacity: [(lba28 as u16).to_le(), ((lba28 >> 16) as u16).to_le()],
            command_set_2: command_set_2.to_le(),
            lba_capacity_2: [
                (self.total_sectors as u16).to_le(),
                ((self.total_sectors >> 16) as u16).to_le(),
                ((self.total_sectors >> 32) as u16).to_le(),
                ((self.total_sectors >> 48) as u16).to_le(),
            ],
            ..DriveId::zeroed()
        };

        // This channel hands over the first character of each pair in the
        // low byte lane, so text goes in as-is, space padded.
        let pad_ascii = |dst: &mut [u8], src: &[u8]| {
            for (i, b) in dst.iter_mut().enumerate() {
                *b = *src.get(i).unwrap_or(&b' ');
            }
        };

        pad_ascii(&mut id.serial_no, self.serial);
        pad_ascii(&mut id.fw_rev, self.fw_version);
        pad_ascii(&mut id.model, self.model);

        id
    }
}
