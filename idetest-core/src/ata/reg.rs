#![allow(non_snake_case)]

use bitflags::bitflags;

bitflags! {
    /// Status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        /// Error
        const ERR = 1 << 0;
        /// Index (vendor specific)
        const IDX = 1 << 1;
        /// Corrected Data
        const CORR = 1 << 2;
        /// Data Request
        const DRQ = 1 << 3;
        /// Disk Seek Complete
        const DSC = 1 << 4;
        /// Device Fault
        const DF = 1 << 5;
        /// Device Ready
        const DRDY = 1 << 6;
        /// Busy
        const BSY = 1 << 7;
    }
}

bitflags! {
    /// Error register bits. Only meaningful while the status register has
    /// `ERR` set, and any combination may be reported at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ErrorFlags: u8 {
        /// Address Mark Not Found
        const AMNF = 1 << 0;
        /// Track 0 Not Found (during a RECALIBRATE command)
        const TK0NF = 1 << 1;
        /// Aborted Command
        const ABRT = 1 << 2;
        /// Media Change Requested
        const MCR = 1 << 3;
        /// ID Not found
        const IDNF = 1 << 4;
        /// Media Changed
        const MC = 1 << 5;
        /// Unrecoverable Data Error
        const UNC = 1 << 6;
        /// Bad Block
        const BBK = 1 << 7;
    }
}

impl Default for StatusFlags {
    fn default() -> StatusFlags {
        StatusFlags::empty()
    }
}

/// Error bits in register order, paired with their diagnostic text.
pub const ERROR_DESCRIPTIONS: [(ErrorFlags, &str); 8] = [
    (ErrorFlags::AMNF, "no address mark"),
    (ErrorFlags::TK0NF, "track 0 not found"),
    (ErrorFlags::ABRT, "command aborted"),
    (ErrorFlags::MCR, "media change request"),
    (ErrorFlags::IDNF, "ID mark not found"),
    (ErrorFlags::MC, "media changed"),
    (ErrorFlags::UNC, "uncorrectable data"),
    (ErrorFlags::BBK, "bad block"),
];

impl ErrorFlags {
    /// Human readable description of a single error bit.
    pub fn describe(self) -> Option<&'static str> {
        ERROR_DESCRIPTIONS
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, desc)| *desc)
    }
}

/// Device/Head register bits
pub mod DEVHEAD {
    /// Obsolete, historically forced high
    pub const OBS7: usize = 7;
    /// Obsolete, historically forced high
    pub const OBS5: usize = 5;
    /// Device Index
    pub const DEV: usize = 4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_bit_has_a_description() {
        for flag in ErrorFlags::all().iter() {
            assert!(flag.describe().is_some(), "{:?}", flag);
        }
        assert_eq!((ErrorFlags::ABRT | ErrorFlags::BBK).describe(), None);
    }

    #[test]
    fn status_bits_match_register_layout() {
        assert_eq!(StatusFlags::ERR.bits(), 0x01);
        assert_eq!(StatusFlags::DRQ.bits(), 0x08);
        assert_eq!(StatusFlags::DF.bits(), 0x20);
        assert_eq!(StatusFlags::DRDY.bits(), 0x40);
        assert_eq!(StatusFlags::BSY.bits(), 0x80);
    }
}
