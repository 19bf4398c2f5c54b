use byteorder::{ByteOrder, LittleEndian};

use super::{DeviceStatus, IdeProbe, TAG};
use crate::ata::{AtaCmd, IDENTIFY_LEN, IDENTIFY_WORDS};
use crate::channel::{IdeReg, Registers};
use crate::diag::DiagSink;

/// IDENTIFY DEVICE word offsets.
#[allow(non_snake_case)]
mod WORD {
    pub const GENERAL_CONFIG: usize = 0;
    pub const CYLINDERS: usize = 1;
    pub const HEADS: usize = 3;
    pub const SECTORS: usize = 6;
    pub const SERIAL: usize = 10;
    pub const FIRMWARE: usize = 23;
    pub const MODEL: usize = 27;
    pub const CAPABILITIES: usize = 49;
    pub const MAX_LBA: usize = 60;
    pub const COMMAND_SET: usize = 83;
}

/// Lengths of the ASCII fields, in bytes.
const SERIAL_LEN: usize = 20;
const FIRMWARE_LEN: usize = 8;
const MODEL_LEN: usize = 40;

/// general configuration: removable media
const CONFIG_REMOVABLE: u16 = 1 << 7;
/// general configuration: fixed media
const CONFIG_FIXED: u16 = 1 << 6;
/// capabilities: LBA supported
const CAP_LBA: u16 = 1 << 9;
/// capabilities: DMA supported
const CAP_DMA: u16 = 1 << 8;
/// command sets: 48-bit Address feature set
const CMDSET_LBA48: u16 = 1 << 10;

/// Raw IDENTIFY DEVICE response.
///
/// Each word read from the data register is stored low byte first, so
/// [`word`](IdentifyBlock::word) gives back exactly what the register
/// returned, and the ASCII fields are the bytes in transfer order.
#[derive(Clone)]
pub struct IdentifyBlock {
    raw: [u8; IDENTIFY_LEN],
}

impl std::fmt::Debug for IdentifyBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifyBlock")
            .field("raw", &"[...]")
            .field("info", &self.info())
            .finish()
    }
}

impl IdentifyBlock {
    pub fn from_bytes(raw: [u8; IDENTIFY_LEN]) -> IdentifyBlock {
        IdentifyBlock { raw }
    }

    pub fn from_words(words: &[u16; IDENTIFY_WORDS]) -> IdentifyBlock {
        let mut raw = [0; IDENTIFY_LEN];
        LittleEndian::write_u16_into(words, &mut raw);
        IdentifyBlock { raw }
    }

    pub fn as_bytes(&self) -> &[u8; IDENTIFY_LEN] {
        &self.raw
    }

    /// Word `idx`, as read from the data register.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not below 256.
    pub fn word(&self, idx: usize) -> u16 {
        LittleEndian::read_u16(&self.raw[idx * 2..])
    }

    /// Double word starting at word `idx` (low word first).
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not below 255.
    pub fn dword(&self, idx: usize) -> u32 {
        self.word(idx) as u32 | (self.word(idx + 1) as u32) << 16
    }

    /// ASCII field of `len` bytes starting at word `idx`.
    ///
    /// The last byte of the field is always taken as the terminator, so at
    /// most `len - 1` characters come back. Stops early at a NUL, and drops
    /// the trailing space padding.
    fn ascii(&self, idx: usize, len: usize) -> String {
        let field = &self.raw[idx * 2..idx * 2 + len - 1];
        let field = match field.iter().position(|&b| b == 0) {
            Some(end) => &field[..end],
            None => field,
        };
        String::from_utf8_lossy(field).trim_end_matches(' ').to_string()
    }

    pub fn general_config(&self) -> u16 {
        self.word(WORD::GENERAL_CONFIG)
    }

    pub fn is_removable(&self) -> bool {
        self.general_config() & CONFIG_REMOVABLE != 0
    }

    pub fn is_fixed(&self) -> bool {
        self.general_config() & CONFIG_FIXED != 0
    }

    /// Number of logical cylinders.
    pub fn cylinders(&self) -> u16 {
        self.word(WORD::CYLINDERS)
    }

    /// Number of logical heads.
    pub fn heads(&self) -> u16 {
        self.word(WORD::HEADS)
    }

    /// Number of sectors per track.
    pub fn sectors_per_track(&self) -> u16 {
        self.word(WORD::SECTORS)
    }

    pub fn serial(&self) -> String {
        self.ascii(WORD::SERIAL, SERIAL_LEN)
    }

    pub fn firmware_revision(&self) -> String {
        self.ascii(WORD::FIRMWARE, FIRMWARE_LEN)
    }

    pub fn model(&self) -> String {
        self.ascii(WORD::MODEL, MODEL_LEN)
    }

    pub fn capabilities(&self) -> u16 {
        self.word(WORD::CAPABILITIES)
    }

    pub fn lba_supported(&self) -> bool {
        self.capabilities() & CAP_LBA != 0
    }

    pub fn dma_supported(&self) -> bool {
        self.capabilities() & CAP_DMA != 0
    }

    /// Total number of user addressable sectors in 28-bit LBA mode.
    pub fn lba28_sectors(&self) -> u32 {
        self.dword(WORD::MAX_LBA)
    }

    pub fn command_sets(&self) -> u16 {
        self.word(WORD::COMMAND_SET)
    }

    pub fn lba48_supported(&self) -> bool {
        self.command_sets() & CMDSET_LBA48 != 0
    }

    /// Every decoded field at once.
    pub fn info(&self) -> DriveInfo {
        DriveInfo {
            general_config: self.general_config(),
            removable: self.is_removable(),
            fixed: self.is_fixed(),
            cylinders: self.cylinders(),
            heads: self.heads(),
            sectors_per_track: self.sectors_per_track(),
            serial: self.serial(),
            firmware_revision: self.firmware_revision(),
            model: self.model(),
            capabilities: self.capabilities(),
            lba: self.lba_supported(),
            dma: self.dma_supported(),
            lba28_sectors: self.lba28_sectors(),
            command_sets: self.command_sets(),
            lba48: self.lba48_supported(),
        }
    }
}

/// Decoded IDENTIFY DEVICE fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveInfo {
    pub general_config: u16,
    pub removable: bool,
    pub fixed: bool,
    pub cylinders: u16,
    pub heads: u16,
    pub sectors_per_track: u16,
    pub serial: String,
    pub firmware_revision: String,
    pub model: String,
    pub capabilities: u16,
    pub lba: bool,
    pub dma: bool,
    pub lba28_sectors: u32,
    pub command_sets: u16,
    pub lba48: bool,
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

impl<R: Registers, D, S: DiagSink> IdeProbe<R, D, S> {
    /// Issue IDENTIFY DEVICE to the selected drive, and read back its
    /// parameter block.
    ///
    /// Should only be called once [`detect_drive`](IdeProbe::detect_drive)
    /// has succeeded. Errors reported by the drive are logged, but the
    /// transfer still goes ahead.
    pub fn identify_device(&mut self) -> IdentifyBlock {
        diag!(self.diag, Info, TAG, "identify device; wait device ready...");

        let status = self.wait_not_busy();
        self.report_status(status);

        let cmd = AtaCmd::IdentifyDevice as u8;
        diag!(self.diag, Info, TAG, "sending identify command {:#04x}", cmd);
        self.regs.write8(IdeReg::Command, cmd);

        // NOTE: only BSY is waited on, DRQ isn't checked before the transfer
        let status = self.wait_not_busy();
        self.report_status(status);

        let mut raw = [0; IDENTIFY_LEN];
        for word in raw.chunks_exact_mut(2) {
            LittleEndian::write_u16(word, self.regs.read16(IdeReg::Data));
        }
        let block = IdentifyBlock::from_bytes(raw);

        self.report_identity(&block);
        self.diag
            .hexdump(block.as_bytes().as_ptr() as usize, block.as_bytes());

        diag!(self.diag, Info, TAG, "done");
        block
    }

    fn wait_not_busy(&mut self) -> DeviceStatus {
        loop {
            match self.poll_status() {
                DeviceStatus::Busy => diag!(self.diag, Debug, TAG, "device busy..."),
                status => return status,
            }
        }
    }

    fn report_identity(&mut self, id: &IdentifyBlock) {
        let info = id.info();

        self.field("general configuration bits", format_args!("${:04x}", info.general_config));
        self.field("drive is removable?", format_args!("{}", yes_no(info.removable)));
        self.field("drive is fixed?", format_args!("{}", yes_no(info.fixed)));
        self.field("number of logical cylinders", format_args!("${:x}", info.cylinders));
        self.field("number of logical heads", format_args!("${:x}", info.heads));
        self.field("number of sectors per track", format_args!("${:x}", info.sectors_per_track));
        self.field("serial number", format_args!("{}", info.serial));
        self.field("firmware revision", format_args!("{}", info.firmware_revision));
        self.field("model number", format_args!("{}", info.model));
        self.field("total number of sectors (LBA)", format_args!("${:x}", info.lba28_sectors));
        self.field("capabilities bits", format_args!("${:04x}", info.capabilities));
        self.field("LBA is supported?", format_args!("{}", yes_no(info.lba)));
        self.field("DMA is supported?", format_args!("{}", yes_no(info.dma)));
        self.field("command sets supported", format_args!("${:04x}", info.command_sets));
        self.field("LBA48 is supported?", format_args!("{}", yes_no(info.lba48)));
    }

    fn field(&mut self, label: &str, value: std::fmt::Arguments<'_>) {
        diag!(self.diag, Info, TAG, "{:<30}: {}", label, value);
    }
}

#[cfg(test)]
mod tests {
    use ntest::timeout;

    use super::*;
    use crate::delay::NoDelay;
    use crate::diag::testing::Recorder;
    use crate::diag::Severity;
    use crate::probe::testing::FakeRegs;
    use crate::probe::DISCARD_READS;

    fn blank() -> [u16; IDENTIFY_WORDS] {
        [0; IDENTIFY_WORDS]
    }

    /// Pack `s` two characters per word, first character in the low byte.
    fn put_ascii(words: &mut [u16], s: &[u8]) {
        for (word, pair) in words.iter_mut().zip(s.chunks(2)) {
            *word = pair[0] as u16 | (*pair.get(1).unwrap_or(&b' ') as u16) << 8;
        }
    }

    #[test]
    fn lba28_sector_count_spans_two_words() {
        let mut words = blank();
        words[60] = 0x5678;
        words[61] = 0x1234;

        let id = IdentifyBlock::from_words(&words);
        assert_eq!(id.lba28_sectors(), 0x1234_5678);
        assert_eq!(id.as_bytes()[120..124], [0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn model_string_stays_inside_its_field() {
        let mut words = blank();
        for w in words[27..47].iter_mut() {
            *w = 0x2020;
        }
        words[27] = 0x4241;
        words[28] = 0x4443;
        words[29] = 0x4645;
        // whatever follows the field must not leak in
        for w in words[47..].iter_mut() {
            *w = 0x5858;
        }

        assert_eq!(IdentifyBlock::from_words(&words).model(), "ABCDEF");
    }

    #[test]
    fn unterminated_fields_lose_their_last_byte() {
        let mut words = blank();
        for w in words.iter_mut() {
            *w = 0x5a5a;
        }

        let id = IdentifyBlock::from_words(&words);
        assert_eq!(id.serial(), "Z".repeat(19));
        assert_eq!(id.firmware_revision(), "Z".repeat(7));
        assert_eq!(id.model(), "Z".repeat(39));
    }

    #[test]
    fn full_width_model_is_terminated_inside_the_field() {
        let mut words = blank();
        put_ascii(&mut words[27..47], b"0123456789abcdefghijklmnopqrstuvwxyzABCD");

        assert_eq!(
            IdentifyBlock::from_words(&words).model(),
            "0123456789abcdefghijklmnopqrstuvwxyzABC"
        );
    }

    #[test]
    fn strings_stop_at_nul() {
        let mut words = blank();
        put_ascii(&mut words[10..20], b"  WD-123");
        // NUL, then junk that must not show up
        words[14] = 0x4100;
        put_ascii(&mut words[23..27], b"1.0\0junk");

        let id = IdentifyBlock::from_words(&words);
        // leading padding is shown as delivered
        assert_eq!(id.serial(), "  WD-123");
        assert_eq!(id.firmware_revision(), "1.0");
    }

    #[test]
    fn last_word_is_addressable() {
        let mut words = blank();
        words[254] = 0xbeef;
        words[255] = 0xa5a5;

        let id = IdentifyBlock::from_words(&words);
        assert_eq!(id.word(255), 0xa5a5);
        assert_eq!(id.dword(254), 0xa5a5_beef);
    }

    #[test]
    #[should_panic]
    fn words_past_the_block_panic() {
        IdentifyBlock::from_words(&blank()).dword(255);
    }

    #[test]
    fn flag_words() {
        let mut words = blank();
        words[0] = 0x0080;
        words[1] = 1024;
        words[3] = 16;
        words[6] = 63;
        words[49] = 0x0200;
        words[83] = 0x4400;

        let info = IdentifyBlock::from_words(&words).info();
        assert!(info.removable);
        assert!(!info.fixed);
        assert_eq!((info.cylinders, info.heads, info.sectors_per_track), (1024, 16, 63));
        assert!(info.lba);
        assert!(!info.dma);
        assert!(info.lba48);

        words[0] = 0x0040;
        words[49] = 0x0100;
        words[83] = 0x4000;
        let info = IdentifyBlock::from_words(&words).info();
        assert!(info.fixed);
        assert!(!info.removable);
        assert!(!info.lba);
        assert!(info.dma);
        assert!(!info.lba48);
    }

    fn script_identify(regs: &mut FakeRegs, words: &[u16; IDENTIFY_WORDS]) {
        let poll = DISCARD_READS + 1;
        // busy, ready, (command), busy, busy, data ready
        regs.script_reads(&vec![0x80; poll]);
        regs.script_reads(&vec![0x50; poll]);
        regs.script_reads(&vec![0x80; 2 * poll]);
        regs.script_reads(&vec![0x58; poll]);
        regs.data.extend(words.iter().copied());
    }

    #[test]
    #[timeout(1000)]
    fn identify_transaction() {
        let mut words = blank();
        words[1] = 0x3fff;
        put_ascii(&mut words[27..47], b"clickydrive");

        let mut regs = FakeRegs::with_status(0x50);
        script_identify(&mut regs, &words);

        let mut probe = IdeProbe::new(regs, NoDelay::new(), Recorder::default());
        let id = probe.identify_device();

        assert_eq!(id.cylinders(), 0x3fff);
        assert_eq!(id.model(), "clickydrive");
        assert_eq!(probe.regs().writes, vec![(IdeReg::Command, 0xec)]);
        assert!(probe.regs().data.is_empty());
        assert_eq!(
            probe
                .diag()
                .at(Severity::Debug)
                .iter()
                .filter(|l| **l == "device busy...")
                .count(),
            3
        );
        assert!(probe.diag().contains("sending identify command 0xec"));
        assert!(probe
            .diag()
            .contains(&format!("{:<30}: clickydrive", "model number")));

        let dumps = &probe.diag().dumps;
        assert_eq!(dumps.len(), 1);
        assert_eq!(dumps[0].1.as_slice(), &id.as_bytes()[..]);
    }

    #[test]
    #[timeout(1000)]
    fn drive_errors_during_identify_are_only_reported() {
        let mut regs = FakeRegs::with_status(0x51);
        regs.error = 0x04;
        regs.script_reads(&vec![0x50; DISCARD_READS + 1]);
        regs.data.extend(std::iter::repeat(0xffff).take(IDENTIFY_WORDS));

        let mut probe = IdeProbe::new(regs, NoDelay::new(), Recorder::default());
        let id = probe.identify_device();

        assert!(probe.diag().at(Severity::Error).contains(&"command aborted"));
        assert!(probe.regs().data.is_empty());
        assert_eq!(id.word(255), 0xffff);
    }
}
