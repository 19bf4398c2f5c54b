//! A simulated IDE channel.
//!
//! Lets the probe run somewhere without the real controller. Drives are
//! modelled just far enough to answer the probe: power-on spin-up, drive
//! selection, the scratch registers, and IDENTIFY DEVICE. Any other command
//! is refused the way a drive refuses commands it doesn't support, with ERR
//! set and ABRT in the error register.

use std::convert::TryFrom;

use bit_field::BitField;

use super::{IdeIdx, IdeReg, Registers};
use crate::ata::reg::{ErrorFlags, StatusFlags, DEVHEAD};
use crate::ata::{AtaCmd, IDENTIFY_LEN};
use crate::error::{Error, Result};

mod identify;

use identify::IdeDriveMeta;

const NUM_HEADS: usize = 16;
const NUM_SECTORS: usize = 63;

/// Value read back from a channel with no drive driving the bus.
const OPEN_BUS: u8 = 0xff;

/// Configuration of a simulated drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimDriveCfg {
    /// Size of the drive, in bytes.
    pub capacity: u64,
    /// At most 40 ASCII characters.
    pub model: String,
    /// At most 20 ASCII characters.
    pub serial: String,
    /// At most 8 ASCII characters.
    pub fw_version: String,
    /// Number of status reads before the drive reports ready after power-on.
    pub spinup_polls: u32,
    /// Number of status reads a command keeps the drive busy for.
    pub busy_polls: u32,
    /// Report a device fault instead of becoming ready.
    pub fault: bool,
}

impl Default for SimDriveCfg {
    fn default() -> SimDriveCfg {
        SimDriveCfg {
            capacity: 40 * 1024 * 1024,
            model: "idetest simulated drive".into(),
            serial: "SIM0000000000001".into(),
            fw_version: "0.1".into(),
            spinup_polls: 0,
            busy_polls: 2,
            fault: false,
        }
    }
}

impl SimDriveCfg {
    fn validate(&self) -> Result<()> {
        let check = |field: &'static str, s: &str, max: usize| {
            if !s.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
                return Err(Error::NonAscii(field));
            }
            if s.len() > max {
                return Err(Error::FieldTooLong {
                    field,
                    len: s.len(),
                    max,
                });
            }
            Ok(())
        };

        check("model", &self.model, 40)?;
        check("serial", &self.serial, 20)?;
        check("firmware revision", &self.fw_version, 8)?;

        if self.capacity < (NUM_HEADS * NUM_SECTORS * 512) as u64 {
            return Err(Error::CapacityTooSmall(self.capacity));
        }

        Ok(())
    }

    fn identify_data(&self) -> [u8; IDENTIFY_LEN] {
        let cylinders = self.capacity / (NUM_HEADS * NUM_SECTORS * 512) as u64;

        let drive_meta = IdeDriveMeta {
            total_sectors: self.capacity / 512,
            // CHS geometry tops out at 16383 cylinders
            cylinders: cylinders.min(16383) as u16,
            heads: NUM_HEADS as u16,
            sectors: NUM_SECTORS as u16,
            serial: self.serial.as_bytes(),
            fw_version: self.fw_version.as_bytes(),
            model: self.model.as_bytes(),
        };

        let mut data = [0; IDENTIFY_LEN];
        // won't panic, since `DriveId` is statically asserted to be exactly
        // 512 bytes long.
        data.copy_from_slice(bytemuck::bytes_of(&drive_meta.to_drive_id()));
        data
    }
}

mod iobuf {
    use crate::ata::IDENTIFY_LEN;

    pub struct IdeIoBuf {
        buf: [u8; IDENTIFY_LEN],
        idx: usize,
    }

    impl std::fmt::Debug for IdeIoBuf {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
            f.debug_struct("IdeIoBuf")
                .field("buf", &"[...]")
                .field("idx", &self.idx)
                .finish()
        }
    }

    impl IdeIoBuf {
        pub fn empty() -> IdeIoBuf {
            IdeIoBuf {
                buf: [0; IDENTIFY_LEN],
                idx: IDENTIFY_LEN,
            }
        }

        pub fn read8(&mut self) -> Option<u8> {
            let ret = *self.buf.get(self.idx)?;
            self.idx += 1;
            Some(ret)
        }

        /// Load a fresh sector, and reset the cursor to the start of it.
        pub fn load(&mut self, data: &[u8; IDENTIFY_LEN]) {
            self.buf = *data;
            self.idx = 0;
        }

        /// Check if the transfer is done
        pub fn is_done_transfer(&self) -> bool {
            self.idx >= IDENTIFY_LEN
        }
    }
}
use iobuf::IdeIoBuf;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum IdeDriveState {
    /// Powering on. Counts down status reads until ready.
    SpinUp(u32),
    Idle,
    /// Executing a command. Counts down status reads until it completes.
    Busy(AtaCmd, u32),
    /// Rejecting a command. Counts down status reads until ERR is raised.
    Aborting(u32),
    ReadReady,
}

#[derive(Debug, Default)]
struct IdeRegs {
    error: u8,
    feature: u8,
    sector_count: u8,
    sector_no: u8,
    cyl_lo: u8,
    cyl_hi: u8,
    dev_head: u8,
    status: StatusFlags,
}

#[derive(Debug)]
struct IdeDrive {
    cfg: SimDriveCfg,
    identify: [u8; IDENTIFY_LEN],

    state: IdeDriveState,

    iobuf: IdeIoBuf,
    reg: IdeRegs,
}

impl IdeDrive {
    fn new(cfg: SimDriveCfg) -> IdeDrive {
        let mut drive = IdeDrive {
            identify: cfg.identify_data(),
            state: IdeDriveState::Idle,
            iobuf: IdeIoBuf::empty(),
            reg: IdeRegs::default(),
            cfg,
        };
        drive.power_on();
        drive
    }

    fn power_on(&mut self) {
        self.iobuf = IdeIoBuf::empty();
        self.reg.error = 0x01; // diagnostic code: no error detected
        if self.cfg.spinup_polls == 0 {
            self.become_ready();
        } else {
            self.state = IdeDriveState::SpinUp(self.cfg.spinup_polls);
            self.reg.status = StatusFlags::empty();
        }
    }

    fn become_ready(&mut self) {
        self.state = IdeDriveState::Idle;
        self.reg.status = StatusFlags::DRDY | StatusFlags::DSC;
        if self.cfg.fault {
            self.reg.status |= StatusFlags::DF;
        }
    }

    /// Every status read moves the drive one step closer to finishing
    /// whatever it's doing.
    fn tick(&mut self) {
        match self.state {
            IdeDriveState::SpinUp(0) => self.become_ready(),
            IdeDriveState::SpinUp(n) => self.state = IdeDriveState::SpinUp(n - 1),
            IdeDriveState::Busy(cmd, 0) => self.complete_cmd(cmd),
            IdeDriveState::Busy(cmd, n) => self.state = IdeDriveState::Busy(cmd, n - 1),
            IdeDriveState::Aborting(0) => self.abort_cmd(),
            IdeDriveState::Aborting(n) => self.state = IdeDriveState::Aborting(n - 1),
            IdeDriveState::Idle | IdeDriveState::ReadReady => {}
        }
    }

    fn exec_cmd(&mut self, cmd: u8) {
        match self.state {
            IdeDriveState::Idle | IdeDriveState::ReadReady => {}
            state => {
                warn!(target: "SIM", "ignoring IDE cmd {:#04x?} while drive is {:?}", cmd, state);
                return;
            }
        }

        (self.reg.status).remove(StatusFlags::ERR | StatusFlags::DRQ);
        (self.reg.status).insert(StatusFlags::BSY);
        self.reg.error = 0;

        let busy = self.cfg.busy_polls;
        self.state = match AtaCmd::try_from(cmd) {
            Ok(AtaCmd::IdentifyDevice) => IdeDriveState::Busy(AtaCmd::IdentifyDevice, busy),
            Ok(other) => {
                debug!(target: "SIM", "refusing unsupported IDE command {:?}", other);
                IdeDriveState::Aborting(busy)
            }
            Err(_) => {
                debug!(target: "SIM", "refusing unknown IDE command {:#04x?}", cmd);
                IdeDriveState::Aborting(busy)
            }
        };

        if busy == 0 {
            self.tick();
        }
    }

    fn complete_cmd(&mut self, cmd: AtaCmd) {
        match cmd {
            AtaCmd::IdentifyDevice => {
                self.iobuf.load(&self.identify);
                self.state = IdeDriveState::ReadReady;
                (self.reg.status).remove(StatusFlags::BSY);
                (self.reg.status).insert(StatusFlags::DRQ | StatusFlags::DRDY);
            }
            other => {
                // only IDENTIFY DEVICE is ever scheduled
                warn!(target: "SIM", "unexpected pending command {:?}", other);
                self.abort_cmd();
            }
        }
    }

    fn abort_cmd(&mut self) {
        self.state = IdeDriveState::Idle;
        self.reg.error = ErrorFlags::ABRT.bits();
        (self.reg.status).remove(StatusFlags::BSY | StatusFlags::DRQ);
        (self.reg.status).insert(StatusFlags::ERR | StatusFlags::DRDY);
    }

    fn data_read8(&mut self) -> u8 {
        if self.state != IdeDriveState::ReadReady {
            warn!(target: "SIM", "data read while drive is {:?}", self.state);
            return 0;
        }

        let ret = self.iobuf.read8().unwrap_or(0);

        if self.iobuf.is_done_transfer() {
            self.state = IdeDriveState::Idle;
            (self.reg.status).remove(StatusFlags::DRQ);
        }

        ret
    }

    fn status(&mut self) -> u8 {
        self.tick();
        self.reg.status.bits()
    }
}

/// Simulated IDE channel with up to two drives.
#[derive(Debug)]
pub struct SimController {
    selected_device: IdeIdx,
    ide0: Option<IdeDrive>,
    ide1: Option<IdeDrive>,

    selects: usize,
}

impl Default for SimController {
    fn default() -> SimController {
        SimController::new()
    }
}

impl SimController {
    /// A channel with nothing attached.
    pub fn new() -> SimController {
        SimController {
            selected_device: IdeIdx::IDE0,
            ide0: None,
            ide1: None,
            selects: 0,
        }
    }

    /// Attach a (freshly powered-on) drive to the channel. Returns the
    /// configuration of the previously-attached drive (if applicable).
    pub fn attach(&mut self, idx: IdeIdx, cfg: SimDriveCfg) -> Result<Option<SimDriveCfg>> {
        cfg.validate()?;

        let old_drive = self.detach(idx);
        *self.slot(idx) = Some(IdeDrive::new(cfg));
        Ok(old_drive)
    }

    /// Detach a drive from the channel. Returns its configuration (if
    /// applicable).
    pub fn detach(&mut self, idx: IdeIdx) -> Option<SimDriveCfg> {
        self.slot(idx).take().map(|ide| ide.cfg)
    }

    /// Number of writes to the Device/Head register so far.
    pub fn select_count(&self) -> usize {
        self.selects
    }

    fn slot(&mut self, idx: IdeIdx) -> &mut Option<IdeDrive> {
        match idx {
            IdeIdx::IDE0 => &mut self.ide0,
            IdeIdx::IDE1 => &mut self.ide1,
        }
    }

    fn selected(&mut self) -> Option<&mut IdeDrive> {
        let idx = self.selected_device;
        let ide = self.slot(idx).as_mut();
        if ide.is_none() {
            // not a real error. The probe might just be checking for drives.
            trace!(target: "SIM", "access to {} when no drive is connected", idx);
        }
        ide
    }
}

impl Registers for SimController {
    fn read8(&mut self, reg: IdeReg) -> u8 {
        use IdeReg::*;

        if let IntStatus | DriveAddr = reg {
            trace!(target: "SIM", "{:?} isn't modelled, floating high", reg);
            return OPEN_BUS;
        }

        let ide = match self.selected() {
            Some(ide) => ide,
            None => return OPEN_BUS,
        };

        match reg {
            Data => ide.data_read8(),
            Error | Features => ide.reg.error,
            SectorCount => ide.reg.sector_count,
            SectorNo => ide.reg.sector_no,
            CylinderLo => ide.reg.cyl_lo,
            CylinderHi => ide.reg.cyl_hi,
            DeviceHead => ide.reg.dev_head,
            Status | Command | AltStatus | DevControl => ide.status(),
            IntStatus | DriveAddr => unreachable!("handled above"),
        }
    }

    fn write8(&mut self, reg: IdeReg, val: u8) {
        use IdeReg::*;

        if let DeviceHead = reg {
            self.selects += 1;
            self.selected_device = val.get_bit(DEVHEAD::DEV).into();
            if let Some(ide) = self.selected() {
                ide.reg.dev_head = val;
            }
            return;
        }

        let ide = match self.selected() {
            Some(ide) => ide,
            None => return,
        };

        match reg {
            Data => warn!(target: "SIM", "ignoring data write {:#04x?}", val),
            Features | Error => ide.reg.feature = val,
            SectorCount => ide.reg.sector_count = val,
            SectorNo => ide.reg.sector_no = val,
            CylinderLo => ide.reg.cyl_lo = val,
            CylinderHi => ide.reg.cyl_hi = val,
            Command | Status => ide.exec_cmd(val),
            DevControl | AltStatus | IntStatus | DriveAddr => {
                trace!(target: "SIM", "ignoring write of {:#04x?} to {:?}", val, reg)
            }
            DeviceHead => unreachable!("handled above"),
        }
    }

    fn read16(&mut self, reg: IdeReg) -> u16 {
        match reg {
            IdeReg::Data => {
                let lo = self.read8(IdeReg::Data);
                let hi = self.read8(IdeReg::Data);
                u16::from_le_bytes([lo, hi])
            }
            _ => self.read8(reg) as u16,
        }
    }

    fn settle(&mut self) {}
}
