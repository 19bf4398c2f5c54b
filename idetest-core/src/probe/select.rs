use bit_field::BitField;

use super::{DeviceStatus, IdeProbe, TAG};
use crate::ata::reg::DEVHEAD;
use crate::channel::{IdeIdx, IdeReg, Registers};
use crate::delay::Delay;
use crate::diag::DiagSink;

/// Values written to (and read back from) the cylinder low register to make
/// sure something is actually latching them.
const SCRATCH_PATTERNS: [u8; 2] = [0x12, 0x34];

/// Back-off between attempts while a drive spins up.
const SPINUP_BACKOFF_SECS: u32 = 1;

/// Number of selection attempts a drive gets before it's given up on.
///
/// The master is given more time to spin up than the slave.
pub fn attempt_budget(idx: IdeIdx) -> u32 {
    match idx {
        IdeIdx::IDE0 => 5,
        IdeIdx::IDE1 => 1,
    }
}

/// Device/Head value selecting `idx`, with the obsolete bits forced high.
fn select_byte(idx: IdeIdx) -> u8 {
    let mut val = 0u8;
    val.set_bit(DEVHEAD::OBS7, true)
        .set_bit(DEVHEAD::OBS5, true)
        .set_bit(DEVHEAD::DEV, idx == IdeIdx::IDE1);
    val
}

impl<R: Registers, D: Delay, S: DiagSink> IdeProbe<R, D, S> {
    /// Select drive `drive` (only the low bit counts), wait for it to become
    /// ready, and make sure it's really there.
    pub fn detect_drive(&mut self, drive: u8) -> bool {
        let idx = IdeIdx::from_index(drive);
        let mut ready = false;

        for _ in 0..attempt_budget(idx) {
            diag!(self.diag, Debug, TAG, "drive select: {}", idx);
            self.regs.write8(IdeReg::DeviceHead, select_byte(idx));

            let status = self.poll_status();
            self.report_status(status);

            match status {
                DeviceStatus::NotReady => {
                    // give the drive a chance to spin up
                    self.delay.sleep(SPINUP_BACKOFF_SECS, 0);
                }
                DeviceStatus::Ready => {
                    ready = true;
                    break;
                }
                // nothing there, or nothing waiting will fix
                _ => return false,
            }
        }

        if !ready {
            diag!(self.diag, Warn, TAG, "no drive found!");
            return false;
        }

        // a floating bus can look ready, but it won't hold on to a value
        if !self.scratch_roundtrip() {
            diag!(self.diag, Warn, TAG, "failed - no drive!");
            return false;
        }

        diag!(self.diag, Info, TAG, "drive found");
        true
    }

    fn scratch_roundtrip(&mut self) -> bool {
        SCRATCH_PATTERNS.iter().all(|&pattern| {
            self.regs.write8(IdeReg::CylinderLo, pattern);
            let readback = self.regs.read8(IdeReg::CylinderLo);
            if readback != pattern {
                diag!(
                    self.diag,
                    Debug,
                    TAG,
                    "cylinder low: wrote {:02x}, read back {:02x}",
                    pattern,
                    readback
                );
            }
            readback == pattern
        })
    }
}
