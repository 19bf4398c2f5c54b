//! Scriptable register file for exercising the probe without a channel.

use std::collections::VecDeque;

use crate::channel::{IdeReg, Registers};

#[derive(Debug, Default)]
pub struct FakeRegs {
    /// Status returned once the script runs dry.
    status: u8,
    script: VecDeque<u8>,
    cylinder_lo: u8,

    pub error: u8,
    /// Words handed out by 16-bit data reads, in order. Reads past the end
    /// return 0.
    pub data: VecDeque<u16>,
    /// When cleared, the cylinder low register reads back like a floating
    /// bus.
    pub latch_scratch: bool,

    pub status_reads: usize,
    pub error_reads: usize,
    pub settles: usize,
    pub writes: Vec<(IdeReg, u8)>,
}

impl FakeRegs {
    pub fn with_status(status: u8) -> FakeRegs {
        FakeRegs {
            status,
            latch_scratch: true,
            ..FakeRegs::default()
        }
    }

    /// Queue up values for the next status reads.
    pub fn script_reads(&mut self, reads: &[u8]) {
        self.script.extend(reads.iter().copied());
    }

    /// Number of drive selects issued.
    pub fn selects(&self) -> usize {
        self.writes
            .iter()
            .filter(|(reg, _)| *reg == IdeReg::DeviceHead)
            .count()
    }
}

impl Registers for FakeRegs {
    fn read8(&mut self, reg: IdeReg) -> u8 {
        match reg {
            IdeReg::Status => {
                self.status_reads += 1;
                self.script.pop_front().unwrap_or(self.status)
            }
            IdeReg::Error => {
                self.error_reads += 1;
                self.error
            }
            IdeReg::CylinderLo if self.latch_scratch => self.cylinder_lo,
            IdeReg::CylinderLo => 0xff,
            _ => 0,
        }
    }

    fn write8(&mut self, reg: IdeReg, val: u8) {
        if reg == IdeReg::CylinderLo {
            self.cylinder_lo = val;
        }
        self.writes.push((reg, val));
    }

    fn read16(&mut self, reg: IdeReg) -> u16 {
        match reg {
            IdeReg::Data => self.data.pop_front().unwrap_or(0),
            _ => self.read8(reg) as u16,
        }
    }

    fn settle(&mut self) {
        self.settles += 1;
    }
}
