use super::{IdeProbe, TAG};
use crate::ata::reg::{ErrorFlags, StatusFlags, ERROR_DESCRIPTIONS};
use crate::channel::{IdeReg, Registers};
use crate::diag::DiagSink;

/// Number of throwaway status reads before the one that counts.
///
/// The status register needs at least 400ns to settle after a drive select
/// or command write. 15 reads with a ~1us gap each is plenty.
pub const DISCARD_READS: usize = 15;

/// Condition of the selected device, as seen by a single status read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Ready to accept commands.
    Ready,
    /// BSY and DRDY both set: what a floating bus looks like.
    NotPresent,
    Busy,
    /// Command failed. Details are in the error register.
    Error,
    Fault,
    /// Neither busy nor ready (e.g: still spinning up).
    NotReady,
}

impl DeviceStatus {
    /// Classify a raw status register value.
    ///
    /// First match wins: NotReady, NotPresent, Busy, Error, Fault, Ready.
    pub fn classify(status: StatusFlags) -> DeviceStatus {
        let bsy_drdy = status & (StatusFlags::BSY | StatusFlags::DRDY);

        if bsy_drdy.is_empty() {
            DeviceStatus::NotReady
        } else if bsy_drdy == StatusFlags::BSY | StatusFlags::DRDY {
            DeviceStatus::NotPresent
        } else if status.contains(StatusFlags::BSY) {
            DeviceStatus::Busy
        } else if status.contains(StatusFlags::ERR) {
            DeviceStatus::Error
        } else if status.contains(StatusFlags::DF) {
            DeviceStatus::Fault
        } else {
            DeviceStatus::Ready
        }
    }

    /// Which bits decided the classification.
    fn cause(self) -> &'static str {
        match self {
            DeviceStatus::NotReady => "!(BSY | DRDY)",
            DeviceStatus::NotPresent => "BSY & DRDY",
            DeviceStatus::Busy => "BSY",
            DeviceStatus::Error => "ERR",
            DeviceStatus::Fault => "DF",
            DeviceStatus::Ready => "DRDY",
        }
    }
}

impl<R: Registers, D, S: DiagSink> IdeProbe<R, D, S> {
    /// Read the status register once it has had time to settle, and classify
    /// it.
    pub fn poll_status(&mut self) -> DeviceStatus {
        for i in 0..DISCARD_READS {
            self.regs.settle();
            let status = self.regs.read8(IdeReg::Status);
            diag!(self.diag, Verbose, TAG, "dummy read #{:2}; status = {:02x}", i, status);
        }

        let raw = self.regs.read8(IdeReg::Status);
        diag!(self.diag, Debug, TAG, "status: {:02x}", raw);

        let status = DeviceStatus::classify(StatusFlags::from_bits_truncate(raw));
        diag!(self.diag, Verbose, TAG, "{} => {:?}", status.cause(), status);
        status
    }

    /// Narrate a classification. `Error` is handed to
    /// [`report_error`](IdeProbe::report_error).
    pub fn report_status(&mut self, status: DeviceStatus) {
        match status {
            DeviceStatus::Ready => diag!(self.diag, Debug, TAG, "device ready to accept commands"),
            DeviceStatus::NotPresent => diag!(self.diag, Info, TAG, "device not present"),
            DeviceStatus::Busy => diag!(self.diag, Warn, TAG, "device busy"),
            DeviceStatus::Fault => diag!(self.diag, Error, TAG, "device faulted"),
            DeviceStatus::NotReady => diag!(self.diag, Warn, TAG, "device not ready"),
            DeviceStatus::Error => {
                self.report_error();
            }
        }
    }

    /// Read the error register and report every flag that's set.
    ///
    /// Only meaningful right after a poll classified as `Error`.
    pub fn report_error(&mut self) -> ErrorFlags {
        let flags = ErrorFlags::from_bits_truncate(self.regs.read8(IdeReg::Error));

        if flags.is_empty() {
            diag!(self.diag, Error, TAG, "error, but no error flags set");
        }

        for (flag, desc) in ERROR_DESCRIPTIONS.iter() {
            if flags.contains(*flag) {
                diag!(self.diag, Error, TAG, "{}", desc);
            }
        }

        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::NoDelay;
    use crate::diag::testing::Recorder;
    use crate::diag::Severity;
    use crate::probe::testing::FakeRegs;

    fn probe(regs: FakeRegs) -> IdeProbe<FakeRegs, NoDelay, Recorder> {
        IdeProbe::new(regs, NoDelay::new(), Recorder::default())
    }

    const BSY: u8 = 0x80;
    const DRDY: u8 = 0x40;
    const DF: u8 = 0x20;
    const ERR: u8 = 0x01;

    #[test]
    fn not_busy_and_not_ready_is_not_ready() {
        for raw in 0..=0xffu8 {
            if raw & (BSY | DRDY) == 0 {
                let status = DeviceStatus::classify(StatusFlags::from_bits_truncate(raw));
                assert_eq!(status, DeviceStatus::NotReady, "{:02x}", raw);
            }
        }
    }

    #[test]
    fn classification_is_total_and_ordered() {
        for raw in 0..=0xffu8 {
            let expected = if raw & (BSY | DRDY) == 0 {
                DeviceStatus::NotReady
            } else if raw & (BSY | DRDY) == BSY | DRDY {
                DeviceStatus::NotPresent
            } else if raw & BSY != 0 {
                DeviceStatus::Busy
            } else if raw & ERR != 0 {
                DeviceStatus::Error
            } else if raw & DF != 0 {
                DeviceStatus::Fault
            } else {
                DeviceStatus::Ready
            };

            let status = DeviceStatus::classify(StatusFlags::from_bits_truncate(raw));
            assert_eq!(status, expected, "{:02x}", raw);
        }
    }

    #[test]
    fn busy_and_ready_means_nobody_home() {
        assert_eq!(DeviceStatus::classify(StatusFlags::all()), DeviceStatus::NotPresent);
        assert_eq!(
            DeviceStatus::classify(StatusFlags::BSY | StatusFlags::DRDY),
            DeviceStatus::NotPresent
        );
        assert_eq!(
            DeviceStatus::classify(StatusFlags::BSY | StatusFlags::ERR),
            DeviceStatus::Busy
        );
        assert_eq!(
            DeviceStatus::classify(StatusFlags::DRDY | StatusFlags::ERR | StatusFlags::DF),
            DeviceStatus::Error
        );
        assert_eq!(
            DeviceStatus::classify(StatusFlags::DRDY | StatusFlags::DF),
            DeviceStatus::Fault
        );
        assert_eq!(
            DeviceStatus::classify(StatusFlags::DRDY | StatusFlags::DRQ),
            DeviceStatus::Ready
        );
    }

    #[test]
    fn poll_discards_reads_before_classifying() {
        let mut regs = FakeRegs::with_status(0x50);
        // the last read is the one that counts
        regs.script_reads(&[0x80; DISCARD_READS]);

        let mut probe = probe(regs);
        assert_eq!(probe.poll_status(), DeviceStatus::Ready);
        assert_eq!(probe.regs().status_reads, DISCARD_READS + 1);
        assert_eq!(probe.regs().settles, DISCARD_READS);
        assert_eq!(probe.diag().at(Severity::Verbose).len(), DISCARD_READS + 1);
        assert_eq!(probe.diag().at(Severity::Debug), vec!["status: 50"]);
    }

    #[test]
    fn polling_has_no_hidden_state() {
        let mut probe = probe(FakeRegs::with_status(0x58));
        let first = probe.poll_status();
        for _ in 0..10 {
            assert_eq!(probe.poll_status(), first);
        }
    }

    #[test]
    fn error_bits_are_reported_independently() {
        let mut regs = FakeRegs::with_status(0x51);
        regs.error = (ErrorFlags::ABRT | ErrorFlags::BBK).bits();

        let mut probe = probe(regs);
        let flags = probe.report_error();

        assert_eq!(flags, ErrorFlags::ABRT | ErrorFlags::BBK);
        assert_eq!(
            probe.diag().at(Severity::Error),
            vec!["command aborted", "bad block"]
        );
    }

    #[test]
    fn every_error_bit_gets_its_own_line() {
        let mut regs = FakeRegs::with_status(0x51);
        regs.error = 0xff;

        let mut probe = probe(regs);
        assert_eq!(probe.report_error(), ErrorFlags::all());
        assert_eq!(probe.diag().at(Severity::Error).len(), 8);
    }

    #[test]
    fn error_without_flags_is_called_out() {
        let mut probe = probe(FakeRegs::with_status(0x51));
        probe.report_status(DeviceStatus::Error);

        assert_eq!(
            probe.diag().at(Severity::Error),
            vec!["error, but no error flags set"]
        );
        assert_eq!(probe.regs().error_reads, 1);
    }

    #[test]
    fn only_error_touches_the_error_register() {
        let mut probe = probe(FakeRegs::with_status(0x50));
        for status in [
            DeviceStatus::Ready,
            DeviceStatus::NotPresent,
            DeviceStatus::Busy,
            DeviceStatus::Fault,
            DeviceStatus::NotReady,
        ]
        .iter()
        {
            probe.report_status(*status);
        }

        assert_eq!(probe.regs().error_reads, 0);
        assert!(probe.diag().contains("device faulted"));
        assert!(probe.diag().contains("device not present"));
    }
}
