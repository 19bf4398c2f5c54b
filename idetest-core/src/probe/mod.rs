//! Drive detection and identification over a polled IDE channel.
//!
//! The typical sequence is:
//!
//! ```no_run
//! use idetest_core::channel::Mmio;
//! use idetest_core::delay::ThreadSleep;
//! use idetest_core::diag::LogSink;
//! use idetest_core::IdeProbe;
//!
//! let mmio = unsafe { Mmio::new(Mmio::DEFAULT_BASE) }.unwrap();
//! let mut probe = IdeProbe::new(mmio, ThreadSleep, LogSink);
//! if probe.detect_drive(0) {
//!     let id = probe.identify_device();
//!     println!("{}", id.model());
//! }
//! ```

mod identify;
mod select;
mod status;

#[cfg(test)]
mod testing;

pub use identify::{DriveInfo, IdentifyBlock};
pub use select::attempt_budget;
pub use status::{DeviceStatus, DISCARD_READS};

/// Log tag used for everything the probe reports.
const TAG: &str = "IDE";

/// Probes a single IDE channel.
///
/// Owns (or mutably borrows, since the collaborator traits are implemented
/// for `&mut T`) the channel's registers, a delay service for spin-up
/// back-off, and the sink that receives every diagnostic.
#[derive(Debug)]
pub struct IdeProbe<R, D, S> {
    regs: R,
    delay: D,
    diag: S,
}

impl<R, D, S> IdeProbe<R, D, S> {
    pub fn new(regs: R, delay: D, diag: S) -> IdeProbe<R, D, S> {
        IdeProbe { regs, delay, diag }
    }

    pub fn regs(&self) -> &R {
        &self.regs
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn diag(&self) -> &S {
        &self.diag
    }
}
