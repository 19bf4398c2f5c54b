//! Polled ATA/IDE drive detection and IDENTIFY DEVICE decoding.
//!
//! Everything here talks to a single controller channel through the
//! [`channel::Registers`] trait, and reports what it sees through an injected
//! [`diag::DiagSink`]. The only blocking wait (drive spin-up back-off) goes
//! through an injected [`delay::Delay`].

#[macro_use]
extern crate static_assertions;

#[macro_use]
extern crate log;

#[macro_use]
pub mod diag;

pub mod ata;
pub mod channel;
pub mod delay;
pub mod error;
pub mod probe;

pub use error::{Error, Result};
pub use probe::{DeviceStatus, DriveInfo, IdeProbe, IdentifyBlock};
