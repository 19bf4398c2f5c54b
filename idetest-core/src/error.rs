use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while setting up a channel.
///
/// Conditions reported by the drive itself are never errors: they surface as
/// [`DeviceStatus`](crate::DeviceStatus) and
/// [`ErrorFlags`](crate::ata::reg::ErrorFlags) values.
#[derive(Debug, Error)]
pub enum Error {
    #[error("MMIO base address cannot be null")]
    NullBase,
    #[error("MMIO base address {0:#010x} is not 4-byte aligned")]
    MisalignedBase(usize),
    #[error("{field} is {len} bytes long, but the field only holds {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("{0} must be printable ASCII")]
    NonAscii(&'static str),
    #[error("capacity of {0} bytes is smaller than a single cylinder")]
    CapacityTooSmall(u64),
}
