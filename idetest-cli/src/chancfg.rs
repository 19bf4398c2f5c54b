use std::str::FromStr;

use idetest_core::channel::sim::SimDriveCfg;
use idetest_core::channel::{IdeIdx, Mmio};

/// Helper struct to parse IDE channel configurations.
#[derive(Debug, PartialEq, Eq)]
pub enum ChannelCfg {
    /// `mmio[:base=<addr>]`
    Mmio { base: usize },
    /// `sim[:len=<len>,model=<s>,serial=<s>,fw=<s>,spinup=<n>,busy=<n>,slave,fault,absent]`
    Sim {
        drive: SimDriveCfg,
        slot: IdeIdx,
        absent: bool,
    },
}

impl Default for ChannelCfg {
    fn default() -> ChannelCfg {
        ChannelCfg::Sim {
            drive: SimDriveCfg::default(),
            slot: IdeIdx::IDE0,
            absent: false,
        }
    }
}

fn parse_capacity(desc: &str) -> Option<u64> {
    use human_size::{Byte, ParsingError, Size, SpecificSize};
    match desc.parse::<Size>() {
        Ok(s) => {
            let bytes: SpecificSize<Byte> = s.into();
            Some(bytes.value() as u64)
        }
        Err(ParsingError::MissingMultiple) => desc.parse::<u64>().ok(),
        Err(_) => None,
    }
}

fn parse_addr(desc: &str) -> Option<usize> {
    match desc.strip_prefix("0x").or_else(|| desc.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(&hex.replace('_', ""), 16).ok(),
        None => desc.parse::<usize>().ok(),
    }
}

impl FromStr for ChannelCfg {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<ChannelCfg, &'static str> {
        let mut s = s.splitn(2, ':');
        let kind = s.next().unwrap_or_default();
        let opts = s.next().into_iter().flat_map(|s| s.split(','));

        Ok(match kind {
            "mmio" => {
                let mut base = Mmio::DEFAULT_BASE;

                for arg in opts {
                    let mut s = arg.splitn(2, '=');
                    match s.next().unwrap_or_default() {
                        "base" => {
                            base = parse_addr(s.next().ok_or("missing argument for `base`")?)
                                .ok_or("could not parse `base`")?;
                        }
                        _ => return Err("unknown `mmio` option"),
                    }
                }

                ChannelCfg::Mmio { base }
            }
            "sim" => {
                let mut drive = SimDriveCfg::default();
                let mut slot = IdeIdx::IDE0;
                let mut absent = false;

                for arg in opts {
                    let mut s = arg.splitn(2, '=');
                    let kind = s.next().unwrap_or_default();
                    let mut val = || s.next().ok_or("missing argument for sim option");
                    match kind {
                        "len" => {
                            drive.capacity =
                                parse_capacity(val()?).ok_or("could not parse `len`")?;
                        }
                        "model" => drive.model = val()?.into(),
                        "serial" => drive.serial = val()?.into(),
                        "fw" => drive.fw_version = val()?.into(),
                        "spinup" => {
                            drive.spinup_polls =
                                val()?.parse().map_err(|_| "could not parse `spinup`")?;
                        }
                        "busy" => {
                            drive.busy_polls =
                                val()?.parse().map_err(|_| "could not parse `busy`")?;
                        }
                        "slave" => slot = IdeIdx::IDE1,
                        "fault" => drive.fault = true,
                        "absent" => absent = true,
                        "" => {}
                        _ => return Err("unknown `sim` option"),
                    }
                }

                ChannelCfg::Sim {
                    drive,
                    slot,
                    absent,
                }
            }
            _ => return Err("invalid channel kind"),
        })
    }
}
