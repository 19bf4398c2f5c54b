#[macro_use]
extern crate log;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error>>;

use structopt::StructOpt;

use idetest_core::channel::sim::SimDriveCfg;
use idetest_core::channel::{IdeIdx, Mmio, Registers, SimController};
use idetest_core::delay::{Delay, NoDelay, ThreadSleep};
use idetest_core::diag::LogSink;
use idetest_core::{diag, IdeProbe};

mod chancfg;

use crate::chancfg::ChannelCfg;

/// Exit status when the requested drive never shows up.
const EXIT_NO_DRIVE: i32 = 2;

#[derive(StructOpt)]
#[structopt(name = "idetest")]
#[structopt(about = r#"
Probe an IDE channel for a drive, and dump its IDENTIFY DEVICE data.
"#)]
struct Args {
    /// IDE channel to probe.
    ///
    /// `mmio[:base=<addr>]` accesses the controller's register block
    /// directly, and only makes sense where that address is identity mapped.
    ///
    /// `sim[:len=<size>,model=<s>,serial=<s>,fw=<s>,spinup=<n>,busy=<n>,slave,fault,absent]`
    /// probes a simulated drive instead. `spinup` and `busy` count status
    /// reads, `slave` attaches the drive as device 1, and `absent` leaves the
    /// channel empty.
    ///
    /// e.g: `--channel sim:spinup=40` takes a few rounds of back-off before
    /// the drive reports ready.
    #[structopt(long, default_value = "sim")]
    channel: ChannelCfg,

    /// Drive to probe (0 = master, 1 = slave).
    #[structopt(short, long, default_value = "0", possible_values = &["0", "1"])]
    drive: u8,
}

fn main() -> DynResult<()> {
    pretty_env_logger::formatted_builder()
        .filter(None, log::LevelFilter::Error)
        .filter(Some("idetest"), log::LevelFilter::Trace)
        .filter(Some("idetest_core"), log::LevelFilter::Info)
        .filter(Some("IDE"), log::LevelFilter::Debug)
        .filter(Some("MEM"), log::LevelFilter::Trace)
        .filter(Some("SIM"), log::LevelFilter::Info)
        .parse_filters(&std::env::var("RUST_LOG").unwrap_or_default())
        .init();

    let args = Args::from_args();

    info!("idetest v{}", env!("CARGO_PKG_VERSION"));

    let found = match args.channel {
        ChannelCfg::Mmio { base } => {
            info!("probing IDE registers at {:#010x}", base);
            // only as sound as the user's claim that the block lives there
            let regs = unsafe { Mmio::new(base)? };
            run(regs, ThreadSleep, args.drive)
        }
        ChannelCfg::Sim {
            drive,
            slot,
            absent,
        } => {
            // nothing to wait for: the drive only advances on status reads
            run(sim_channel(drive, slot, absent)?, NoDelay::new(), args.drive)
        }
    };

    if !found {
        diag!(LogSink, Fatal, "idetest", "no drive detected on device {}", args.drive);
        std::process::exit(EXIT_NO_DRIVE);
    }

    Ok(())
}

fn sim_channel(drive: SimDriveCfg, slot: IdeIdx, absent: bool) -> DynResult<SimController> {
    let mut sim = SimController::new();
    if absent {
        info!("probing an empty simulated channel");
    } else {
        info!("simulated {} drive: {:#?}", slot, drive);
        sim.attach(slot, drive)?;
    }
    Ok(sim)
}

/// Detect `drive`, and identify it if it's there. Returns whether the drive
/// was found.
fn run(regs: impl Registers, delay: impl Delay, drive: u8) -> bool {
    let mut probe = IdeProbe::new(regs, delay, LogSink);

    if !probe.detect_drive(drive) {
        return false;
    }

    let id = probe.identify_device();
    info!(
        "{} (serial {}, firmware {}): {} sectors",
        id.model(),
        id.serial(),
        id.firmware_revision(),
        id.lba28_sectors()
    );

    true
}
