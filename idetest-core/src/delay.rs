//! Coarse blocking delays.

use std::time::Duration;

/// Blocks the calling thread for (at least) the requested time.
///
/// Only used for the spin-up back-off while selecting a drive, so
/// implementations don't need to be precise.
pub trait Delay {
    fn sleep(&mut self, secs: u32, micros: u32);
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn sleep(&mut self, secs: u32, micros: u32) {
        (**self).sleep(secs, micros)
    }
}

/// Sleeps using the host's scheduler.
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadSleep;

impl Delay for ThreadSleep {
    fn sleep(&mut self, secs: u32, micros: u32) {
        debug!("sleep {} s and {} us...", secs, micros);
        std::thread::sleep(Duration::from_secs(secs as u64) + Duration::from_micros(micros as u64));
    }
}

/// Doesn't actually wait, but remembers every request.
///
/// Handy when the channel on the other end is simulated, and there's nothing
/// to wait for.
#[derive(Debug, Default, Clone)]
pub struct NoDelay {
    requests: Vec<Duration>,
}

impl NoDelay {
    pub fn new() -> NoDelay {
        NoDelay::default()
    }

    /// Every delay requested so far, in order.
    pub fn requests(&self) -> &[Duration] {
        &self.requests
    }
}

impl Delay for NoDelay {
    fn sleep(&mut self, secs: u32, micros: u32) {
        trace!("skipping sleep of {} s and {} us", secs, micros);
        self.requests
            .push(Duration::from_secs(secs as u64) + Duration::from_micros(micros as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_delay_records_requests() {
        let mut delay = NoDelay::new();
        {
            let mut borrowed = &mut delay;
            borrowed.sleep(1, 0);
            borrowed.sleep(0, 250);
        }
        assert_eq!(
            delay.requests(),
            &[Duration::from_secs(1), Duration::from_micros(250)]
        );
    }

    #[test]
    fn thread_sleep_waits() {
        let start = std::time::Instant::now();
        ThreadSleep.sleep(0, 2_000);
        assert!(start.elapsed() >= Duration::from_micros(2_000));
    }
}
