//! Diagnostic sink: leveled, tagged log lines plus raw memory dumps.
//!
//! The probe never reaches for a global logger directly. It narrates through
//! a [`DiagSink`], which lets tests capture every line, and lets the binary
//! forward everything to the `log` facade via [`LogSink`].

use std::fmt;

pub mod hexdump;

/// Log a line through a [`DiagSink`].
///
/// `diag!(sink, Info, "IDE", "found {} drives", n)`
#[macro_export]
macro_rules! diag {
    ($sink:expr, $severity:ident, $tag:expr, $($args:tt)*) => {
        $crate::diag::DiagSink::log(
            &mut $sink,
            $crate::diag::Severity::$severity,
            $tag,
            format_args!($($args)*),
        )
    };
}

/// Severity tiers, most severe first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Verbose,
}

impl Severity {
    /// Corresponding `log` level. `log` has no fatal tier, so fatal lines are
    /// emitted as errors (with a marker, see [`LogSink`]).
    pub fn level(self) -> log::Level {
        match self {
            Severity::Fatal | Severity::Error => log::Level::Error,
            Severity::Warn => log::Level::Warn,
            Severity::Info => log::Level::Info,
            Severity::Debug => log::Level::Debug,
            Severity::Verbose => log::Level::Trace,
        }
    }
}

/// Receives the probe's diagnostics.
pub trait DiagSink {
    /// Emit a single log line.
    fn log(&mut self, severity: Severity, tag: &str, args: fmt::Arguments<'_>);

    /// Dump `bytes`, labelling rows as if they started at `addr`.
    fn hexdump(&mut self, addr: usize, bytes: &[u8]);
}

impl<S: DiagSink + ?Sized> DiagSink for &mut S {
    fn log(&mut self, severity: Severity, tag: &str, args: fmt::Arguments<'_>) {
        (**self).log(severity, tag, args)
    }

    fn hexdump(&mut self, addr: usize, bytes: &[u8]) {
        (**self).hexdump(addr, bytes)
    }
}

/// Forwards diagnostics to the `log` facade, using the tag as the log target.
///
/// Hex dumps go to the `MEM` target: the header line at trace level, and the
/// rows themselves only if debug level is enabled for `MEM`.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogSink;

impl LogSink {
    pub const MEM_TARGET: &'static str = "MEM";
}

impl DiagSink for LogSink {
    fn log(&mut self, severity: Severity, tag: &str, args: fmt::Arguments<'_>) {
        match severity {
            Severity::Fatal => log!(target: tag, severity.level(), "FATAL: {}", args),
            _ => log!(target: tag, severity.level(), "{}", args),
        }
    }

    fn hexdump(&mut self, addr: usize, bytes: &[u8]) {
        trace!(target: Self::MEM_TARGET, "{}", hexdump::header(addr, bytes.len()));

        if !log_enabled!(target: Self::MEM_TARGET, log::Level::Debug) {
            return;
        }

        for row in hexdump::rows(addr, bytes) {
            debug!(target: Self::MEM_TARGET, "{}", row);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every diagnostic, for assertions.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub lines: Vec<(Severity, String, String)>,
        pub dumps: Vec<(usize, Vec<u8>)>,
    }

    impl Recorder {
        pub fn at(&self, severity: Severity) -> Vec<&str> {
            self.lines
                .iter()
                .filter(|(s, _, _)| *s == severity)
                .map(|(_, _, msg)| msg.as_str())
                .collect()
        }

        pub fn contains(&self, needle: &str) -> bool {
            self.lines.iter().any(|(_, _, msg)| msg.contains(needle))
        }
    }

    impl DiagSink for Recorder {
        fn log(&mut self, severity: Severity, tag: &str, args: fmt::Arguments<'_>) {
            self.lines.push((severity, tag.to_string(), args.to_string()));
        }

        fn hexdump(&mut self, addr: usize, bytes: &[u8]) {
            self.dumps.push((addr, bytes.to_vec()));
        }
    }
}
