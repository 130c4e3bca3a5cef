//! Defines the diagnostic console that logs to standard error.

use std::io::{self, Stderr, Write};

use log::{LevelFilter, SetLoggerError};
use spin::{Mutex, Once};

pub struct Console {
    level: LevelFilter,
    stderr: Mutex<Stderr>,
}

static DEFAULT: Once<Console> = Once::new();

impl Console {
    /// Installs the console as the global logger.
    ///
    /// Only the first call chooses the level; later calls fail because a logger is already set.
    pub fn init(level: LevelFilter) -> Result<&'static Self, SetLoggerError> {
        let console = DEFAULT.call_once(|| Console {
            level,
            stderr: Mutex::new(io::stderr()),
        });
        console.install()?;
        Ok(console)
    }

    fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.level);
        Ok(())
    }

    /// Maps a `-v` count onto a level filter.
    pub fn level_for(verbosity: u8) -> LevelFilter {
        match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

impl log::Log for Console {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Nowhere left to report a failed write to stderr.
        let _ = write_log_entry_to(&mut *self.stderr.lock(), record);
    }

    fn flush(&self) {
        let _ = self.stderr.lock().flush();
    }
}

fn write_log_entry_to(writer: &mut impl Write, record: &log::Record) -> io::Result<()> {
    #[cfg(debug_assertions)]
    return writeln!(
        writer,
        "[{} {}:{} {}] {}",
        record.level(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.target(),
        record.args()
    );
    #[cfg(not(debug_assertions))]
    return writeln!(writer, "[{:5}] {}", record.level(), record.args());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(Console::level_for(0), LevelFilter::Warn);
        assert_eq!(Console::level_for(1), LevelFilter::Info);
        assert_eq!(Console::level_for(2), LevelFilter::Debug);
        assert_eq!(Console::level_for(3), LevelFilter::Trace);
        assert_eq!(Console::level_for(200), LevelFilter::Trace);
    }

    #[test]
    fn second_install_is_rejected() {
        let _ = Console::init(LevelFilter::Warn);
        let message = Console::init(LevelFilter::Trace)
            .map(|_| ())
            .map_err(|err| err.to_string())
            .unwrap_err();
        assert!(!message.is_empty());
        assert_eq!(log::max_level(), LevelFilter::Warn);
    }

    #[test]
    fn entry_contains_level_and_message() {
        let mut out = Vec::new();
        write_log_entry_to(
            &mut out,
            &log::Record::builder()
                .level(log::Level::Warn)
                .args(format_args!("frame {} lost", 3))
                .build(),
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[WARN"));
        assert!(text.trim_end().ends_with("frame 3 lost"));
    }
}
