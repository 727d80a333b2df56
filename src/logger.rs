//! `log` backend writing to the console UART.

use log::{LevelFilter, Log, Metadata, Record};

use crate::kprintln;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        kprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

/// Install the console logger. Call once, after the UART is up.
pub fn init(level: LevelFilter) {
    // A second call keeps the first logger; nothing to report it on yet.
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
