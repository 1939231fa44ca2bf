use envwatch_core::time::TIMESTAMP_FORMAT;
use log::{Level, LevelFilter, Metadata, Record};

/// Writes `<local time> [LEVEL] message` lines to stderr
struct ConsoleLogger;

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[31m[ERROR]\x1b[0m",
        Level::Warn => "\x1b[33m[WARN]\x1b[0m",
        Level::Info => "\x1b[32m[INFO]\x1b[0m",
        Level::Debug => "\x1b[36m[DEBUG]\x1b[0m",
        Level::Trace => "\x1b[90m[TRACE]\x1b[0m",
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!(
            "{} {} {}",
            chrono::Local::now().format(TIMESTAMP_FORMAT),
            level_tag(record.level()),
            record.args()
        );
    }

    fn flush(&self) {}
}

/// Install the console logger
///
/// Fails only if another logger is already installed.
pub fn init_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let logger = Box::leak(Box::new(ConsoleLogger));
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}
