//! Initialisation of the program logger.
//!
//! Everything is written to stderr, leaving stdout for the solution document. The level is read
//! from the `CABLE_TRENCH_LOG_LEVEL` environment variable.
use anyhow::{Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::io::IsTerminal;

/// The environment variable holding the log level
pub const LOG_LEVEL_VAR: &str = "CABLE_TRENCH_LOG_LEVEL";

/// The log level used if [`LOG_LEVEL_VAR`] is unset
const DEFAULT_LOG_LEVEL: &str = "info";

/// Convert a log level name (`off`, `error`, `warn`, `info`, `debug` or `trace`) to a filter
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    let filter = match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {}", unknown),
    };
    Ok(filter)
}

/// Initialise the program logger using `fern`, colourising output if stderr is a terminal
pub fn init() -> Result<()> {
    let log_level = env::var(LOG_LEVEL_VAR).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let log_level = parse_level(&log_level)?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let use_colour = std::io::stderr().is_terminal();

    Dispatch::new()
        .format(move |out, message, record| {
            if use_colour {
                write_log(out, colours.color(record.level()), record.target(), message);
            } else {
                write_log_plain(out, message, record);
            }
        })
        .level(log_level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}
