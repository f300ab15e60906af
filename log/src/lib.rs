//! # Logging Library
//!
//! Process-wide logger used by the `cvkit` helpers. A single [`Logger`]
//! implementation is installed once with [`set_logger`]; the `info!`,
//! `warning!`, `error!`, `critical!` and `debug!` macros forward to it and are
//! no-ops until a logger exists.
use colored::Colorize;
use std::fmt::Display;
use std::sync::{Arc, OnceLock};

/// Submodule containing the console/file logger
pub mod logger;

static LOGGER: OnceLock<Arc<dyn Logger + Send + Sync>> = OnceLock::new();

/// Sets the global logger instance for the application
///
/// # Returns
///
/// * `Ok(())` if the logger was installed
/// * `Err(LogError::AlreadyInitialized)` if a logger has already been installed
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use log::logger::AdvancedLogger;
/// use log::{set_logger, LogLevel};
///
/// let logger = Arc::new(AdvancedLogger::new(LogLevel::Debug, None));
/// set_logger(logger).expect("Failed to initialize logger");
/// ```
pub fn set_logger(logger: Arc<dyn Logger + Send + Sync>) -> Result<(), LogError> {
    LOGGER
        .set(logger)
        .map_err(|_| LogError::AlreadyInitialized)
}

/// Retrieves the current global logger, if one is set
pub fn logger() -> Option<Arc<dyn Logger + Send + Sync>> {
    LOGGER.get().cloned()
}

/// Errors that can occur during logger operations
#[derive(Debug)]
pub enum LogError {
    /// Returned when attempting to initialize a logger after one has already been set
    AlreadyInitialized,
}

impl Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogError::AlreadyInitialized => write!(f, "Logger has already been initialized"),
        }
    }
}

impl std::error::Error for LogError {}

/// Trait that all logger implementations must implement
pub trait Logger: Send + Sync {
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }
    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
    fn critical(&self, message: &str) {
        self.log(LogLevel::Critical, message);
    }
    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
    /// Logs a message with a specified log level
    fn log(&self, level: LogLevel, message: &str);
    /// Sets the minimum level that will be output
    fn set_level(&self, level: LogLevel);
    /// Whether a message at `level` would be emitted
    fn enabled(&self, level: LogLevel) -> bool;
}

/// Logging levels in order of increasing severity.
///
/// `NoLog` sits above every real level, so selecting it as the threshold
/// silences all output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warning = 2,
    Error = 3,
    Critical = 4,
    NoLog = 5,
}

impl LogLevel {
    /// Returns the uncolored name of the level, used in log files
    pub fn raw_str(&self) -> &'static str {
        match self {
            LogLevel::NoLog => "NOLOG",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warning,
            3 => LogLevel::Error,
            4 => LogLevel::Critical,
            _ => LogLevel::NoLog,
        }
    }
}

impl Display for LogLevel {
    /// Colored level tag for console output
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use LogLevel::*;
        let level_str = match self {
            NoLog => String::new(),
            Info => format!("{}", "INFO".blue().bold()),
            Warning => format!("{}", "WARNING".yellow().bold()),
            Error => format!("{}", "ERROR".red().bold()),
            Critical => format!("{}", "CRITICAL".bright_red().bold()),
            Debug => format!("{}", "DEBUG".cyan().bold()),
        };
        write!(f, "{level_str}")
    }
}

/// Logs a message with the specified log level
///
/// # Example
///
/// ```
/// use log::{log, LogLevel};
///
/// log!(LogLevel::Warning, "This is a {} message", "warning");
/// ```
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)*) => {{
        if let Some(logger) = $crate::logger() {
            if logger.enabled($level) {
                let message = format!($($arg)*);
                logger.log($level, &message);
            }
        }
    }};
}

/// Logs a message at INFO level
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {{
        $crate::log!($crate::LogLevel::Info, $($arg)*);
    }};
}

/// Logs a message at WARNING level
#[macro_export]
macro_rules! warning {
    ($($arg:tt)*) => {{
        $crate::log!($crate::LogLevel::Warning, $($arg)*);
    }};
}

/// Logs a message at ERROR level
///
/// # Example
///
/// ```
/// use log::error;
///
/// let err = "permission denied";
/// error!("Failed to copy file: {}", err);
/// ```
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        $crate::log!($crate::LogLevel::Error, $($arg)*);
    }};
}

/// Logs a message at CRITICAL level
#[macro_export]
macro_rules! critical {
    ($($arg:tt)*) => {{
        $crate::log!($crate::LogLevel::Critical, $($arg)*);
    }};
}

/// Logs a message at DEBUG level
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {{
        $crate::log!($crate::LogLevel::Debug, $($arg)*);
    }};
}
