use crate::{LogError, LogLevel, Logger, set_logger};
use dirs::data_dir;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

const LOG_FILE_NAME: &str = "latest.log";

/// Console logger with an optional mirror file.
///
/// Console lines carry a colored level tag; file lines carry the plain tag.
/// A log file left over from a previous run is renamed after the current
/// time and archived as `.7z` before a fresh one is started.
pub struct AdvancedLogger {
    level: AtomicU8,
    log_file: Option<PathBuf>,
    file_lock: Mutex<()>,
}

impl AdvancedLogger {
    pub fn new(level: LogLevel, log_file: Option<PathBuf>) -> Self {
        let log_file = log_file.and_then(|file| match prepare_log_file(&file) {
            Ok(()) => Some(file),
            Err(e) => {
                eprintln!("Failed to prepare log file {}: {e}", file.display());
                None
            }
        });

        AdvancedLogger {
            level: AtomicU8::new(level as u8),
            log_file,
            file_lock: Mutex::new(()),
        }
    }

    /// Installs a logger for `app`, mirroring to `<data_dir>/<app>/latest.log`
    /// when the platform exposes a data directory.
    pub fn init(log_level: LogLevel, app: &str) -> Result<(), LogError> {
        let file = data_dir().map(|dir| dir.join(app).join(LOG_FILE_NAME));
        set_logger(Arc::new(AdvancedLogger::new(log_level, file)))
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    fn write_line(&self, file: &Path, line: &str) -> std::io::Result<()> {
        let _guard = self.file_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut handle = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(file)?;
        writeln!(handle, "{line}")
    }
}

fn prepare_log_file(file: &Path) -> std::io::Result<()> {
    if file.exists() {
        archive_previous(file);
    }

    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::File::create(file)?;
    Ok(())
}

fn archive_previous(file: &Path) {
    let renamed = file.with_file_name(format!(
        "{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));

    if let Err(e) = std::fs::rename(file, &renamed) {
        eprintln!("Failed to rename existing log file: {e}");
        return;
    }

    let compressed = renamed.with_extension("7z");
    match sevenz_rust2::compress_to_path(&renamed, &compressed) {
        Ok(()) => {
            std::fs::remove_file(&renamed)
                .unwrap_or_else(|e| eprintln!("Failed to remove old log file: {e}"));
        }
        // keep the plain file rather than lose it
        Err(e) => eprintln!("Failed to compress file: {e}"),
    }
}

impl Logger for AdvancedLogger {
    fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::NoLog && level >= LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let timestamp = chrono::Local::now().format("%d%m%Y %H:%M:%S");
        println!("{timestamp} - [{level}] - {message}");

        if let Some(file) = &self.log_file {
            let line = format!("{} - [{}] - {}", timestamp, level.raw_str(), message);
            self.write_line(file, &line)
                .unwrap_or_else(|e| eprintln!("Failed to write to log file: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_plain_level_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join(LOG_FILE_NAME);

        let logger = AdvancedLogger::new(LogLevel::Info, Some(file.clone()));
        logger.debug("hidden");
        logger.warning("disk almost full");

        let contents = std::fs::read_to_string(&file).unwrap();
        assert!(contents.contains("[WARNING] - disk almost full"));
        assert!(!contents.contains("hidden"));
    }

    #[test]
    fn archives_previous_log() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(LOG_FILE_NAME);
        std::fs::write(&file, "old run\n").unwrap();

        let logger = AdvancedLogger::new(LogLevel::Info, Some(file.clone()));
        assert_eq!(logger.log_file(), Some(file.as_path()));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "");

        let archives: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "7z"))
            .collect();
        assert_eq!(archives.len(), 1);
    }
}
