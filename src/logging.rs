use simplelog::*;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;
use thiserror::Error;

static INIT: Once = Once::new();
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("HOME environment variable not set")]
    NoHome,
    #[error("cannot open log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Logger initialization failed")]
    InitFailed,
}

/// `~/.local/share/hostsyncrs/logs`
pub fn log_dir() -> Result<PathBuf, LoggingError> {
    let home = std::env::var("HOME").map_err(|_| LoggingError::NoHome)?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("hostsyncrs")
        .join("logs"))
}

/// Installs the file logger, plus a stderr logger at `term_level` when given.
/// Only the first call installs anything.
pub fn init_logger(term_level: Option<LevelFilter>) -> Result<(), LoggingError> {
    let log_dir = log_dir()?;

    // Create the log directory if it doesn't exist
    fs::create_dir_all(&log_dir)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("app.log"))?;

    INIT.call_once(|| {
        let mut loggers: Vec<Box<dyn SharedLogger>> = vec![WriteLogger::new(
            LevelFilter::Debug,
            Config::default(),
            log_file,
        )];
        if let Some(level) = term_level {
            loggers.push(TermLogger::new(
                level,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            ));
        }
        if CombinedLogger::init(loggers).is_ok() {
            LOGGER_INITIALIZED.store(true, Ordering::SeqCst);
        }
    });

    if LOGGER_INITIALIZED.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(LoggingError::InitFailed)
    }
}
