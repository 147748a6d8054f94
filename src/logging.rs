use std::{io, path::PathBuf};

use chrono::{DateTime, Utc};

use crate::config::LogConfig;

pub fn log_file_name(now: DateTime<Utc>) -> String {
    format!("s3-folder-download_{}.log", now.format("%Y_%m_%d-%H_%M_%S"))
}

/// Installs `simple_logging` as the `log` backend.
///
/// Returns the log file path when logging to a directory.
pub fn init(config: &LogConfig) -> io::Result<Option<PathBuf>> {
    match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(log_file_name(Utc::now()));
            simple_logging::log_to_file(&path, config.level)?;
            Ok(Some(path))
        }
        None => {
            simple_logging::log_to_stderr(config.level);
            Ok(None)
        }
    }
}
