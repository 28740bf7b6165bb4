use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use env_logger::{Builder, Env, Target};

use crate::error::{Error, Result};

/// Timestamp used to name per-run log files and artifacts.
pub fn run_timestamp() -> String {
    Local::now().format("%Y-%m-%d-%H%M:%S:%6f").to_string()
}

/// Formats one log line as `<date> - <logger> - <LEVEL> - <message>`.
pub fn format_line(logger: &str, level: log::Level, message: &std::fmt::Arguments<'_>) -> String {
    format!(
        "{} - {} - {} - {}",
        Local::now().format("%m/%d/%Y %I:%M:%S %p"),
        logger,
        level,
        message
    )
}

/// Creates `<dir>/<timestamp>.log` and routes the global logger into it.
///
/// `RUST_LOG` overrides the default `info` filter. When a logger is already
/// installed it stays in place and the new file is left empty.
pub fn init_run_logger(dir: &Path, logger: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let path = dir.join(format!("{}.log", run_timestamp()));
    let file = File::create(&path).map_err(|e| Error::io(&path, e))?;

    let name = logger.to_string();
    let installed = Builder::from_env(Env::default().default_filter_or("info"))
        .format(move |buf, record| {
            writeln!(buf, "{}", format_line(&name, record.level(), record.args()))
        })
        .target(Target::Pipe(Box::new(file)))
        .try_init();

    if installed.is_err() {
        log::debug!("logger already installed; {} stays empty", path.display());
    }

    Ok(path)
}
