use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::settings::config_dir;

pub const LOG_ENV: &str = "LEDGERLENS_LOG";

/// Route tracing output to `~/.config/ledgerlens/ledgerlens.log`. The terminal
/// belongs to ratatui, so nothing is ever written to stdout/stderr from here.
/// Logging is best-effort: if the file cannot be opened the app runs silent.
pub fn init() {
    let dir = config_dir();
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("ledgerlens.log"))
    {
        Ok(f) => f,
        Err(_) => return,
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
