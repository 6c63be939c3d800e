use colored::Colorize;

use crate::error::Result;
use crate::logging::LOG_ENV;
use crate::settings::{config_dir, load_settings, save_settings, settings_path, validate_base_url, Settings};

pub fn show(settings: &Settings) -> Result<()> {
    let user = if settings.user_name.is_empty() {
        "(not set)"
    } else {
        &settings.user_name
    };
    println!("User:         {user}");
    println!("Backend:      {}", settings.base_url);
    println!("Timeout:      {}s", settings.request_timeout_secs);
    println!("Settings:     {}", settings_path().display());
    println!("Log file:     {}", config_dir().join("ledgerlens.log").display());
    println!();
    println!("Override the backend per run with --base-url or LEDGERLENS_BASE_URL.");
    println!("Set {LOG_ENV}=debug for request logging.");
    Ok(())
}

pub fn set_url(url: &str) -> Result<()> {
    let url = validate_base_url(url)?;
    let mut settings = load_settings();
    settings.base_url = url.clone();
    save_settings(&settings)?;
    println!("{} Backend set to {url}", "\u{2713}".green());
    Ok(())
}
