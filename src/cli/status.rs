//! Status command implementation

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::config::{self, ACCESS_ID_VAR, ACCESS_KEY_VAR, COMPANY_VAR, Credentials, Settings};
use crate::error::Result;

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Run the status command to display credential and configuration status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "lmexport Configuration Status".bold());

    // A broken env file is reported, not fatal
    if let Err(e) = config::load_env_file(opts.env_file_ref()) {
        println!("{} {}", "✗".red(), e);
    }

    // Settings file
    let settings_path = Settings::resolve_path(opts.config_ref())?;
    match Settings::load_at(opts.config_ref()) {
        Ok(settings) => {
            if settings_path.exists() {
                println!(
                    "Settings file: {}",
                    settings_path.display().to_string().cyan()
                );
            } else {
                println!(
                    "Settings file: {} {}",
                    settings_path.display().to_string().dimmed(),
                    "(not present, using defaults)".dimmed()
                );
            }
            println!(
                "Output directory: {}",
                settings.out_dir.display().to_string().cyan()
            );
        }
        Err(e) => println!("{} {}", "✗".red(), e),
    }

    println!();

    // Credentials
    for name in [ACCESS_ID_VAR, COMPANY_VAR] {
        match env_value(name) {
            Some(value) => println!("{} {}: {}", "✓".green(), name, value),
            None => println!("{} {} not set", "✗".red(), name),
        }
    }
    match env_value(ACCESS_KEY_VAR) {
        Some(key) => println!(
            "{} {}: {}",
            "✓".green(),
            ACCESS_KEY_VAR,
            config::mask_secret(&key)
        ),
        None => println!("{} {} not set", "✗".red(), ACCESS_KEY_VAR),
    }

    println!();

    // Resolved endpoint
    match Credentials::from_env() {
        Ok(credentials) => println!(
            "API base URL: {}",
            credentials.base_url(opts.api_host_ref()).cyan()
        ),
        Err(e) => {
            println!("{} {}", "○".dimmed(), e);
            if let Some(host) = opts.api_host_ref() {
                println!("{} Custom API host: {}", "○".dimmed(), host.cyan());
            }
        }
    }

    println!();

    Ok(())
}
