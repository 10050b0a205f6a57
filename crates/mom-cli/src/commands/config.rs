//! Config command.

use anyhow::Result;
use colored::Colorize;
use mom_core::config::{MomConfig, LOCAL_CONFIG_FILE};
use std::path::Path;

pub fn execute(config: &MomConfig, explicit: Option<&Path>) -> Result<()> {
    println!("{}", "Configuration".cyan().bold());
    println!();

    match explicit {
        Some(path) => println!("{}: {}", "File".bold(), path.display()),
        None => {
            let local = Path::new(LOCAL_CONFIG_FILE);
            let global = MomConfig::global_config_path();
            let mut found = false;
            for path in global.iter().map(|p| p.as_path()).chain(std::iter::once(local)) {
                if path.exists() {
                    println!("{}: {}", "File".bold(), path.display());
                    found = true;
                }
            }
            if !found {
                println!("{}: {}", "File".bold(), "none (defaults)".dimmed());
            }
        }
    }
    println!();

    println!("{}", "[capture]".bold());
    println!("  quality        = {}", config.capture.quality);
    println!("  allow_editing  = {}", config.capture.allow_editing);
    println!(
        "  camera_command = {}",
        config.capture.camera_command.as_deref().unwrap_or("(not set)")
    );

    println!("{}", "[location]".bold());
    println!("  timeout_ms     = {}", config.location.timeout_ms);
    println!("  high_accuracy  = {}", config.location.high_accuracy);
    match config.location.coordinate() {
        Some(coord) => println!("  position       = {coord}"),
        None => println!("  position       = {}", "(not set)".dimmed()),
    }

    println!("{}", "[places]".bold());
    println!("  api_key        = {}", mask(config.places.credential()));
    println!("  base_url       = {}", config.places.base_url);
    println!("  radius_m       = {}", config.places.radius_m);
    println!("  max_results    = {}", config.places.max_results);

    println!("{}", "[web]".bold());
    println!("  host           = {}", config.web.host);
    println!("  port           = {}", config.web.port);
    Ok(())
}

/// Show only the last four characters of a credential.
fn mask(credential: Option<&str>) -> String {
    match credential {
        None => "(not set)".to_string(),
        Some(key) if key.chars().count() <= 4 => "****".to_string(),
        Some(key) => {
            let tail: String = key.chars().skip(key.chars().count() - 4).collect();
            format!("****{tail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask(None), "(not set)");
        assert_eq!(mask(Some("abc")), "****");
        assert_eq!(mask(Some("AIzaSyExample1234")), "****1234");
    }
}
