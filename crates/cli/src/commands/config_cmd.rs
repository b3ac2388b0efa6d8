//! `laid config`: Configuration management commands.

use std::path::Path;

use laid_config::AppConfig;

pub async fn init(config_path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() && !force {
        println!("Config already exists at {}", config_path.display());
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    AppConfig::default().save_to(config_path)?;
    println!("✅ Wrote default config to {}", config_path.display());
    Ok(())
}

pub async fn show(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config =
        AppConfig::load_with_env(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config_path.display());
    Ok(())
}
