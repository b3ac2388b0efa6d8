//! `laid modes`: List the available modes.

use std::path::Path;

use laid_agent::ModeCatalog;
use laid_config::AppConfig;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config =
        AppConfig::load_with_env(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let catalog = ModeCatalog::with_overrides(&config.modes);

    println!("Modes (use /mode <name> in chat):");
    for name in catalog.names() {
        let summary = catalog.get(&name).map(summary_line).unwrap_or_default();
        println!("  {name:<14} {summary}");
    }
    Ok(())
}

/// First non-blank line of a mode prompt.
fn summary_line(prompt: &str) -> &str {
    prompt
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}
