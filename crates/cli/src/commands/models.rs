//! `laid models`: List the model catalog or the server's models.

use std::path::Path;

use laid_config::AppConfig;
use laid_core::Provider;
use laid_providers::OpenAiCompatProvider;

use super::chat::format_model_list;

pub async fn run(config_path: &Path, remote: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config =
        AppConfig::load_with_env(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    if !remote {
        println!("{}", format_model_list(&config));
        return Ok(());
    }

    let provider = OpenAiCompatProvider::lm_studio(&config.base_url);
    let models = provider
        .list_models()
        .await
        .map_err(|e| format!("Could not reach {}: {e}", provider.base_url()))?;

    if models.is_empty() {
        println!("The server at {} reports no models.", provider.base_url());
        return Ok(());
    }

    println!("Models at {}:", provider.base_url());
    for id in &models {
        let marker = if *id == config.current_model { "  (current)" } else { "" };
        println!("  {id}{marker}");
    }
    Ok(())
}
