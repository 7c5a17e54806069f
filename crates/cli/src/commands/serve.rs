//! `radimpress serve`: Start the web UI and JSON API.

use radimpress_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🩻 RadImpress");
    println!("   Open:      http://{}:{}/", config.gateway.host, config.gateway.port);
    println!("   Data:      {}", config.data_dir().display());
    println!("   Model:     {}", config.model.default_model);
    if !config.has_api_key() {
        println!("   ⚠️  No API key configured — set OPENAI_API_KEY or enter one in the settings panel");
    }

    radimpress_gateway::start(config).await?;

    Ok(())
}
