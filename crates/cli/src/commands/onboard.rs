//! `radimpress onboard`: first-time setup.

use radimpress_config::{AppConfig, StudyCatalog};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🩻 RadImpress — First-Time Setup");
    println!("================================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    let config = if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        AppConfig::default()
    };

    let data_dir = config.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        println!("✅ Created data directory: {}", data_dir.display());
    }

    let documents_dir = config.documents_dir();
    if !documents_dir.exists() {
        std::fs::create_dir_all(&documents_dir)?;
        println!("✅ Created document directory: {}", documents_dir.display());
    }

    let studies_path = config.studies_path();
    if studies_path.exists() {
        println!("  Studies file exists: {}", studies_path.display());
    } else {
        std::fs::write(&studies_path, StudyCatalog::default_toml())?;
        println!("✅ Created studies.toml with {} study types", StudyCatalog::builtin().len());
    }

    println!("\n📝 Next steps:");
    println!("   1. Set OPENAI_API_KEY or add api_key to {}", config_path.display());
    println!("   2. Edit {} to change the study list", studies_path.display());
    println!("   3. Run: radimpress serve\n");

    println!("🎉 Setup complete!\n");

    Ok(())
}
