//! `radimpress doctor`: diagnose configuration and study data.

use radimpress_config::{AppConfig, StudyCatalog};
use radimpress_store::{DocumentStore, PromptStore};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 RadImpress Doctor — System Diagnostics");
    println!("=========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — using defaults (run `radimpress onboard`)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            println!("\n  ⚠️  1 blocking issue found.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key — set OPENAI_API_KEY or add api_key to config.toml");
        issues += 1;
    }
    println!("     Endpoint: {}", config.api_url);
    println!("     Model:    {}", config.model.default_model);

    let data_dir = config.data_dir();
    if data_dir.exists() {
        println!("  ✅ Data directory: {}", data_dir.display());
    } else {
        println!("  ⚠️  No data directory at {} — run `radimpress onboard`", data_dir.display());
        issues += 1;
    }

    let studies_path = config.studies_path();
    if studies_path.exists() {
        let catalog = StudyCatalog::load(&studies_path);
        println!("  ✅ Studies file: {} study types", catalog.len());
        issues += check_studies(&config, &catalog);
    } else {
        println!("  ⚠️  No studies file — built-in list will be written on first start");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Report stored prompts and documents; returns the number of problems found.
fn check_studies(config: &AppConfig, catalog: &StudyCatalog) -> usize {
    let prompts = PromptStore::new(config.prompts_path());
    let documents = DocumentStore::new(config.documents_dir());
    let mut issues = 0;

    let overrides = prompts.load_all();
    println!("  ✅ Custom prompts: {}", overrides.len());
    for study in overrides.keys().filter(|s| !catalog.contains(s)) {
        println!("  ⚠️  Prompt saved for unknown study '{study}'");
        issues += 1;
    }

    let mut with_document = 0;
    for study in catalog.studies() {
        if !documents.exists(study.as_str()) {
            continue;
        }
        with_document += 1;
        let text = radimpress_extract::extract(&documents.path_for(study.as_str()));
        if text.is_empty() {
            println!("  ❌ Reference document for '{study}' yields no text");
            issues += 1;
        }
    }
    println!("  ✅ Reference documents: {with_document}");

    issues
}
