//! `radimpress studies`: list study types with their configuration.

use radimpress_config::{AppConfig, StudyCatalog};
use radimpress_store::{DocumentStore, PromptStore};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let catalog = StudyCatalog::load(&config.studies_path());
    let prompts = PromptStore::new(config.prompts_path());
    let documents = DocumentStore::new(config.documents_dir());

    println!("{:<24} {:<8} {:<8}", "STUDY", "PROMPT", "DOCUMENT");
    for study in catalog.studies() {
        let name = study.as_str();
        let prompt = if prompts.has_override(name) { "custom" } else { "default" };
        let document = if documents.exists(name) { "yes" } else { "-" };
        println!("{name:<24} {prompt:<8} {document:<8}");
    }
    println!("\n{} study types ({})", catalog.len(), config.studies_path().display());

    Ok(())
}
