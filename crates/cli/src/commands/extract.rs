//! `radimpress extract <file>`: show what a reference document contributes
//! to the prompt.

use radimpress_impression::{TokenBudget, estimate_tokens};
use std::path::Path;
use tracing::debug;

pub async fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(file).map_err(|e| format!("Cannot read {}: {e}", file.display()))?;
    debug!(path = %file.display(), bytes = bytes.len(), "Extracting document");
    let extraction = radimpress_extract::extract_bytes(&bytes)?;

    let tokens = estimate_tokens(&extraction.text);
    let status = TokenBudget::default().validate(tokens);

    println!("{}", extraction.text);
    eprintln!();
    eprintln!(
        "{} characters, extracted with the {} method",
        extraction.text.chars().count(),
        extraction.method.as_str()
    );
    eprintln!("{}", status.describe(tokens));

    Ok(())
}
