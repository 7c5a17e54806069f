//! System and user prompt construction.

use radimpress_core::error::ImpressionError;
use radimpress_core::template::DOCUMENT_PLACEHOLDER;

/// Fill every `{document_content}` in `template` with `document_text`.
///
/// A template without the placeholder is returned unchanged.
pub fn assemble(template: &str, document_text: &str) -> String {
    template.replace(DOCUMENT_PLACEHOLDER, document_text)
}

/// The user turn for one submission.
///
/// Blank `history` reads as "Not provided"; blank `findings` is an error.
pub fn build_user_prompt(
    study: &str,
    history: &str,
    findings: &str,
) -> Result<String, ImpressionError> {
    if findings.trim().is_empty() {
        return Err(ImpressionError::MissingFindings);
    }
    let history = if history.trim().is_empty() {
        "Not provided"
    } else {
        history
    };

    Ok(format!(
        "\nStudy Type: {study}\nClinical History: {history}\nKey Findings: {findings}\n\n\
         Following ALL protocols and guidelines in the reference document above, \
         generate a concise impression in 3-4 bullet points."
    ))
}
