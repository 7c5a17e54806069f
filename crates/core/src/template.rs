//! Prompt template constants shared by the prompt store and the assembler.

/// The literal token replaced with the extracted reference document.
pub const DOCUMENT_PLACEHOLDER: &str = "{document_content}";

/// Substituted for the placeholder when a study has no reference document.
pub const NO_DOCUMENT_TEXT: &str = "No reference document available for this study type.";

/// Template used for every study type without a saved override.
pub const DEFAULT_PROMPT: &str = "You are an expert radiologist creating a concise radiology impression section following RCR 2018 standards.

CRITICAL INSTRUCTIONS:
1. You MUST follow ALL steps, protocols, and guidelines mentioned in the REFERENCE DOCUMENT below
2. Read the ENTIRE reference document carefully before generating the impression
3. Apply every relevant checklist, measurement standard, and reporting requirement from the document
4. If the document specifies a structure or format, follow it exactly
5. If the document mentions specific terminology or classifications, use them

Generate the impression as exactly 3-4 bullet points:
- Summarize key findings following document protocols
- State primary diagnosis or differential as per document guidelines
- Include any measurements or specifics required by the document

Use clear, standardized terminology as specified in the reference document.

---REFERENCE DOCUMENT START---
{document_content}
---REFERENCE DOCUMENT END---

Now generate the impression following ALL guidelines above.";

/// Whether `template` will receive the document text.
pub fn has_placeholder(template: &str) -> bool {
    template.contains(DOCUMENT_PLACEHOLDER)
}
