//! Structured plain-text rendering of a parsed body.
//!
//! Headings are marked with `#` prefixes and underlined, short emphatic
//! paragraphs become `###` pseudo-headings, and all tables are appended at
//! the end with ` | ` separated cells.

use std::collections::HashMap;

use crate::ooxml::{Block, Paragraph};

const RULE_WIDTH: usize = 80;
const PSEUDO_HEADING_MAX_CHARS: usize = 100;

#[derive(Debug, PartialEq, Eq)]
enum Kind {
    /// Real heading style, with its numeric level when the name has one.
    Heading(Option<usize>),
    PseudoHeading,
    Body,
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Resolve the paragraph's style display name: the styles-part name when
/// known, otherwise the raw style id.
fn style_name<'a>(paragraph: &'a Paragraph, styles: &'a HashMap<String, String>) -> Option<&'a str> {
    let id = paragraph.style_id.as_deref()?;
    Some(styles.get(id).map(String::as_str).unwrap_or(id))
}

/// Word defines heading levels 1 to 9; anything else has no numeric level.
const MAX_HEADING_LEVEL: usize = 9;

fn heading_level(name: &str) -> Option<Option<usize>> {
    let prefix = name.get(..7)?;
    if !prefix.eq_ignore_ascii_case("heading") {
        return None;
    }
    let rest = name[7..].trim();
    if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
        Some(
            rest.parse()
                .ok()
                .filter(|n| (1..=MAX_HEADING_LEVEL).contains(n)),
        )
    } else {
        Some(None)
    }
}

/// Has at least one cased character and no lowercase ones.
fn is_all_caps(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

fn classify(paragraph: &Paragraph, text: &str, styles: &HashMap<String, String>) -> Kind {
    if let Some(level) = style_name(paragraph, styles).and_then(heading_level) {
        return Kind::Heading(level);
    }
    if text.chars().count() < PSEUDO_HEADING_MAX_CHARS
        && (is_all_caps(text) || text.ends_with(':') || paragraph.first_run_bold)
    {
        return Kind::PseudoHeading;
    }
    Kind::Body
}

/// Render `blocks` using `styles` (style id → display name).
pub(crate) fn render(blocks: &[Block], styles: &HashMap<String, String>) -> String {
    let mut lines = vec![
        rule(),
        "REFERENCE DOCUMENT - COMPLETE CONTENT".to_string(),
        rule(),
        String::new(),
    ];

    let mut tables = Vec::new();
    for block in blocks {
        let paragraph = match block {
            Block::Paragraph(p) => p,
            Block::Table(t) => {
                tables.push(t);
                continue;
            }
        };

        let text = paragraph.text.trim();
        if text.is_empty() {
            lines.push(String::new());
            continue;
        }

        match classify(paragraph, text, styles) {
            Kind::Heading(level) => {
                lines.push(String::new());
                let marker = level.map_or_else(|| "##".to_string(), |n| "#".repeat(n));
                lines.push(format!("{marker} {text}"));
                lines.push("-".repeat(text.chars().count()));
            }
            Kind::PseudoHeading => {
                lines.push(String::new());
                lines.push(format!("### {text}"));
                lines.push(String::new());
            }
            Kind::Body => lines.push(text.to_string()),
        }
    }

    if !tables.is_empty() {
        lines.push(String::new());
        lines.push(rule());
        lines.push("TABLES FROM DOCUMENT".to_string());
        lines.push(rule());

        for (i, table) in tables.iter().enumerate() {
            lines.push(format!("\n[Table {}]", i + 1));
            for row in &table.rows {
                let cells: Vec<&str> = row.iter().map(|c| c.trim()).collect();
                if cells.iter().any(|c| !c.is_empty()) {
                    lines.push(cells.join(" | "));
                }
            }
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::Table;

    fn para(text: &str) -> Block {
        Block::Paragraph(Paragraph {
            text: text.into(),
            ..Default::default()
        })
    }

    fn styled(style: &str, text: &str) -> Block {
        Block::Paragraph(Paragraph {
            style_id: Some(style.into()),
            text: text.into(),
            first_run_bold: false,
        })
    }

    fn styles() -> HashMap<String, String> {
        HashMap::from([
            ("Heading1".to_string(), "heading 1".to_string()),
            ("Heading2".to_string(), "heading 2".to_string()),
            ("Title".to_string(), "Title".to_string()),
        ])
    }

    const BANNER: &str = "================================================================================\nREFERENCE DOCUMENT - COMPLETE CONTENT\n================================================================================\n";

    #[test]
    fn banner_comes_first() {
        assert_eq!(render(&[], &styles()), BANNER);
    }

    #[test]
    fn heading_with_level_is_underlined() {
        let out = render(&[styled("Heading1", "Lung Nodules")], &styles());
        assert!(out.ends_with("\n\n# Lung Nodules\n------------"));
    }

    #[test]
    fn heading_level_from_style_id_without_styles_part() {
        let out = render(&[styled("Heading2", "Follow-up")], &HashMap::new());
        assert!(out.contains("\n## Follow-up\n---------"));
    }

    #[test]
    fn heading_without_numeric_level_uses_double_hash() {
        assert_eq!(heading_level("Heading"), Some(None));
        assert_eq!(heading_level("Heading Special"), Some(None));
        assert_eq!(heading_level("heading 3"), Some(Some(3)));
        assert_eq!(heading_level("Normal"), None);
        assert_eq!(heading_level("Title"), None);
    }

    #[test]
    fn out_of_range_heading_level_uses_double_hash() {
        assert_eq!(heading_level("heading 9"), Some(Some(9)));
        assert_eq!(heading_level("heading 0"), Some(None));
        assert_eq!(heading_level("Heading 999999999"), Some(None));
        assert_eq!(heading_level("Heading 99999999999999999999999"), Some(None));

        let out = render(&[styled("Heading 999999999", "Appendix")], &HashMap::new());
        assert!(out.ends_with("\n\n## Appendix\n--------"));
    }

    #[test]
    fn pseudo_headings() {
        let out = render(&[para("RECOMMENDATIONS"), para("Measurements:")], &styles());
        assert!(out.contains("\n\n### RECOMMENDATIONS\n\n"));
        assert!(out.contains("\n\n### Measurements:\n"));

        let bold = Block::Paragraph(Paragraph {
            style_id: None,
            text: "Key point".into(),
            first_run_bold: true,
        });
        assert!(render(&[bold], &styles()).contains("### Key point"));
    }

    #[test]
    fn long_caps_paragraph_is_body_text() {
        let long = "A".repeat(100);
        let out = render(&[para(&long)], &styles());
        assert!(!out.contains("###"));
        assert!(out.ends_with(&long));
    }

    #[test]
    fn all_caps_requires_a_cased_character() {
        assert!(is_all_caps("CT 2018"));
        assert!(!is_all_caps("2018"));
        assert!(!is_all_caps("Mixed CASE"));
    }

    #[test]
    fn body_text_is_trimmed_and_blank_paragraphs_kept() {
        let out = render(&[para("  Report all nodules.  "), para("   "), para("Next.")], &styles());
        assert!(out.ends_with("Report all nodules.\n\nNext."));
    }

    #[test]
    fn tables_are_appended_after_content() {
        let table = Block::Table(Table {
            rows: vec![
                vec![" Size ".into(), "Action".into()],
                vec!["".into(), "  ".into()],
                vec!["<6 mm".into(), "None".into()],
            ],
        });
        let out = render(&[table, para("After table.")], &styles());
        let content_at = out.find("After table.").unwrap();
        let tables_at = out.find("TABLES FROM DOCUMENT").unwrap();
        assert!(content_at < tables_at);
        assert!(out.ends_with("\n\n[Table 1]\nSize | Action\n<6 mm | None\n"));
    }

    #[test]
    fn multiple_tables_numbered_from_one() {
        let t = || Block::Table(Table { rows: vec![vec!["x".into()]] });
        let out = render(&[t(), t()], &styles());
        assert!(out.contains("[Table 1]"));
        assert!(out.contains("[Table 2]"));
    }
}
