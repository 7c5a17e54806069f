//! WordprocessingML parsing.
//!
//! Two views of `word/document.xml` are produced here:
//!
//! - [`flat_text`]: every text node of the body in document order, with tabs
//!   and breaks preserved and paragraphs separated by blank lines.
//! - [`parse_body`]: the top-level block structure (paragraphs with their
//!   style and first-run formatting, and tables as rows of cell text).
//!
//! Paragraphs nested inside text boxes are not part of the body flow and are
//! skipped by [`parse_body`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use radimpress_core::error::ExtractError;
use std::collections::HashMap;

/// A top-level body block.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Paragraph {
    pub style_id: Option<String>,
    pub text: String,
    pub first_run_bold: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Table {
    pub rows: Vec<Vec<String>>,
}

fn xml_err(e: impl std::fmt::Display) -> ExtractError {
    ExtractError::Xml(e.to_string())
}

fn attr(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// `w:b` with no `w:val`, or any value other than an explicit off.
fn toggle_on(e: &BytesStart<'_>) -> bool {
    match attr(e, b"val") {
        None => true,
        Some(v) => !matches!(v.as_str(), "0" | "false" | "off"),
    }
}

/// Text of the body in document order.
pub(crate) fn flat_text(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;
    let mut run_depth = 0usize;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => out.push_str("\n\n"),
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => out.push_str("\n\n"),
                b"w:tab" if run_depth > 0 => out.push('\t'),
                b"w:br" | b"w:cr" if run_depth > 0 => out.push('\n'),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Text(t) if in_text => out.push_str(&t.unescape().map_err(xml_err)?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

#[derive(Default)]
struct ParagraphBuilder {
    paragraph: Paragraph,
    runs: usize,
    in_run: bool,
    in_props: bool,
}

#[derive(Default)]
struct TableBuilder {
    table: Table,
    row: Vec<String>,
    cell: Vec<String>,
}

/// Top-level blocks of the body.
pub(crate) fn parse_body(xml: &str) -> Result<Vec<Block>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut blocks = Vec::new();
    // Outer paragraph first; deeper entries are text-box paragraphs.
    let mut paragraphs: Vec<ParagraphBuilder> = Vec::new();
    let mut table: Option<TableBuilder> = None;
    let mut table_depth = 0usize;
    let mut in_text = false;

    loop {
        let event = reader.read_event().map_err(xml_err)?;
        let (start, empty) = match &event {
            Event::Start(e) => (Some(e), false),
            Event::Empty(e) => (Some(e), true),
            _ => (None, false),
        };

        if let Some(e) = start {
            match e.name().as_ref() {
                b"w:p" => {
                    paragraphs.push(ParagraphBuilder::default());
                    if empty {
                        finish_paragraph(&mut paragraphs, &mut table, &mut blocks, table_depth);
                    }
                }
                b"w:pPr" if !empty => {
                    if let Some(p) = paragraphs.last_mut() {
                        p.in_props = true;
                    }
                }
                b"w:pStyle" => {
                    if let Some(p) = paragraphs.last_mut() {
                        p.paragraph.style_id = attr(e, b"val");
                    }
                }
                b"w:r" if !empty => {
                    if let Some(p) = paragraphs.last_mut() {
                        p.runs += 1;
                        p.in_run = true;
                    }
                }
                b"w:b" => {
                    if let Some(p) = paragraphs.last_mut() {
                        if p.in_run && !p.in_props && p.runs == 1 {
                            p.paragraph.first_run_bold = toggle_on(e);
                        }
                    }
                }
                b"w:t" if !empty => in_text = true,
                b"w:tab" => push_in_run(&mut paragraphs, "\t"),
                b"w:br" | b"w:cr" => push_in_run(&mut paragraphs, "\n"),
                b"w:tbl" if !empty => {
                    table_depth += 1;
                    if table_depth == 1 {
                        table = Some(TableBuilder::default());
                    }
                }
                b"w:tr" if !empty && table_depth == 1 => {
                    if let Some(t) = table.as_mut() {
                        t.row.clear();
                    }
                }
                b"w:tc" if table_depth == 1 => {
                    if let Some(t) = table.as_mut() {
                        t.cell.clear();
                        if empty {
                            t.row.push(String::new());
                        }
                    }
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => finish_paragraph(&mut paragraphs, &mut table, &mut blocks, table_depth),
                b"w:pPr" => {
                    if let Some(p) = paragraphs.last_mut() {
                        p.in_props = false;
                    }
                }
                b"w:r" => {
                    if let Some(p) = paragraphs.last_mut() {
                        p.in_run = false;
                    }
                }
                b"w:t" => in_text = false,
                b"w:tc" if table_depth == 1 => {
                    if let Some(t) = table.as_mut() {
                        let text = t.cell.join("\n");
                        t.row.push(text);
                        t.cell.clear();
                    }
                }
                b"w:tr" if table_depth == 1 => {
                    if let Some(t) = table.as_mut() {
                        let row = std::mem::take(&mut t.row);
                        t.table.rows.push(row);
                    }
                }
                b"w:tbl" => {
                    table_depth = table_depth.saturating_sub(1);
                    if table_depth == 0 {
                        if let Some(t) = table.take() {
                            blocks.push(Block::Table(t.table));
                        }
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(xml_err)?;
                if let Some(p) = paragraphs.last_mut() {
                    p.paragraph.text.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(blocks)
}

fn push_in_run(paragraphs: &mut [ParagraphBuilder], s: &str) {
    if let Some(p) = paragraphs.last_mut() {
        if p.in_run && !p.in_props {
            p.paragraph.text.push_str(s);
        }
    }
}

fn finish_paragraph(
    paragraphs: &mut Vec<ParagraphBuilder>,
    table: &mut Option<TableBuilder>,
    blocks: &mut Vec<Block>,
    table_depth: usize,
) {
    let Some(done) = paragraphs.pop() else {
        return;
    };
    if !paragraphs.is_empty() {
        // Text-box paragraph inside another paragraph's run.
        return;
    }
    if table_depth == 0 {
        blocks.push(Block::Paragraph(done.paragraph));
    } else if let Some(t) = table.as_mut() {
        t.cell.push(done.paragraph.text);
    }
}

/// Map of paragraph style id → display name from `word/styles.xml`.
pub(crate) fn style_names(xml: &str) -> Result<HashMap<String, String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut names = HashMap::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == b"w:style" => {
                current = attr(&e, b"styleId");
            }
            Event::Empty(e) if e.name().as_ref() == b"w:name" => {
                if let (Some(id), Some(name)) = (current.as_ref(), attr(&e, b"val")) {
                    names.insert(id.clone(), name);
                }
            }
            Event::End(e) if e.name().as_ref() == b"w:style" => current = None,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(names)
}
