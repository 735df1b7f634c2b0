//! Markdown rendering of page blocks
//!
//! Rendering is a pure function of the blocks: the same document always
//! produces the same text.

use crate::document::{Block, ListItem};
use std::collections::HashMap;

/// Deepest heading level markdown supports
const MAX_HEADING_LEVEL: u8 = 6;

/// Level a page's shallowest heading is moved to in the combined document
pub const PAGE_HEADING_BASE: u8 = 3;

/// Turns heading text into an anchor slug
///
/// Lowercases, keeps alphanumerics, and joins words with single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_hyphen = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

/// Hands out unique slugs, suffixing repeats with `-1`, `-2`, ...
#[derive(Debug, Default)]
pub struct SlugSet {
    used: HashMap<String, usize>,
}

impl SlugSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique(&mut self, text: &str) -> String {
        let base = slugify(text);
        if !self.used.contains_key(&base) {
            self.used.insert(base.clone(), 0);
            return base;
        }

        loop {
            let count = self.used.entry(base.clone()).or_insert(0);
            *count += 1;
            let candidate = format!("{}-{}", base, count);
            if !self.used.contains_key(&candidate) {
                self.used.insert(candidate.clone(), 0);
                return candidate;
            }
        }
    }
}

/// Shallowest heading level among `blocks`
pub fn shallowest_heading(blocks: &[Block]) -> Option<u8> {
    blocks
        .iter()
        .filter_map(|b| match b {
            Block::Heading { level, .. } => Some(*level),
            _ => None,
        })
        .min()
}

/// Renders blocks, moving headings so that `shallowest` lands on `base`
pub fn render_blocks(blocks: &[Block], shallowest: u8, base: u8) -> String {
    let rendered: Vec<String> = blocks
        .iter()
        .map(|block| render_block(block, shallowest, base))
        .filter(|s| !s.is_empty())
        .collect();
    rendered.join("\n\n")
}

fn render_block(block: &Block, shallowest: u8, base: u8) -> String {
    match block {
        Block::Heading { level, text } => {
            let level = (level.saturating_sub(shallowest) + base).min(MAX_HEADING_LEVEL);
            format!("{} {}", "#".repeat(level as usize), text)
        }
        Block::Paragraph(text) => text.clone(),
        Block::Code { language, code } => render_code(language.as_deref(), code),
        Block::List { ordered, items } => render_list(*ordered, items, shallowest, base),
        Block::Quote(text) => text
            .lines()
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {}", line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Block::Table { header, rows } => render_table(header, rows),
    }
}

/// Fence that cannot collide with the code it wraps
fn code_fence(code: &str) -> &'static str {
    if code.contains("```") {
        "~~~~"
    } else {
        "```"
    }
}

fn render_code(language: Option<&str>, code: &str) -> String {
    let fence = code_fence(code);
    format!(
        "{fence}{}\n{}\n{fence}",
        language.unwrap_or(""),
        code.trim_end_matches('\n'),
        fence = fence
    )
}

fn render_list(ordered: bool, items: &[ListItem], shallowest: u8, base: u8) -> String {
    let mut md = String::new();

    for (i, item) in items.iter().enumerate() {
        let marker = if ordered {
            format!("{}. ", i + 1)
        } else {
            "- ".to_string()
        };
        let indent = " ".repeat(marker.len());

        if !md.is_empty() {
            md.push('\n');
        }
        md.push_str(&marker);
        md.push_str(&item.text);

        for child in &item.children {
            let rendered = render_block(child, shallowest, base);
            if rendered.is_empty() {
                continue;
            }
            // Paragraphs and code under an item need a blank line; nested lists do not
            if !matches!(child, Block::List { .. }) {
                md.push('\n');
            }
            for line in rendered.lines() {
                md.push('\n');
                if !line.is_empty() {
                    md.push_str(&indent);
                    md.push_str(line);
                }
            }
        }
    }

    md
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

/// Escapes a page title for use as link text or heading text
pub fn escape_title(title: &str) -> String {
    let escaped = title.replace('[', "\\[").replace(']', "\\]");
    match escaped.strip_prefix('#') {
        Some(rest) => format!("\\#{}", rest),
        None => escaped,
    }
}

fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let width = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let row_line = |cells: &[String]| {
        let mut padded: Vec<String> = cells.iter().map(|c| escape_cell(c)).collect();
        padded.resize(width, String::new());
        format!("| {} |", padded.join(" | "))
    };

    let mut md = row_line(header);
    md.push('\n');
    md.push_str(&format!("|{}", " --- |".repeat(width)));
    for row in rows {
        md.push('\n');
        md.push_str(&row_line(row));
    }
    md
}
