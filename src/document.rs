//! Structured page content produced by the extractor
//!
//! A [`PageDocument`] is the unit handed from the crawler to the output
//! assembler: the page's title, its content as a sequence of [`Block`]s, the
//! in-scope links it points to and a hash of its normalized text.

use sha2::{Digest, Sha256};
use url::Url;

/// One structural element of a page body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `level` is the source heading level (1-6)
    Heading { level: u8, text: String },

    /// Inline markdown (links, emphasis, inline code already rendered)
    Paragraph(String),

    /// Preformatted code, kept verbatim
    Code {
        language: Option<String>,
        code: String,
    },

    List { ordered: bool, items: Vec<ListItem> },

    Quote(String),

    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// A list entry; nested lists and code blocks are kept as children
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListItem {
    pub text: String,
    pub children: Vec<Block>,
}

impl Block {
    /// Appends the block's visible text to `out`, one line per text run
    fn collect_text(&self, out: &mut String) {
        match self {
            Block::Heading { text, .. } | Block::Paragraph(text) | Block::Quote(text) => {
                push_line(out, text)
            }
            Block::Code { code, .. } => push_line(out, code),
            Block::List { items, .. } => {
                for item in items {
                    push_line(out, &item.text);
                    for child in &item.children {
                        child.collect_text(out);
                    }
                }
            }
            Block::Table { header, rows } => {
                push_line(out, &header.join(" "));
                for row in rows {
                    push_line(out, &row.join(" "));
                }
            }
        }
    }
}

fn push_line(out: &mut String, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(text);
}

/// Extracted content of a single page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    /// Canonical URL the page was requested as
    pub url: Url,

    /// Discovery order of the page's URL record
    pub order: usize,

    /// Depth at which the URL was discovered
    pub depth: u32,

    pub title: String,

    pub blocks: Vec<Block>,

    /// In-scope outbound links, canonical, in document order, deduplicated
    pub links: Vec<Url>,

    /// Hex SHA-256 of the normalized body text
    pub content_hash: String,
}

impl PageDocument {
    pub fn new(url: Url, title: String, blocks: Vec<Block>, links: Vec<Url>) -> Self {
        let mut doc = Self {
            url,
            order: 0,
            depth: 0,
            title,
            blocks,
            links,
            content_hash: String::new(),
        };
        doc.content_hash = content_hash(&doc.plain_text());
        doc
    }

    /// Visible text of all blocks
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            block.collect_text(&mut out);
        }
        out
    }

    /// True when extraction found no body content
    pub fn has_empty_body(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Hashes text after lowercasing and collapsing whitespace
///
/// Two pages that differ only in markup or spacing hash the same.
pub fn content_hash(text: &str) -> String {
    let normalized = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
