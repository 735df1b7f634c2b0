//! Output assembler
//!
//! Collects accepted page documents and renders them into one markdown
//! document. Pages are ordered by discovery order regardless of the order in
//! which they were accepted, so the rendered text only depends on the set of
//! pages and the crawl statistics.

use crate::document::{Block, PageDocument};
use crate::output::llm_txt::render_llm_txt;
use crate::output::markdown::{
    escape_title, render_blocks, shallowest_heading, SlugSet, PAGE_HEADING_BASE,
};
use crate::output::stats::CrawlStats;
use crate::url::extract_host;
use std::collections::BTreeMap;
use url::Url;

/// Rendered artifacts of a finished crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledOutput {
    pub title: String,
    pub markdown: String,
    pub llm_txt: String,
    pub page_count: usize,
}

#[derive(Debug)]
pub struct Assembler {
    root_url: Url,
    title_override: Option<String>,
    pages: BTreeMap<usize, PageDocument>,
}

impl Assembler {
    pub fn new(root_url: Url, title_override: Option<String>) -> Self {
        Self {
            root_url,
            title_override: title_override.filter(|t| !t.trim().is_empty()),
            pages: BTreeMap::new(),
        }
    }

    /// Accepts a page; returns false if a page with the same discovery order
    /// was already accepted
    pub fn accept(&mut self, doc: PageDocument) -> bool {
        if self.pages.contains_key(&doc.order) {
            tracing::warn!("Page {} accepted twice, keeping the first", doc.url);
            return false;
        }
        self.pages.insert(doc.order, doc);
        true
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Document title: configured title, else the root page's title, else the root host
    pub fn document_title(&self) -> String {
        if let Some(title) = &self.title_override {
            return title.trim().to_string();
        }

        self.pages
            .values()
            .find(|p| p.url == self.root_url)
            .map(|p| p.title.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| extract_host(&self.root_url))
            .unwrap_or_else(|| self.root_url.to_string())
    }

    /// Renders the combined markdown document and the llm.txt index
    pub fn finalize(self, stats: &CrawlStats) -> AssembledOutput {
        let title = self.document_title();
        let pages: Vec<PageDocument> = self.pages.into_values().collect();

        let mut slugs = SlugSet::new();
        let anchors: Vec<String> = pages.iter().map(|p| slugs.unique(&p.title)).collect();

        let mut md = String::new();
        md.push_str(&format!("# {}\n\n", title));
        md.push_str(&format!(
            "> Consolidated from {} page{} crawled from <{}>.\n\n",
            pages.len(),
            if pages.len() == 1 { "" } else { "s" },
            self.root_url
        ));

        md.push_str("## Contents\n\n");
        for (page, anchor) in pages.iter().zip(&anchors) {
            md.push_str(&format!("- [{}](#{})\n", escape_title(&page.title), anchor));
        }
        md.push('\n');

        for (page, anchor) in pages.iter().zip(&anchors) {
            render_page(&mut md, page, anchor);
        }

        render_summary(&mut md, stats);

        AssembledOutput {
            title,
            llm_txt: render_llm_txt(&pages),
            page_count: pages.len(),
            markdown: md,
        }
    }
}

fn render_page(md: &mut String, page: &PageDocument, anchor: &str) {
    md.push_str("---\n\n");
    md.push_str(&format!("<a id=\"{}\"></a>\n\n", anchor));
    md.push_str(&format!("## {}\n\n", escape_title(&page.title)));
    md.push_str(&format!("> Source: <{}>\n\n", page.url));

    let blocks = body_blocks(page);
    let shallowest = shallowest_heading(blocks).unwrap_or(1);
    let body = render_blocks(blocks, shallowest, PAGE_HEADING_BASE);
    if body.is_empty() {
        md.push_str("*No content could be extracted from this page.*\n\n");
    } else {
        md.push_str(&body);
        md.push_str("\n\n");
    }
}

/// Page blocks without a leading heading that repeats the page title
fn body_blocks(page: &PageDocument) -> &[Block] {
    match page.blocks.first() {
        Some(Block::Heading { text, .. })
            if text.trim().eq_ignore_ascii_case(page.title.trim()) =>
        {
            &page.blocks[1..]
        }
        _ => &page.blocks,
    }
}

fn render_summary(md: &mut String, stats: &CrawlStats) {
    md.push_str("---\n\n");
    md.push_str("## Crawl Summary\n\n");
    md.push_str(&format!("- Pages included: {}\n", stats.included));
    md.push_str(&format!("- URLs discovered: {}\n", stats.discovered));
    md.push_str(&format!("- Failed: {}\n", stats.failed));
    md.push_str(&format!("- Skipped: {}\n", stats.skipped));
    md.push_str(&format!("- Duplicates removed: {}\n", stats.duplicates));

    let skipped = stats.skipped_in_order();
    if !skipped.is_empty() {
        md.push_str("\n### Failed and Skipped URLs\n\n");
        for entry in skipped {
            md.push_str(&format!("- <{}>: {}\n", entry.url, entry.reason));
        }
    }
}
