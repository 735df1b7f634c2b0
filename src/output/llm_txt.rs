//! llm.txt index generation
//!
//! A compact companion to the markdown document: one entry per included page
//! with a coarse page type, the source URL and a short description, so a
//! model can decide which section to read before loading the whole file.

use crate::document::PageDocument;
use std::fmt;

const HEADER: &str = "# llm.txt - AI-friendly documentation index\n\
# This file helps LLMs quickly find relevant documentation sections\n";

const MAX_DESCRIPTION_CHARS: usize = 200;

const FALLBACK_DESCRIPTION: &str = "Documentation page content.";

/// Coarse kind of documentation page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Api,
    Guide,
    Reference,
    Example,
    Section,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "API",
            Self::Guide => "GUIDE",
            Self::Reference => "REFERENCE",
            Self::Example => "EXAMPLE",
            Self::Section => "SECTION",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a page from its URL and title; the first matching kind wins
pub fn classify_page(url: &str, title: &str) -> PageKind {
    let url = url.to_lowercase();
    let title = title.to_lowercase();
    let url_has = |needles: &[&str]| needles.iter().any(|n| url.contains(n));
    let title_has = |needles: &[&str]| needles.iter().any(|n| title.contains(n));

    if url_has(&["/api/", "/pkg/"]) || title_has(&["api", "package"]) {
        PageKind::Api
    } else if url_has(&["/guide/", "/tutorial/", "/learn/", "/docs/guides/"])
        || title_has(&["guide", "tutorial", "getting started"])
    {
        PageKind::Guide
    } else if url_has(&["/ref/", "/reference/", "/spec/"])
        || title_has(&["reference", "specification"])
    {
        PageKind::Reference
    } else if url_has(&["/example/", "/examples/"]) || title_has(&["example"]) {
        PageKind::Example
    } else {
        PageKind::Section
    }
}

fn with_period(sentence: &str) -> String {
    let sentence = sentence.trim_end_matches('.');
    format!("{}.", sentence)
}

/// Summarizes page text as its first one or two sentences
pub fn extract_description(text: &str) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return FALLBACK_DESCRIPTION.to_string();
    }

    let mut sentences = text.split(". ");
    let first = sentences.next().unwrap_or_default();

    if let Some(second) = sentences.next() {
        let pair = format!("{}. {}", first, with_period(second));
        if pair.chars().count() <= MAX_DESCRIPTION_CHARS {
            return pair;
        }
    }

    let single = with_period(first);
    if single.chars().count() > MAX_DESCRIPTION_CHARS {
        let truncated: String = single.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
        return format!("{}...", truncated);
    }
    single
}

/// Renders the index for `pages`, which must already be in discovery order
pub fn render_llm_txt(pages: &[PageDocument]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for page in pages {
        let kind = classify_page(page.url.as_str(), &page.title);
        out.push_str(&format!("[{}] {}\n", kind, page.title));
        out.push_str(&format!("{}\n", page.url));
        out.push_str(&format!("{}\n\n", extract_description(&page.plain_text())));
    }

    out
}
