//! Content extraction from fetched HTML
//!
//! This module turns an HTML response into a [`PageDocument`]:
//! - Locating the primary content region and skipping page chrome
//! - Converting the region into structural blocks
//! - Collecting outbound links that fall inside the crawl scope

use crate::crawler::fetcher::FetchResult;
use crate::document::{Block, ListItem, PageDocument};
use crate::url::{canonicalize, resolve_link, CrawlScope};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Visible text a candidate region needs to be taken as the main content
const MIN_CONTENT_CHARS: usize = 200;

/// Semantic containers, tried first
const SEMANTIC_SELECTORS: &[&str] = &["main", "article", "[role='main']", "[role='article']"];

/// Common documentation content containers
const CLASS_SELECTORS: &[&str] = &[
    ".markdown-body",
    ".docs-content",
    ".doc-content",
    ".documentation",
    ".theme-doc-markdown",
    ".rst-content",
    ".post-content",
    ".page-content",
    ".article-content",
    ".entry-content",
    ".content-wrapper",
    ".content",
    ".document",
    "#main-content",
    "#content",
    "#main",
];

/// Elements never rendered
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "aside", "form", "iframe", "noscript", "svg", "button",
    "template", "head", "link", "meta", "select", "input", "textarea", "object", "canvas",
];

const SKIPPED_ROLES: &[&str] = &["navigation", "banner", "contentinfo", "search"];

const SKIPPED_CLASSES: &[&str] = &[
    "sidebar",
    "toc",
    "table-of-contents",
    "menu",
    "navbar",
    "navigation",
    "breadcrumb",
    "breadcrumbs",
    "pagination",
    "edit-page",
    "skip-link",
    "sr-only",
    "visually-hidden",
];

/// Permalink anchors next to headings
const PERMALINK_CLASSES: &[&str] = &["headerlink", "hash-link", "anchor", "anchor-link", "header-anchor"];

/// Element depth past which a subtree is rendered as plain text
const MAX_NESTING: usize = 128;

/// Title suffixes that only repeat the site name
const TITLE_SUFFIXES: &[&str] = &[
    " - Documentation",
    " | Documentation",
    " Documentation",
    " Docs",
    " API Reference",
];

/// Extracts the structured content and in-scope links of a fetched page
///
/// Malformed markup never fails: the HTML parser recovers what it can, and a
/// page without recognizable content yields a document with an empty body.
pub fn extract(fetch: &FetchResult, scope: &CrawlScope) -> PageDocument {
    let html = fetch.text();
    let document = Html::parse_document(&html);
    let base = document_base(&document, &fetch.final_url);

    let converter = Converter { base: &base };
    let root = main_content(&document);

    let blocks = match root {
        Some(root) => converter.blocks(root),
        None => Vec::new(),
    };
    if blocks.is_empty() {
        tracing::warn!("No content extracted from {}", fetch.url);
    }

    let title = root
        .and_then(first_heading)
        .or_else(|| page_title(&document))
        .unwrap_or_else(|| fallback_title(&fetch.url));

    let links = extract_links(&document, &base, scope, &fetch.url);

    PageDocument::new(fetch.url.clone(), title, blocks, links)
}

/// Strips site-name suffixes and collapses whitespace in a `<title>`
pub fn clean_title(raw: &str) -> String {
    let mut title = collapse_whitespace(raw);
    for suffix in TITLE_SUFFIXES {
        if let Some(stripped) = title.strip_suffix(suffix) {
            let stripped = stripped.trim();
            if !stripped.is_empty() {
                title = stripped.to_string();
            }
            break;
        }
    }
    title
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn document_base(document: &Html, final_url: &Url) -> Url {
    selector("base[href]")
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr("href"))
                .and_then(|href| final_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| final_url.clone())
}

/// Picks the element whose subtree is rendered
///
/// 1. Semantic containers, then known content classes/ids: the first
///    candidate with more than 200 characters of visible text wins
/// 2. The container with the most direct content children
/// 3. `<body>`
fn main_content(document: &Html) -> Option<ElementRef<'_>> {
    for css in SEMANTIC_SELECTORS.iter().chain(CLASS_SELECTORS) {
        let Some(sel) = selector(css) else {
            continue;
        };
        for candidate in document.select(&sel) {
            if is_skipped(candidate) {
                continue;
            }
            if visible_text(candidate).chars().count() > MIN_CONTENT_CHARS {
                tracing::trace!("Main content matched {}", css);
                return Some(candidate);
            }
        }
    }

    if let Some(sel) = selector("section, div") {
        let mut best: Option<(usize, ElementRef<'_>)> = None;
        for candidate in document.select(&sel) {
            if is_skipped(candidate) {
                continue;
            }
            let count = content_children(candidate);
            if count >= 2 && best.map(|(n, _)| count > n).unwrap_or(true) {
                best = Some((count, candidate));
            }
        }
        if let Some((_, el)) = best {
            return Some(el);
        }
    }

    selector("body")
        .and_then(|sel| document.select(&sel).next())
        .or_else(|| Some(document.root_element()))
}

fn content_children(el: ElementRef<'_>) -> usize {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| {
            matches!(
                child.value().name(),
                "p" | "pre" | "ul" | "ol" | "table" | "blockquote" | "h1" | "h2" | "h3" | "h4"
                    | "h5" | "h6"
            )
        })
        .count()
}

/// True for page chrome that must not be rendered
fn is_skipped(el: ElementRef<'_>) -> bool {
    let value = el.value();
    let name = value.name();

    if SKIPPED_TAGS.contains(&name) {
        return true;
    }
    if name == "header" && !contains_heading(el) {
        return true;
    }
    if value.attr("hidden").is_some() || value.attr("aria-hidden") == Some("true") {
        return true;
    }
    if let Some(role) = value.attr("role") {
        if SKIPPED_ROLES.contains(&role.to_ascii_lowercase().as_str()) {
            return true;
        }
    }
    if let Some(id) = value.id() {
        if SKIPPED_CLASSES.contains(&id.to_ascii_lowercase().as_str()) {
            return true;
        }
    }

    value.classes().any(|class| {
        let class = class.to_ascii_lowercase();
        SKIPPED_CLASSES.contains(&class.as_str())
            || (name == "a" && PERMALINK_CLASSES.contains(&class.as_str()))
    })
}

fn contains_heading(el: ElementRef<'_>) -> bool {
    el.descendants()
        .filter_map(ElementRef::wrap)
        .any(|d| heading_level(d.value().name()).is_some())
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Text of an element, skipping chrome, with whitespace collapsed
fn visible_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_visible_text(el, &mut out);
    collapse_whitespace(&out)
}

/// Pending work for the explicit-stack text walks
enum Step<'a> {
    Text(&'a str),
    Enter(ElementRef<'a>),
    /// Space after a block-level element
    Gap,
}

/// Pushes the children of `el` so that they pop in document order
fn push_children<'a>(el: ElementRef<'a>, stack: &mut Vec<Step<'a>>) {
    for child in el.children().rev() {
        match child.value() {
            Node::Text(text) => stack.push(Step::Text(text)),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    stack.push(Step::Enter(child));
                }
            }
            _ => {}
        }
    }
}

fn push_visible_text(el: ElementRef<'_>, out: &mut String) {
    let mut stack = Vec::new();
    push_children(el, &mut stack);

    while let Some(step) = stack.pop() {
        match step {
            Step::Text(text) => out.push_str(text),
            Step::Gap => out.push(' '),
            Step::Enter(child) => {
                if is_skipped(child) {
                    continue;
                }
                if !is_inline(child.value().name()) {
                    stack.push(Step::Gap);
                }
                push_children(child, &mut stack);
            }
        }
    }
}

/// Text exactly as written, for preformatted blocks
fn raw_text(el: ElementRef<'_>, out: &mut String) {
    let mut stack = Vec::new();
    push_children(el, &mut stack);

    while let Some(step) = stack.pop() {
        match step {
            Step::Text(text) => out.push_str(text),
            Step::Gap => {}
            Step::Enter(child) => {
                if child.value().name() == "br" {
                    out.push('\n');
                } else if !is_skipped(child) {
                    push_children(child, &mut stack);
                }
            }
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_inline(name: &str) -> bool {
    matches!(
        name,
        "a" | "abbr"
            | "b"
            | "bdi"
            | "bdo"
            | "cite"
            | "code"
            | "data"
            | "del"
            | "dfn"
            | "em"
            | "i"
            | "ins"
            | "kbd"
            | "mark"
            | "q"
            | "s"
            | "samp"
            | "small"
            | "span"
            | "strong"
            | "sub"
            | "sup"
            | "time"
            | "tt"
            | "u"
            | "var"
            | "wbr"
            | "br"
            | "img"
            | "label"
    )
}

fn first_heading(root: ElementRef<'_>) -> Option<String> {
    let sel = selector("h1")?;
    root.select(&sel)
        .filter(|h| !is_skipped(*h))
        .map(visible_text)
        .find(|text| !text.is_empty())
}

fn page_title(document: &Html) -> Option<String> {
    let sel = selector("title")?;
    document
        .select(&sel)
        .next()
        .map(|el| clean_title(&el.text().collect::<String>()))
        .filter(|title| !title.is_empty())
}

fn fallback_title(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back().map(str::to_string))
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| url.host_str().unwrap_or(url.as_str()).to_string())
}

/// Collects every followable `<a href>` in the page that is in scope
///
/// Links are returned as resolved, one per canonical form.
fn extract_links(document: &Html, base: &Url, scope: &CrawlScope, own_url: &Url) -> Vec<Url> {
    let Some(sel) = selector("a[href]") else {
        return Vec::new();
    };
    let own = canonicalize(own_url.clone()).ok();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&sel) {
        if anchor.value().attr("download").is_some() {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(url) = resolve_link(base, href) else {
            continue;
        };
        let Ok(canonical) = canonicalize(url.clone()) else {
            continue;
        };
        if own.as_ref() == Some(&canonical) || !scope.contains(&canonical) {
            continue;
        }
        if seen.insert(canonical.as_str().to_string()) {
            links.push(url);
        }
    }

    links
}

/// Converts a content subtree into blocks
struct Converter<'a> {
    base: &'a Url,
}

impl Converter<'_> {
    fn blocks(&self, root: ElementRef<'_>) -> Vec<Block> {
        let mut out = Vec::new();
        self.children_into(root, &mut out, 0);
        out
    }

    /// Renders children, grouping loose inline content into paragraphs
    fn children_into(&self, el: ElementRef<'_>, out: &mut Vec<Block>, depth: usize) {
        let mut paragraph = String::new();

        for child in el.children() {
            match child.value() {
                Node::Text(text) => paragraph.push_str(text),
                Node::Element(_) => {
                    let Some(child) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if is_skipped(child) {
                        continue;
                    }
                    if is_inline(child.value().name()) {
                        paragraph.push_str(&self.inline(child, depth + 1));
                    } else {
                        flush_paragraph(&mut paragraph, out);
                        self.block_into(child, out, depth + 1);
                    }
                }
                _ => {}
            }
        }

        flush_paragraph(&mut paragraph, out);
    }

    fn block_into(&self, el: ElementRef<'_>, out: &mut Vec<Block>, depth: usize) {
        if depth > MAX_NESTING {
            let text = visible_text(el);
            if !text.is_empty() {
                out.push(Block::Paragraph(text));
            }
            return;
        }

        let name = el.value().name();

        if let Some(level) = heading_level(name) {
            let text = visible_text(el);
            if !text.is_empty() {
                out.push(Block::Heading { level, text });
            }
            return;
        }

        match name {
            "p" => {
                let text = collapse_whitespace(&self.inline_children(el, depth));
                if !text.is_empty() {
                    out.push(Block::Paragraph(text));
                }
            }
            "pre" => {
                if let Some(code) = code_block(el) {
                    out.push(code);
                }
            }
            "ul" | "ol" => {
                let items = self.list_items(el, depth);
                if !items.is_empty() {
                    out.push(Block::List {
                        ordered: name == "ol",
                        items,
                    });
                }
            }
            "blockquote" => {
                let mut inner = Vec::new();
                self.children_into(el, &mut inner, depth);
                let text = inner
                    .iter()
                    .filter_map(|block| match block {
                        Block::Paragraph(text) | Block::Quote(text) => Some(text.clone()),
                        Block::Heading { text, .. } => Some(text.clone()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n");
                if !text.is_empty() {
                    out.push(Block::Quote(text));
                }
            }
            "table" => {
                if let Some(table) = self.table(el, depth) {
                    out.push(table);
                }
            }
            "hr" | "img" | "picture" | "video" | "audio" => {}
            _ => self.children_into(el, out, depth),
        }
    }

    fn list_items(&self, list: ElementRef<'_>, depth: usize) -> Vec<ListItem> {
        list.children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "li" && !is_skipped(*child))
            .map(|li| self.list_item(li, depth + 1))
            .filter(|item| !item.text.is_empty() || !item.children.is_empty())
            .collect()
    }

    fn list_item(&self, li: ElementRef<'_>, depth: usize) -> ListItem {
        let mut text = String::new();
        let mut children = Vec::new();

        for child in li.children() {
            match child.value() {
                Node::Text(t) => text.push_str(t),
                Node::Element(_) => {
                    let Some(child) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if is_skipped(child) {
                        continue;
                    }
                    let name = child.value().name();
                    if is_inline(name) {
                        text.push_str(&self.inline(child, depth + 1));
                    } else if name == "p" && children.is_empty() {
                        text.push(' ');
                        text.push_str(&self.inline_children(child, depth + 1));
                    } else {
                        self.block_into(child, &mut children, depth + 1);
                    }
                }
                _ => {}
            }
        }

        ListItem {
            text: collapse_whitespace(&text),
            children,
        }
    }

    fn table(&self, table: ElementRef<'_>, depth: usize) -> Option<Block> {
        let row_sel = selector("tr")?;
        let mut header: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();

        for tr in table.select(&row_sel) {
            let cells: Vec<ElementRef<'_>> = tr
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|c| matches!(c.value().name(), "th" | "td"))
                .collect();
            if cells.is_empty() {
                continue;
            }
            let all_header = cells.iter().all(|c| c.value().name() == "th");
            let texts: Vec<String> = cells
                .iter()
                .map(|c| collapse_whitespace(&self.inline_children(*c, depth + 1)))
                .collect();

            if header.is_empty() && rows.is_empty() && all_header {
                header = texts;
            } else {
                rows.push(texts);
            }
        }

        if header.is_empty() && rows.is_empty() {
            return None;
        }
        if header.is_empty() {
            header = rows.remove(0);
        }
        Some(Block::Table { header, rows })
    }

    fn inline_children(&self, el: ElementRef<'_>, depth: usize) -> String {
        if depth > MAX_NESTING {
            return visible_text(el);
        }

        let mut out = String::new();
        for child in el.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        if !is_skipped(child) {
                            out.push_str(&self.inline(child, depth + 1));
                            if !is_inline(child.value().name()) {
                                out.push(' ');
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Renders an inline element as markdown
    fn inline(&self, el: ElementRef<'_>, depth: usize) -> String {
        match el.value().name() {
            "br" => " ".to_string(),
            "img" => String::new(),
            "code" | "kbd" | "samp" | "tt" => {
                let mut raw = String::new();
                raw_text(el, &mut raw);
                let text = collapse_whitespace(&raw);
                if text.is_empty() {
                    String::new()
                } else if text.contains('`') {
                    format!("`` {} ``", text)
                } else {
                    format!("`{}`", text)
                }
            }
            "strong" | "b" => wrap_inline(&self.inline_children(el, depth), "**"),
            "em" | "i" => wrap_inline(&self.inline_children(el, depth), "*"),
            "a" => {
                let raw = self.inline_children(el, depth);
                let text = collapse_whitespace(&raw);
                let target = el
                    .value()
                    .attr("href")
                    .map(str::trim)
                    .filter(|href| !href.starts_with('#'))
                    .and_then(|href| self.base.join(href).ok())
                    .filter(|url| url.scheme() == "http" || url.scheme() == "https");
                match target {
                    Some(url) if !text.is_empty() => {
                        keep_edges(&raw, &format!("[{}]({})", text, url))
                    }
                    _ => raw,
                }
            }
            _ => self.inline_children(el, depth),
        }
    }
}

/// Wraps trimmed text in a markdown marker, keeping the outer spacing
fn wrap_inline(raw: &str, marker: &str) -> String {
    let text = collapse_whitespace(raw);
    if text.is_empty() {
        return raw.to_string();
    }
    keep_edges(raw, &format!("{}{}{}", marker, text, marker))
}

fn keep_edges(raw: &str, rendered: &str) -> String {
    let lead = if raw.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if raw.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{}{}{}", lead, rendered, trail)
}

fn flush_paragraph(paragraph: &mut String, out: &mut Vec<Block>) {
    let text = collapse_whitespace(paragraph);
    if !text.is_empty() {
        out.push(Block::Paragraph(text));
    }
    paragraph.clear();
}

fn code_block(pre: ElementRef<'_>) -> Option<Block> {
    let mut raw = String::new();
    raw_text(pre, &mut raw);
    let code = raw.trim_start_matches(['\n', '\r']).trim_end().to_string();
    if code.trim().is_empty() {
        return None;
    }

    let code_child = pre
        .children()
        .filter_map(ElementRef::wrap)
        .find(|c| c.value().name() == "code");
    let language = std::iter::once(pre)
        .chain(code_child)
        .flat_map(|el| el.value().classes())
        .find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .map(str::to_string)
        })
        .filter(|lang| !lang.is_empty());

    Some(Block::Code { language, code })
}
