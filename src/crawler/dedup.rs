//! URL and content deduplication index

use std::collections::HashSet;

/// Two dedup layers: canonical URLs (before fetch) and content hashes
/// (after extraction)
#[derive(Debug, Default)]
pub struct DedupIndex {
    urls: HashSet<String>,
    hashes: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the canonical URL has been seen before
    pub fn seen(&self, canonical: &str) -> bool {
        self.urls.contains(canonical)
    }

    /// Records a canonical URL; returns true if it was new
    pub fn mark_url_seen(&mut self, canonical: &str) -> bool {
        self.urls.insert(canonical.to_string())
    }

    /// Records a content hash; returns true if it was new
    pub fn record_content_hash(&mut self, hash: &str) -> bool {
        self.hashes.insert(hash.to_string())
    }

    pub fn url_count(&self) -> usize {
        self.urls.len()
    }

    pub fn content_count(&self) -> usize {
        self.hashes.len()
    }
}
