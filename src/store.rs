//! In-memory document store.
//!
//! Holds the chunks of exactly one trained corpus. Chunks live in two views
//! that are always mutated together under a single lock:
//!
//! - the insertion-ordered sequence of all [`Chunk`]s, and
//! - a per-source grouping (normalized source → ordered chunk contents).
//!
//! The store is an explicit instance: construct one, wrap it in an `Arc`,
//! and pass it to the trainer, router, and server. The lock is a
//! `std::sync::RwLock` and is never held across an `.await`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::Chunk;
use crate::site::{domain_name, normalize_source, SiteMatcher};

#[derive(Default)]
struct StoreInner {
    chunks: Vec<Chunk>,
    by_source: HashMap<String, Vec<String>>,
    /// Source keys in first-insertion order.
    source_order: Vec<String>,
}

/// Thread-safe in-memory chunk store with keyword search.
pub struct DocumentStore {
    inner: RwLock<StoreInner>,
    sites: SiteMatcher,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::with_sites(SiteMatcher::default())
    }

    /// A store whose `search` short-circuits on the given brands.
    pub fn with_sites(sites: SiteMatcher) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            sites,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert one chunk under the normalized form of `source`.
    pub fn add_document(&self, content: impl Into<String>, source: &str) {
        let content = content.into();
        let source = normalize_source(source);

        let total = {
            let mut inner = self.write();
            if !inner.by_source.contains_key(&source) {
                inner.source_order.push(source.clone());
            }
            inner
                .by_source
                .entry(source.clone())
                .or_default()
                .push(content.clone());
            inner.chunks.push(Chunk {
                content,
                source: source.clone(),
            });
            inner.chunks.len()
        };

        tracing::debug!(source = %source, total, "added document");
    }

    /// Insert chunks in order; returns the total chunk count afterwards.
    pub fn add_documents(&self, docs: impl IntoIterator<Item = Chunk>) -> usize {
        for doc in docs {
            self.add_document(doc.content, &doc.source);
        }
        self.len()
    }

    /// All chunk contents for one website.
    ///
    /// Tries an exact normalized match, then the first known source that
    /// contains or is contained by the query, then every chunk whose source
    /// shares the query's second-level domain.
    pub fn get_website_content(&self, website: &str) -> Vec<String> {
        let wanted = normalize_source(website);
        let inner = self.read();

        if let Some(group) = inner.by_source.get(&wanted) {
            return group.clone();
        }

        for source in &inner.source_order {
            if source.contains(&wanted) || wanted.contains(source.as_str()) {
                return inner.by_source.get(source).cloned().unwrap_or_default();
            }
        }

        let wanted_domain = domain_name(&wanted);
        inner
            .chunks
            .iter()
            .filter(|c| domain_name(&c.source) == wanted_domain)
            .map(|c| c.content.clone())
            .collect()
    }

    /// Chunk contents relevant to `query`, best first.
    pub fn search(&self, query: &str) -> Vec<String> {
        if let Some(brand) = self.sites.brand_in(query) {
            let content = self.get_website_content(&brand.domain);
            if !content.is_empty() {
                return content;
            }
        }

        if let Some(site) = self.sites.about_domain(query) {
            let content = self.get_website_content(&site);
            if !content.is_empty() {
                return content;
            }
        }

        let keywords = search_keywords(query);
        let inner = self.read();

        let mut scored: Vec<(usize, &str)> = inner
            .chunks
            .iter()
            .filter_map(|c| {
                let matches = count_matches(&keywords, &c.content);
                (matches > 0).then_some((matches, c.content.as_str()))
            })
            .collect();

        // Stable: equal counts keep insertion order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored.into_iter().map(|(_, c)| c.to_string()).collect()
    }

    /// Normalized source keys in insertion order.
    pub fn get_websites(&self) -> Vec<String> {
        self.read().source_order.clone()
    }

    /// Drop every chunk and source.
    pub fn clear(&self) {
        let mut inner = self.write();
        *inner = StoreInner::default();
    }

    pub fn len(&self) -> usize {
        self.read().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all chunks in insertion order.
    pub fn chunks(&self) -> Vec<Chunk> {
        self.read().chunks.clone()
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased whitespace tokens longer than three characters.
fn search_keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .map(str::to_string)
        .collect()
}

fn count_matches(keywords: &[String], content: &str) -> usize {
    let lower = content.to_lowercase();
    keywords.iter().filter(|k| lower.contains(k.as_str())).count()
}

/// Number of distinct query keywords that occur in `content`, the score
/// `search` ranks by.
pub fn match_count(query: &str, content: &str) -> usize {
    count_matches(&search_keywords(query), content)
}
