//! Website training.
//!
//! [`Trainer::train`] turns a list of page URLs into chunks: fetch, strip
//! markup, slice into fixed-size windows, insert. Pages are processed one at
//! a time with a fixed pause between them so small sites are not hammered.
//! A failed page is logged and skipped; it never aborts the batch.
//!
//! [`Trainer::scrape_website`] is the full crawl-and-train run behind
//! `sitechat scrape` and `POST /api/scrape`.

use anyhow::{bail, Result};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::chunk::non_empty_chunks;
use crate::config::{FallbackConfig, TrainingConfig};
use crate::crawler::{normalize_seed, Crawler};
use crate::fetch::{Fetcher, PageSource};
use crate::markup::strip_markup;
use crate::models::TrainReport;
use crate::site::domain_name;
use crate::store::DocumentStore;

/// Fallback facts inserted when a scrape of the fallback site errors out.
const FACTS_ON_FAILURE: usize = 2;

/// Fetches pages and loads their text into a [`DocumentStore`].
pub struct Trainer {
    fetcher: Fetcher,
    chunk_size: usize,
    delay: Duration,
    fallback: FallbackConfig,
}

impl Trainer {
    pub fn new(fetcher: Fetcher, training: &TrainingConfig, fallback: &FallbackConfig) -> Self {
        Self {
            fetcher,
            chunk_size: training.chunk_size,
            delay: Duration::from_millis(training.delay_ms),
            fallback: fallback.clone(),
        }
    }

    /// Override the pause between pages.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fetch, strip, chunk, and store every URL in order.
    pub async fn train(&self, store: &DocumentStore, urls: &[String]) -> TrainReport {
        info!(count = urls.len(), "training on URLs");
        let mut report = TrainReport::default();

        for (i, url) in urls.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            report.pages += 1;
            let html = match self.fetcher.fetch_text(url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(url = %url, error = %e, "skipping page");
                    report.failed += 1;
                    continue;
                }
            };

            let text = strip_markup(&html);
            let chunks = non_empty_chunks(&text, self.chunk_size);
            let added = chunks.len();
            for chunk in chunks {
                store.add_document(chunk, url);
            }
            report.chunks += added;

            info!(url = %url, bytes = html.len(), chunks = added, "trained on page");
        }

        info!(
            pages = report.pages,
            failed = report.failed,
            chunks = report.chunks,
            websites = ?store.get_websites(),
            "training complete"
        );
        report
    }

    /// Clear the store, discover pages for `seed`, and train on them.
    ///
    /// Returns the discovered URLs. When nothing could be learned and the
    /// seed refers to the fallback site, the fallback facts are inserted so
    /// the canonical questions about it stay answerable. A seed that cannot
    /// form a URL is an error; for the fallback site the first two facts are
    /// still inserted first.
    pub async fn scrape_website(
        &self,
        crawler: &Crawler,
        store: &DocumentStore,
        seed: &str,
    ) -> Result<Vec<String>> {
        info!(seed = %seed, "scraping website");
        store.clear();

        match self.crawl_and_train(crawler, store, seed).await {
            Ok(urls) => {
                if store.is_empty() && self.is_fallback_site(seed) {
                    info!(site = %self.fallback.site, "no content found, adding fallback facts");
                    self.add_fallback_facts(store);
                }
                Ok(urls)
            }
            Err(e) => {
                if self.is_fallback_site(seed) {
                    info!(site = %self.fallback.site, "scrape failed, adding fallback facts");
                    for fact in self.fallback.facts.iter().take(FACTS_ON_FAILURE) {
                        store.add_document(fact.as_str(), &self.fallback.site);
                    }
                }
                Err(e)
            }
        }
    }

    async fn crawl_and_train(
        &self,
        crawler: &Crawler,
        store: &DocumentStore,
        seed: &str,
    ) -> Result<Vec<String>> {
        if seed.trim().is_empty() {
            bail!("url must not be empty");
        }
        let base = normalize_seed(seed);
        if let Err(e) = Url::parse(&base) {
            bail!("invalid url '{}': {}", seed, e);
        }

        let urls = crawler.discover(&base).await;
        self.train(store, &urls).await;
        Ok(urls)
    }

    /// True when `seed` mentions the fallback site's domain name.
    pub fn is_fallback_site(&self, seed: &str) -> bool {
        let name = domain_name(&self.fallback.site).to_lowercase();
        !name.is_empty() && seed.to_lowercase().contains(&name)
    }

    /// Insert the configured fallback facts under the fallback site.
    pub fn add_fallback_facts(&self, store: &DocumentStore) -> usize {
        for fact in &self.fallback.facts {
            store.add_document(fact.as_str(), &self.fallback.site);
        }
        self.fallback.facts.len()
    }
}
