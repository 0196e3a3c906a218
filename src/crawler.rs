//! Bounded URL discovery for a website.
//!
//! Discovery tries the site's `sitemap.xml` first; when that yields nothing
//! it falls back to the links on the home page. Every fetch failure is
//! logged and treated as "no URLs found", so discovery itself never fails:
//! in the worst case the seed URL comes back alone.
//!
//! ```text
//! seed ─▶ normalize ─▶ /sitemap.xml ──(urls)──────────────┐
//!                          │ (none)                        ▼
//!                          └─▶ home page links ─▶ cap at max_urls
//!                                 │ (fetch failed)
//!                                 └─▶ retry once over https
//! ```

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlerConfig;
use crate::fetch::{Fetcher, PageSource};
use crate::sitemap::parse_sitemap;

static RE_HREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"href=["'](.*?)["']"#).unwrap());

/// Discovers the pages of a website.
pub struct Crawler {
    fetcher: Box<dyn PageSource>,
    max_urls: usize,
}

impl Crawler {
    pub fn new(fetcher: impl PageSource + 'static, max_urls: usize) -> Self {
        Self {
            fetcher: Box::new(fetcher),
            max_urls,
        }
    }

    pub fn from_config(fetcher: Fetcher, config: &CrawlerConfig) -> Self {
        Self::new(fetcher, config.max_urls)
    }

    pub fn max_urls(&self) -> usize {
        self.max_urls
    }

    /// Discover at most `max_urls` page URLs for `seed`.
    pub async fn discover(&self, seed: &str) -> Vec<String> {
        let base = normalize_seed(seed);
        info!(seed = %seed, base = %base, "discovering pages");

        let mut urls = self.sitemap_urls(&base).await;

        if urls.is_empty() {
            info!(base = %base, "crawling home page directly");
            urls = self.crawl_home_page(&base).await;
        }

        if urls.is_empty() {
            info!(base = %base, "no URLs found, using the seed alone");
            urls.push(base);
        }

        urls.truncate(self.max_urls);
        info!(count = urls.len(), max = self.max_urls, "discovery finished");
        urls
    }

    /// Page URLs listed in `<base>/sitemap.xml`, or empty on any failure.
    async fn sitemap_urls(&self, base: &str) -> Vec<String> {
        let sitemap_url = format!("{}/sitemap.xml", base);
        debug!(url = %sitemap_url, "fetching sitemap");

        let xml = match self.fetcher.fetch_text(&sitemap_url).await {
            Ok(xml) => xml,
            Err(e) => {
                warn!(error = %e, "sitemap unavailable, falling back to direct crawling");
                return Vec::new();
            }
        };

        match parse_sitemap(&xml) {
            Ok(urls) => {
                info!(count = urls.len(), "found URLs in sitemap");
                urls
            }
            Err(e) => {
                warn!(error = %e, "sitemap unreadable, falling back to direct crawling");
                Vec::new()
            }
        }
    }

    /// Same-domain links on the home page, with one https retry.
    async fn crawl_home_page(&self, base: &str) -> Vec<String> {
        match self.fetcher.fetch_text(base).await {
            Ok(html) => return extract_links(&html, base),
            Err(e) => warn!(url = %base, error = %e, "failed to fetch home page"),
        }

        if base.starts_with("https://") {
            return Vec::new();
        }

        let https_base = force_https(base);
        info!(url = %https_base, "retrying home page over https");
        match self.fetcher.fetch_text(&https_base).await {
            Ok(html) => extract_links(&html, &https_base),
            Err(e) => {
                warn!(url = %https_base, error = %e, "https retry failed");
                Vec::new()
            }
        }
    }
}

/// Prepend `http://` when no scheme is given and drop one trailing slash.
pub fn normalize_seed(seed: &str) -> String {
    let seed = seed.trim();
    let with_scheme = if seed.starts_with("http://") || seed.starts_with("https://") {
        seed.to_string()
    } else {
        format!("http://{}", seed)
    };
    match with_scheme.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => with_scheme,
    }
}

fn force_https(url: &str) -> String {
    format!("https://{}", url.strip_prefix("http://").unwrap_or(url))
}

/// Collect same-domain links from `html`, resolved against `base`.
///
/// The page itself comes first. Order is first occurrence; duplicates are
/// dropped. Root-relative hrefs are appended to `base`; absolute hrefs are
/// kept only when their host equals the base host; fragments and other
/// scheme-bearing values (`mailto:`, `javascript:`, …) are skipped; any other
/// relative href is joined to `base` with a `/`.
pub fn extract_links(html: &str, base: &str) -> Vec<String> {
    let base_host = Url::parse(base)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    let mut push = |link: String| {
        if seen.insert(link.clone()) {
            links.push(link);
        }
    };

    push(base.to_string());

    for caps in RE_HREF.captures_iter(html) {
        let href = caps[1].trim();
        if href.is_empty() {
            continue;
        }

        let resolved = if href.starts_with("//") {
            same_host(&format!("http:{}", href), base_host.as_deref()).then(|| {
                let scheme = base.split("://").next().unwrap_or("http");
                format!("{}:{}", scheme, href)
            })
        } else if href.starts_with('/') {
            Some(format!("{}{}", base, href))
        } else if href.starts_with("http") {
            same_host(href, base_host.as_deref()).then(|| href.to_string())
        } else if href.starts_with('#') || href.contains(':') {
            None
        } else {
            Some(format!("{}/{}", base, href))
        };

        if let Some(link) = resolved {
            push(link);
        }
    }

    debug!(base = %base, count = links.len(), "extracted links");
    links
}

fn same_host(href: &str, base_host: Option<&str>) -> bool {
    match (Url::parse(href), base_host) {
        (Ok(url), Some(host)) => url.host_str() == Some(host),
        _ => false,
    }
}
