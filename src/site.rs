//! Site reference extraction.
//!
//! Everything that turns free text or a URL into a site identifier lives here:
//! source normalization, second-level-domain extraction, and brand/domain
//! detection in questions. Both the [`DocumentStore`](crate::store::DocumentStore)
//! and the [`QueryRouter`](crate::router::QueryRouter) go through a single
//! [`SiteMatcher`], so the trigger lists exist in one place.
//!
//! # Contract
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`normalize_source`] | URL or path | scheme, one trailing `/`, and leading `www.` removed |
//! | [`domain_name`] | URL or path | second-level label (`visafy` for `visafy.com/a`) |
//! | [`SiteMatcher::extract_site_reference`] | question | `Some(domain)` or `None` |

use regex::Regex;
use std::sync::LazyLock;

use crate::config::BrandConfig;

static RE_SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://").unwrap());

static RE_ABOUT_DOMAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)about\s+([a-zA-Z0-9.-]+\.[a-zA-Z]{2,})").unwrap());

static RE_SITE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:about|from|learned|know)\s+([a-zA-Z0-9.-]+\.[a-zA-Z]{2,})").unwrap()
});

/// Phrases that signal a question is about a website as a whole.
const INTENT_PHRASES: &[&str] = &["about", "learned", "know", "tell me"];

/// TLD literals that count as a site reference even without a known brand.
const SITE_TLDS: &[&str] = &[".com", ".to"];

/// Normalize a URL or path into a source identifier.
pub fn normalize_source(url: &str) -> String {
    let without_scheme = RE_SCHEME.replace(url, "");
    let without_scheme: &str = &without_scheme;
    let without_slash = without_scheme.strip_suffix('/').unwrap_or(without_scheme);
    without_slash
        .strip_prefix("www.")
        .unwrap_or(without_slash)
        .to_string()
}

/// Second-level domain of a URL or source (`"visafy"` for `"https://www.visafy.com/about"`).
///
/// Inputs with a single host label are returned normalized but otherwise unchanged.
pub fn domain_name(url: &str) -> String {
    let normalized = normalize_source(url);
    let host = normalized.split('/').next().unwrap_or_default();
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() >= 2 {
        parts[parts.len() - 2].to_string()
    } else {
        normalized
    }
}

/// True when either normalized name contains the other.
pub fn sources_overlap(a: &str, b: &str) -> bool {
    let a = normalize_source(a);
    let b = normalize_source(b);
    a.contains(&b) || b.contains(&a)
}

/// A short brand name that resolves to a domain (`visafy` → `visafy.com`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brand {
    pub name: String,
    pub domain: String,
}

/// Detects site references in free text.
#[derive(Debug, Clone)]
pub struct SiteMatcher {
    brands: Vec<Brand>,
}

impl SiteMatcher {
    pub fn new(brands: Vec<Brand>) -> Self {
        let brands = brands
            .into_iter()
            .map(|b| Brand {
                name: b.name.to_lowercase(),
                domain: b.domain.to_lowercase(),
            })
            .collect();
        Self { brands }
    }

    pub fn from_config(brands: &[BrandConfig]) -> Self {
        Self::new(
            brands
                .iter()
                .map(|b| Brand {
                    name: b.name.clone(),
                    domain: b.domain.clone(),
                })
                .collect(),
        )
    }

    pub fn brands(&self) -> &[Brand] {
        &self.brands
    }

    /// First configured brand whose name or domain appears in `text`.
    pub fn brand_in(&self, text: &str) -> Option<&Brand> {
        let lower = text.to_lowercase();
        self.brands
            .iter()
            .find(|b| lower.contains(&b.domain) || lower.contains(&b.name))
    }

    /// True when `text` carries a TLD literal or a brand name.
    pub fn mentions_site(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        SITE_TLDS.iter().any(|t| lower.contains(t))
            || self.brands.iter().any(|b| lower.contains(&b.name))
    }

    /// True when `text` both asks about something and names a site.
    pub fn has_site_intent(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        INTENT_PHRASES.iter().any(|p| lower.contains(p)) && self.mentions_site(&lower)
    }

    /// Resolve the site a question refers to.
    ///
    /// A brand name wins; otherwise the first domain-like token following
    /// `about`, `from`, `learned`, or `know`.
    pub fn extract_site_reference(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        if let Some(brand) = self.brands.iter().find(|b| lower.contains(&b.name)) {
            return Some(brand.domain.clone());
        }
        RE_SITE_REFERENCE
            .captures(text)
            .map(|caps| caps[1].to_string())
    }

    /// The domain in an `about <domain>` phrase, if any.
    pub fn about_domain(&self, text: &str) -> Option<String> {
        RE_ABOUT_DOMAIN
            .captures(text)
            .map(|caps| caps[1].to_string())
    }
}

impl Default for SiteMatcher {
    fn default() -> Self {
        Self::from_config(&crate::config::default_brands())
    }
}
