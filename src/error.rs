//! Typed errors for the I/O edges of the pipeline.
//!
//! Orchestration code works in [`anyhow::Result`]; these types exist where a
//! caller needs to tell failure kinds apart (a non-2xx page vs. a dead host,
//! a missing API key vs. a malformed completion body).

use thiserror::Error;

/// A failed outbound page or sitemap fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS, or timeout failure.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The body could not be read as text.
    #[error("failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Malformed sitemap XML.
#[derive(Debug, Error)]
#[error("sitemap parse error at byte {position}: {message}")]
pub struct SitemapError {
    pub position: u64,
    pub message: String,
}

/// A failed call to the remote completion API.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generator is not configured: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid completion response: {0}")]
    Parse(String),
}
