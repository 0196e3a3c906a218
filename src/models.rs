//! Core data types that flow through the training and retrieval pipeline.

use serde::Serialize;

/// A bounded slice of extracted text tagged with the normalized source it
/// came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub content: String,
    pub source: String,
}

impl Chunk {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }
}

/// Summary of one website training run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrainReport {
    /// URLs attempted, successful or not.
    pub pages: usize,
    /// URLs whose fetch failed and were skipped.
    pub failed: usize,
    /// Chunks inserted into the store.
    pub chunks: usize,
}

/// Summary of one local-directory training run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LocalTrainReport {
    /// Files read and chunked.
    pub files: usize,
    /// Files skipped (wrong extension, unreadable, or empty).
    pub skipped: usize,
    /// Chunks inserted, fallback facts included.
    pub chunks: usize,
}
