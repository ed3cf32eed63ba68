//! Result types returned by the publisher.

use serde::Serialize;
use std::path::PathBuf;

/// One source document published as PDF and DOCX.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedDocument {
    /// Markdown source the renditions were produced from.
    pub source: PathBuf,
    pub pdf: PathBuf,
    pub docx: PathBuf,
    /// Number of normalised blocks.
    pub blocks: usize,
    /// Pages in the written PDF.
    pub pages: usize,
}

/// Summary of a whole publishing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Published documents, in run order.
    pub documents: Vec<PublishedDocument>,
    /// Wall-clock time of the run, upstream step included.
    pub duration_ms: u64,
}

impl PublishReport {
    /// Total PDF pages across all documents.
    pub fn total_pages(&self) -> usize {
        self.documents.iter().map(|d| d.pages).sum()
    }
}
