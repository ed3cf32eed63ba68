//! Error types for the legal-docs library.
//!
//! Every failure is fatal for the run: the publisher processes documents in
//! order and stops at the first error, so there is a single error enum
//! rather than a fatal/non-fatal split. Malformed Markdown is never an error;
//! unrecognised lines degrade to paragraphs.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the legal-docs library.
#[derive(Debug, Error)]
pub enum LegalDocsError {
    // ── Upstream generation ───────────────────────────────────────────────
    /// The Markdown generator could not be started at all.
    #[error("Failed to start upstream generator '{program}': {source}")]
    UpstreamSpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The Markdown generator ran but exited unsuccessfully.
    #[error("Upstream generator '{program}' exited with {}\n{stdout}{stderr}", exit_label(.code))]
    UpstreamFailed {
        program: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    // ── Fonts ─────────────────────────────────────────────────────────────
    /// A font file was configured but does not exist.
    #[error("Font path not found: '{path}'")]
    FontNotFound { path: PathBuf },

    /// The font file exists but is not a usable TrueType/OpenType font.
    #[error("Font '{path}' could not be loaded: {detail}")]
    InvalidFont { path: PathBuf, detail: String },

    /// No font file was configured and the name is not a built-in PDF font.
    #[error("Font '{name}' is not a built-in PDF font; configure a font_path for it")]
    UnknownFont { name: String },

    // ── Source documents ──────────────────────────────────────────────────
    /// Source Markdown file does not exist.
    #[error("Source file not found: '{path}'")]
    SourceNotFound { path: PathBuf },

    /// Process does not have read permission on the source file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// Source file is not valid UTF-8.
    #[error("Source file '{path}' is not valid UTF-8 (byte offset {offset})")]
    SourceNotUtf8 { path: PathBuf, offset: usize },

    /// Any other I/O failure while reading a source file.
    #[error("Failed to read source file '{path}': {source}")]
    SourceReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output ────────────────────────────────────────────────────────────
    /// Could not create the output directory or file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The PDF object graph could not be serialised.
    #[error("Failed to write PDF '{path}': {detail}")]
    PdfWriteFailed { path: PathBuf, detail: String },

    /// The DOCX package could not be written.
    #[error("Failed to write DOCX '{path}': {detail}")]
    DocxWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The manifest file is unreadable or malformed.
    #[error("Invalid manifest '{path}': {detail}")]
    InvalidManifest { path: PathBuf, detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_not_found_names_path() {
        let e = LegalDocsError::FontNotFound {
            path: PathBuf::from("/fonts/simhei.ttf"),
        };
        assert!(e.to_string().contains("/fonts/simhei.ttf"), "got: {e}");
    }

    #[test]
    fn upstream_failure_includes_captured_output() {
        let e = LegalDocsError::UpstreamFailed {
            program: "node".into(),
            code: Some(2),
            stdout: "partial\n".into(),
            stderr: "boom".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("status 2"), "got: {msg}");
        assert!(msg.contains("partial"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn upstream_failure_by_signal() {
        let e = LegalDocsError::UpstreamFailed {
            program: "node".into(),
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(e.to_string().contains("a signal"));
    }

    #[test]
    fn not_utf8_display() {
        let e = LegalDocsError::SourceNotUtf8 {
            path: PathBuf::from("terms.md"),
            offset: 17,
        };
        assert!(e.to_string().contains("byte offset 17"));
    }
}
