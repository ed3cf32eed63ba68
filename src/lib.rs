//! # legal-docs
//!
//! Publish legal policy documents written in a restricted Markdown dialect as
//! a paginated PDF and an editable Word document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Upstream   regenerate the Markdown sources (external command)
//!  ├─ 2. Font       resolve a built-in PDF font or register a TrueType file
//!  ├─ 3. Normalize  one typed block per source line, inline markup stripped
//!  ├─ 4. PDF        greedy wrap + fixed-page layout, written with lopdf
//!  └─ 5. DOCX       one styled paragraph per block, written with docx-rs
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use legal_docs::{publish, PublishConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PublishConfig::standard_legal_set(".", None).build()?;
//!     let report = publish(config)?;
//!     for doc in &report.documents {
//!         println!("{} → {} pages", doc.pdf.display(), doc.pages);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `legal-docs` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! legal-docs = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod publish;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DocumentTarget, PublishConfig, PublishConfigBuilder};
pub use error::LegalDocsError;
pub use output::{PublishReport, PublishedDocument};
pub use pipeline::docx::render_flow;
pub use pipeline::fonts::{FontLoader, FontRegistry, RegisteredFont, StandardFont};
pub use pipeline::normalize::{clean, normalize, Block};
pub use pipeline::pdf::{lay_out, render_pages, Canvas, PageGeometry, PdfSummary};
pub use pipeline::upstream::{run_upstream, UpstreamCommand, UpstreamOutput};
pub use pipeline::wrap::{wrap, TextMeasure};
pub use progress::{NoopProgressCallback, ProgressCallback, PublishProgressCallback};
pub use publish::{inspect, publish, render_markdown, Publisher};
