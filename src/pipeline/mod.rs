//! Pipeline stages for Markdown-to-PDF/DOCX publishing.
//!
//! Each submodule implements one step. The two renderers consume the same
//! block list independently and never interact.
//!
//! ## Data Flow
//!
//! ```text
//! upstream ──▶ source ──▶ normalize ──┬──▶ pdf  (wrap + fonts)
//! (generator)  (UTF-8)    (blocks)    └──▶ docx
//! ```
//!
//! 1. [`upstream`]:  run the external Markdown generator once per run
//! 2. [`source`]:    read a Markdown file, mapping I/O failures to typed errors
//! 3. [`normalize`]: classify each line as a heading, bullet, paragraph or blank
//! 4. [`fonts`]:     resolve and cache the font a document is set in
//! 5. [`wrap`]:      greedy line breaking against that font's metrics
//! 6. [`pdf`]:       paginate onto fixed pages and write with `lopdf`
//! 7. [`docx`]:      emit a reflowable Word document with `docx-rs`

pub mod docx;
pub mod fonts;
pub mod normalize;
pub mod pdf;
pub mod source;
pub mod upstream;
pub mod wrap;
