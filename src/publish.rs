//! Publishing entry points.
//!
//! A [`Publisher`] owns the configuration and the font registry for one run.
//! It runs the upstream generator once, then publishes each document in
//! order. The first error aborts the run; documents already written stay on
//! disk.

use crate::config::{DocumentTarget, PublishConfig};
use crate::error::LegalDocsError;
use crate::output::{PublishReport, PublishedDocument};
use crate::pipeline::fonts::{FontRegistry, RegisteredFont};
use crate::pipeline::normalize::{normalize, Block};
use crate::pipeline::pdf::{render_pages, PageGeometry, PdfSummary};
use crate::pipeline::{docx, source, upstream};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Long-lived context for a publishing run.
#[derive(Debug)]
pub struct Publisher {
    config: PublishConfig,
    fonts: FontRegistry,
}

impl Publisher {
    pub fn new(config: PublishConfig) -> Self {
        Self::with_fonts(config, FontRegistry::new())
    }

    /// Use a pre-populated or custom-loading font registry.
    pub fn with_fonts(config: PublishConfig, fonts: FontRegistry) -> Self {
        Self { config, fonts }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// Run the upstream step, then publish every configured document.
    ///
    /// # Errors
    /// Returns the first error encountered. An upstream failure aborts before
    /// any document is touched.
    pub fn run(&mut self) -> Result<PublishReport, LegalDocsError> {
        let start = Instant::now();
        let documents = self.config.documents.clone();
        let total = documents.len();
        let callback = self.config.progress_callback.clone();
        info!("Publishing {} documents", total);

        if let Some(ref cb) = callback {
            cb.on_run_start(total);
        }

        // ── Step 1: Upstream generator ───────────────────────────────────
        if let Some(cmd) = &self.config.upstream {
            let output = upstream::run_upstream(cmd, &self.config.root)?;
            if let Some(ref cb) = callback {
                cb.on_upstream_output(&output.stdout, &output.stderr);
            }
        }

        // ── Step 2: Documents, in order ──────────────────────────────────
        let mut report = PublishReport::default();
        for (idx, target) in documents.iter().enumerate() {
            let index = idx + 1;
            if let Some(ref cb) = callback {
                cb.on_document_start(index, total, &self.config.source_path(target));
            }
            match self.publish_document(target) {
                Ok(doc) => {
                    if let Some(ref cb) = callback {
                        cb.on_document_complete(index, total, &doc);
                    }
                    report.documents.push(doc);
                }
                Err(e) => {
                    warn!("Publishing {} failed: {}", target.source.display(), e);
                    if let Some(ref cb) = callback {
                        cb.on_document_error(index, total, &e.to_string());
                    }
                    return Err(e);
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Published {} documents ({} pages) in {}ms",
            report.documents.len(),
            report.total_pages(),
            report.duration_ms
        );
        if let Some(ref cb) = callback {
            cb.on_run_complete(total, report.duration_ms);
        }
        Ok(report)
    }

    /// Publish one document: resolve its font, read, normalise, then write
    /// the PDF and the DOCX.
    ///
    /// The font is resolved first so a missing font file fails before the
    /// source is read or any output is written.
    pub fn publish_document(&mut self, target: &DocumentTarget) -> Result<PublishedDocument, LegalDocsError> {
        let font_path = self.config.font_path(target);
        let font = self.fonts.ensure(&target.font, font_path.as_deref())?;

        let source_path = self.config.source_path(target);
        let pdf_path = self.config.pdf_path(target);
        let docx_path = self.config.docx_path(target);

        let text = source::read_source(&source_path)?;
        let blocks = normalize(&text);
        debug!("{}: {} blocks", source_path.display(), blocks.len());

        let summary = render_pages(&blocks, &pdf_path, &font, &self.config.geometry)?;
        docx::render_flow(&blocks, &docx_path)?;
        info!("Generated {} and {}", pdf_path.display(), docx_path.display());

        Ok(PublishedDocument {
            source: source_path,
            pdf: pdf_path,
            docx: docx_path,
            blocks: blocks.len(),
            pages: summary.pages,
        })
    }
}

/// Publish every document in `config` with a fresh [`Publisher`].
pub fn publish(config: PublishConfig) -> Result<PublishReport, LegalDocsError> {
    Publisher::new(config).run()
}

/// Render in-memory Markdown to both formats on A4.
pub fn render_markdown(
    text: &str,
    pdf_path: &Path,
    docx_path: &Path,
    font: &RegisteredFont,
) -> Result<PdfSummary, LegalDocsError> {
    let blocks = normalize(text);
    let summary = render_pages(&blocks, pdf_path, font, &PageGeometry::default())?;
    docx::render_flow(&blocks, docx_path)?;
    Ok(summary)
}

/// Normalise a source file without rendering it.
pub fn inspect(path: impl AsRef<Path>) -> Result<Vec<Block>, LegalDocsError> {
    let text = source::read_source(path.as_ref())?;
    Ok(normalize(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fonts::{FontLoader, FontProgram, StandardFont};
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;

    const SCENARIO: &str =
        "# Terms\nThis is a paragraph.\n- First point\n  - Nested point\n---\n## Section Two\n";

    struct CountingLoader(Rc<Cell<usize>>);

    impl FontLoader for CountingLoader {
        fn load(&self, _name: &str, _path: &Path) -> Result<FontProgram, LegalDocsError> {
            self.0.set(self.0.get() + 1);
            Ok(FontProgram::Standard(StandardFont::Courier))
        }
    }

    fn write_source(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_publish_document_writes_both_outputs() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "terms.md", SCENARIO);
        let config = PublishConfig::builder()
            .root(dir.path())
            .output_dir("out")
            .document(DocumentTarget::new("terms.md", "Helvetica"))
            .build()
            .unwrap();

        let report = publish(config).unwrap();
        let doc = &report.documents[0];
        assert_eq!(doc.blocks, 6);
        assert_eq!(doc.pages, 1);
        assert_eq!(doc.pdf, dir.path().join("out/terms.pdf"));
        assert!(std::fs::metadata(&doc.pdf).unwrap().len() > 0);
        assert!(std::fs::metadata(&doc.docx).unwrap().len() > 0);
    }

    #[test]
    fn test_shared_font_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "a-cn.md", "# 条款\n");
        write_source(dir.path(), "b-cn.md", "# 隐私\n");
        let calls = Rc::new(Cell::new(0));
        let config = PublishConfig::builder()
            .root(dir.path())
            .output_dir("out")
            .document(DocumentTarget::new("a-cn.md", "SimHei").font_path("simhei.ttf"))
            .document(DocumentTarget::new("b-cn.md", "SimHei").font_path("simhei.ttf"))
            .build()
            .unwrap();

        let mut publisher =
            Publisher::with_fonts(config, FontRegistry::with_loader(CountingLoader(Rc::clone(&calls))));
        let report = publisher.run().unwrap();
        assert_eq!(report.documents.len(), 2);
        assert_eq!(calls.get(), 1);
        assert!(publisher.fonts().is_registered("SimHei"));
    }

    #[test]
    fn test_missing_font_fails_before_output() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "terms-cn.md", SCENARIO);
        let config = PublishConfig::builder()
            .root(dir.path())
            .output_dir("out")
            .document(DocumentTarget::new("terms-cn.md", "SimHei").font_path("missing/simhei.ttf"))
            .build()
            .unwrap();

        let err = publish(config).unwrap_err();
        assert!(matches!(err, LegalDocsError::FontNotFound { .. }), "got: {err}");
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_first_error_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path(), "c.md", "# C\n");
        let config = PublishConfig::builder()
            .root(dir.path())
            .output_dir("out")
            .document(DocumentTarget::new("missing.md", "Helvetica"))
            .document(DocumentTarget::new("c.md", "Helvetica"))
            .build()
            .unwrap();

        let err = publish(config).unwrap_err();
        assert!(matches!(err, LegalDocsError::SourceNotFound { .. }), "got: {err}");
        assert!(!dir.path().join("out/c.pdf").exists());
    }

    #[test]
    fn test_render_markdown_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let font = RegisteredFont::new("Helvetica", FontProgram::Standard(StandardFont::Helvetica));
        let pdf = dir.path().join("x.pdf");
        let docx = dir.path().join("x.docx");
        let summary = render_markdown(SCENARIO, &pdf, &docx, &font).unwrap();
        assert_eq!(summary.pages, 1);
        assert!(pdf.exists() && docx.exists());
    }

    #[test]
    fn test_inspect_returns_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(dir.path(), "terms.md", SCENARIO);
        let blocks = inspect(&path).unwrap();
        assert_eq!(blocks.len(), 6);
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 1,
                text: "Terms".into()
            }
        );
    }
}
