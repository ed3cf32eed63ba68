//! Configuration types for a publishing run.
//!
//! All run behaviour is controlled through [`PublishConfig`], built via its
//! [`PublishConfigBuilder`]. A builder can start empty, from a JSON manifest
//! ([`PublishConfig::from_manifest`]) or from the built-in set of legal
//! documents ([`PublishConfig::standard_legal_set`]).
//!
//! # Paths
//! Relative paths in a config (sources, font files, outputs and the output
//! directory) resolve against [`PublishConfig::root`], which is also the
//! working directory of the upstream generator. A manifest sets the root to
//! its own directory.
//!
//! # Example
//! ```rust
//! use legal_docs::{DocumentTarget, PublishConfig};
//!
//! let config = PublishConfig::builder()
//!     .root("site")
//!     .output_dir("public/legal")
//!     .document(DocumentTarget::new("terms-of-service.md", "Helvetica"))
//!     .build()
//!     .unwrap();
//! assert_eq!(
//!     config.pdf_path(&config.documents[0]),
//!     std::path::Path::new("site/public/legal/terms-of-service.pdf")
//! );
//! ```

use crate::error::LegalDocsError;
use crate::pipeline::pdf::PageGeometry;
use crate::pipeline::upstream::UpstreamCommand;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Output directory used when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "public/legal";

/// Stems of the documents published by the standard set.
pub const LEGAL_DOCUMENT_STEMS: [&str; 3] = ["terms-of-service", "privacy-policy", "cookies-policy"];

/// Font used by the English documents of the standard set.
pub const LATIN_FONT: &str = "Helvetica";

/// Font identifier used by the Chinese documents of the standard set.
pub const CJK_FONT: &str = "SimHei";

fn default_font() -> String {
    LATIN_FONT.to_string()
}

/// One source document and how to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentTarget {
    /// Markdown source file.
    pub source: PathBuf,
    /// Font identifier; a built-in PDF font name or the name to register
    /// `font_path` under.
    #[serde(default = "default_font")]
    pub font: String,
    /// TrueType/OpenType file backing `font`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Explicit PDF output; defaults to `<output_dir>/<stem>.pdf`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PathBuf>,
    /// Explicit DOCX output; defaults to `<output_dir>/<stem>.docx`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docx: Option<PathBuf>,
}

impl DocumentTarget {
    pub fn new(source: impl Into<PathBuf>, font: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            font: font.into(),
            font_path: None,
            pdf: None,
            docx: None,
        }
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    pub fn pdf(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdf = Some(path.into());
        self
    }

    pub fn docx(mut self, path: impl Into<PathBuf>) -> Self {
        self.docx = Some(path.into());
        self
    }

    /// File stem of the source, used to name derived outputs.
    pub fn stem(&self) -> String {
        self.source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }
}

/// Configuration for a publishing run.
///
/// Built via [`PublishConfig::builder()`].
#[derive(Clone)]
pub struct PublishConfig {
    /// Base for relative paths and working directory of the upstream step.
    /// Default: `.`.
    pub root: PathBuf,

    /// Directory derived outputs are written to. Default: `public/legal`.
    pub output_dir: PathBuf,

    /// Documents to publish, in order.
    pub documents: Vec<DocumentTarget>,

    /// Generator run once before any document. Default: none.
    pub upstream: Option<UpstreamCommand>,

    /// Page size and margins for the PDF rendition. Default: A4, 50/60pt.
    pub geometry: PageGeometry,

    /// Optional per-document progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            documents: Vec::new(),
            upstream: None,
            geometry: PageGeometry::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfig")
            .field("root", &self.root)
            .field("output_dir", &self.output_dir)
            .field("documents", &self.documents)
            .field("upstream", &self.upstream)
            .field("geometry", &self.geometry)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PublishProgressCallback>"),
            )
            .finish()
    }
}

impl PublishConfig {
    /// Create a new builder for `PublishConfig`.
    pub fn builder() -> PublishConfigBuilder {
        PublishConfigBuilder {
            config: Self::default(),
        }
    }

    /// The built-in legal document set rooted at `root`.
    ///
    /// Publishes terms of service, privacy policy and cookies policy from
    /// `<root>/<stem>.md` in Helvetica after running
    /// `node scripts/write-legal-markdown.mjs`, writing the renditions to
    /// `<root>/public/legal`. When `cjk_font` is given the Chinese
    /// `<stem>-cn.md` variants are added, rendered with that file registered
    /// as `SimHei`.
    pub fn standard_legal_set(root: impl Into<PathBuf>, cjk_font: Option<PathBuf>) -> PublishConfigBuilder {
        let mut documents: Vec<DocumentTarget> = LEGAL_DOCUMENT_STEMS
            .iter()
            .map(|stem| DocumentTarget::new(format!("{stem}.md"), LATIN_FONT))
            .collect();
        if let Some(font_path) = cjk_font {
            documents.extend(LEGAL_DOCUMENT_STEMS.iter().map(|stem| {
                DocumentTarget::new(format!("{stem}-cn.md"), CJK_FONT)
                    .font_path(font_path.clone())
            }));
        }

        Self::builder()
            .root(root)
            .output_dir(DEFAULT_OUTPUT_DIR)
            .documents(documents)
            .upstream(UpstreamCommand::new("node", ["scripts/write-legal-markdown.mjs"]))
    }

    /// Load a JSON manifest. The manifest's directory becomes the root.
    pub fn from_manifest(path: &Path) -> Result<PublishConfigBuilder, LegalDocsError> {
        let text = std::fs::read_to_string(path).map_err(|e| LegalDocsError::InvalidManifest {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let manifest: Manifest = serde_json::from_str(&text).map_err(|e| LegalDocsError::InvalidManifest {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let root = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut builder = Self::builder()
            .root(root)
            .documents(manifest.documents)
            .geometry(manifest.page);
        if let Some(dir) = manifest.output_dir {
            builder = builder.output_dir(dir);
        }
        if let Some(cmd) = manifest.upstream {
            builder = builder.upstream(cmd);
        }
        Ok(builder)
    }

    /// `path` made absolute against [`Self::root`] when relative.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn source_path(&self, target: &DocumentTarget) -> PathBuf {
        self.resolve(&target.source)
    }

    pub fn font_path(&self, target: &DocumentTarget) -> Option<PathBuf> {
        target.font_path.as_deref().map(|p| self.resolve(p))
    }

    pub fn pdf_path(&self, target: &DocumentTarget) -> PathBuf {
        match &target.pdf {
            Some(p) => self.resolve(p),
            None => self.resolve(&self.output_dir.join(format!("{}.pdf", target.stem()))),
        }
    }

    pub fn docx_path(&self, target: &DocumentTarget) -> PathBuf {
        match &target.docx {
            Some(p) => self.resolve(p),
            None => self.resolve(&self.output_dir.join(format!("{}.docx", target.stem()))),
        }
    }
}

/// On-disk manifest format.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    output_dir: Option<PathBuf>,
    #[serde(default)]
    upstream: Option<UpstreamCommand>,
    #[serde(default)]
    page: PageGeometry,
    documents: Vec<DocumentTarget>,
}

/// Builder for [`PublishConfig`].
#[derive(Debug)]
pub struct PublishConfigBuilder {
    config: PublishConfig,
}

impl PublishConfigBuilder {
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn document(mut self, target: DocumentTarget) -> Self {
        self.config.documents.push(target);
        self
    }

    pub fn documents(mut self, targets: impl IntoIterator<Item = DocumentTarget>) -> Self {
        self.config.documents = targets.into_iter().collect();
        self
    }

    pub fn upstream(mut self, cmd: UpstreamCommand) -> Self {
        self.config.upstream = Some(cmd);
        self
    }

    /// Skip the upstream generator.
    pub fn no_upstream(mut self) -> Self {
        self.config.upstream = None;
        self
    }

    pub fn geometry(mut self, geometry: PageGeometry) -> Self {
        self.config.geometry = geometry;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PublishConfig, LegalDocsError> {
        let c = &self.config;
        let g = &c.geometry;
        if g.width <= 0.0 || g.height <= 0.0 {
            return Err(LegalDocsError::InvalidConfig(format!(
                "Page size must be positive, got {}x{}",
                g.width, g.height
            )));
        }
        if g.margin_x < 0.0 || g.margin_y < 0.0 || g.content_width() <= 0.0 || g.top() <= g.margin_y {
            return Err(LegalDocsError::InvalidConfig(format!(
                "Margins {}/{} leave no content area on a {}x{} page",
                g.margin_x, g.margin_y, g.width, g.height
            )));
        }
        if let Some(cmd) = &c.upstream {
            if cmd.program.trim().is_empty() {
                return Err(LegalDocsError::InvalidConfig(
                    "Upstream program must not be empty".into(),
                ));
            }
        }

        let mut outputs = HashSet::new();
        for target in &c.documents {
            if target.source.as_os_str().is_empty() {
                return Err(LegalDocsError::InvalidConfig(
                    "Document source must not be empty".into(),
                ));
            }
            if target.font.trim().is_empty() {
                return Err(LegalDocsError::InvalidConfig(format!(
                    "Document '{}' has an empty font name",
                    target.source.display()
                )));
            }
            for output in [c.pdf_path(target), c.docx_path(target)] {
                if !outputs.insert(output.clone()) {
                    return Err(LegalDocsError::InvalidConfig(format!(
                        "Output '{}' is written by more than one document",
                        output.display()
                    )));
                }
            }
        }
        Ok(self.config)
    }
}
