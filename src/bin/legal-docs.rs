//! CLI binary for legal-docs.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PublishConfig`, relays the upstream generator's output and reports each
//! published document.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use legal_docs::{
    inspect, Publisher, PublishConfig, PublishConfigBuilder, PublishProgressCallback, PublishedDocument,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback ────────────────────────────────────────────────────

/// Prints one `[legal-docs]` line per document and, when enabled, keeps an
/// indicatif bar underneath. In JSON mode stdout carries only the report, so
/// upstream output goes to stderr and per-document lines are dropped.
struct CliProgressCallback {
    bar: Option<ProgressBar>,
    quiet: bool,
    json: bool,
}

impl CliProgressCallback {
    fn new(show_bar: bool, quiet: bool, json: bool) -> Arc<Self> {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:32.green/238}] {pos}/{len} documents  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Publishing");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self { bar, quiet, json })
    }

    /// Where upstream generator output is relayed, `None` when suppressed.
    fn upstream_sink(&self) -> Option<Sink> {
        if self.quiet {
            None
        } else if self.json {
            Some(Sink::Stderr)
        } else {
            Some(Sink::Stdout)
        }
    }

    /// Print to stdout without tearing the progress bar.
    fn print(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Stdout,
    Stderr,
}

/// Non-empty upstream streams, trimmed, stdout first.
fn relayed_lines<'a>(stdout: &'a str, stderr: &'a str) -> impl Iterator<Item = &'a str> {
    [stdout, stderr].into_iter().map(str::trim).filter(|text| !text.is_empty())
}

impl PublishProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_documents: usize) {
        if let Some(bar) = &self.bar {
            bar.set_length(total_documents as u64);
            bar.set_message("running upstream generator…");
        }
    }

    fn on_upstream_output(&self, stdout: &str, stderr: &str) {
        let Some(sink) = self.upstream_sink() else {
            return;
        };
        for text in relayed_lines(stdout, stderr) {
            match sink {
                Sink::Stdout => self.print(text),
                Sink::Stderr => eprintln!("{text}"),
            }
        }
    }

    fn on_document_start(&self, _index: usize, _total: usize, source: &Path) {
        if let Some(bar) = &self.bar {
            let name = source.file_name().map(|n| n.to_string_lossy().into_owned());
            bar.set_message(name.unwrap_or_default());
        }
    }

    fn on_document_complete(&self, _index: usize, _total: usize, document: &PublishedDocument) {
        if !self.quiet && !self.json {
            self.print(&format!(
                "[legal-docs] Generated {} and {}",
                document.pdf.display(),
                document.docx.display()
            ));
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        if let Some(bar) = &self.bar {
            bar.abandon();
        }
        eprintln!("  {} Document {}/{}  {}", red("✗"), index, total, red(error));
    }

    fn on_run_complete(&self, total_documents: usize, duration_ms: u64) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
            eprintln!(
                "{} {} documents published  {}",
                green("✔"),
                bold(&total_documents.to_string()),
                dim(&format!("{duration_ms}ms"))
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Regenerate and publish the standard legal set in the current project
  legal-docs

  # Include the Chinese documents, rendered with a local CJK font
  legal-docs --cjk-font /usr/share/fonts/simhei.ttf

  # Publish the documents listed in a manifest
  legal-docs legal.json

  # Skip the upstream generator and print a JSON report
  legal-docs --skip-upstream --json

  # Show how a source file is split into blocks
  legal-docs --inspect terms-of-service.md

MANIFEST:
  {
    "output_dir": "public/legal",
    "upstream": { "program": "node", "args": ["scripts/write-legal-markdown.mjs"] },
    "documents": [
      { "source": "terms-of-service.md", "font": "Helvetica" },
      { "source": "terms-of-service-cn.md", "font": "SimHei",
        "font_path": "fonts/simhei.ttf" }
    ]
  }
  Relative paths resolve against the manifest's directory.

ENVIRONMENT VARIABLES:
  LEGAL_DOCS_ROOT       Project root for the standard set
  LEGAL_DOCS_CJK_FONT   TrueType font used for the Chinese documents
  RUST_LOG              Override the log filter (e.g. legal_docs=debug)
"#;

/// Publish legal Markdown documents as PDF and DOCX.
#[derive(Parser, Debug)]
#[command(
    name = "legal-docs",
    version,
    about = "Publish legal Markdown documents as PDF and DOCX",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// JSON manifest listing the documents to publish. Without one, the
    /// standard legal set under --root is published.
    manifest: Option<PathBuf>,

    /// Project root for the standard legal set.
    #[arg(long, env = "LEGAL_DOCS_ROOT", default_value = ".")]
    root: PathBuf,

    /// Override the output directory.
    #[arg(short, long, env = "LEGAL_DOCS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// TrueType font for the Chinese documents; they are skipped without one.
    #[arg(long, env = "LEGAL_DOCS_CJK_FONT")]
    cjk_font: Option<PathBuf>,

    /// Do not run the upstream Markdown generator.
    #[arg(long, env = "LEGAL_DOCS_SKIP_UPSTREAM")]
    skip_upstream: bool,

    /// Print the normalised blocks of FILE as JSON and exit.
    #[arg(long, value_name = "FILE")]
    inspect: Option<PathBuf>,

    /// Print the run report as JSON.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "LEGAL_DOCS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "LEGAL_DOCS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "LEGAL_DOCS_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar and the per-document lines replace INFO logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.inspect.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Inspect mode ─────────────────────────────────────────────────────
    if let Some(ref path) = cli.inspect {
        let blocks = inspect(path).with_context(|| format!("Failed to inspect {}", path.display()))?;
        println!(
            "{}",
            serde_json::to_string_pretty(&blocks).context("Failed to serialise blocks")?
        );
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let callback = CliProgressCallback::new(show_progress, cli.quiet, cli.json);
    let config = build_config(&cli)?
        .progress_callback(callback as Arc<dyn PublishProgressCallback>)
        .build()
        .context("Invalid configuration")?;

    // ── Publish ──────────────────────────────────────────────────────────
    let report = Publisher::new(config).run().context("Publishing failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    }
    Ok(())
}

/// Map CLI args to a `PublishConfigBuilder`.
fn build_config(cli: &Cli) -> Result<PublishConfigBuilder> {
    let mut builder = match &cli.manifest {
        Some(path) => PublishConfig::from_manifest(path)
            .with_context(|| format!("Failed to load manifest {}", path.display()))?,
        None => PublishConfig::standard_legal_set(&cli.root, cli.cjk_font.clone()),
    };
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if cli.skip_upstream {
        builder = builder.no_upstream();
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_mode_relays_upstream_to_stderr() {
        assert_eq!(CliProgressCallback::new(false, false, true).upstream_sink(), Some(Sink::Stderr));
        assert_eq!(CliProgressCallback::new(false, false, false).upstream_sink(), Some(Sink::Stdout));
        assert_eq!(CliProgressCallback::new(false, true, true).upstream_sink(), None);
    }

    #[test]
    fn test_relayed_lines_skip_empty_streams() {
        let lines: Vec<&str> = relayed_lines("  wrote 6 files\n", " \n").collect();
        assert_eq!(lines, ["wrote 6 files"]);
        let lines: Vec<&str> = relayed_lines("", "warning: stale\n").collect();
        assert_eq!(lines, ["warning: stale"]);
    }
}
