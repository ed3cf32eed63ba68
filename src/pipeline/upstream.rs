//! Upstream generation: run the external Markdown generator before rendering.
//!
//! The generator is opaque to this crate. It is run once, synchronously, in
//! the project root; a non-zero exit aborts the whole run before any document
//! is rendered. Captured output is handed back so the caller can relay it.

use crate::error::LegalDocsError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// An external command, e.g. `node scripts/write-legal-markdown.mjs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl UpstreamCommand {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The command as it would be typed in a shell.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Output captured from a successful generator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `cmd` in `cwd` and wait for it to finish.
pub fn run_upstream(cmd: &UpstreamCommand, cwd: &Path) -> Result<UpstreamOutput, LegalDocsError> {
    info!("Running upstream generator: {} (in {})", cmd.display(), cwd.display());

    let output = Command::new(&cmd.program)
        .args(&cmd.args)
        .current_dir(cwd)
        .output()
        .map_err(|e| LegalDocsError::UpstreamSpawnFailed {
            program: cmd.program.clone(),
            source: e,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(LegalDocsError::UpstreamFailed {
            program: cmd.program.clone(),
            code: output.status.code(),
            stdout,
            stderr,
        });
    }

    debug!(
        "Upstream generator finished ({} bytes stdout, {} bytes stderr)",
        stdout.len(),
        stderr.len()
    );
    Ok(UpstreamOutput { stdout, stderr })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_args() {
        let cmd = UpstreamCommand::new("node", ["scripts/write-legal-markdown.mjs"]);
        assert_eq!(cmd.display(), "node scripts/write-legal-markdown.mjs");
    }

    #[test]
    fn test_args_default_to_empty() {
        let cmd: UpstreamCommand = serde_json::from_str(r#"{"program":"make"}"#).unwrap();
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_spawn_failure() {
        let cmd = UpstreamCommand::new("definitely-not-a-real-program-xyz", Vec::<String>::new());
        let err = run_upstream(&cmd, Path::new(".")).unwrap_err();
        assert!(matches!(err, LegalDocsError::UpstreamSpawnFailed { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_output() {
        let cmd = UpstreamCommand::new("sh", ["-c", "echo wrote 6 files; echo note >&2"]);
        let out = run_upstream(&cmd, Path::new(".")).unwrap();
        assert_eq!(out.stdout.trim(), "wrote 6 files");
        assert_eq!(out.stderr.trim(), "note");
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = UpstreamCommand::new("sh", ["-c", "echo x > marker.txt"]);
        run_upstream(&cmd, dir.path()).unwrap();
        assert!(dir.path().join("marker.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_failure() {
        let cmd = UpstreamCommand::new("sh", ["-c", "echo partial; echo broken >&2; exit 3"]);
        match run_upstream(&cmd, Path::new(".")).unwrap_err() {
            LegalDocsError::UpstreamFailed {
                code, stdout, stderr, ..
            } => {
                assert_eq!(code, Some(3));
                assert_eq!(stdout.trim(), "partial");
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("expected UpstreamFailed, got {other}"),
        }
    }
}
