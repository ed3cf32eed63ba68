//! Source resolution: read a Markdown file as UTF-8 text.

use crate::error::LegalDocsError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Read the whole of `path`, mapping failures to typed errors.
pub fn read_source(path: &Path) -> Result<String, LegalDocsError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LegalDocsError::SourceNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => LegalDocsError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => LegalDocsError::SourceReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let text = String::from_utf8(bytes).map_err(|e| LegalDocsError::SourceNotUtf8 {
        path: path.to_path_buf(),
        offset: e.utf8_error().valid_up_to(),
    })?;

    debug!("Read {} ({} bytes)", path.display(), text.len());
    Ok(text)
}
