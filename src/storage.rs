//! Reading and writing the settings file

use crate::document::{Document, Layout};
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Load a document from disk
///
/// A missing file yields an empty document.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_document(path: &Path, layout: Layout) -> Result<Document> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "settings file missing, starting empty");
        return Ok(Document::new(layout));
    }

    let contents = fs::read_to_string(path)?;
    let document = Document::parse(&contents, layout)?;
    tracing::debug!(path = %path.display(), groups = document.groups.len(), "settings loaded");
    Ok(document)
}

/// Save a document to disk
///
/// Creates missing parent directories. The document is written to a sibling
/// temporary file first and then renamed over the target.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the document cannot be
/// serialized, or the file cannot be written.
pub fn save_document(path: &Path, document: &Document) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let contents = document.to_xml()?;
    let staging = staging_path(path);
    fs::write(&staging, contents)?;
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }

    tracing::debug!(path = %path.display(), "settings saved");
    Ok(())
}

/// Delete the settings file
///
/// Returns `Ok(true)` if a file was removed, `Ok(false)` if there was none.
pub fn delete_document(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
