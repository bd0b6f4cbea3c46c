use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use perizia_core::{FileDescriptor, PDF_MIME};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Reads `path` into a descriptor, typed as PDF by extension or magic bytes.
pub fn load_file(path: &Path) -> Result<FileDescriptor> {
    let content = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = detect_mime(path, &content);
    Ok(FileDescriptor::new(name, mime, Bytes::from(content)))
}

pub fn load_files(paths: &[impl AsRef<Path>]) -> Result<Vec<FileDescriptor>> {
    paths.iter().map(|path| load_file(path.as_ref())).collect()
}

fn detect_mime(path: &Path, content: &[u8]) -> &'static str {
    let pdf_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if pdf_extension || content.starts_with(PDF_MAGIC) {
        PDF_MIME
    } else {
        "application/octet-stream"
    }
}
