//! File collaborators: read and hash the definition source, write the
//! rendered artifact exactly once.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use hwdef_core::content_hash;

/// A definition file's text plus the content hash of its exact bytes.
pub struct Source {
    pub text: String,
    pub hash: String,
}

/// Fail unless `path` carries the expected extension.
pub fn check_extension(path: &Path, expected: &str) -> Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(expected) => Ok(()),
        _ => bail!(
            "{} should be a .{expected} file",
            path.display()
        ),
    }
}

/// Read a definition file, hashing the raw bytes before decoding.
pub fn read_source(path: &Path) -> Result<Source> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let hash = content_hash(&bytes);
    let text = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    Ok(Source { text, hash })
}

/// Write the finished artifact, creating the destination directory if
/// missing.
pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

/// Uppercase guard token derived from the output file stem.
pub fn derive_guard(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("GENERATED")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
