//! Visitor identity: a random ID generated once and kept in a small file.

use std::path::Path;

use ekk0_core::error::Result;
use ekk0_core::types::VisitorId;
use tracing::info;

/// Read the visitor ID stored at `path`, generating and writing a new one
/// if the file is missing or blank.
///
/// # Errors
/// Returns an error if the file exists but cannot be read, or a new ID
/// cannot be written.
pub fn load_or_create(path: &Path) -> Result<VisitorId> {
    match std::fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => {
            return Ok(VisitorId(content.trim().to_string()));
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let visitor = VisitorId::generate();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, visitor.as_str())?;
    info!(visitor = %visitor, path = %path.display(), "Generated visitor identity");
    Ok(visitor)
}
