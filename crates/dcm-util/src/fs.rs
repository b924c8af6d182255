use std::io::Write;
use std::path::Path;

use crate::errors::DcmError;

/// Ensure a directory exists, creating it and any parents if needed.
///
/// Fails if `path` exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<(), DcmError> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        return Ok(());
    }
    if !path.is_dir() {
        return Err(DcmError::Generic {
            message: format!("path {} is not a directory", path.display()),
        });
    }
    Ok(())
}

/// Returns true when `path` is absent or an empty directory.
pub fn is_empty_dir(path: &Path) -> Result<bool, DcmError> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(std::fs::read_dir(path)?.next().is_none())
}

/// Write `data` to `path` through a temporary file in the same directory,
/// so readers never observe a half-written file.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), DcmError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    ensure_dir(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| DcmError::Io(e.error))?;
    Ok(())
}
