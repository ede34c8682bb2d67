use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use studio_logging::studio_info;
use tempfile::NamedTempFile;

pub(crate) fn load_code(path: &Path) -> Result<String> {
    let code = fs::read_to_string(path)
        .with_context(|| format!("failed to read code from {}", path.display()))?;
    studio_info!("Loaded {} bytes of code from {:?}", code.len(), path);
    Ok(code)
}

/// Replaces `path` with `code` in one step; readers never see a partial file.
pub(crate) fn save_code(path: &Path, code: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(code.as_bytes())
        .and_then(|()| tmp.flush())
        .with_context(|| format!("failed to write code for {}", path.display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to save code to {}", path.display()))?;
    studio_info!("Wrote {} bytes of code to {:?}", code.len(), path);
    Ok(())
}
