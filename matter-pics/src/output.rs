//! Per-run output directory layout: `<root>/endpoint<N>/<template file>`.

use matter_model::EndpointId;
use std::path::{Path, PathBuf};

use crate::error::PicsError;

/// Create `root` if missing, otherwise remove everything inside it.
pub fn prepare_output_root(root: &Path) -> Result<(), PicsError> {
    if !root.exists() {
        log::info!("Creating output directory {}", root.display());
        return std::fs::create_dir_all(root).map_err(|e| PicsError::io(root, e));
    }

    log::info!("Cleaning output directory {}", root.display());
    for entry in std::fs::read_dir(root).map_err(|e| PicsError::io(root, e))? {
        let path = entry.map_err(|e| PicsError::io(root, e))?.path();
        if path.is_dir() {
            std::fs::remove_dir_all(&path).map_err(|e| PicsError::io(&path, e))?;
        } else {
            std::fs::remove_file(&path).map_err(|e| PicsError::io(&path, e))?;
        }
    }
    Ok(())
}

/// `<root>/endpoint<N>`, created on demand.
pub fn endpoint_output_dir(root: &Path, endpoint: EndpointId) -> Result<PathBuf, PicsError> {
    let dir = root.join(format!("endpoint{endpoint}"));
    if !dir.exists() {
        std::fs::create_dir(&dir).map_err(|e| PicsError::io(&dir, e))?;
    }
    Ok(dir)
}
