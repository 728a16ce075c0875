//! Loads a directory of device-type requirement files.
//!
//! Files are parsed in parallel and merged sequentially in file-name order.
//! When two files declare the same device-type id the later file wins.

use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::model::DeviceTypeDocument;
use crate::requirement::{DeviceTypeRequirement, RequirementSet};

#[derive(Debug, thiserror::Error)]
pub enum RequirementError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{}: invalid id: {source}", path.display())]
    InvalidId {
        path: PathBuf,
        #[source]
        source: matter_model::DecodeError,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Skip files that fail to read or parse instead of failing the load.
    pub lenient: bool,
}

pub fn load_device_type_requirements(dir: &Path) -> Result<RequirementSet, RequirementError> {
    load_device_type_requirements_with(dir, LoadOptions::default())
}

pub fn load_device_type_requirements_with(
    dir: &Path,
    options: LoadOptions,
) -> Result<RequirementSet, RequirementError> {
    let files = requirement_files(dir)?;
    log::info!("Loading {} requirement files from {}", files.len(), dir.display());

    let parsed: Vec<(PathBuf, Result<DeviceTypeRequirement, RequirementError>)> = files
        .par_iter()
        .map(|path| (path.clone(), load_requirement_file(path)))
        .collect();

    let mut set = RequirementSet::default();
    for (path, result) in parsed {
        let requirement = match result {
            Ok(r) => r,
            Err(e) if options.lenient => {
                log::warn!("Skipping requirement file: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };
        let id = requirement.id;
        if let Some(previous) = set.insert(requirement) {
            log::warn!(
                "Device type {id:#06x} defined twice; {} replaces {}",
                path.display(),
                previous
                    .source
                    .as_deref()
                    .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string())
            );
        }
    }
    Ok(set)
}

/// Parse a single requirement file.
pub fn load_requirement_file(path: &Path) -> Result<DeviceTypeRequirement, RequirementError> {
    let text = std::fs::read_to_string(path).map_err(|source| RequirementError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: DeviceTypeDocument = serde_json::from_str(&text).map_err(|source| RequirementError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let mut requirement =
        DeviceTypeRequirement::from_document(&doc).map_err(|source| RequirementError::InvalidId {
            path: path.to_path_buf(),
            source,
        })?;
    requirement.source = Some(path.to_path_buf());
    log::debug!(
        "Loaded {} with {} server clusters",
        requirement.display_name(),
        requirement.server_clusters.len()
    );
    Ok(requirement)
}

/// `*.json` files in `dir`, sorted by file name.
pub fn requirement_files(dir: &Path) -> Result<Vec<PathBuf>, RequirementError> {
    let io_err = |source: std::io::Error| RequirementError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if path.is_file() && is_json {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
