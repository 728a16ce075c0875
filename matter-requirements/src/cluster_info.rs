//! Cluster id -> name / PICS prefix table.
//!
//! Loaded from the cluster metadata JSON shipped with the certification
//! tooling:
//!
//! ```json
//! {"ClusterIdentifiers": {"On/Off Cluster": {"Identifier": "0x0006", "PICS Code": "OO"}}}
//! ```

use matter_model::{parse_hex_id, ClusterId, DecodeError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ClusterInfoError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cluster metadata JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cluster '{name}': invalid identifier: {source}")]
    InvalidIdentifier {
        name: String,
        #[source]
        source: DecodeError,
    },
}

#[derive(Debug, Deserialize)]
struct ClusterInfoFile {
    #[serde(rename = "ClusterIdentifiers")]
    cluster_identifiers: BTreeMap<String, ClusterInfoEntry>,
}

#[derive(Debug, Deserialize)]
struct ClusterInfoEntry {
    #[serde(rename = "Identifier")]
    identifier: String,
    #[serde(rename = "PICS Code")]
    pics_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInfo {
    pub id: ClusterId,
    pub name: String,
    pub pics_code: String,
}

#[derive(Debug, Clone, Default)]
pub struct ClusterInfoTable {
    by_id: BTreeMap<ClusterId, ClusterInfo>,
}

impl ClusterInfoTable {
    pub fn from_json(text: &str) -> Result<Self, ClusterInfoError> {
        let file: ClusterInfoFile = serde_json::from_str(text)?;
        let mut table = Self::default();
        for (name, entry) in file.cluster_identifiers {
            let id = parse_hex_id(&entry.identifier).map_err(|source| ClusterInfoError::InvalidIdentifier {
                name: name.clone(),
                source,
            })?;
            table.insert(ClusterInfo {
                id,
                name,
                pics_code: entry.pics_code,
            });
        }
        log::debug!("Cluster info table holds {} clusters", table.by_id.len());
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, ClusterInfoError> {
        let text = std::fs::read_to_string(path).map_err(|source| ClusterInfoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn insert(&mut self, info: ClusterInfo) {
        if let Some(previous) = self.by_id.insert(info.id, info) {
            log::warn!("Cluster {:#06x} listed twice; replacing '{}'", previous.id, previous.name);
        }
    }

    pub fn get(&self, id: ClusterId) -> Option<&ClusterInfo> {
        self.by_id.get(&id)
    }

    pub fn resolve_name(&self, id: ClusterId) -> Option<&str> {
        self.get(id).map(|info| info.name.as_str())
    }

    pub fn pics_code(&self, id: ClusterId) -> Option<&str> {
        self.get(id).map(|info| info.pics_code.as_str())
    }

    /// Name -> id for every known cluster.
    pub fn known_clusters(&self) -> BTreeMap<&str, ClusterId> {
        self.by_id.values().map(|info| (info.name.as_str(), info.id)).collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"ClusterIdentifiers": {
        "On/Off Cluster": {"Identifier": "0x0006", "PICS Code": "OO"},
        "Descriptor Cluster": {"Identifier": "0x001D", "PICS Code": "DESC"}
    }}"#;

    #[test]
    fn lookup_by_id() {
        let table = ClusterInfoTable::from_json(SAMPLE).unwrap();
        assert_eq!(table.resolve_name(6), Some("On/Off Cluster"));
        assert_eq!(table.pics_code(0x1d), Some("DESC"));
        assert_eq!(table.pics_code(0x28), None);
    }

    #[test]
    fn known_clusters_maps_names_to_ids() {
        let table = ClusterInfoTable::from_json(SAMPLE).unwrap();
        let known = table.known_clusters();
        assert_eq!(known.get("Descriptor Cluster"), Some(&0x1d));
        assert_eq!(known.len(), 2);
    }

    #[test]
    fn identifier_case_does_not_matter() {
        let table = ClusterInfoTable::from_json(
            r#"{"ClusterIdentifiers": {"Access Control Cluster": {"Identifier": "0x001f", "PICS Code": "ACL"}}}"#,
        )
        .unwrap();
        assert_eq!(table.pics_code(0x1F), Some("ACL"));
    }

    #[test]
    fn bad_identifier_names_the_cluster() {
        let err = ClusterInfoTable::from_json(
            r#"{"ClusterIdentifiers": {"Broken": {"Identifier": "six", "PICS Code": "X"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }
}
