//! Serde types matching the device-type requirement JSON files.
//!
//! Ids are kept as the hex strings found in the files; [`crate::requirement`]
//! turns them into typed requirements.

use serde::{Deserialize, Serialize};

/// Root document, one per device type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTypeDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub revision: u32,
    #[serde(default)]
    pub server_clusters: Vec<ClusterEntry>,
    #[serde(default)]
    pub client_clusters: Vec<ClusterEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_server_clusters: Vec<ClusterRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterEntry {
    pub id: String,
    #[serde(default)]
    pub mandatory_features: Vec<ElementEntry>,
    // excluded_* lists are missing from most files
    #[serde(default)]
    pub excluded_features: Vec<ElementEntry>,
    #[serde(default)]
    pub mandatory_attributes: Vec<ElementEntry>,
    #[serde(default)]
    pub excluded_attributes: Vec<ElementEntry>,
    #[serde(default)]
    pub mandatory_commands: Vec<ElementEntry>,
    #[serde(default)]
    pub excluded_commands: Vec<ElementEntry>,
}

/// A feature, attribute or command entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementEntry {
    pub pics_code: String,
    /// Explicit hex id, used instead of decoding `pics_code`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRef {
    pub id: String,
}
