//! Typed device-type requirements.
//!
//! Device-type and cluster ids are parsed when a file is loaded. Element ids
//! are resolved lazily through [`ElementRequirement::resolve_id`], so a single
//! malformed PICS code only affects the check that uses it.

use matter_model::{
    command_direction, decode_id, parse_hex_id, ClusterId, CommandDirection, DecodeError, DeviceTypeId,
    ElementMarker,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::model::{ClusterEntry, DeviceTypeDocument, ElementEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct ElementRequirement {
    pub pics_code: String,
    pub id_override: Option<String>,
}

impl ElementRequirement {
    pub fn new(pics_code: impl Into<String>) -> Self {
        Self {
            pics_code: pics_code.into(),
            id_override: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id_override = Some(id.into());
        self
    }

    /// Numeric element id. An explicit `id` wins over the PICS code.
    pub fn resolve_id(&self, marker: ElementMarker) -> Result<u32, DecodeError> {
        match &self.id_override {
            Some(id) => parse_hex_id(id),
            None => decode_id(&self.pics_code, marker),
        }
    }

    /// Command direction from the `.Rsp` / `.Tx` suffix.
    pub fn direction(&self) -> Result<CommandDirection, DecodeError> {
        command_direction(&self.pics_code)
    }
}

impl From<&ElementEntry> for ElementRequirement {
    fn from(entry: &ElementEntry) -> Self {
        Self {
            pics_code: entry.pics_code.clone(),
            id_override: entry.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterRequirement {
    pub id: ClusterId,
    pub mandatory_features: Vec<ElementRequirement>,
    pub excluded_features: Vec<ElementRequirement>,
    pub mandatory_attributes: Vec<ElementRequirement>,
    pub excluded_attributes: Vec<ElementRequirement>,
    pub mandatory_commands: Vec<ElementRequirement>,
    pub excluded_commands: Vec<ElementRequirement>,
}

impl ClusterRequirement {
    pub fn new(id: ClusterId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn from_entry(entry: &ClusterEntry) -> Result<Self, DecodeError> {
        let convert = |list: &[ElementEntry]| list.iter().map(ElementRequirement::from).collect();
        Ok(Self {
            id: parse_hex_id(&entry.id)?,
            mandatory_features: convert(&entry.mandatory_features),
            excluded_features: convert(&entry.excluded_features),
            mandatory_attributes: convert(&entry.mandatory_attributes),
            excluded_attributes: convert(&entry.excluded_attributes),
            mandatory_commands: convert(&entry.mandatory_commands),
            excluded_commands: convert(&entry.excluded_commands),
        })
    }
}

/// Requirements for one device type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceTypeRequirement {
    pub id: DeviceTypeId,
    pub name: Option<String>,
    pub revision: u32,
    pub server_clusters: Vec<ClusterRequirement>,
    pub client_clusters: Vec<ClusterRequirement>,
    pub excluded_server_clusters: Vec<ClusterId>,
    /// File the requirement was loaded from, if any.
    pub source: Option<PathBuf>,
}

impl DeviceTypeRequirement {
    pub fn from_document(doc: &DeviceTypeDocument) -> Result<Self, DecodeError> {
        Ok(Self {
            id: parse_hex_id(&doc.id)?,
            name: doc.name.clone(),
            revision: doc.revision,
            server_clusters: doc
                .server_clusters
                .iter()
                .map(ClusterRequirement::from_entry)
                .collect::<Result<_, _>>()?,
            client_clusters: doc
                .client_clusters
                .iter()
                .map(ClusterRequirement::from_entry)
                .collect::<Result<_, _>>()?,
            excluded_server_clusters: doc
                .excluded_server_clusters
                .iter()
                .map(|c| parse_hex_id(&c.id))
                .collect::<Result<_, _>>()?,
            source: None,
        })
    }

    /// Name for messages: the document name or the hex id.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} ({:#06x})", self.id),
            None => format!("{:#06x}", self.id),
        }
    }
}

/// All loaded requirements, keyed by device-type id. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct RequirementSet {
    by_id: BTreeMap<DeviceTypeId, DeviceTypeRequirement>,
}

impl RequirementSet {
    pub fn get(&self, id: DeviceTypeId) -> Option<&DeviceTypeRequirement> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DeviceTypeId> + '_ {
        self.by_id.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceTypeRequirement> {
        self.by_id.values()
    }

    /// Returns the replaced requirement when the id was already present.
    pub fn insert(&mut self, requirement: DeviceTypeRequirement) -> Option<DeviceTypeRequirement> {
        self.by_id.insert(requirement.id, requirement)
    }
}

impl FromIterator<DeviceTypeRequirement> for RequirementSet {
    fn from_iter<I: IntoIterator<Item = DeviceTypeRequirement>>(iter: I) -> Self {
        let mut set = Self::default();
        for requirement in iter {
            set.insert(requirement);
        }
        set
    }
}
