//! A [`DeviceController`] that answers from a recorded wildcard read.
//!
//! Snapshot files are JSON or YAML:
//!
//! ```json
//! {
//!   "endpoints": {"1": {"clusters": {"6": {"attributes": {"0": true, "65529": [0, 1, 2]}}}}},
//!   "implemented_commands": {"1": {"6": [0, 1]}}
//! }
//! ```
//!
//! `implemented_commands` is optional. Without it a cluster implements
//! exactly its AcceptedCommandList; with it, the listed clusters implement the
//! given commands instead, which models a device whose list is wrong.

use matter_model::{
    AttributeId, AttributeValue, CapabilityTree, ClusterId, CommandId, EndpointData, EndpointId,
    ACCESS_CONTROL_ACL, ACCESS_CONTROL_CLUSTER, ROOT_ENDPOINT,
};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::controller::{CommandRequest, DeviceController, ProtocolError, StatusCode};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("cannot tell snapshot format of {} (expected .json, .yml or .yaml)", .0.display())]
    UnknownFormat(PathBuf),
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    endpoints: BTreeMap<EndpointId, EndpointData>,
    #[serde(default)]
    implemented_commands: BTreeMap<EndpointId, BTreeMap<ClusterId, BTreeSet<CommandId>>>,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotDevice {
    tree: CapabilityTree,
    implemented: BTreeMap<(EndpointId, ClusterId), BTreeSet<CommandId>>,
    invocations: Vec<CommandRequest>,
}

impl SnapshotDevice {
    pub fn new(tree: CapabilityTree) -> Self {
        Self {
            tree,
            ..Default::default()
        }
    }

    /// Override the commands `cluster` on `endpoint` really implements.
    pub fn with_implemented_commands(
        mut self,
        endpoint: EndpointId,
        cluster: ClusterId,
        commands: impl IntoIterator<Item = CommandId>,
    ) -> Self {
        self.implemented
            .insert((endpoint, cluster), commands.into_iter().collect());
        self
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(Self::from_file(serde_json::from_str(text)?))
    }

    pub fn from_yaml(text: &str) -> Result<Self, SnapshotError> {
        Ok(Self::from_file(serde_yaml::from_str(text)?))
    }

    /// Load a snapshot, choosing the format by file extension.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let device = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text)?,
            Some("yml" | "yaml") => Self::from_yaml(&text)?,
            _ => return Err(SnapshotError::UnknownFormat(path.to_path_buf())),
        };
        log::info!(
            "Loaded snapshot {} with {} endpoints",
            path.display(),
            device.tree.endpoints.len()
        );
        Ok(device)
    }

    fn from_file(file: SnapshotFile) -> Self {
        let implemented = file
            .implemented_commands
            .into_iter()
            .flat_map(|(endpoint, clusters)| {
                clusters
                    .into_iter()
                    .map(move |(cluster, commands)| ((endpoint, cluster), commands))
            })
            .collect();
        Self {
            tree: CapabilityTree {
                endpoints: file.endpoints,
            },
            implemented,
            invocations: Vec::new(),
        }
    }

    /// Current device state, including writes made since loading.
    pub fn tree(&self) -> &CapabilityTree {
        &self.tree
    }

    /// Every command invoked so far, in order.
    pub fn invocations(&self) -> &[CommandRequest] {
        &self.invocations
    }

    pub fn acl(&self) -> Option<&AttributeValue> {
        self.tree
            .attribute(ROOT_ENDPOINT, ACCESS_CONTROL_CLUSTER, ACCESS_CONTROL_ACL)
            .ok()
    }

    fn implements(&self, endpoint: EndpointId, cluster: ClusterId, command: CommandId) -> bool {
        match self.implemented.get(&(endpoint, cluster)) {
            Some(commands) => commands.contains(&command),
            None => self
                .tree
                .declared_accepted_commands(endpoint, cluster)
                .is_ok_and(|list| list.contains(&command)),
        }
    }

    /// Whether any ACL entry grants access to `cluster` on `endpoint`.
    ///
    /// An entry with null targets covers everything; a target with a null
    /// field matches any value for it. Privilege levels are not modelled.
    /// Without an ACL attribute every access is allowed.
    fn acl_allows(&self, endpoint: EndpointId, cluster: ClusterId) -> bool {
        let Some(entries) = self.acl().and_then(AttributeValue::as_list) else {
            return true;
        };
        entries.iter().any(|entry| match entry.field("targets") {
            None | Some(AttributeValue::Null) => true,
            Some(targets) => targets.as_list().is_some_and(|targets| {
                targets.iter().any(|target| {
                    field_matches(target, "cluster", u64::from(cluster))
                        && field_matches(target, "endpoint", u64::from(endpoint))
                })
            }),
        })
    }
}

fn field_matches(target: &AttributeValue, name: &str, value: u64) -> bool {
    match target.field(name) {
        None | Some(AttributeValue::Null) => true,
        Some(field) => field.as_u64() == Some(value),
    }
}

impl DeviceController for SnapshotDevice {
    fn read_capability_tree(&mut self) -> Result<CapabilityTree, ProtocolError> {
        Ok(self.tree.clone())
    }

    fn read_attribute(
        &mut self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
    ) -> Result<AttributeValue, ProtocolError> {
        self.tree
            .attribute(endpoint, cluster, attribute)
            .cloned()
            .map_err(|_| ProtocolError::Read {
                endpoint,
                cluster,
                attribute,
                status: StatusCode::UnsupportedAttribute,
            })
    }

    fn write_attribute(
        &mut self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        value: AttributeValue,
    ) -> Result<(), ProtocolError> {
        if self.tree.attribute(endpoint, cluster, attribute).is_err() {
            return Err(ProtocolError::Write {
                endpoint,
                cluster,
                attribute,
                status: StatusCode::UnsupportedAttribute,
            });
        }
        self.tree.set_attribute(endpoint, cluster, attribute, value);
        Ok(())
    }

    fn invoke_command(&mut self, request: &CommandRequest) -> Result<StatusCode, ProtocolError> {
        self.invocations.push(*request);

        let status = if !self.tree.endpoints.contains_key(&request.endpoint) {
            StatusCode::UnsupportedEndpoint
        } else if !self.tree.has_cluster(request.endpoint, request.cluster) {
            StatusCode::UnsupportedCluster
        } else if !self.implements(request.endpoint, request.cluster, request.command) {
            StatusCode::UnsupportedCommand
        } else if !self.acl_allows(request.endpoint, request.cluster) {
            StatusCode::UnsupportedAccess
        } else {
            StatusCode::Success
        };
        Ok(status)
    }
}
