//! In-memory capability tree built from a wildcard read.
//!
//! Layout is endpoint -> cluster -> attribute -> value. The DataVersion meta
//! field lives beside the attribute map, so it never takes part in
//! attribute-identity comparisons.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::ids::*;
use crate::value::AttributeValue;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TreeError {
    #[error("endpoint {0} not present in wildcard read")]
    EndpointNotFound(EndpointId),
    #[error("cluster {cluster:#06x} not present on endpoint {endpoint}")]
    ClusterNotFound { endpoint: EndpointId, cluster: ClusterId },
    #[error("attribute {attribute:#06x} missing on endpoint {endpoint}, cluster {cluster:#06x}")]
    MissingAttribute {
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
    },
    #[error("attribute {attribute:#06x} on endpoint {endpoint}, cluster {cluster:#06x}: expected {expected}")]
    InvalidValue {
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        expected: &'static str,
    },
}

/// Result of a wildcard read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CapabilityTree {
    pub endpoints: BTreeMap<EndpointId, EndpointData>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EndpointData {
    pub clusters: BTreeMap<ClusterId, ClusterData>,
}

/// One cluster instance on one endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterData {
    #[serde(default)]
    pub data_version: Option<u32>,
    #[serde(default)]
    pub attributes: BTreeMap<AttributeId, AttributeValue>,
}

/// One entry of the Descriptor DeviceTypeList.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTypeEntry {
    pub device_type: DeviceTypeId,
    pub revision: u32,
}

impl ClusterData {
    pub fn with_attribute(mut self, id: AttributeId, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(id, value.into());
        self
    }
}

impl CapabilityTree {
    pub fn endpoint(&self, endpoint: EndpointId) -> Result<&EndpointData, TreeError> {
        self.endpoints
            .get(&endpoint)
            .ok_or(TreeError::EndpointNotFound(endpoint))
    }

    pub fn cluster(&self, endpoint: EndpointId, cluster: ClusterId) -> Result<&ClusterData, TreeError> {
        self.endpoint(endpoint)?
            .clusters
            .get(&cluster)
            .ok_or(TreeError::ClusterNotFound { endpoint, cluster })
    }

    pub fn has_cluster(&self, endpoint: EndpointId, cluster: ClusterId) -> bool {
        self.endpoints
            .get(&endpoint)
            .is_some_and(|ep| ep.clusters.contains_key(&cluster))
    }

    pub fn attribute(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
    ) -> Result<&AttributeValue, TreeError> {
        self.cluster(endpoint, cluster)?
            .attributes
            .get(&attribute)
            .ok_or(TreeError::MissingAttribute {
                endpoint,
                cluster,
                attribute,
            })
    }

    /// Insert or replace a single attribute value, creating the endpoint and
    /// cluster on demand.
    pub fn set_attribute(
        &mut self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        value: AttributeValue,
    ) {
        self.endpoints
            .entry(endpoint)
            .or_default()
            .clusters
            .entry(cluster)
            .or_default()
            .attributes
            .insert(attribute, value);
    }

    /// Endpoints observed in the wildcard read, sorted.
    pub fn endpoint_ids(&self) -> Vec<EndpointId> {
        self.endpoints.keys().copied().collect()
    }

    /// Cluster ids observed on `endpoint`, sorted.
    pub fn server_ids(&self, endpoint: EndpointId) -> Result<Vec<ClusterId>, TreeError> {
        Ok(self.endpoint(endpoint)?.clusters.keys().copied().collect())
    }

    /// Attribute ids actually present on the cluster instance, sorted.
    pub fn attribute_ids(&self, endpoint: EndpointId, cluster: ClusterId) -> Result<Vec<AttributeId>, TreeError> {
        Ok(self.cluster(endpoint, cluster)?.attributes.keys().copied().collect())
    }

    /// The cluster's own AttributeList, sorted.
    pub fn declared_attribute_list(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
    ) -> Result<Vec<AttributeId>, TreeError> {
        self.required_id_list(endpoint, cluster, ATTRIBUTE_LIST)
    }

    /// The cluster's AcceptedCommandList, sorted.
    pub fn declared_accepted_commands(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
    ) -> Result<Vec<CommandId>, TreeError> {
        self.required_id_list(endpoint, cluster, ACCEPTED_COMMAND_LIST)
    }

    /// The cluster's GeneratedCommandList, sorted. Empty when absent.
    pub fn declared_generated_commands(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
    ) -> Result<Vec<CommandId>, TreeError> {
        self.optional_id_list(endpoint, cluster, GENERATED_COMMAND_LIST)
    }

    /// The cluster's EventList, sorted. Empty when absent.
    pub fn declared_event_list(&self, endpoint: EndpointId, cluster: ClusterId) -> Result<Vec<u32>, TreeError> {
        self.optional_id_list(endpoint, cluster, EVENT_LIST)
    }

    pub fn feature_map(&self, endpoint: EndpointId, cluster: ClusterId) -> Result<u32, TreeError> {
        let value = self.attribute(endpoint, cluster, FEATURE_MAP)?;
        value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or(TreeError::InvalidValue {
                endpoint,
                cluster,
                attribute: FEATURE_MAP,
                expected: "32-bit bitmap",
            })
    }

    /// Descriptor ServerList on `endpoint`, sorted.
    pub fn declared_server_list(&self, endpoint: EndpointId) -> Result<Vec<ClusterId>, TreeError> {
        self.required_id_list(endpoint, DESCRIPTOR_CLUSTER, DESCRIPTOR_SERVER_LIST)
    }

    /// Descriptor ClientList on `endpoint`, sorted. Empty when absent.
    pub fn declared_client_list(&self, endpoint: EndpointId) -> Result<Vec<ClusterId>, TreeError> {
        self.optional_id_list(endpoint, DESCRIPTOR_CLUSTER, DESCRIPTOR_CLIENT_LIST)
    }

    /// Root Descriptor PartsList as reported by the device, sorted.
    pub fn declared_parts_list(&self) -> Result<Vec<EndpointId>, TreeError> {
        let value = self.attribute(ROOT_ENDPOINT, DESCRIPTOR_CLUSTER, DESCRIPTOR_PARTS_LIST)?;
        let mut ids: Vec<EndpointId> = value.as_id_list().ok_or(TreeError::InvalidValue {
            endpoint: ROOT_ENDPOINT,
            cluster: DESCRIPTOR_CLUSTER,
            attribute: DESCRIPTOR_PARTS_LIST,
            expected: "list of endpoint ids",
        })?;
        ids.sort_unstable();
        Ok(ids)
    }

    /// PartsList with endpoint 0 added, sorted and deduplicated.
    pub fn effective_parts_list(&self) -> Result<Vec<EndpointId>, TreeError> {
        let mut parts: BTreeSet<EndpointId> = self.declared_parts_list()?.into_iter().collect();
        parts.insert(ROOT_ENDPOINT);
        Ok(parts.into_iter().collect())
    }

    /// Descriptor DeviceTypeList on `endpoint`.
    pub fn device_types(&self, endpoint: EndpointId) -> Result<Vec<DeviceTypeEntry>, TreeError> {
        let invalid = TreeError::InvalidValue {
            endpoint,
            cluster: DESCRIPTOR_CLUSTER,
            attribute: DESCRIPTOR_DEVICE_TYPE_LIST,
            expected: "list of {deviceType, revision} structs",
        };
        let value = self.attribute(endpoint, DESCRIPTOR_CLUSTER, DESCRIPTOR_DEVICE_TYPE_LIST)?;
        let items = value.as_list().ok_or_else(|| invalid.clone())?;

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let device_type = item
                .field("deviceType")
                .and_then(AttributeValue::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| invalid.clone())?;
            let revision = item
                .field("revision")
                .and_then(AttributeValue::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| invalid.clone())?;
            entries.push(DeviceTypeEntry {
                device_type,
                revision,
            });
        }
        Ok(entries)
    }

    fn required_id_list(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
    ) -> Result<Vec<u32>, TreeError> {
        let value = self.attribute(endpoint, cluster, attribute)?;
        Self::sorted_ids(value, endpoint, cluster, attribute)
    }

    fn optional_id_list(
        &self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
    ) -> Result<Vec<u32>, TreeError> {
        match self.cluster(endpoint, cluster)?.attributes.get(&attribute) {
            Some(value) => Self::sorted_ids(value, endpoint, cluster, attribute),
            None => Ok(Vec::new()),
        }
    }

    fn sorted_ids(
        value: &AttributeValue,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
    ) -> Result<Vec<u32>, TreeError> {
        let mut ids: Vec<u32> = value.as_id_list().ok_or(TreeError::InvalidValue {
            endpoint,
            cluster,
            attribute,
            expected: "list of ids",
        })?;
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree_with_parts(parts: &[u64]) -> CapabilityTree {
        let mut tree = CapabilityTree::default();
        tree.set_attribute(
            ROOT_ENDPOINT,
            DESCRIPTOR_CLUSTER,
            DESCRIPTOR_PARTS_LIST,
            AttributeValue::id_list(parts),
        );
        tree
    }

    #[test]
    fn effective_parts_list_injects_root() {
        let tree = tree_with_parts(&[2, 1]);
        assert_eq!(tree.declared_parts_list().unwrap(), vec![1, 2]);
        assert_eq!(tree.effective_parts_list().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn effective_parts_list_does_not_duplicate_root() {
        let tree = tree_with_parts(&[0, 1]);
        assert_eq!(tree.effective_parts_list().unwrap(), vec![0, 1]);
    }

    #[test]
    fn optional_lists_default_to_empty() {
        let mut tree = CapabilityTree::default();
        tree.set_attribute(1, ON_OFF_CLUSTER, ACCEPTED_COMMAND_LIST, AttributeValue::id_list(&[0u64]));
        assert_eq!(tree.declared_generated_commands(1, ON_OFF_CLUSTER).unwrap(), Vec::<u32>::new());
        assert_eq!(tree.declared_event_list(1, ON_OFF_CLUSTER).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn missing_attribute_list_is_an_error() {
        let mut tree = CapabilityTree::default();
        tree.set_attribute(1, ON_OFF_CLUSTER, FEATURE_MAP, 0u32.into());
        assert_eq!(
            tree.declared_attribute_list(1, ON_OFF_CLUSTER).unwrap_err(),
            TreeError::MissingAttribute {
                endpoint: 1,
                cluster: ON_OFF_CLUSTER,
                attribute: ATTRIBUTE_LIST
            }
        );
    }

    #[test]
    fn feature_map_rejects_non_integer() {
        let mut tree = CapabilityTree::default();
        tree.set_attribute(1, ON_OFF_CLUSTER, FEATURE_MAP, "nope".into());
        assert!(matches!(
            tree.feature_map(1, ON_OFF_CLUSTER),
            Err(TreeError::InvalidValue { .. })
        ));
    }
}
