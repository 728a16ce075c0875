//! Static per-cluster command schema.
//!
//! Command probing needs to know which commands a cluster defines and in which
//! direction they flow. The built-in table covers the clusters found on the
//! root node and on common lighting/sensor endpoints; it can be extended or
//! overridden from a JSON file of the same shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::*;
use crate::pics::CommandDirection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSchema {
    pub id: CommandId,
    pub name: String,
    pub direction: CommandDirection,
    /// Must be sent as a timed invoke.
    #[serde(default)]
    pub timed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSchema {
    pub id: ClusterId,
    pub name: String,
    #[serde(default)]
    pub commands: Vec<CommandSchema>,
}

impl ClusterSchema {
    /// Commands a client sends to this cluster's server.
    pub fn client_to_server_commands(&self) -> impl Iterator<Item = &CommandSchema> {
        self.commands
            .iter()
            .filter(|c| c.direction == CommandDirection::Accepted)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    clusters: BTreeMap<ClusterId, ClusterSchema>,
}

impl SchemaRegistry {
    pub fn get(&self, cluster: ClusterId) -> Option<&ClusterSchema> {
        self.clusters.get(&cluster)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn insert(&mut self, schema: ClusterSchema) {
        self.clusters.insert(schema.id, schema);
    }

    /// Parse a JSON array of cluster schemas.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let list: Vec<ClusterSchema> = serde_json::from_str(text)?;
        let mut registry = Self::default();
        for schema in list {
            registry.insert(schema);
        }
        Ok(registry)
    }

    /// Entries in `other` replace entries with the same cluster id.
    pub fn merge(&mut self, other: SchemaRegistry) {
        for (id, schema) in other.clusters {
            if self.clusters.insert(id, schema).is_some() {
                log::debug!("cluster schema {id:#06x} overridden");
            }
        }
    }

    /// The hand-maintained built-in table.
    pub fn builtin() -> Self {
        use CommandDirection::{Accepted as In, Generated as Out};

        let table: &[(ClusterId, &str, &[(CommandId, &str, CommandDirection, bool)])] = &[
            (
                IDENTIFY_CLUSTER,
                "Identify",
                &[(0x00, "Identify", In, false), (0x40, "TriggerEffect", In, false)],
            ),
            (
                GROUPS_CLUSTER,
                "Groups",
                &[
                    (0x00, "AddGroup", In, false),
                    (0x01, "ViewGroup", In, false),
                    (0x02, "GetGroupMembership", In, false),
                    (0x03, "RemoveGroup", In, false),
                    (0x04, "RemoveAllGroups", In, false),
                    (0x05, "AddGroupIfIdentifying", In, false),
                    (0x00, "AddGroupResponse", Out, false),
                    (0x01, "ViewGroupResponse", Out, false),
                    (0x02, "GetGroupMembershipResponse", Out, false),
                    (0x03, "RemoveGroupResponse", Out, false),
                ],
            ),
            (
                ON_OFF_CLUSTER,
                "OnOff",
                &[
                    (0x00, "Off", In, false),
                    (0x01, "On", In, false),
                    (0x02, "Toggle", In, false),
                    (0x40, "OffWithEffect", In, false),
                    (0x41, "OnWithRecallGlobalScene", In, false),
                    (0x42, "OnWithTimedOff", In, false),
                ],
            ),
            (
                LEVEL_CONTROL_CLUSTER,
                "LevelControl",
                &[
                    (0x00, "MoveToLevel", In, false),
                    (0x01, "Move", In, false),
                    (0x02, "Step", In, false),
                    (0x03, "Stop", In, false),
                    (0x04, "MoveToLevelWithOnOff", In, false),
                    (0x05, "MoveWithOnOff", In, false),
                    (0x06, "StepWithOnOff", In, false),
                    (0x07, "StopWithOnOff", In, false),
                    (0x08, "MoveToClosestFrequency", In, false),
                ],
            ),
            (DESCRIPTOR_CLUSTER, "Descriptor", &[]),
            (BINDING_CLUSTER, "Binding", &[]),
            (ACCESS_CONTROL_CLUSTER, "AccessControl", &[]),
            (BASIC_INFORMATION_CLUSTER, "BasicInformation", &[]),
            (
                GENERAL_COMMISSIONING_CLUSTER,
                "GeneralCommissioning",
                &[
                    (0x00, "ArmFailSafe", In, false),
                    (0x01, "ArmFailSafeResponse", Out, false),
                    (0x02, "SetRegulatoryConfig", In, false),
                    (0x03, "SetRegulatoryConfigResponse", Out, false),
                    (0x04, "CommissioningComplete", In, false),
                    (0x05, "CommissioningCompleteResponse", Out, false),
                ],
            ),
            (
                NETWORK_COMMISSIONING_CLUSTER,
                "NetworkCommissioning",
                &[
                    (0x00, "ScanNetworks", In, false),
                    (0x01, "ScanNetworksResponse", Out, false),
                    (0x02, "AddOrUpdateWiFiNetwork", In, false),
                    (0x03, "AddOrUpdateThreadNetwork", In, false),
                    (0x04, "RemoveNetwork", In, false),
                    (0x05, "NetworkConfigResponse", Out, false),
                    (0x06, "ConnectNetwork", In, false),
                    (0x07, "ConnectNetworkResponse", Out, false),
                    (0x08, "ReorderNetwork", In, false),
                ],
            ),
            (
                GENERAL_DIAGNOSTICS_CLUSTER,
                "GeneralDiagnostics",
                &[(0x00, "TestEventTrigger", In, false)],
            ),
            (
                ADMINISTRATOR_COMMISSIONING_CLUSTER,
                "AdministratorCommissioning",
                &[
                    (0x00, "OpenCommissioningWindow", In, true),
                    (0x01, "OpenBasicCommissioningWindow", In, true),
                    (0x02, "RevokeCommissioning", In, true),
                ],
            ),
            (
                OPERATIONAL_CREDENTIALS_CLUSTER,
                "OperationalCredentials",
                &[
                    (0x00, "AttestationRequest", In, false),
                    (0x01, "AttestationResponse", Out, false),
                    (0x02, "CertificateChainRequest", In, false),
                    (0x03, "CertificateChainResponse", Out, false),
                    (0x04, "CSRRequest", In, false),
                    (0x05, "CSRResponse", Out, false),
                    (0x06, "AddNOC", In, false),
                    (0x07, "UpdateNOC", In, false),
                    (0x08, "NOCResponse", Out, false),
                    (0x09, "UpdateFabricLabel", In, false),
                    (0x0A, "RemoveFabric", In, false),
                    (0x0B, "AddTrustedRootCertificate", In, false),
                ],
            ),
            (
                GROUP_KEY_MANAGEMENT_CLUSTER,
                "GroupKeyManagement",
                &[
                    (0x00, "KeySetWrite", In, false),
                    (0x01, "KeySetRead", In, false),
                    (0x02, "KeySetReadResponse", Out, false),
                    (0x03, "KeySetRemove", In, false),
                    (0x04, "KeySetReadAllIndices", In, false),
                    (0x05, "KeySetReadAllIndicesResponse", Out, false),
                ],
            ),
            (BOOLEAN_STATE_CLUSTER, "BooleanState", &[]),
        ];

        let mut registry = Self::default();
        for (id, name, commands) in table {
            registry.insert(ClusterSchema {
                id: *id,
                name: (*name).to_string(),
                commands: commands
                    .iter()
                    .map(|(cmd, cmd_name, direction, timed)| CommandSchema {
                        id: *cmd,
                        name: (*cmd_name).to_string(),
                        direction: *direction,
                        timed: *timed,
                    })
                    .collect(),
            });
        }
        registry
    }
}
