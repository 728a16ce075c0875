//! Numeric identifiers shared by every crate in the workspace.

pub type EndpointId = u16;
pub type ClusterId = u32;
pub type AttributeId = u32;
pub type CommandId = u32;
pub type DeviceTypeId = u32;

/// The root node endpoint. Never listed in the device's own PartsList.
pub const ROOT_ENDPOINT: EndpointId = 0;

// --- Global attributes (present on every cluster instance) ---

pub const GENERATED_COMMAND_LIST: AttributeId = 0xFFF8;
pub const ACCEPTED_COMMAND_LIST: AttributeId = 0xFFF9;
pub const EVENT_LIST: AttributeId = 0xFFFA;
pub const ATTRIBUTE_LIST: AttributeId = 0xFFFB;
pub const FEATURE_MAP: AttributeId = 0xFFFC;
pub const CLUSTER_REVISION: AttributeId = 0xFFFD;

/// Returns true for the global attribute range 0xFFF8..=0xFFFD.
pub fn is_global_attribute(id: AttributeId) -> bool {
    (GENERATED_COMMAND_LIST..=CLUSTER_REVISION).contains(&id)
}

// --- Clusters ---

pub const IDENTIFY_CLUSTER: ClusterId = 0x0003;
pub const GROUPS_CLUSTER: ClusterId = 0x0004;
pub const ON_OFF_CLUSTER: ClusterId = 0x0006;
pub const LEVEL_CONTROL_CLUSTER: ClusterId = 0x0008;
pub const DESCRIPTOR_CLUSTER: ClusterId = 0x001D;
pub const BINDING_CLUSTER: ClusterId = 0x001E;
pub const ACCESS_CONTROL_CLUSTER: ClusterId = 0x001F;
pub const BASIC_INFORMATION_CLUSTER: ClusterId = 0x0028;
pub const GENERAL_COMMISSIONING_CLUSTER: ClusterId = 0x0030;
pub const NETWORK_COMMISSIONING_CLUSTER: ClusterId = 0x0031;
pub const GENERAL_DIAGNOSTICS_CLUSTER: ClusterId = 0x0033;
pub const ADMINISTRATOR_COMMISSIONING_CLUSTER: ClusterId = 0x003C;
pub const OPERATIONAL_CREDENTIALS_CLUSTER: ClusterId = 0x003E;
pub const GROUP_KEY_MANAGEMENT_CLUSTER: ClusterId = 0x003F;
pub const BOOLEAN_STATE_CLUSTER: ClusterId = 0x0045;

// --- Descriptor cluster attributes ---

pub const DESCRIPTOR_DEVICE_TYPE_LIST: AttributeId = 0x0000;
pub const DESCRIPTOR_SERVER_LIST: AttributeId = 0x0001;
pub const DESCRIPTOR_CLIENT_LIST: AttributeId = 0x0002;
pub const DESCRIPTOR_PARTS_LIST: AttributeId = 0x0003;
pub const DESCRIPTOR_TAG_LIST: AttributeId = 0x0004;

/// Descriptor feature bit 0: TagList.
pub const DESCRIPTOR_FEATURE_TAG_LIST: u32 = 0;

/// Identify feature bit 0: Query.
pub const IDENTIFY_FEATURE_QUERY: u32 = 0;

/// AccessControl attribute 0x0000: Acl.
pub const ACCESS_CONTROL_ACL: AttributeId = 0x0000;
