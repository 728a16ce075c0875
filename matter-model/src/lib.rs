pub mod ids;
pub mod pics;
pub mod schema;
pub mod tree;
pub mod value;

pub use ids::*;
pub use pics::{
    command_direction, decode_id, encode_attribute, encode_command, encode_feature, CommandDirection,
    DecodeError, ElementMarker, parse_hex_id, PicsCode, PicsElement, PicsSide,
};
pub use schema::{ClusterSchema, CommandSchema, SchemaRegistry};
pub use tree::{CapabilityTree, ClusterData, DeviceTypeEntry, EndpointData, TreeError};
pub use value::AttributeValue;
