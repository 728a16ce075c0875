//! Device controller abstraction.
//!
//! The transport, commissioning and the real wildcard-read / invoke
//! primitives live behind [`DeviceController`]. Every call is a blocking
//! round trip and takes `&mut self`, so probes run strictly one after another.

use matter_model::{AttributeId, AttributeValue, CapabilityTree, ClusterId, CommandId, EndpointId};
use std::fmt;
use thiserror::Error;

/// Interaction-model status returned by a command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Success,
    Failure,
    UnsupportedAccess,
    UnsupportedEndpoint,
    UnsupportedCommand,
    InvalidCommand,
    UnsupportedAttribute,
    Busy,
    UnsupportedCluster,
    NeedsTimedInteraction,
    Other(u8),
}

impl StatusCode {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => StatusCode::Success,
            0x01 => StatusCode::Failure,
            0x7E => StatusCode::UnsupportedAccess,
            0x7F => StatusCode::UnsupportedEndpoint,
            0x81 => StatusCode::UnsupportedCommand,
            0x85 => StatusCode::InvalidCommand,
            0x86 => StatusCode::UnsupportedAttribute,
            0x9C => StatusCode::Busy,
            0xC3 => StatusCode::UnsupportedCluster,
            0xC6 => StatusCode::NeedsTimedInteraction,
            other => StatusCode::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            StatusCode::Success => 0x00,
            StatusCode::Failure => 0x01,
            StatusCode::UnsupportedAccess => 0x7E,
            StatusCode::UnsupportedEndpoint => 0x7F,
            StatusCode::UnsupportedCommand => 0x81,
            StatusCode::InvalidCommand => 0x85,
            StatusCode::UnsupportedAttribute => 0x86,
            StatusCode::Busy => 0x9C,
            StatusCode::UnsupportedCluster => 0xC3,
            StatusCode::NeedsTimedInteraction => 0xC6,
            StatusCode::Other(code) => code,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Other(code) => write!(f, "status {code:#04x}"),
            known => write!(f, "{known:?} ({:#04x})", known.code()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("read of endpoint {endpoint}, cluster {cluster:#06x}, attribute {attribute:#06x} failed: {status}")]
    Read {
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        status: StatusCode,
    },
    #[error("write of endpoint {endpoint}, cluster {cluster:#06x}, attribute {attribute:#06x} failed: {status}")]
    Write {
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        status: StatusCode,
    },
}

/// One command invocation. Timed commands carry the timed-request timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRequest {
    pub endpoint: EndpointId,
    pub cluster: ClusterId,
    pub command: CommandId,
    pub timed_timeout_ms: Option<u16>,
}

pub trait DeviceController {
    /// Wildcard read of every attribute on every endpoint.
    fn read_capability_tree(&mut self) -> Result<CapabilityTree, ProtocolError>;

    fn read_attribute(
        &mut self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
    ) -> Result<AttributeValue, ProtocolError>;

    fn write_attribute(
        &mut self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        value: AttributeValue,
    ) -> Result<(), ProtocolError>;

    /// Invoke a command with empty fields. Status responses, including
    /// failures, are returned as values; only transport problems are errors.
    fn invoke_command(&mut self, request: &CommandRequest) -> Result<StatusCode, ProtocolError>;
}
