//! PICS code encoding and decoding.
//!
//! A PICS code names one protocol element of a cluster:
//!
//! ```text
//! OO.S          usage (server)
//! OO.S.F00      feature bit 0
//! OO.S.A0003    attribute 0x0003
//! OO.S.C00.Rsp  accepted command 0x00
//! OO.S.C01.Tx   generated command 0x01
//! ```
//!
//! The codec is an exact inverse: decoding an encoded id returns the id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("PICS code '{code}' does not contain '{marker}'")]
    MarkerNotFound { code: String, marker: &'static str },
    #[error("PICS code '{code}' is too short for a {len}-digit id after '{marker}'")]
    Truncated {
        code: String,
        marker: &'static str,
        len: usize,
    },
    #[error("PICS code '{code}': '{digits}' is not hexadecimal")]
    InvalidHex { code: String, digits: String },
    #[error("PICS code '{0}' has no .Rsp or .Tx direction suffix")]
    UnknownDirection(String),
    #[error("malformed PICS code '{0}'")]
    Malformed(String),
}

/// Server (`.S`) or client (`.C`) side of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PicsSide {
    Server,
    Client,
}

impl PicsSide {
    pub fn tag(self) -> &'static str {
        match self {
            PicsSide::Server => "S",
            PicsSide::Client => "C",
        }
    }
}

/// Direction of a command relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandDirection {
    /// Client-to-server, listed in AcceptedCommandList (`.Rsp`).
    Accepted,
    /// Server-to-client, listed in GeneratedCommandList (`.Tx`).
    Generated,
}

impl CommandDirection {
    pub fn suffix(self) -> &'static str {
        match self {
            CommandDirection::Accepted => "Rsp",
            CommandDirection::Generated => "Tx",
        }
    }
}

impl fmt::Display for CommandDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandDirection::Accepted => write!(f, "accepted"),
            CommandDirection::Generated => write!(f, "generated"),
        }
    }
}

/// The element marker searched for by [`decode_id`], with its id width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementMarker {
    Feature,
    Attribute,
    Command,
}

impl ElementMarker {
    pub fn marker(self) -> &'static str {
        match self {
            ElementMarker::Feature => ".S.F",
            ElementMarker::Attribute => ".S.A",
            ElementMarker::Command => ".S.C",
        }
    }

    /// Number of hex digits that follow the marker.
    pub fn id_len(self) -> usize {
        match self {
            ElementMarker::Feature | ElementMarker::Command => 2,
            ElementMarker::Attribute => 4,
        }
    }
}

/// What a PICS code refers to within its cluster side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PicsElement {
    Usage,
    Feature(u8),
    Attribute(u16),
    Command(u8, CommandDirection),
}

/// A parsed PICS code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PicsCode {
    pub prefix: String,
    pub side: PicsSide,
    pub element: PicsElement,
}

impl PicsCode {
    pub fn usage(prefix: &str, side: PicsSide) -> Self {
        Self {
            prefix: prefix.to_string(),
            side,
            element: PicsElement::Usage,
        }
    }

    pub fn feature(prefix: &str, bit: u8) -> Self {
        Self {
            prefix: prefix.to_string(),
            side: PicsSide::Server,
            element: PicsElement::Feature(bit),
        }
    }

    pub fn attribute(prefix: &str, id: u16) -> Self {
        Self {
            prefix: prefix.to_string(),
            side: PicsSide::Server,
            element: PicsElement::Attribute(id),
        }
    }

    pub fn command(prefix: &str, id: u8, direction: CommandDirection) -> Self {
        Self {
            prefix: prefix.to_string(),
            side: PicsSide::Server,
            element: PicsElement::Command(id, direction),
        }
    }
}

impl fmt::Display for PicsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.prefix, self.side.tag())?;
        match self.element {
            PicsElement::Usage => Ok(()),
            PicsElement::Feature(bit) => write!(f, ".F{bit:02X}"),
            PicsElement::Attribute(id) => write!(f, ".A{id:04X}"),
            PicsElement::Command(id, direction) => write!(f, ".C{id:02X}.{}", direction.suffix()),
        }
    }
}

impl FromStr for PicsCode {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DecodeError::Malformed(s.to_string());
        let mut parts = s.split('.');

        let prefix = parts.next().filter(|p| !p.is_empty()).ok_or_else(malformed)?;
        let side = match parts.next() {
            Some("S") => PicsSide::Server,
            Some("C") => PicsSide::Client,
            _ => return Err(malformed()),
        };

        let element = match parts.next() {
            None => PicsElement::Usage,
            Some(tag) => {
                let (kind, digits) = tag.split_at_checked(1).ok_or_else(malformed)?;
                match (kind, digits.len()) {
                    ("F", 2) => PicsElement::Feature(parse_hex(s, digits)? as u8),
                    ("A", 4) => PicsElement::Attribute(parse_hex(s, digits)? as u16),
                    ("C", 2) => {
                        let direction = match parts.next() {
                            Some("Rsp") => CommandDirection::Accepted,
                            Some("Tx") => CommandDirection::Generated,
                            _ => return Err(DecodeError::UnknownDirection(s.to_string())),
                        };
                        PicsElement::Command(parse_hex(s, digits)? as u8, direction)
                    }
                    _ => return Err(malformed()),
                }
            }
        };

        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(PicsCode {
            prefix: prefix.to_string(),
            side,
            element,
        })
    }
}

fn parse_hex(code: &str, digits: &str) -> Result<u32, DecodeError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeError::InvalidHex {
            code: code.to_string(),
            digits: digits.to_string(),
        });
    }
    u32::from_str_radix(digits, 16).map_err(|_| DecodeError::InvalidHex {
        code: code.to_string(),
        digits: digits.to_string(),
    })
}

pub fn encode_feature(prefix: &str, bit: u8) -> String {
    PicsCode::feature(prefix, bit).to_string()
}

pub fn encode_attribute(prefix: &str, id: u16) -> String {
    PicsCode::attribute(prefix, id).to_string()
}

pub fn encode_command(prefix: &str, id: u8, direction: CommandDirection) -> String {
    PicsCode::command(prefix, id, direction).to_string()
}

/// Locate `marker` inside `code` and parse the following `id_len` hex digits.
pub fn decode_id(code: &str, marker: ElementMarker) -> Result<u32, DecodeError> {
    let tag = marker.marker();
    let start = code.find(tag).ok_or_else(|| DecodeError::MarkerNotFound {
        code: code.to_string(),
        marker: tag,
    })? + tag.len();

    let digits = code
        .get(start..start + marker.id_len())
        .ok_or_else(|| DecodeError::Truncated {
            code: code.to_string(),
            marker: tag,
            len: marker.id_len(),
        })?;
    parse_hex(code, digits)
}

/// Direction of a command PICS code, from its `.Rsp` / `.Tx` suffix.
pub fn command_direction(code: &str) -> Result<CommandDirection, DecodeError> {
    if code.contains(".Rsp") {
        Ok(CommandDirection::Accepted)
    } else if code.contains(".Tx") {
        Ok(CommandDirection::Generated)
    } else {
        Err(DecodeError::UnknownDirection(code.to_string()))
    }
}

/// Parse a hex id such as `0x0100` (prefix optional).
pub fn parse_hex_id(text: &str) -> Result<u32, DecodeError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    parse_hex(text, digits)
}
