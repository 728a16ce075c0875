//! Reconciliation results.

use matter_model::{AttributeId, ClusterId, CommandDirection, CommandId, DeviceTypeId, EndpointId};
use std::fmt;

/// The rule a [`Finding`] violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constraint {
    AttributeList,
    ServerList,
    PartsList,
    AcceptedCommandList,
    WellFormedCluster,
    DescriptorPresent,
    DeviceTypeKnown,
    DeviceTypeRevision,
    MandatoryServerCluster,
    ExcludedServerCluster,
    MandatoryClientCluster,
    MandatoryFeature,
    ExcludedFeature,
    MandatoryAttribute,
    ExcludedAttribute,
    MandatoryCommand,
    ExcludedCommand,
    ValidCommandCode,
    BindingForClients,
    IdentifyQueryClear,
    TagListForRepeatedDeviceType,
}

impl Constraint {
    pub fn description(self) -> &'static str {
        match self {
            Constraint::AttributeList => "reported attributes differ from AttributeList",
            Constraint::ServerList => "reported clusters differ from ServerList",
            Constraint::PartsList => "reported endpoints differ from PartsList",
            Constraint::AcceptedCommandList => "probed commands differ from AcceptedCommandList",
            Constraint::WellFormedCluster => "global attribute missing or malformed",
            Constraint::DescriptorPresent => "Descriptor cluster missing",
            Constraint::DeviceTypeKnown => "no requirement document for device type",
            Constraint::DeviceTypeRevision => "device type revision mismatch",
            Constraint::MandatoryServerCluster => "mandatory server cluster missing from ServerList",
            Constraint::ExcludedServerCluster => "excluded server cluster present in ServerList",
            Constraint::MandatoryClientCluster => "mandatory client cluster missing from ClientList",
            Constraint::MandatoryFeature => "mandatory feature not set in FeatureMap",
            Constraint::ExcludedFeature => "excluded feature set in FeatureMap",
            Constraint::MandatoryAttribute => "mandatory attribute missing from AttributeList",
            Constraint::ExcludedAttribute => "excluded attribute present in AttributeList",
            Constraint::MandatoryCommand => "mandatory command missing from command list",
            Constraint::ExcludedCommand => "excluded command present in command list",
            Constraint::ValidCommandCode => "command PICS code has no .Rsp/.Tx direction",
            Constraint::BindingForClients => "Binding cluster required when client clusters are present",
            Constraint::IdentifyQueryClear => "Identify query feature must not be set",
            Constraint::TagListForRepeatedDeviceType => {
                "device type on several endpoints requires the Descriptor TagList feature"
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// The cluster element a finding is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Feature(u32),
    Attribute(AttributeId),
    Command(CommandId, CommandDirection),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Feature(bit) => write!(f, "feature bit {bit}"),
            Element::Attribute(id) => write!(f, "attribute {id:#06x}"),
            Element::Command(id, direction) => write!(f, "{direction} command {id:#04x}"),
        }
    }
}

/// One failed reconciliation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub constraint: Constraint,
    pub endpoint: EndpointId,
    pub device_type: Option<DeviceTypeId>,
    pub cluster: Option<ClusterId>,
    pub element: Option<Element>,
    pub detail: String,
}

impl Finding {
    pub fn new(constraint: Constraint, endpoint: EndpointId) -> Self {
        Self {
            constraint,
            endpoint,
            device_type: None,
            cluster: None,
            element: None,
            detail: String::new(),
        }
    }

    pub fn with_device_type(mut self, device_type: DeviceTypeId) -> Self {
        self.device_type = Some(device_type);
        self
    }

    pub fn with_cluster(mut self, cluster: ClusterId) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "endpoint {}", self.endpoint)?;
        if let Some(cluster) = self.cluster {
            write!(f, ", cluster {cluster:#06x}")?;
        }
        if let Some(element) = self.element {
            write!(f, ", {element}")?;
        }
        if let Some(device_type) = self.device_type {
            write!(f, " (device type {device_type:#06x})")?;
        }
        write!(f, ": {}", self.constraint)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// A unit of work left out of the run, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub endpoint: Option<EndpointId>,
    pub cluster: Option<ClusterId>,
    pub reason: String,
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.endpoint, self.cluster) {
            (Some(ep), Some(cluster)) => write!(f, "endpoint {ep}, cluster {cluster:#06x}: {}", self.reason),
            (Some(ep), None) => write!(f, "endpoint {ep}: {}", self.reason),
            (None, Some(cluster)) => write!(f, "cluster {cluster:#06x}: {}", self.reason),
            (None, None) => f.write_str(&self.reason),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
    pub skipped: Vec<Skipped>,
}

impl ValidationReport {
    pub fn is_success(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn push(&mut self, finding: Finding) {
        log::debug!("Finding: {finding}");
        self.findings.push(finding);
    }

    /// Record a skipped unit and log it as a warning.
    pub fn skip(&mut self, endpoint: Option<EndpointId>, cluster: Option<ClusterId>, reason: impl Into<String>) {
        let skipped = Skipped {
            endpoint,
            cluster,
            reason: reason.into(),
        };
        log::warn!("Skipping {skipped}");
        self.skipped.push(skipped);
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.findings.extend(other.findings);
        self.skipped.extend(other.skipped);
    }

    pub fn with_constraint(&self, constraint: Constraint) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.constraint == constraint)
    }
}

/// `declared only: [..]; reported only: [..]` for two sorted id lists.
pub(crate) fn list_difference(declared: &[u32], reported: &[u32]) -> String {
    let only_declared: Vec<String> = declared
        .iter()
        .filter(|id| !reported.contains(id))
        .map(|id| format!("{id:#06x}"))
        .collect();
    let only_reported: Vec<String> = reported
        .iter()
        .filter(|id| !declared.contains(id))
        .map(|id| format!("{id:#06x}"))
        .collect();
    format!(
        "declared only: [{}]; reported only: [{}]",
        only_declared.join(", "),
        only_reported.join(", ")
    )
}
