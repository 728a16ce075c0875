//! Requirement conformance: does each endpoint implement what its declared
//! device types demand?

use matter_model::{
    CapabilityTree, ClusterId, CommandDirection, DeviceTypeId, ElementMarker, EndpointId, BINDING_CLUSTER,
    DESCRIPTOR_CLUSTER, DESCRIPTOR_FEATURE_TAG_LIST, IDENTIFY_CLUSTER, IDENTIFY_FEATURE_QUERY,
};
use matter_requirements::{ClusterRequirement, DeviceTypeRequirement, ElementRequirement, RequirementSet};
use std::collections::BTreeMap;

use crate::controller::DeviceController;
use crate::error::ConformanceError;
use crate::findings::{Constraint, Element, Finding, ValidationReport};

/// Device types of the "simple" device class. An endpoint hosting one of
/// them must expose Binding when it has client clusters.
pub const SIMPLE_DEVICE_TYPES: &[DeviceTypeId] = &[
    0x000A, // Door Lock
    0x000B, // Door Lock Controller
    0x000F, // Generic Switch
    0x0015, // Contact Sensor
    0x002B, // Fan
    0x0100, // On/Off Light
    0x0101, // Dimmable Light
    0x0103, // On/Off Light Switch
    0x0104, // Dimmer Switch
    0x0105, // Color Dimmer Switch
    0x0106, // Light Sensor
    0x0107, // Occupancy Sensor
    0x010A, // On/Off Plug-in Unit
    0x010B, // Dimmable Plug-in Unit
    0x010C, // Color Temperature Light
    0x010D, // Extended Color Light
    0x0202, // Window Covering
    0x0203, // Window Covering Controller
    0x0301, // Thermostat
    0x0302, // Temperature Sensor
    0x0303, // Pump
    0x0304, // Pump Controller
    0x0305, // Pressure Sensor
    0x0306, // Flow Sensor
    0x0307, // Humidity Sensor
    0x0840, // Control Bridge
    0x0850, // On/Off Sensor
];

/// Read the capability tree and check it against `requirements`.
pub fn validate_device_types<C: DeviceController + ?Sized>(
    controller: &mut C,
    requirements: &RequirementSet,
) -> Result<ValidationReport, ConformanceError> {
    let tree = controller.read_capability_tree()?;
    Ok(check_device_type_conformance(&tree, requirements))
}

/// Check every endpoint of the effective parts list against the requirements
/// of the device types in its DeviceTypeList, plus the base device rules.
pub fn check_device_type_conformance(tree: &CapabilityTree, requirements: &RequirementSet) -> ValidationReport {
    let mut report = ValidationReport::default();

    let endpoints = match tree.effective_parts_list() {
        Ok(endpoints) => endpoints,
        Err(e) => {
            report.push(Finding::new(Constraint::DescriptorPresent, 0).with_detail(e.to_string()));
            return report;
        }
    };

    // device type -> endpoints it appears on
    let mut placements: BTreeMap<DeviceTypeId, Vec<EndpointId>> = BTreeMap::new();

    for endpoint in endpoints {
        if !tree.has_cluster(endpoint, DESCRIPTOR_CLUSTER) {
            report.push(Finding::new(Constraint::DescriptorPresent, endpoint).with_cluster(DESCRIPTOR_CLUSTER));
            continue;
        }
        let Some(lists) = EndpointLists::read(tree, endpoint, &mut report) else {
            continue;
        };

        check_identify_query(tree, endpoint, &lists, &mut report);

        for entry in lists.device_types.iter() {
            placements.entry(entry.device_type).or_default().push(endpoint);

            let Some(requirement) = requirements.get(entry.device_type) else {
                report.push(
                    Finding::new(Constraint::DeviceTypeKnown, endpoint)
                        .with_device_type(entry.device_type)
                        .with_detail(format!("{} requirement documents loaded", requirements.len())),
                );
                continue;
            };
            log::info!("Endpoint {endpoint}: checking {}", requirement.display_name());

            if requirement.revision != entry.revision {
                report.push(
                    Finding::new(Constraint::DeviceTypeRevision, endpoint)
                        .with_device_type(entry.device_type)
                        .with_detail(format!(
                            "device reports revision {}, requirement is revision {}",
                            entry.revision, requirement.revision
                        )),
                );
            }

            if SIMPLE_DEVICE_TYPES.contains(&entry.device_type)
                && !lists.clients.is_empty()
                && !lists.servers.contains(&BINDING_CLUSTER)
            {
                report.push(
                    Finding::new(Constraint::BindingForClients, endpoint)
                        .with_device_type(entry.device_type)
                        .with_cluster(BINDING_CLUSTER),
                );
            }

            check_requirement(tree, endpoint, &lists, requirement, &mut report);
        }
    }

    check_tag_lists(tree, &placements, &mut report);
    report
}

struct EndpointLists {
    device_types: Vec<matter_model::DeviceTypeEntry>,
    servers: Vec<ClusterId>,
    clients: Vec<ClusterId>,
}

impl EndpointLists {
    fn read(tree: &CapabilityTree, endpoint: EndpointId, report: &mut ValidationReport) -> Option<Self> {
        let lists = tree.device_types(endpoint).and_then(|device_types| {
            Ok(Self {
                device_types,
                servers: tree.declared_server_list(endpoint)?,
                clients: tree.declared_client_list(endpoint)?,
            })
        });
        match lists {
            Ok(lists) => Some(lists),
            Err(e) => {
                report.push(
                    Finding::new(Constraint::WellFormedCluster, endpoint)
                        .with_cluster(DESCRIPTOR_CLUSTER)
                        .with_detail(e.to_string()),
                );
                None
            }
        }
    }
}

fn check_identify_query(tree: &CapabilityTree, endpoint: EndpointId, lists: &EndpointLists, report: &mut ValidationReport) {
    if !lists.servers.contains(&IDENTIFY_CLUSTER) {
        return;
    }
    match tree.feature_map(endpoint, IDENTIFY_CLUSTER) {
        Ok(map) if map & (1 << IDENTIFY_FEATURE_QUERY) != 0 => report.push(
            Finding::new(Constraint::IdentifyQueryClear, endpoint)
                .with_cluster(IDENTIFY_CLUSTER)
                .with_element(Element::Feature(IDENTIFY_FEATURE_QUERY)),
        ),
        Ok(_) => {}
        Err(e) => report.push(
            Finding::new(Constraint::WellFormedCluster, endpoint)
                .with_cluster(IDENTIFY_CLUSTER)
                .with_detail(e.to_string()),
        ),
    }
}

fn check_tag_lists(
    tree: &CapabilityTree,
    placements: &BTreeMap<DeviceTypeId, Vec<EndpointId>>,
    report: &mut ValidationReport,
) {
    for (&device_type, endpoints) in placements {
        if endpoints.len() < 2 {
            continue;
        }
        for &endpoint in endpoints {
            let has_tag_list = tree
                .feature_map(endpoint, DESCRIPTOR_CLUSTER)
                .is_ok_and(|map| map & (1 << DESCRIPTOR_FEATURE_TAG_LIST) != 0);
            if !has_tag_list {
                report.push(
                    Finding::new(Constraint::TagListForRepeatedDeviceType, endpoint)
                        .with_device_type(device_type)
                        .with_cluster(DESCRIPTOR_CLUSTER)
                        .with_element(Element::Feature(DESCRIPTOR_FEATURE_TAG_LIST))
                        .with_detail(format!("device type also on endpoints {endpoints:?}")),
                );
            }
        }
    }
}

fn check_requirement(
    tree: &CapabilityTree,
    endpoint: EndpointId,
    lists: &EndpointLists,
    requirement: &DeviceTypeRequirement,
    report: &mut ValidationReport,
) {
    let device_type = requirement.id;

    for cluster in &requirement.server_clusters {
        if !lists.servers.contains(&cluster.id) {
            report.push(
                Finding::new(Constraint::MandatoryServerCluster, endpoint)
                    .with_device_type(device_type)
                    .with_cluster(cluster.id),
            );
            continue;
        }
        ClusterCheck {
            tree,
            endpoint,
            device_type,
            cluster,
        }
        .run(report);
    }

    for &excluded in &requirement.excluded_server_clusters {
        if lists.servers.contains(&excluded) {
            report.push(
                Finding::new(Constraint::ExcludedServerCluster, endpoint)
                    .with_device_type(device_type)
                    .with_cluster(excluded),
            );
        }
    }

    for cluster in &requirement.client_clusters {
        if !lists.clients.contains(&cluster.id) {
            report.push(
                Finding::new(Constraint::MandatoryClientCluster, endpoint)
                    .with_device_type(device_type)
                    .with_cluster(cluster.id),
            );
        }
    }
}

/// Element checks for one required server cluster that is present.
struct ClusterCheck<'a> {
    tree: &'a CapabilityTree,
    endpoint: EndpointId,
    device_type: DeviceTypeId,
    cluster: &'a ClusterRequirement,
}

impl ClusterCheck<'_> {
    fn run(&self, report: &mut ValidationReport) {
        self.check_features(report);
        self.check_attributes(report);
        self.check_commands(report);
    }

    fn finding(&self, constraint: Constraint) -> Finding {
        Finding::new(constraint, self.endpoint)
            .with_device_type(self.device_type)
            .with_cluster(self.cluster.id)
    }

    fn malformed(&self, report: &mut ValidationReport, error: &matter_model::TreeError) {
        report.push(self.finding(Constraint::WellFormedCluster).with_detail(error.to_string()));
    }

    /// Decode an element id, recording a skip on failure.
    fn resolve(&self, element: &ElementRequirement, marker: ElementMarker, report: &mut ValidationReport) -> Option<u32> {
        match element.resolve_id(marker) {
            Ok(id) => Some(id),
            Err(e) => {
                report.skip(Some(self.endpoint), Some(self.cluster.id), format!("requirement element skipped: {e}"));
                None
            }
        }
    }

    fn check_features(&self, report: &mut ValidationReport) {
        let cluster = self.cluster;
        if cluster.mandatory_features.is_empty() && cluster.excluded_features.is_empty() {
            return;
        }
        let map = match self.tree.feature_map(self.endpoint, cluster.id) {
            Ok(map) => map,
            Err(e) => return self.malformed(report, &e),
        };

        let groups = [
            (&cluster.mandatory_features, true, Constraint::MandatoryFeature),
            (&cluster.excluded_features, false, Constraint::ExcludedFeature),
        ];
        for (elements, required, constraint) in groups {
            for element in elements {
                let Some(bit) = self.resolve(element, ElementMarker::Feature, report) else {
                    continue;
                };
                if bit >= 32 {
                    report.skip(
                        Some(self.endpoint),
                        Some(cluster.id),
                        format!("feature bit {bit} of '{}' is outside FeatureMap", element.pics_code),
                    );
                    continue;
                }
                let set = map & (1 << bit) != 0;
                if set != required {
                    report.push(
                        self.finding(constraint)
                            .with_element(Element::Feature(bit))
                            .with_detail(format!("{} (FeatureMap {map:#010x})", element.pics_code)),
                    );
                }
            }
        }
    }

    fn check_attributes(&self, report: &mut ValidationReport) {
        let cluster = self.cluster;
        if cluster.mandatory_attributes.is_empty() && cluster.excluded_attributes.is_empty() {
            return;
        }
        let declared = match self.tree.declared_attribute_list(self.endpoint, cluster.id) {
            Ok(list) => list,
            Err(e) => return self.malformed(report, &e),
        };

        let groups = [
            (&cluster.mandatory_attributes, true, Constraint::MandatoryAttribute),
            (&cluster.excluded_attributes, false, Constraint::ExcludedAttribute),
        ];
        for (elements, required, constraint) in groups {
            for element in elements {
                let Some(id) = self.resolve(element, ElementMarker::Attribute, report) else {
                    continue;
                };
                if declared.contains(&id) != required {
                    report.push(
                        self.finding(constraint)
                            .with_element(Element::Attribute(id))
                            .with_detail(element.pics_code.clone()),
                    );
                }
            }
        }
    }

    fn check_commands(&self, report: &mut ValidationReport) {
        let cluster = self.cluster;
        if cluster.mandatory_commands.is_empty() && cluster.excluded_commands.is_empty() {
            return;
        }
        let accepted = match self.tree.declared_accepted_commands(self.endpoint, cluster.id) {
            Ok(list) => list,
            Err(e) => return self.malformed(report, &e),
        };
        let generated = match self.tree.declared_generated_commands(self.endpoint, cluster.id) {
            Ok(list) => list,
            Err(e) => return self.malformed(report, &e),
        };

        let groups = [
            (&cluster.mandatory_commands, true, Constraint::MandatoryCommand),
            (&cluster.excluded_commands, false, Constraint::ExcludedCommand),
        ];
        for (elements, required, constraint) in groups {
            for element in elements {
                let direction = match element.direction() {
                    Ok(direction) => direction,
                    Err(e) => {
                        report.push(self.finding(Constraint::ValidCommandCode).with_detail(e.to_string()));
                        continue;
                    }
                };
                let Some(id) = self.resolve(element, ElementMarker::Command, report) else {
                    continue;
                };
                let list = match direction {
                    CommandDirection::Accepted => &accepted,
                    CommandDirection::Generated => &generated,
                };
                if list.contains(&id) != required {
                    report.push(
                        self.finding(constraint)
                            .with_element(Element::Command(id, direction))
                            .with_detail(element.pics_code.clone()),
                    );
                }
            }
        }
    }
}
