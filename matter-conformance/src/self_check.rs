//! Self-consistency check: does the device describe itself truthfully?
//!
//! Compares what a wildcard read actually returns against the device's own
//! AttributeList, ServerList and PartsList, and the AcceptedCommandList
//! against commands discovered by probing under a narrowed ACL.

use matter_model::{CapabilityTree, ClusterId, ClusterSchema, CommandId, EndpointId, SchemaRegistry, ROOT_ENDPOINT};
use std::collections::BTreeSet;

use crate::acl::with_narrowed_acl;
use crate::controller::DeviceController;
use crate::error::ConformanceError;
use crate::findings::{list_difference, Constraint, Finding, ValidationReport};
use crate::probe::probe_accepted_commands;

/// Run every self-consistency check against `controller`.
///
/// The ACL is narrowed once per endpoint that has commands to probe and is
/// restored before the next endpoint starts.
pub fn check_self_consistency<C: DeviceController + ?Sized>(
    controller: &mut C,
    schema: &SchemaRegistry,
) -> Result<ValidationReport, ConformanceError> {
    let tree = controller.read_capability_tree()?;
    log::info!("Wildcard read returned {} endpoints", tree.endpoints.len());

    let mut report = check_declared_lists(&tree);
    for endpoint in tree.endpoint_ids() {
        check_accepted_commands(controller, &tree, endpoint, schema, &mut report)?;
    }
    Ok(report)
}

/// The list checks that need no device interaction: attributes per cluster,
/// servers per endpoint and the endpoint set.
pub fn check_declared_lists(tree: &CapabilityTree) -> ValidationReport {
    let mut report = ValidationReport::default();

    for endpoint in tree.endpoint_ids() {
        let servers = match tree.server_ids(endpoint) {
            Ok(servers) => servers,
            Err(e) => {
                report.push(Finding::new(Constraint::WellFormedCluster, endpoint).with_detail(e.to_string()));
                continue;
            }
        };

        for &cluster in &servers {
            check_attribute_list(tree, endpoint, cluster, &mut report);
        }

        match tree.declared_server_list(endpoint) {
            Ok(declared) if declared != servers => report.push(
                Finding::new(Constraint::ServerList, endpoint).with_detail(list_difference(&declared, &servers)),
            ),
            Ok(_) => {}
            Err(e) => report.push(Finding::new(Constraint::ServerList, endpoint).with_detail(e.to_string())),
        }
    }

    check_parts_list(tree, &mut report);
    report
}

fn check_attribute_list(tree: &CapabilityTree, endpoint: EndpointId, cluster: ClusterId, report: &mut ValidationReport) {
    let declared = match tree.declared_attribute_list(endpoint, cluster) {
        Ok(declared) => declared,
        Err(e) => {
            report.push(
                Finding::new(Constraint::WellFormedCluster, endpoint)
                    .with_cluster(cluster)
                    .with_detail(e.to_string()),
            );
            return;
        }
    };
    let reported = match tree.attribute_ids(endpoint, cluster) {
        Ok(ids) => ids,
        Err(e) => {
            report.push(
                Finding::new(Constraint::WellFormedCluster, endpoint)
                    .with_cluster(cluster)
                    .with_detail(e.to_string()),
            );
            return;
        }
    };
    if declared != reported {
        report.push(
            Finding::new(Constraint::AttributeList, endpoint)
                .with_cluster(cluster)
                .with_detail(list_difference(&declared, &reported)),
        );
    }
}

fn check_parts_list(tree: &CapabilityTree, report: &mut ValidationReport) {
    let mut reported: BTreeSet<EndpointId> = tree.endpoints.keys().copied().collect();
    reported.insert(ROOT_ENDPOINT);
    let reported: Vec<EndpointId> = reported.into_iter().collect();

    match tree.effective_parts_list() {
        Ok(declared) if declared != reported => {
            let declared: Vec<u32> = declared.into_iter().map(u32::from).collect();
            let reported: Vec<u32> = reported.into_iter().map(u32::from).collect();
            report.push(
                Finding::new(Constraint::PartsList, ROOT_ENDPOINT).with_detail(list_difference(&declared, &reported)),
            );
        }
        Ok(_) => {}
        Err(e) => report.push(Finding::new(Constraint::PartsList, ROOT_ENDPOINT).with_detail(e.to_string())),
    }
}

/// Probe the accepted commands of every cluster on `endpoint` and compare
/// them with each cluster's AcceptedCommandList.
fn check_accepted_commands<C: DeviceController + ?Sized>(
    controller: &mut C,
    tree: &CapabilityTree,
    endpoint: EndpointId,
    schema: &SchemaRegistry,
    report: &mut ValidationReport,
) -> Result<(), ConformanceError> {
    let mut targets: Vec<(&ClusterSchema, Vec<CommandId>)> = Vec::new();

    for cluster in tree.server_ids(endpoint)? {
        let declared = match tree.declared_accepted_commands(endpoint, cluster) {
            Ok(declared) => declared,
            Err(e) => {
                report.push(
                    Finding::new(Constraint::WellFormedCluster, endpoint)
                        .with_cluster(cluster)
                        .with_detail(e.to_string()),
                );
                continue;
            }
        };
        match schema.get(cluster) {
            Some(cluster_schema) if cluster_schema.client_to_server_commands().next().is_some() => {
                targets.push((cluster_schema, declared));
            }
            Some(_) => compare_commands(endpoint, cluster, &declared, &BTreeSet::new(), report),
            None => report.skip(Some(endpoint), Some(cluster), "no command schema for cluster"),
        }
    }

    if targets.is_empty() {
        return Ok(());
    }

    log::info!("Probing commands of {} clusters on endpoint {endpoint}", targets.len());
    let probed = with_narrowed_acl(controller, |controller| {
        let mut probed = Vec::with_capacity(targets.len());
        for (cluster_schema, _) in &targets {
            probed.push(probe_accepted_commands(controller, endpoint, cluster_schema)?);
        }
        Ok(probed)
    })?;

    for ((cluster_schema, declared), probed) in targets.iter().zip(&probed) {
        compare_commands(endpoint, cluster_schema.id, declared, probed, report);
    }
    Ok(())
}

fn compare_commands(
    endpoint: EndpointId,
    cluster: ClusterId,
    declared: &[CommandId],
    probed: &BTreeSet<CommandId>,
    report: &mut ValidationReport,
) {
    let probed: Vec<CommandId> = probed.iter().copied().collect();
    if declared != probed.as_slice() {
        report.push(
            Finding::new(Constraint::AcceptedCommandList, endpoint)
                .with_cluster(cluster)
                .with_detail(list_difference(declared, &probed)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matter_model::*;
    use pretty_assertions::assert_eq;

    fn cluster(attributes: &[u32]) -> ClusterData {
        let mut data = ClusterData::default();
        for &id in attributes {
            data.attributes.insert(id, AttributeValue::Null);
        }
        let mut list: Vec<u64> = attributes.iter().map(|&a| u64::from(a)).collect();
        list.push(u64::from(ATTRIBUTE_LIST));
        list.sort_unstable();
        data.attributes.insert(ATTRIBUTE_LIST, AttributeValue::id_list(&list));
        data
    }

    fn consistent_tree() -> CapabilityTree {
        let mut tree = CapabilityTree::default();
        let root = tree.endpoints.entry(0).or_default();
        root.clusters.insert(DESCRIPTOR_CLUSTER, cluster(&[DESCRIPTOR_SERVER_LIST, DESCRIPTOR_PARTS_LIST]));
        tree.set_attribute(0, DESCRIPTOR_CLUSTER, DESCRIPTOR_SERVER_LIST, AttributeValue::id_list(&[0x1Du64]));
        tree.set_attribute(0, DESCRIPTOR_CLUSTER, DESCRIPTOR_PARTS_LIST, AttributeValue::id_list(&[1u64]));

        let ep1 = tree.endpoints.entry(1).or_default();
        ep1.clusters.insert(DESCRIPTOR_CLUSTER, cluster(&[DESCRIPTOR_SERVER_LIST]));
        ep1.clusters.insert(ON_OFF_CLUSTER, cluster(&[0x0000]));
        tree.set_attribute(
            1,
            DESCRIPTOR_CLUSTER,
            DESCRIPTOR_SERVER_LIST,
            AttributeValue::id_list(&[0x06u64, 0x1D]),
        );
        tree
    }

    #[test]
    fn consistent_tree_has_no_findings() {
        let report = check_declared_lists(&consistent_tree());
        assert_eq!(report.findings, Vec::new());
    }

    #[test]
    fn data_version_does_not_count_as_attribute() {
        let mut tree = consistent_tree();
        if let Some(data) = tree.endpoints.get_mut(&1).and_then(|ep| ep.clusters.get_mut(&ON_OFF_CLUSTER)) {
            data.data_version = Some(7);
        }
        assert!(check_declared_lists(&tree).is_success());
    }

    #[test]
    fn undeclared_attribute_is_reported() {
        let mut tree = consistent_tree();
        tree.set_attribute(1, ON_OFF_CLUSTER, 0x4000, AttributeValue::Bool(true));
        let report = check_declared_lists(&tree);
        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.constraint, Constraint::AttributeList);
        assert_eq!(finding.cluster, Some(ON_OFF_CLUSTER));
        assert!(finding.detail.contains("reported only: [0x4000]"), "{}", finding.detail);
    }

    #[test]
    fn server_list_must_match_clusters() {
        let mut tree = consistent_tree();
        tree.set_attribute(1, DESCRIPTOR_CLUSTER, DESCRIPTOR_SERVER_LIST, AttributeValue::id_list(&[0x1Du64]));
        let report = check_declared_lists(&tree);
        assert_eq!(report.with_constraint(Constraint::ServerList).count(), 1);
    }

    #[test]
    fn root_endpoint_is_added_to_parts_list() {
        // PartsList [1] never names endpoint 0, yet endpoints {0, 1} match.
        let report = check_declared_lists(&consistent_tree());
        assert_eq!(report.with_constraint(Constraint::PartsList).count(), 0);
    }

    #[test]
    fn extra_endpoint_breaks_parts_list() {
        let mut tree = consistent_tree();
        tree.endpoints.insert(2, EndpointData::default());
        let report = check_declared_lists(&tree);
        let parts: Vec<_> = report.with_constraint(Constraint::PartsList).collect();
        assert_eq!(parts.len(), 1);
        assert!(parts[0].detail.contains("reported only: [0x0002]"));
    }
}
