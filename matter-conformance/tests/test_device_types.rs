use matter_conformance::{check_device_type_conformance, validate_device_types, Constraint, Element, SnapshotDevice};
use matter_model::*;
use matter_requirements::{load_device_type_requirements, RequirementSet};
use pretty_assertions::assert_eq;
use std::path::Path;

const SNAPSHOT: &str = include_str!("../../test-fixtures/snapshots/on_off_light.json");

const LIGHT_REV2: &str = r#"{
    "id": "0x0100",
    "name": "On/Off Light",
    "revision": 2,
    "server_clusters": [
        {
            "id": "0x0006",
            "mandatory_features": [],
            "mandatory_attributes": [{"pics_code": "OO.S.A0000"}],
            "mandatory_commands": [{"pics_code": "OO.S.C00.Rsp"}]
        }
    ],
    "client_clusters": []
}"#;

fn requirements_from(json: &str) -> RequirementSet {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("light.json"), json).unwrap();
    load_device_type_requirements(dir.path()).unwrap()
}

fn light_tree(attribute_list: &[u64]) -> CapabilityTree {
    let device_type = |id: u64, revision: u64| {
        AttributeValue::structure([
            ("deviceType", AttributeValue::from(id)),
            ("revision", AttributeValue::from(revision)),
        ])
    };

    let mut tree = CapabilityTree::default();
    tree.set_attribute(0, DESCRIPTOR_CLUSTER, DESCRIPTOR_DEVICE_TYPE_LIST, AttributeValue::List(vec![]));
    tree.set_attribute(0, DESCRIPTOR_CLUSTER, DESCRIPTOR_SERVER_LIST, AttributeValue::id_list(&[0x1Du64]));
    tree.set_attribute(0, DESCRIPTOR_CLUSTER, DESCRIPTOR_PARTS_LIST, AttributeValue::id_list(&[1u64]));

    tree.set_attribute(
        1,
        DESCRIPTOR_CLUSTER,
        DESCRIPTOR_DEVICE_TYPE_LIST,
        AttributeValue::List(vec![device_type(0x0100, 2)]),
    );
    tree.set_attribute(1, DESCRIPTOR_CLUSTER, DESCRIPTOR_SERVER_LIST, AttributeValue::id_list(&[0x06u64, 0x1D]));
    tree.set_attribute(1, ON_OFF_CLUSTER, FEATURE_MAP, 0u32.into());
    tree.set_attribute(1, ON_OFF_CLUSTER, ATTRIBUTE_LIST, AttributeValue::id_list(attribute_list));
    tree.set_attribute(1, ON_OFF_CLUSTER, ACCEPTED_COMMAND_LIST, AttributeValue::id_list(&[0x00u64]));
    tree
}

#[test]
fn test_minimal_light_passes() {
    let report = check_device_type_conformance(&light_tree(&[0x0000, 0xFFFB]), &requirements_from(LIGHT_REV2));
    assert_eq!(report.findings, Vec::new());
}

#[test]
fn test_missing_mandatory_attribute_is_one_finding() {
    let report = check_device_type_conformance(&light_tree(&[0xFFFB]), &requirements_from(LIGHT_REV2));

    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.constraint, Constraint::MandatoryAttribute);
    assert_eq!(finding.endpoint, 1);
    assert_eq!(finding.cluster, Some(0x0006));
    assert_eq!(finding.element, Some(Element::Attribute(0)));
    assert_eq!(finding.device_type, Some(0x0100));
}

#[test]
fn test_revision_mismatch() {
    let json = LIGHT_REV2.replace(r#""revision": 2"#, r#""revision": 3"#);
    let report = check_device_type_conformance(&light_tree(&[0x0000]), &requirements_from(&json));
    assert_eq!(
        report.findings.iter().map(|f| f.constraint).collect::<Vec<_>>(),
        vec![Constraint::DeviceTypeRevision]
    );
}

#[test]
fn test_missing_cluster_short_circuits_element_checks() {
    let mut tree = light_tree(&[]);
    tree.set_attribute(1, DESCRIPTOR_CLUSTER, DESCRIPTOR_SERVER_LIST, AttributeValue::id_list(&[0x1Du64]));
    let report = check_device_type_conformance(&tree, &requirements_from(LIGHT_REV2));
    assert_eq!(
        report.findings.iter().map(|f| f.constraint).collect::<Vec<_>>(),
        vec![Constraint::MandatoryServerCluster]
    );
}

#[test]
fn test_invalid_direction_is_a_finding() {
    let json = LIGHT_REV2.replace("OO.S.C00.Rsp", "OO.S.C00");
    let report = check_device_type_conformance(&light_tree(&[0x0000]), &requirements_from(&json));
    assert_eq!(report.with_constraint(Constraint::ValidCommandCode).count(), 1);
}

#[test]
fn test_undecodable_code_is_skipped() {
    let json = LIGHT_REV2.replace("OO.S.A0000", "OO.S.AXYZW");
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("light.json"), json).unwrap();
    // The loader only parses JSON; the bad code surfaces when checking.
    let requirements = load_device_type_requirements(dir.path()).unwrap();

    let report = check_device_type_conformance(&light_tree(&[0x0000]), &requirements);
    assert!(report.is_success());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].cluster, Some(0x0006));
}

#[test]
fn test_fixture_device_conforms_to_fixture_requirements() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../test-fixtures/device-types");
    let requirements = load_device_type_requirements(&dir).unwrap();
    let mut device = SnapshotDevice::from_json(SNAPSHOT).unwrap();

    let report = validate_device_types(&mut device, &requirements).unwrap();
    assert_eq!(report.findings, Vec::new());
    assert_eq!(report.skipped, Vec::new());
}

#[test]
fn test_excluded_cluster_present() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../test-fixtures/device-types");
    let requirements = load_device_type_requirements(&dir).unwrap();
    let mut tree = SnapshotDevice::from_json(SNAPSHOT).unwrap().tree().clone();
    tree.set_attribute(
        1,
        DESCRIPTOR_CLUSTER,
        DESCRIPTOR_SERVER_LIST,
        AttributeValue::id_list(&[0x03u64, 0x04, 0x06, 0x08, 0x1D]),
    );

    let report = check_device_type_conformance(&tree, &requirements);
    let excluded: Vec<_> = report.with_constraint(Constraint::ExcludedServerCluster).collect();
    assert_eq!(excluded.len(), 1);
    assert_eq!(excluded[0].cluster, Some(LEVEL_CONTROL_CLUSTER));
}
