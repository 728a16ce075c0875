use matter_pics::{parse_cluster_pics, AnnotationRequest, PicsAnnotator, PicsError, RemapRules, TemplateResolver};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

fn template_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../test-fixtures/pics-templates")
}

fn annotator(rules: RemapRules) -> PicsAnnotator {
    PicsAnnotator::new(TemplateResolver::new(&template_dir(), rules).unwrap())
}

const SCENARIO_TEMPLATE: &str = r#"<?xml version="1.0"?>
<clusterPICS>
  <usage>
    <picsItem><itemNumber>OO.S</itemNumber><status>O</status><support>false</support></picsItem>
    <picsItem><itemNumber>OO.C</itemNumber><status>O</status><support>false</support></picsItem>
  </usage>
  <clusterSide type="Server">
    <attributes>
      <picsItem><itemNumber>OO.S.A0000</itemNumber><status>M</status><support>false</support></picsItem>
    </attributes>
    <events>
      <picsItem><itemNumber>OO.S.E00</itemNumber><status>O</status><support>false</support></picsItem>
      <picsItem><itemNumber>OO.S.E01</itemNumber><status cond="OO.S.F01">M</status><support>false</support></picsItem>
    </events>
    <commandsReceived>
      <picsItem><itemNumber>OO.S.C00.Rsp</itemNumber><status>M</status><support>false</support></picsItem>
    </commandsReceived>
    <commandsGenerated/>
    <features>
      <picsItem><itemNumber>OO.S.F00</itemNumber><status>O</status><support>false</support></picsItem>
      <picsItem><itemNumber>OO.S.F01</itemNumber><status>O</status><support>false</support></picsItem>
    </features>
  </clusterSide>
</clusterPICS>
"#;

#[test]
fn test_usage_and_feature_only() {
    let request = AnnotationRequest::server("On/Off Cluster", "OO").with_features(["OO.S.F00"]);
    let doc = matter_pics::annotate_document(SCENARIO_TEMPLATE, &request).unwrap();

    let pics = parse_cluster_pics(&doc.xml).unwrap();
    assert_eq!(pics.supported_items(), vec!["OO.S", "OO.S.F00"]);
    assert_eq!(
        doc.xml.replace("<support>true</support>", "<support>false</support>"),
        SCENARIO_TEMPLATE
    );
}

#[test]
fn test_fixture_template_events_follow_conformance() {
    let out = tempfile::tempdir().unwrap();
    let request = AnnotationRequest::server("On/Off Cluster", "OO")
        .with_features(["OO.S.F00"])
        .with_attributes(["OO.S.A0000", "OO.S.A4000"])
        .with_accepted_commands(["OO.S.C00.Rsp", "OO.S.C01.Rsp"]);

    let written = annotator(RemapRules::Generator).annotate(&request, out.path()).unwrap();
    assert_eq!(written, out.path().join("On-Off Cluster Test Plan.xml"));

    let pics = parse_cluster_pics(&std::fs::read_to_string(&written).unwrap()).unwrap();
    assert_eq!(
        pics.supported_items(),
        vec![
            "OO.S",
            "OO.S.F00",
            "OO.S.A0000",
            "OO.S.A4000",
            "OO.S.C00.Rsp",
            "OO.S.C01.Rsp",
            "OO.S.E00",
            "OO.S.E01",
            "OO.S.E03",
        ]
    );
}

#[test]
fn test_header_is_copied_from_template() {
    let out = tempfile::tempdir().unwrap();
    let request = AnnotationRequest::server("Identify Cluster", "I");
    let written = annotator(RemapRules::Generator).annotate(&request, out.path()).unwrap();

    let template = std::fs::read_to_string(template_dir().join("Identify Cluster Test Plan.xml")).unwrap();
    let output = std::fs::read_to_string(written).unwrap();
    let header_len = template.find("<clusterPICS").unwrap();
    assert_eq!(&output[..header_len], &template[..header_len]);
}

#[test]
fn test_second_call_merges_into_existing_output() {
    let out = tempfile::tempdir().unwrap();
    let annotator = annotator(RemapRules::Generator);

    let server = AnnotationRequest::server("On/Off Cluster", "OO").with_attributes(["OO.S.A0000"]);
    annotator.annotate(&server, out.path()).unwrap();
    let client = AnnotationRequest::client("On/Off Cluster", "OO");
    let written = annotator.annotate(&client, out.path()).unwrap();

    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 1);
    let text = std::fs::read_to_string(written).unwrap();
    assert_eq!(text.matches("<clusterPICS").count(), 1);

    let pics = parse_cluster_pics(&text).unwrap();
    let supported = pics.supported_items();
    assert!(supported.contains(&"OO.S"));
    assert!(supported.contains(&"OO.C"));
    assert!(supported.contains(&"OO.S.A0000"));
}

#[test]
fn test_annotation_never_clears_support() {
    let out = tempfile::tempdir().unwrap();
    let annotator = annotator(RemapRules::Generator);

    let first = AnnotationRequest::server("Groups Cluster", "G").with_features(["G.S.F00"]);
    annotator.annotate(&first, out.path()).unwrap();
    let second = AnnotationRequest::server("Groups Cluster", "G");
    let written = annotator.annotate(&second, out.path()).unwrap();

    let pics = parse_cluster_pics(&std::fs::read_to_string(written).unwrap()).unwrap();
    assert!(pics.supported_items().contains(&"G.S.F00"));
}

#[test]
fn test_device_mapper_groups_device_management() {
    let out = tempfile::tempdir().unwrap();
    let request = AnnotationRequest::server("Basic Information Cluster", "BINFO").with_attributes(["BINFO.S.A0001"]);
    let written = annotator(RemapRules::DeviceMapper).annotate(&request, out.path()).unwrap();
    assert_eq!(written, out.path().join("Device Management Test Plan.xml"));
}

#[test]
fn test_unknown_cluster_is_template_not_found() {
    let out = tempfile::tempdir().unwrap();
    let request = AnnotationRequest::server("Level Control Cluster", "LVL");
    let err = annotator(RemapRules::Generator).annotate(&request, out.path()).unwrap_err();
    assert!(
        matches!(&err, PicsError::TemplateNotFound { lookup, .. } if lookup == "Level Control Cluster"),
        "{err}"
    );
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}
