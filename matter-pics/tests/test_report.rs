use matter_pics::{pics_report, AnnotationRequest, PicsAnnotator, RemapRules, TemplateResolver};
use std::path::Path;

#[test]
fn test_report_lists_support_and_skips_base() {
    let templates = Path::new(env!("CARGO_MANIFEST_DIR")).join("../test-fixtures/pics-templates");
    let out = tempfile::tempdir().unwrap();
    let annotator = PicsAnnotator::new(TemplateResolver::new(&templates, RemapRules::Generator).unwrap());
    annotator
        .annotate(
            &AnnotationRequest::server("Identify Cluster", "I").with_attributes(["I.S.A0000"]),
            out.path(),
        )
        .unwrap();
    std::fs::write(out.path().join("base.xml"), "<not-pics/>").unwrap();
    std::fs::write(out.path().join("notes.txt"), "ignored").unwrap();

    let report = pics_report(out.path()).unwrap();
    assert_eq!(report.files.len(), 1);
    assert!(report.unreadable.is_empty());

    let file = &report.files[0];
    assert_eq!(file.file_name, "Identify Cluster Test Plan.xml");
    assert_eq!(file.supported_count(), 2);

    let text = report.to_string();
    assert!(text.contains("I.S - true"), "{text}");
    assert!(text.contains("I.S.A0000 - true"), "{text}");
    assert!(text.contains("I.S.A0001 - false"), "{text}");
    assert!(text.contains("[Server/attributes]"), "{text}");
}

#[test]
fn test_report_records_unparseable_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.xml"), "<clusterPICS><usage></clusterPICS>").unwrap();

    let report = pics_report(dir.path()).unwrap();
    assert!(report.files.is_empty());
    assert_eq!(report.unreadable.len(), 1);
    assert_eq!(report.unreadable[0].0, "broken.xml");
}
