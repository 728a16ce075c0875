use matter_conformance::{
    check_self_consistency, with_narrowed_acl, AclGuard, CommandRequest, ConformanceError, Constraint, DeviceController,
    ProtocolError, SnapshotDevice, StatusCode,
};
use matter_model::{
    AttributeId, AttributeValue, CapabilityTree, ClusterId, EndpointId, SchemaRegistry, ACCESS_CONTROL_ACL,
    ACCESS_CONTROL_CLUSTER, ON_OFF_CLUSTER,
};
use pretty_assertions::assert_eq;

const SNAPSHOT: &str = include_str!("../../test-fixtures/snapshots/on_off_light.json");

fn device() -> SnapshotDevice {
    SnapshotDevice::from_json(SNAPSHOT).unwrap()
}

/// Wraps a snapshot device and starts failing after a number of calls.
struct FlakyDevice {
    inner: SnapshotDevice,
    invokes_before_failure: Option<usize>,
    writes_before_failure: Option<usize>,
}

impl FlakyDevice {
    fn new(inner: SnapshotDevice) -> Self {
        Self {
            inner,
            invokes_before_failure: None,
            writes_before_failure: None,
        }
    }
}

fn countdown(remaining: &mut Option<usize>) -> bool {
    match remaining {
        Some(0) => true,
        Some(n) => {
            *n -= 1;
            false
        }
        None => false,
    }
}

impl DeviceController for FlakyDevice {
    fn read_capability_tree(&mut self) -> Result<CapabilityTree, ProtocolError> {
        self.inner.read_capability_tree()
    }

    fn read_attribute(
        &mut self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
    ) -> Result<AttributeValue, ProtocolError> {
        self.inner.read_attribute(endpoint, cluster, attribute)
    }

    fn write_attribute(
        &mut self,
        endpoint: EndpointId,
        cluster: ClusterId,
        attribute: AttributeId,
        value: AttributeValue,
    ) -> Result<(), ProtocolError> {
        if countdown(&mut self.writes_before_failure) {
            return Err(ProtocolError::Transport("write timed out".into()));
        }
        self.inner.write_attribute(endpoint, cluster, attribute, value)
    }

    fn invoke_command(&mut self, request: &CommandRequest) -> Result<StatusCode, ProtocolError> {
        if countdown(&mut self.invokes_before_failure) {
            return Err(ProtocolError::Transport("session lost".into()));
        }
        self.inner.invoke_command(request)
    }
}

#[test]
fn test_conforming_snapshot_passes() {
    let mut device = device();
    let original_acl = device.acl().cloned();

    let report = check_self_consistency(&mut device, &SchemaRegistry::builtin()).unwrap();
    assert_eq!(report.findings, Vec::new());
    assert_eq!(device.acl().cloned(), original_acl);
}

#[test]
fn test_timed_commands_use_timed_invoke() {
    let mut device = device();
    check_self_consistency(&mut device, &SchemaRegistry::builtin()).unwrap();

    let admin: Vec<_> = device
        .invocations()
        .iter()
        .filter(|r| r.cluster == 0x003C)
        .map(|r| (r.command, r.timed_timeout_ms))
        .collect();
    assert_eq!(admin, vec![(0x00, Some(10)), (0x01, Some(10)), (0x02, Some(10))]);

    let on_off_timed = device
        .invocations()
        .iter()
        .filter(|r| r.cluster == ON_OFF_CLUSTER)
        .any(|r| r.timed_timeout_ms.is_some());
    assert!(!on_off_timed);
}

#[test]
fn test_unimplemented_declared_command_is_found() {
    // Toggle is declared but the device does not implement it.
    let mut device = device().with_implemented_commands(1, ON_OFF_CLUSTER, [0x00, 0x01, 0x40, 0x41, 0x42]);
    let report = check_self_consistency(&mut device, &SchemaRegistry::builtin()).unwrap();

    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.constraint, Constraint::AcceptedCommandList);
    assert_eq!(finding.endpoint, 1);
    assert_eq!(finding.cluster, Some(ON_OFF_CLUSTER));
    assert!(finding.detail.contains("declared only: [0x0002]"), "{}", finding.detail);
}

#[test]
fn test_success_status_does_not_count_as_accepted() {
    // With unrestricted access every implemented command answers Success.
    let mut device = device();
    let request = CommandRequest {
        endpoint: 1,
        cluster: ON_OFF_CLUSTER,
        command: 0x02,
        timed_timeout_ms: None,
    };
    assert_eq!(device.invoke_command(&request).unwrap(), StatusCode::Success);

    let schema = SchemaRegistry::builtin();
    let on_off = schema.get(ON_OFF_CLUSTER).unwrap();
    let accepted = matter_conformance::probe_accepted_commands(&mut device, 1, on_off).unwrap();
    assert!(accepted.is_empty());
}

#[test]
fn test_acl_restored_when_probing_fails() {
    let mut device = FlakyDevice::new(device());
    device.invokes_before_failure = Some(3);
    let original_acl = device.inner.acl().cloned();

    let err = check_self_consistency(&mut device, &SchemaRegistry::builtin()).unwrap_err();
    assert!(matches!(err, ConformanceError::Protocol(ProtocolError::Transport(_))), "{err}");
    assert_eq!(device.inner.acl().cloned(), original_acl);
}

#[test]
fn test_failed_revert_is_reported_with_body_error() {
    let mut device = FlakyDevice::new(device());
    // The narrowing write succeeds, the restoring write fails.
    device.writes_before_failure = Some(1);

    let err = with_narrowed_acl(&mut device, |_| -> Result<(), ConformanceError> {
        Err(ConformanceError::InvalidAcl("body failed".into()))
    })
    .unwrap_err();

    match err {
        ConformanceError::AclRevertFailed { revert, body } => {
            assert_eq!(revert, ProtocolError::Transport("write timed out".into()));
            assert!(matches!(body.as_deref(), Some(ConformanceError::InvalidAcl(_))));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_failed_revert_after_successful_body() {
    let mut device = FlakyDevice::new(device());
    device.writes_before_failure = Some(1);

    let err = with_narrowed_acl(&mut device, |_| Ok(42)).unwrap_err();
    assert!(matches!(err, ConformanceError::AclRevertFailed { body: None, .. }));
}

#[test]
fn test_acl_restored_after_panic() {
    let mut device = device();
    let original_acl = device.acl().cloned();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = with_narrowed_acl(&mut device, |_| -> Result<(), ConformanceError> { panic!("probe crashed") });
    }));
    assert!(outcome.is_err());
    assert_eq!(device.acl().cloned(), original_acl);
}

#[test]
fn test_guard_restores_on_drop() {
    let mut device = device();
    let original_acl = device.acl().cloned();
    {
        let mut guard = AclGuard::narrow(&mut device).unwrap();
        let narrowed = guard
            .controller()
            .read_attribute(0, ACCESS_CONTROL_CLUSTER, ACCESS_CONTROL_ACL)
            .unwrap();
        assert_ne!(Some(narrowed), original_acl);
    }
    assert_eq!(device.acl().cloned(), original_acl);
}
