//! Command discovery by invocation.

use matter_model::{ClusterSchema, CommandId, EndpointId};
use std::collections::BTreeSet;

use crate::controller::{CommandRequest, DeviceController, ProtocolError, StatusCode};

/// Timed-request timeout used for commands that require a timed invoke.
pub const TIMED_INVOKE_TIMEOUT_MS: u16 = 10;

/// Invoke every client-to-server command of `cluster` on `endpoint`.
///
/// Must run with the ACL narrowed. A command counts as implemented only when
/// the device answers `UnsupportedAccess`: it recognised the command and
/// refused it on access grounds. Any other status, including `Success`, does
/// not add it.
pub fn probe_accepted_commands<C: DeviceController + ?Sized>(
    controller: &mut C,
    endpoint: EndpointId,
    cluster: &ClusterSchema,
) -> Result<BTreeSet<CommandId>, ProtocolError> {
    let mut accepted = BTreeSet::new();
    for command in cluster.client_to_server_commands() {
        let request = CommandRequest {
            endpoint,
            cluster: cluster.id,
            command: command.id,
            timed_timeout_ms: command.timed.then_some(TIMED_INVOKE_TIMEOUT_MS),
        };
        let status = controller.invoke_command(&request)?;
        log::debug!(
            "Endpoint {endpoint}, {} {} ({:#04x}): {status}",
            cluster.name,
            command.name,
            command.id
        );
        if status == StatusCode::UnsupportedAccess {
            accepted.insert(command.id);
        }
    }
    Ok(accepted)
}
