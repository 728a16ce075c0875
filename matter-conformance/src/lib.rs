pub mod acl;
pub mod controller;
pub mod device_types;
pub mod error;
pub mod findings;
pub mod mapping;
pub mod probe;
pub mod self_check;
pub mod snapshot;

pub use acl::{narrowed_acl, with_narrowed_acl, AclGuard};
pub use controller::{CommandRequest, DeviceController, ProtocolError, StatusCode};
pub use device_types::{check_device_type_conformance, validate_device_types, SIMPLE_DEVICE_TYPES};
pub use error::ConformanceError;
pub use findings::{Constraint, Element, Finding, Skipped, ValidationReport};
pub use mapping::{generate_pics, PicsGeneration};
pub use probe::{probe_accepted_commands, TIMED_INVOKE_TIMEOUT_MS};
pub use self_check::{check_declared_lists, check_self_consistency};
pub use snapshot::{SnapshotDevice, SnapshotError};
