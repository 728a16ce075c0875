use matter_model::TreeError;
use matter_pics::PicsError;
use thiserror::Error;

use crate::controller::ProtocolError;
use crate::snapshot::SnapshotError;

#[derive(Debug, Error)]
pub enum ConformanceError {
    #[error("device communication failed: {0}")]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("unusable access control list: {0}")]
    InvalidAcl(String),
    /// The original ACL could not be written back. `body` holds the error the
    /// guarded work failed with, if it failed too.
    #[error("restoring the access control list failed: {revert}{}", after_body(.body))]
    AclRevertFailed {
        revert: ProtocolError,
        body: Option<Box<ConformanceError>>,
    },
    #[error(transparent)]
    Pics(#[from] PicsError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

fn after_body(body: &Option<Box<ConformanceError>>) -> String {
    match body {
        Some(e) => format!(" (probing had already failed: {e})"),
        None => String::new(),
    }
}
