//! Access-control narrowing for command probing.
//!
//! While probing, the first ACL entry is restricted to the AccessControl
//! cluster itself, so every other command the device implements answers
//! `UnsupportedAccess`. The original list is written back when the
//! [`AclGuard`] is released or dropped.

use matter_model::{AttributeValue, ACCESS_CONTROL_ACL, ACCESS_CONTROL_CLUSTER, ROOT_ENDPOINT};

use crate::controller::{DeviceController, ProtocolError};
use crate::error::ConformanceError;

/// Copy of `original` whose first entry only targets the AccessControl
/// cluster, on any endpoint and device type.
pub fn narrowed_acl(original: &AttributeValue) -> Result<AttributeValue, ConformanceError> {
    let entries = original
        .as_list()
        .ok_or_else(|| ConformanceError::InvalidAcl("ACL attribute is not a list".into()))?;
    let Some((first, rest)) = entries.split_first() else {
        return Err(ConformanceError::InvalidAcl("ACL has no entries".into()));
    };
    let mut first = first
        .as_struct()
        .ok_or_else(|| ConformanceError::InvalidAcl("ACL entry is not a struct".into()))?
        .clone();

    let target = AttributeValue::structure([
        ("cluster", AttributeValue::from(ACCESS_CONTROL_CLUSTER)),
        ("endpoint", AttributeValue::Null),
        ("deviceType", AttributeValue::Null),
    ]);
    first.insert("targets".to_string(), AttributeValue::List(vec![target]));

    let mut narrowed = Vec::with_capacity(entries.len());
    narrowed.push(AttributeValue::Struct(first));
    narrowed.extend(rest.iter().cloned());
    Ok(AttributeValue::List(narrowed))
}

/// Holds the device's ACL narrowed until released.
///
/// [`AclGuard::release`] reports a failed revert. If the guard is dropped
/// without being released (early return, panic), the revert is attempted in
/// `Drop` and a failure is logged.
pub struct AclGuard<'a, C: DeviceController + ?Sized> {
    controller: &'a mut C,
    original: Option<AttributeValue>,
}

impl<'a, C: DeviceController + ?Sized> AclGuard<'a, C> {
    /// Read the ACL, write the narrowed copy and keep the original for the
    /// revert.
    pub fn narrow(controller: &'a mut C) -> Result<Self, ConformanceError> {
        let original = controller.read_attribute(ROOT_ENDPOINT, ACCESS_CONTROL_CLUSTER, ACCESS_CONTROL_ACL)?;
        let narrowed = narrowed_acl(&original)?;
        controller.write_attribute(ROOT_ENDPOINT, ACCESS_CONTROL_CLUSTER, ACCESS_CONTROL_ACL, narrowed)?;
        log::debug!("ACL narrowed to the AccessControl cluster");
        Ok(Self {
            controller,
            original: Some(original),
        })
    }

    pub fn controller(&mut self) -> &mut C {
        self.controller
    }

    /// Write the original ACL back.
    pub fn release(mut self) -> Result<(), ProtocolError> {
        self.revert()
    }

    fn revert(&mut self) -> Result<(), ProtocolError> {
        let Some(original) = self.original.take() else {
            return Ok(());
        };
        self.controller
            .write_attribute(ROOT_ENDPOINT, ACCESS_CONTROL_CLUSTER, ACCESS_CONTROL_ACL, original)?;
        log::debug!("ACL restored");
        Ok(())
    }
}

impl<C: DeviceController + ?Sized> Drop for AclGuard<'_, C> {
    fn drop(&mut self) {
        if self.original.is_some() {
            if let Err(e) = self.revert() {
                log::error!("Could not restore the access control list: {e}");
            }
        }
    }
}

/// Run `body` with the ACL narrowed, then restore it whatever `body` returned.
///
/// A failed restore is always reported as [`ConformanceError::AclRevertFailed`],
/// carrying the body's own error when there was one.
pub fn with_narrowed_acl<C, T, F>(controller: &mut C, body: F) -> Result<T, ConformanceError>
where
    C: DeviceController + ?Sized,
    F: FnOnce(&mut C) -> Result<T, ConformanceError>,
{
    let mut guard = AclGuard::narrow(controller)?;
    let result = body(guard.controller());
    match (result, guard.release()) {
        (result, Ok(())) => result,
        (Ok(_), Err(revert)) => Err(ConformanceError::AclRevertFailed { revert, body: None }),
        (Err(e), Err(revert)) => Err(ConformanceError::AclRevertFailed {
            revert,
            body: Some(Box::new(e)),
        }),
    }
}
