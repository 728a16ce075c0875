//! Decoded attribute values as delivered by the device controller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An already-decoded attribute value.
///
/// Structs are keyed by field name (`deviceType`, `revision`, `targets`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum AttributeValue {
    #[default]
    Null,
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
    List(Vec<AttributeValue>),
    Struct(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AttributeValue::Unsigned(v) => Some(*v),
            AttributeValue::Signed(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, AttributeValue>> {
        match self {
            AttributeValue::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Field lookup on a struct value; `None` for non-structs or missing fields.
    pub fn field(&self, name: &str) -> Option<&AttributeValue> {
        self.as_struct().and_then(|fields| fields.get(name))
    }

    /// Interpret a list of unsigned integers as a list of ids.
    ///
    /// Returns `None` if the value is not a list or an element does not fit in
    /// `T`.
    pub fn as_id_list<T: TryFrom<u64>>(&self) -> Option<Vec<T>> {
        self.as_list()?
            .iter()
            .map(|item| item.as_u64().and_then(|v| T::try_from(v).ok()))
            .collect()
    }

    /// Build a list value from ids.
    pub fn id_list<T: Into<u64> + Copy>(ids: &[T]) -> Self {
        AttributeValue::List(ids.iter().map(|id| AttributeValue::Unsigned((*id).into())).collect())
    }

    /// Build a struct value from `(name, value)` pairs.
    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, AttributeValue)>,
        K: Into<String>,
    {
        AttributeValue::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<u64> for AttributeValue {
    fn from(v: u64) -> Self {
        AttributeValue::Unsigned(v)
    }
}

impl From<u32> for AttributeValue {
    fn from(v: u32) -> Self {
        AttributeValue::Unsigned(u64::from(v))
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_maps_to_variants() {
        let v: AttributeValue =
            serde_json::from_str(r#"{"deviceType": 256, "revision": 2, "label": null}"#).unwrap();
        assert_eq!(v.field("deviceType").and_then(AttributeValue::as_u64), Some(256));
        assert!(v.field("label").unwrap().is_null());
    }

    #[test]
    fn id_list_rejects_out_of_range() {
        let v = AttributeValue::id_list(&[1u64, 70_000]);
        assert_eq!(v.as_id_list::<u32>(), Some(vec![1, 70_000]));
        assert_eq!(v.as_id_list::<u16>(), None);
    }

    #[test]
    fn negative_signed_is_not_unsigned() {
        assert_eq!(AttributeValue::Signed(-1).as_u64(), None);
        assert_eq!(AttributeValue::Signed(7).as_u64(), Some(7));
    }
}
