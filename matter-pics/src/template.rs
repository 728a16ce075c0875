//! PICS XML deserialization model.
//!
//! Read-only view of a PICS template or output document. Annotation does not
//! go through this model (see [`crate::annotator`]) so that comments and
//! layout survive a rewrite.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename = "clusterPICS")]
pub struct ClusterPics {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "picsRoot", default)]
    pub pics_root: Option<String>,
    #[serde(default)]
    pub usage: Option<ItemList>,
    #[serde(rename = "clusterSide", default)]
    pub sides: Vec<ClusterSide>,
}

// Wrapper type for every picsItem container
#[derive(Debug, Default, Deserialize)]
pub struct ItemList {
    #[serde(rename = "picsItem", default)]
    pub items: Vec<PicsItem>,
}

#[derive(Debug, Deserialize)]
pub struct ClusterSide {
    #[serde(rename = "@type")]
    pub side_type: String,
    #[serde(default)]
    pub features: Option<ItemList>,
    #[serde(default)]
    pub attributes: Option<ItemList>,
    #[serde(rename = "commandsReceived", default)]
    pub commands_received: Option<ItemList>,
    #[serde(rename = "commandsGenerated", default)]
    pub commands_generated: Option<ItemList>,
    #[serde(alias = "Events", default)]
    pub events: Option<ItemList>,
}

#[derive(Debug, Deserialize)]
pub struct PicsItem {
    #[serde(rename = "itemNumber")]
    pub item_number: String,
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub support: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Status {
    #[serde(rename = "@cond", default)]
    pub cond: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: Option<String>,
}

impl PicsItem {
    pub fn is_supported(&self) -> bool {
        self.support.as_deref().is_some_and(|s| s.trim() == "true")
    }
}

impl ClusterSide {
    /// Sections in document order, with their element names.
    pub fn sections(&self) -> [(&'static str, Option<&ItemList>); 5] {
        [
            ("features", self.features.as_ref()),
            ("attributes", self.attributes.as_ref()),
            ("commandsReceived", self.commands_received.as_ref()),
            ("commandsGenerated", self.commands_generated.as_ref()),
            ("events", self.events.as_ref()),
        ]
    }
}

impl ClusterPics {
    /// The side whose `type` attribute matches, ignoring case.
    pub fn side(&self, side_type: &str) -> Option<&ClusterSide> {
        self.sides
            .iter()
            .find(|s| s.side_type.eq_ignore_ascii_case(side_type))
    }

    /// Every item number marked `true`, in document order.
    pub fn supported_items(&self) -> Vec<&str> {
        let usage = self.usage.iter().flat_map(|u| u.items.iter());
        let sides = self
            .sides
            .iter()
            .flat_map(|s| s.sections().into_iter().filter_map(|(_, list)| list))
            .flat_map(|list| list.items.iter());
        usage
            .chain(sides)
            .filter(|item| item.is_supported())
            .map(|item| item.item_number.trim())
            .collect()
    }
}

/// Parse PICS XML text.
pub fn parse_cluster_pics(xml: &str) -> Result<ClusterPics, quick_xml::DeError> {
    quick_xml::de::from_str(xml)
}
