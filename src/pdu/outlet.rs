use anyhow::Result;
use roxmltree::Node;

use super::device::{attribute, parse_f64};
use crate::pdu::DeviceLabels;

/// Outlet labels followed by the parent device's labels.
pub const OUTLET_LABELS: [&str; 5] = ["name", "num", "url", "id", "type"];

#[derive(Debug, Clone, PartialEq)]
pub struct Outlet {
    pub name: String,

    pub num: String,

    pub url: String,

    pub amps: f64,

    pub kwatthrs: f64,

    pub watts: f64,

    /// Kept raw; an unknown status must not prevent the readings above from
    /// being published.
    pub status: String,
}

impl Outlet {
    pub fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(Self {
            name: attribute(node, "name")?.to_owned(),
            num: attribute(node, "num")?.to_owned(),
            url: attribute(node, "url")?.to_owned(),
            amps: parse_f64(node, "amps")?,
            kwatthrs: parse_f64(node, "kwatthrs")?,
            watts: parse_f64(node, "watts")?,
            status: attribute(node, "status")?.to_owned(),
        })
    }

    pub fn label_values<'a>(&'a self, device: &'a DeviceLabels) -> [&'a str; 5] {
        let [id, r#type] = device.label_values();
        [&self.name, &self.num, &self.url, id, r#type]
    }
}
