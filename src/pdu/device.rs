use anyhow::{Context as _, Result, anyhow};
use roxmltree::Node;

use crate::pdu::FieldKey;

pub const DEVICE_LABELS: [&str; 2] = ["id", "type"];

/// Identity of one `<device>` element. Every device-level series and every
/// outlet series underneath it carries these labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLabels {
    pub id: String,

    pub r#type: String,
}

impl DeviceLabels {
    pub fn from_node(node: Node<'_, '_>) -> Result<Self> {
        Ok(Self {
            id: attribute(node, "id")?.to_owned(),
            r#type: attribute(node, "type")?.to_owned(),
        })
    }

    pub fn label_values(&self) -> [&str; 2] {
        [&self.id, &self.r#type]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub key: FieldKey,

    pub value: f64,
}

impl Field {
    /// Decodes a `<field key=".." value=".."/>` element. Keys outside
    /// [`FieldKey`] yield `Ok(None)`.
    pub fn from_node(node: Node<'_, '_>) -> Result<Option<Self>> {
        let Ok(key) = attribute(node, "key")?.parse::<FieldKey>() else {
            return Ok(None);
        };

        let value = parse_f64(node, "value")?;

        Ok(Some(Self { key, value }))
    }
}

pub(crate) fn attribute<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| {
        anyhow!(
            "<{}> element is missing attribute: {name}",
            node.tag_name().name()
        )
    })
}

pub(crate) fn parse_f64(node: Node<'_, '_>, name: &str) -> Result<f64> {
    let raw = attribute(node, name)?;
    raw.trim()
        .parse()
        .with_context(|| format!("failed to parse {name}: {raw}"))
}

#[cfg(test)]
mod tests {
    use roxmltree::Document;

    use super::*;

    #[test]
    fn decodes_device_labels() {
        let doc = Document::parse(r#"<device id="1" type="pdu"/>"#).unwrap();
        let labels = DeviceLabels::from_node(doc.root_element()).unwrap();
        assert_eq!(labels.label_values(), ["1", "pdu"]);
    }

    #[test]
    fn device_without_type_is_rejected() {
        let doc = Document::parse(r#"<device id="1"/>"#).unwrap();
        let err = DeviceLabels::from_node(doc.root_element()).unwrap_err();
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn decodes_known_field() {
        let doc = Document::parse(r#"<field key="RealPower-A" value="123.4"/>"#).unwrap();
        let field = Field::from_node(doc.root_element()).unwrap().unwrap();
        assert_eq!(field.key, FieldKey::RealPowerA);
        assert_eq!(field.value, 123.4);
    }

    #[test]
    fn unknown_field_key_is_ignored() {
        let doc = Document::parse(r#"<field key="Foo-Bar" value="oops"/>"#).unwrap();
        assert!(Field::from_node(doc.root_element()).unwrap().is_none());
    }

    #[test]
    fn non_numeric_value_is_an_error() {
        let doc = Document::parse(r#"<field key="Volts-A" value="n/a"/>"#).unwrap();
        assert!(Field::from_node(doc.root_element()).is_err());
    }
}
