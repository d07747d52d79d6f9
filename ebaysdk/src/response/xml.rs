//! XML payload normalization.
//!
//! Converts a legacy API response into a [`ReplyNode`]:
//!
//! - namespaces and `xmlns` declarations are dropped,
//! - attributes become `_name` keys and the element text moves to `value`,
//! - repeated elements become lists, as do registered list nodes,
//! - registered date-like nodes are parsed into timestamps,
//! - empty elements become [`ReplyNode::Null`].

use std::collections::BTreeSet;

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use super::tree::{ReplyNode, parse_timestamp};
use crate::error::{EbayError, Result};

/// Node name sets that shape the reply tree.
///
/// Both sets hold lowercase names. Date-like nodes match the element name;
/// list nodes match the dotted path starting at the root element, such as
/// `finditemsadvancedresponse.searchresult.item`.
#[derive(Debug, Clone, Default)]
pub struct NodeRules {
    datetime_nodes: BTreeSet<String>,
    list_nodes: BTreeSet<String>,
}

impl NodeRules {
    /// Creates rules from element names and dotted list paths.
    #[must_use]
    pub fn new<D, L>(datetime_nodes: D, list_nodes: L) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        Self {
            datetime_nodes: datetime_nodes
                .into_iter()
                .map(|n| n.as_ref().to_ascii_lowercase())
                .collect(),
            list_nodes: list_nodes.into_iter().map(|n| n.as_ref().to_ascii_lowercase()).collect(),
        }
    }

    /// Adds list node paths.
    pub fn extend_list_nodes<L>(&mut self, list_nodes: L)
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        self.list_nodes.extend(list_nodes.into_iter().map(|n| n.as_ref().to_ascii_lowercase()));
    }

    fn is_datetime(&self, name: &str) -> bool {
        self.datetime_nodes.contains(&name.to_ascii_lowercase())
    }

    fn is_list(&self, path: &str) -> bool {
        self.list_nodes.contains(path)
    }
}

#[derive(Debug, Default)]
struct Frame {
    name: String,
    attributes: Vec<(String, ReplyNode)>,
    children: Vec<(String, ReplyNode)>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();

        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| EbayError::Parse(format!("XML attribute: {e}")))?;
            let key = attribute.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }
            let local = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| EbayError::Parse(format!("XML attribute '{local}': {e}")))?;
            attributes.push((format!("_{local}"), ReplyNode::Text(value.into_owned())));
        }

        Ok(Self { name, attributes, ..Self::default() })
    }

    fn add_child(&mut self, name: String, node: ReplyNode, force_list: bool) {
        if let Some((_, existing)) = self.children.iter_mut().find(|(k, _)| *k == name) {
            match existing {
                ReplyNode::List(items) => items.push(node),
                other => {
                    let first = std::mem::take(other);
                    *other = ReplyNode::List(vec![first, node]);
                }
            }
        } else if force_list {
            self.children.push((name, ReplyNode::List(vec![node])));
        } else {
            self.children.push((name, node));
        }
    }

    fn close(self, rules: &NodeRules) -> (String, ReplyNode) {
        let text = if self.text.is_empty() {
            ReplyNode::Null
        } else if rules.is_datetime(&self.name) {
            match parse_timestamp(&self.text) {
                Some(value) => ReplyNode::DateTime { raw: self.text, value },
                None => ReplyNode::Text(self.text),
            }
        } else {
            ReplyNode::Text(self.text)
        };

        if self.attributes.is_empty() && self.children.is_empty() {
            return (self.name, text);
        }

        let mut entries = self.attributes;
        entries.extend(self.children);
        if let Some((_, child)) = entries.iter_mut().find(|(k, _)| k == "value") {
            // a `<value>` child shares the key with the element's own text
            if !text.is_null() {
                let existing = std::mem::take(child);
                let mut items = vec![text];
                match existing {
                    ReplyNode::List(more) => items.extend(more),
                    other => items.push(other),
                }
                *child = ReplyNode::List(items);
            }
        } else if !text.is_null() || entries.iter().all(|(k, _)| k.starts_with('_')) {
            entries.push(("value".to_owned(), text));
        }
        (self.name, ReplyNode::Map(entries))
    }
}

/// Parses an XML document, returning the root element name and its content.
///
/// # Errors
///
/// Returns [`EbayError::Parse`] for malformed XML or an empty document.
pub fn parse(xml: &[u8], rules: &NodeRules) -> Result<(String, ReplyNode)> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    // Lowercase names of the open elements, root first.
    let mut path: Vec<String> = Vec::new();
    let mut root: Option<(String, ReplyNode)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(start)) => {
                let frame = Frame::open(&start)?;
                path.push(frame.name.to_ascii_lowercase());
                stack.push(frame);
            }
            Ok(Event::Empty(start)) => {
                let frame = Frame::open(&start)?;
                let (name, node) = frame.close(rules);
                if let Some(parent) = stack.last_mut() {
                    path.push(name.to_ascii_lowercase());
                    let force = rules.is_list(&path.join("."));
                    path.pop();
                    parent.add_child(name, node, force);
                } else if root.is_none() {
                    root = Some((name, node));
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(frame) = stack.last_mut() {
                    let text =
                        text.unescape().map_err(|e| EbayError::Parse(format!("XML text: {e}")))?;
                    frame.text.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                let Some(frame) = stack.pop() else {
                    return Err(EbayError::Parse("unbalanced XML end tag".to_owned()));
                };
                let (name, node) = frame.close(rules);
                let force = rules.is_list(&path.join("."));
                path.pop();
                if let Some(parent) = stack.last_mut() {
                    parent.add_child(name, node, force);
                } else if root.is_none() {
                    root = Some((name, node));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(EbayError::Parse(format!(
                    "XML error at position {}: {e}",
                    reader.error_position()
                )));
            }
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(EbayError::Parse("XML document ended inside an element".to_owned()));
    }
    root.ok_or_else(|| EbayError::Parse("empty XML document".to_owned()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const FINDING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<findItemsAdvancedResponse xmlns="http://www.ebay.com/marketplace/search/v1/services">
  <ack>Success</ack>
  <version>1.13.0</version>
  <timestamp>2024-05-01T12:00:00.000Z</timestamp>
  <searchResult count="1">
    <item>
      <itemId>1234</itemId>
      <title>Python &amp; Rust</title>
      <sellingStatus>
        <currentPrice currencyId="USD">9.99</currentPrice>
      </sellingStatus>
      <listingInfo>
        <startTime>2024-04-01T08:00:00.000Z</startTime>
        <endTime>bad date</endTime>
      </listingInfo>
    </item>
  </searchResult>
</findItemsAdvancedResponse>"#;

    fn finding_rules() -> NodeRules {
        NodeRules::new(
            ["timestamp", "starttime", "endtime"],
            ["findItemsAdvancedResponse.searchResult.item"],
        )
    }

    #[test]
    fn test_root_is_stripped() {
        let (root, node) = parse(FINDING.as_bytes(), &finding_rules()).unwrap();
        assert_eq!(root, "findItemsAdvancedResponse");
        assert_eq!(node["ack"].as_str(), Some("Success"));
        assert!(node.get("findItemsAdvancedResponse").is_none());
    }

    #[test]
    fn test_forced_list_node() {
        let (_, node) = parse(FINDING.as_bytes(), &finding_rules()).unwrap();
        let items = node["searchResult"]["item"].as_list().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            node.get("searchResult.item.0.title").and_then(ReplyNode::as_str),
            Some("Python & Rust")
        );
    }

    #[test]
    fn test_single_element_without_rule_is_not_a_list() {
        let (_, node) = parse(FINDING.as_bytes(), &NodeRules::default()).unwrap();
        assert!(node["searchResult"]["item"].as_map().is_some());
    }

    #[test]
    fn test_attributes_and_value() {
        let (_, node) = parse(FINDING.as_bytes(), &finding_rules()).unwrap();
        let price = node.get("searchResult.item.0.sellingStatus.currentPrice").unwrap();
        assert_eq!(price.to_value(), json!({ "_currencyId": "USD", "value": "9.99" }));
        assert_eq!(node["searchResult"]["_count"].as_str(), Some("1"));
    }

    #[test]
    fn test_datetime_nodes() {
        let (_, node) = parse(FINDING.as_bytes(), &finding_rules()).unwrap();
        assert!(node["timestamp"].as_datetime().is_some());
        let listing = node.get("searchResult.item.0.listingInfo").unwrap();
        assert!(listing["startTime"].as_datetime().is_some());
        assert!(listing["endTime"].as_datetime().is_none());
        assert_eq!(listing["endTime"].as_str(), Some("bad date"));
    }

    #[test]
    fn test_repeated_elements_become_list() {
        let xml = b"<R><Errors><Code>1</Code></Errors><Errors><Code>2</Code></Errors><Errors><Code>3</Code></Errors></R>";
        let (_, node) = parse(xml, &NodeRules::default()).unwrap();
        assert_eq!(node["Errors"].as_list().map(<[ReplyNode]>::len), Some(3));
        assert_eq!(node["Errors"][2]["Code"].as_str(), Some("3"));
    }

    #[test]
    fn test_empty_elements_are_null() {
        let xml = b"<R><a/><b></b><c x=\"1\"/></R>";
        let (_, node) = parse(xml, &NodeRules::default()).unwrap();
        assert!(node["a"].is_null());
        assert!(node["b"].is_null());
        assert_eq!(node["c"].to_value(), json!({ "_x": "1", "value": null }));
    }

    #[test]
    fn test_namespace_prefixes_are_stripped() {
        let xml = br#"<soap:Envelope xmlns:soap="urn:x"><soap:Body><ns:Ack xmlns:ns="urn:y">Success</ns:Ack></soap:Body></soap:Envelope>"#;
        let (root, node) = parse(xml, &NodeRules::default()).unwrap();
        assert_eq!(root, "Envelope");
        assert_eq!(node["Body"]["Ack"].as_str(), Some("Success"));
    }

    #[test]
    fn test_text_next_to_value_child_keeps_both() {
        let xml = br#"<R><Ack>Success</Ack><Spec unit="cm">12<value>x</value></Spec></R>"#;
        let (_, node) = parse(xml, &NodeRules::default()).unwrap();
        let dict = node.to_value();

        assert_eq!(dict["Spec"], json!({ "_unit": "cm", "value": ["12", "x"] }));
        for path in ["Spec.value", "Spec.value.0", "Spec.value.1", "Spec._unit"] {
            let from_tree = node.get(path).map(ReplyNode::to_value);
            let from_dict = dict.pointer(&format!("/{}", path.replace('.', "/"))).cloned();
            assert_eq!(from_tree, from_dict, "{path}");
        }
    }

    #[test]
    fn test_value_child_without_text_is_untouched() {
        let xml = b"<R><Spec unit=\"cm\"><value>x</value></Spec></R>";
        let (_, node) = parse(xml, &NodeRules::default()).unwrap();
        assert_eq!(node["Spec"].to_value(), json!({ "_unit": "cm", "value": "x" }));
    }

    #[test]
    fn test_cdata() {
        let xml = b"<R><Description><![CDATA[<b>bold</b>]]></Description></R>";
        let (_, node) = parse(xml, &NodeRules::default()).unwrap();
        assert_eq!(node["Description"].as_str(), Some("<b>bold</b>"));
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse(b"<R><a></b></R>", &NodeRules::default()).unwrap_err();
        assert!(matches!(err, EbayError::Parse(_)));
    }

    #[test]
    fn test_unterminated_document() {
        assert!(parse(b"<R><a>1</a>", &NodeRules::default()).is_err());
    }

    #[test]
    fn test_empty_document() {
        assert!(parse(b"", &NodeRules::default()).is_err());
    }

    #[test]
    fn test_list_rule_for_nested_path() {
        let xml = b"<R><ItemArray><Item><ItemID>1</ItemID></Item></ItemArray></R>";
        let rules = NodeRules::new(Vec::<String>::new(), ["R.ItemArray.Item"]);
        let (_, node) = parse(xml, &rules).unwrap();
        assert_eq!(node["ItemArray"]["Item"][0]["ItemID"].as_str(), Some("1"));
    }
}
