//! Navigable reply tree.
//!
//! Both XML and JSON payloads are normalized into a [`ReplyNode`]. Nodes are
//! addressed with dotted paths; list elements are addressed by index:
//!
//! ```
//! use ebaysdk::response::ReplyNode;
//! use serde_json::json;
//!
//! let reply = ReplyNode::from_value(json!({
//!     "searchResult": { "item": [{ "title": "Raspberry Pi 5" }] }
//! }));
//!
//! let title = reply.get("searchResult.item.0.title").and_then(|n| n.as_str());
//! assert_eq!(title, Some("Raspberry Pi 5"));
//! assert_eq!(reply["searchResult"]["item"][0]["title"].as_str(), Some("Raspberry Pi 5"));
//! assert!(reply["missing"].is_null());
//! ```

use std::{fmt, ops::Index};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Number, Value};

static NULL: ReplyNode = ReplyNode::Null;

/// Application-level acknowledgement reported by legacy APIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ack {
    /// The call succeeded.
    Success,
    /// The call succeeded with warnings.
    Warning,
    /// The call failed.
    Failure,
    /// Part of the call failed.
    PartialFailure,
    /// Any value this SDK does not know about.
    Other(String),
}

impl Ack {
    /// Parses an `ack` value; unknown values are kept verbatim.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "Success" => Self::Success,
            "Warning" => Self::Warning,
            "Failure" => Self::Failure,
            "PartialFailure" => Self::PartialFailure,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns `true` for `Success` and `Warning`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::Warning)
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Warning => f.write_str("Warning"),
            Self::Failure => f.write_str("Failure"),
            Self::PartialFailure => f.write_str("PartialFailure"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

/// One node of a normalized reply.
///
/// Maps keep the document order of their keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReplyNode {
    /// Empty element or JSON `null`.
    #[default]
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number.
    Number(Number),
    /// Text content.
    Text(String),
    /// Text content parsed as a timestamp.
    DateTime {
        /// Text as it appeared in the payload.
        raw: String,
        /// Parsed value.
        value: DateTime<Utc>,
    },
    /// Repeated elements or a JSON array.
    List(Vec<ReplyNode>),
    /// Element children or a JSON object.
    Map(Vec<(String, ReplyNode)>),
}

impl ReplyNode {
    /// Converts a JSON value into a reply tree.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_value).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from_value(v))).collect())
            }
        }
    }

    /// Returns the plain mapping view of the tree.
    ///
    /// Timestamps are rendered as the text they were parsed from.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Text(s) | Self::DateTime { raw: s, .. } => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            Self::Map(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, node) in entries {
                    map.insert(key.clone(), node.to_value());
                }
                Value::Object(map)
            }
        }
    }

    /// Looks up a dotted path such as `searchResult.item.0.title`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Self> {
        if path.is_empty() {
            return Some(self);
        }
        path.split('.').try_fold(self, |node, segment| node.child(segment))
    }

    /// Returns a direct child by key, or a list item by index.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Self::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Reads the `ack`/`Ack` child of this node.
    #[must_use]
    pub fn ack(&self) -> Option<Ack> {
        self.child("ack").or_else(|| self.child("Ack")).and_then(Self::as_str).map(Ack::parse)
    }

    /// Returns `true` for [`ReplyNode::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns text content; timestamps yield their original text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::DateTime { raw: s, .. } => Some(s),
            _ => None,
        }
    }

    /// Returns the parsed timestamp of a date-like node.
    #[must_use]
    pub const fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Returns list items.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns map entries in document order.
    #[must_use]
    pub fn as_map(&self) -> Option<&[(String, Self)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns a boolean from a JSON boolean or `true`/`false` text.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Returns a number from a JSON number or numeric text.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns an integer from a JSON number or numeric text.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Iterates over list items, or over the node itself when it is not a list.
    ///
    /// Useful for nodes that are not registered as list nodes.
    pub fn iter(&self) -> impl Iterator<Item = &Self> {
        let items: &[Self] = match self {
            Self::List(items) => items,
            Self::Null => &[],
            other => std::slice::from_ref(other),
        };
        items.iter()
    }
}

impl Index<&str> for ReplyNode {
    type Output = Self;

    fn index(&self, key: &str) -> &Self::Output {
        self.child(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for ReplyNode {
    type Output = Self;

    fn index(&self, index: usize) -> &Self::Output {
        match self {
            Self::List(items) => items.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

/// Parses the timestamp formats eBay emits.
///
/// Accepts RFC 3339 (`2024-01-15T10:30:00.000Z`) and naive ISO-8601
/// timestamps, which are taken as UTC.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Some(value.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use super::*;

    fn sample() -> ReplyNode {
        ReplyNode::from_value(json!({
            "ack": "Success",
            "searchResult": {
                "_count": "2",
                "item": [
                    { "itemId": "1", "title": "first" },
                    { "itemId": "2", "title": "second" }
                ]
            },
            "total": 2,
            "empty": null
        }))
    }

    #[test]
    fn test_dotted_get() {
        let reply = sample();
        assert_eq!(
            reply.get("searchResult.item.1.title").and_then(ReplyNode::as_str),
            Some("second")
        );
        assert_eq!(reply.get("searchResult._count").and_then(ReplyNode::as_i64), Some(2));
        assert!(reply.get("searchResult.item.5").is_none());
        assert!(reply.get("searchResult.item.title").is_none());
    }

    #[test]
    fn test_empty_path_is_self() {
        let reply = sample();
        assert_eq!(reply.get(""), Some(&reply));
    }

    #[test]
    fn test_index_missing_is_null() {
        let reply = sample();
        assert!(reply["nope"]["deeper"][3].is_null());
        assert_eq!(reply["total"].as_i64(), Some(2));
    }

    #[test]
    fn test_ack() {
        assert_eq!(sample().ack(), Some(Ack::Success));
        let upper = ReplyNode::from_value(json!({ "Ack": "Failure" }));
        assert_eq!(upper.ack(), Some(Ack::Failure));
        assert_eq!(ReplyNode::Null.ack(), None);
    }

    #[test]
    fn test_ack_parse() {
        assert_eq!(Ack::parse("PartialFailure"), Ack::PartialFailure);
        assert_eq!(Ack::parse("Bogus"), Ack::Other("Bogus".to_owned()));
        assert!(Ack::Warning.is_success());
        assert!(!Ack::Failure.is_success());
        assert_eq!(Ack::PartialFailure.to_string(), "PartialFailure");
    }

    #[test]
    fn test_to_value_matches_source() {
        let value = json!({ "a": [1, "two", null, true], "b": { "c": "d" } });
        assert_eq!(ReplyNode::from_value(value.clone()).to_value(), value);
    }

    #[test]
    fn test_to_value_keeps_document_order() {
        let node = ReplyNode::Map(vec![
            ("zeta".to_owned(), ReplyNode::Text("1".to_owned())),
            ("alpha".to_owned(), ReplyNode::Text("2".to_owned())),
        ]);
        assert_eq!(node.to_value(), json!({ "zeta": "1", "alpha": "2" }));
    }

    #[test]
    fn test_datetime_node() {
        let value = parse_timestamp("2024-01-15T10:30:00.000Z").unwrap();
        let node = ReplyNode::DateTime { raw: "2024-01-15T10:30:00.000Z".to_owned(), value };
        assert_eq!(node.as_str(), Some("2024-01-15T10:30:00.000Z"));
        assert_eq!(node.as_datetime().map(|d| d.hour()), Some(10));
        assert_eq!(node.to_value(), json!("2024-01-15T10:30:00.000Z"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("2024-03-01T00:00:00Z").map(|d| d.month()), Some(3));
        assert_eq!(parse_timestamp("2024-03-01T12:00:00+02:00").map(|d| d.hour()), Some(10));
        assert_eq!(parse_timestamp("2024-03-01T12:00:00.123").map(|d| d.day()), Some(1));
        assert_eq!(parse_timestamp("2024-03-01 12:00:00").map(|d| d.year()), Some(2024));
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_iter_single_and_list() {
        let reply = sample();
        assert_eq!(reply["searchResult"]["item"].iter().count(), 2);
        assert_eq!(reply["total"].iter().count(), 1);
        assert_eq!(reply["empty"].iter().count(), 0);
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(ReplyNode::Text("true".to_owned()).as_bool(), Some(true));
        assert_eq!(ReplyNode::Bool(false).as_bool(), Some(false));
        assert_eq!(ReplyNode::Text("yes".to_owned()).as_bool(), None);
    }
}
