//! Parameter mapping to XML encoding for the legacy APIs.
//!
//! ```
//! use ebaysdk::request::xml::{envelope, to_xml};
//! use serde_json::json;
//!
//! let params = json!({
//!     "keywords": "rust",
//!     "itemFilter": [
//!         { "name": "Condition", "value": "Used" },
//!         { "name": "LocatedIn", "value": "US" }
//!     ],
//!     "paginationInput": { "entriesPerPage": 10 },
//!     "sortOrder": { "@attrs": { "kind": "primary" }, "#text": "PricePlusShippingLowest" }
//! });
//!
//! let body = to_xml(&params)?;
//! assert!(body.starts_with("<keywords>rust</keywords><itemFilter><name>Condition</name>"));
//! assert!(body.contains("<sortOrder kind=\"primary\">PricePlusShippingLowest</sortOrder>"));
//!
//! let request = envelope("findItemsAdvanced", "urn:example", &body);
//! assert!(request.contains("<findItemsAdvancedRequest xmlns=\"urn:example\">"));
//! # Ok::<(), ebaysdk::EbayError>(())
//! ```

use quick_xml::escape::escape;
use serde_json::{Map, Value};

use crate::error::{EbayError, Result};

/// Reserved key holding element attributes.
pub const ATTRS_KEY: &str = "@attrs";
/// Reserved key holding element text next to attributes or children.
pub const TEXT_KEY: &str = "#text";

/// Wraps an encoded body in the `{verb}Request` envelope.
#[must_use]
pub fn envelope(verb: &str, namespace: &str, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?><{verb}Request xmlns=\"{}\">{body}</{verb}Request>",
        escape(namespace)
    )
}

/// Encodes a parameter mapping as a sequence of XML elements.
///
/// `Null` encodes to an empty string.
///
/// # Errors
///
/// Returns [`EbayError::InvalidParameter`] if the top level is not a mapping,
/// a key is not a valid XML name, arrays are nested, or `@attrs`/`#text`
/// hold non-scalar values.
pub fn to_xml(params: &Value) -> Result<String> {
    match params {
        Value::Null => Ok(String::new()),
        Value::Object(map) => map_to_xml(map),
        other => Err(EbayError::InvalidParameter(format!(
            "parameters must be a mapping, got {}",
            kind(other)
        ))),
    }
}

/// Encodes the entries of a mapping as a sequence of XML elements.
///
/// # Errors
///
/// Same as [`to_xml`].
pub fn map_to_xml(map: &Map<String, Value>) -> Result<String> {
    let mut out = String::new();
    write_children(&mut out, map)?;
    Ok(out)
}

fn write_children(out: &mut String, map: &Map<String, Value>) -> Result<()> {
    for (name, value) in map {
        if name == ATTRS_KEY || name == TEXT_KEY {
            continue;
        }
        write_element(out, name, value)?;
    }
    Ok(())
}

fn write_element(out: &mut String, name: &str, value: &Value) -> Result<()> {
    validate_name(name)?;
    match value {
        Value::Array(items) => {
            for item in items {
                if item.is_array() {
                    return Err(EbayError::InvalidParameter(format!(
                        "'{name}' contains a nested array"
                    )));
                }
                write_single(out, name, item)?;
            }
            Ok(())
        }
        _ => write_single(out, name, value),
    }
}

fn write_single(out: &mut String, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Null => {
            out.push('<');
            out.push_str(name);
            out.push_str("/>");
        }
        Value::Object(map) => {
            out.push('<');
            out.push_str(name);
            if let Some(attrs) = map.get(ATTRS_KEY) {
                write_attributes(out, name, attrs)?;
            }
            out.push('>');
            if let Some(text) = map.get(TEXT_KEY) {
                let text = scalar_text(text).ok_or_else(|| {
                    EbayError::InvalidParameter(format!("'{name}.{TEXT_KEY}' must be a scalar"))
                })?;
                out.push_str(&escape(text.as_str()));
            }
            write_children(out, map)?;
            close(out, name);
        }
        Value::Array(_) => {
            return Err(EbayError::InvalidParameter(format!("'{name}' contains a nested array")));
        }
        scalar => {
            out.push('<');
            out.push_str(name);
            out.push('>');
            if let Some(text) = scalar_text(scalar) {
                out.push_str(&escape(text.as_str()));
            }
            close(out, name);
        }
    }
    Ok(())
}

fn write_attributes(out: &mut String, name: &str, attrs: &Value) -> Result<()> {
    let Value::Object(attrs) = attrs else {
        return Err(EbayError::InvalidParameter(format!("'{name}.{ATTRS_KEY}' must be a mapping")));
    };
    for (key, value) in attrs {
        validate_name(key)?;
        let text = scalar_text(value).ok_or_else(|| {
            EbayError::InvalidParameter(format!("attribute '{name}@{key}' must be a scalar"))
        })?;
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(text.as_str()));
        out.push('"');
    }
    Ok(())
}

fn close(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Checks that `name` can be used as an element or attribute name.
///
/// # Errors
///
/// Returns [`EbayError::InvalidParameter`] for names that are empty, do not
/// start with an ASCII letter or `_`, or contain characters other than ASCII
/// letters, digits, `_`, `-` and `.`.
pub fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(EbayError::InvalidParameter(format!("'{name}' is not a valid XML name")))
    }
}

pub(crate) const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_scalars() {
        let xml = to_xml(&json!({ "a": "x", "b": 3, "c": 1.5, "d": true, "e": null })).unwrap();
        assert_eq!(xml, "<a>x</a><b>3</b><c>1.5</c><d>true</d><e/>");
    }

    #[test]
    fn test_escaping() {
        let xml = to_xml(&json!({ "keywords": "<Rust> & \"Python\"" })).unwrap();
        assert_eq!(xml, "<keywords>&lt;Rust&gt; &amp; &quot;Python&quot;</keywords>");
    }

    #[test]
    fn test_arrays_repeat_element() {
        let xml = to_xml(&json!({ "ItemID": ["1", "2"] })).unwrap();
        assert_eq!(xml, "<ItemID>1</ItemID><ItemID>2</ItemID>");
    }

    #[test]
    fn test_empty_array_writes_nothing() {
        assert_eq!(to_xml(&json!({ "ItemID": [] })).unwrap(), "");
    }

    #[test]
    fn test_nested_objects_keep_order() {
        let xml = to_xml(&json!({
            "Item": {
                "Title": "t",
                "StartPrice": { "@attrs": { "currencyID": "USD" }, "#text": 9.5 }
            }
        }))
        .unwrap();
        assert_eq!(
            xml,
            "<Item><Title>t</Title><StartPrice currencyID=\"USD\">9.5</StartPrice></Item>"
        );
    }

    #[test]
    fn test_attributes_with_children() {
        let xml =
            to_xml(&json!({ "outputSelector": { "@attrs": { "id": 1 }, "name": "x" } })).unwrap();
        assert_eq!(xml, "<outputSelector id=\"1\"><name>x</name></outputSelector>");
    }

    #[test]
    fn test_null_and_empty_mapping() {
        assert_eq!(to_xml(&Value::Null).unwrap(), "");
        assert_eq!(to_xml(&json!({})).unwrap(), "");
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        let err = to_xml(&json!(["a"])).unwrap_err();
        assert!(matches!(err, EbayError::InvalidParameter(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_nested_arrays_rejected() {
        assert!(to_xml(&json!({ "a": [[1, 2]] })).is_err());
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(to_xml(&json!({ "1abc": "x" })).is_err());
        assert!(to_xml(&json!({ "a b": "x" })).is_err());
        assert!(to_xml(&json!({ "": "x" })).is_err());
        assert!(to_xml(&json!({ "a": { "@attrs": { "bad name": 1 } } })).is_err());
    }

    #[test]
    fn test_non_scalar_attrs_rejected() {
        assert!(to_xml(&json!({ "a": { "@attrs": "x" } })).is_err());
        assert!(to_xml(&json!({ "a": { "@attrs": { "k": [1] } } })).is_err());
        assert!(to_xml(&json!({ "a": { "#text": { "k": 1 } } })).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("findItemsAdvanced").is_ok());
        assert!(validate_name("_private.x-y").is_ok());
        assert!(validate_name("-x").is_err());
    }

    #[test]
    fn test_envelope() {
        let xml = envelope("GetItem", "urn:ebay:apis:eBLBaseComponents", "<ItemID>1</ItemID>");
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><GetItemRequest \
             xmlns=\"urn:ebay:apis:eBLBaseComponents\"><ItemID>1</ItemID></GetItemRequest>"
        );
    }
}
