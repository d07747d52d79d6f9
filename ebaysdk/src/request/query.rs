//! Query string encoding for REST calls.

use serde_json::{Map, Value};
use url::Url;

use super::xml::kind;
use crate::error::{EbayError, Result};

/// Flattens parameters into query pairs.
///
/// Nulls are skipped, booleans render as `true`/`false`, and arrays of
/// scalars are joined with `,`. Keys listed in `skip` are left out.
///
/// # Errors
///
/// Returns [`EbayError::InvalidParameter`] for nested mappings and for arrays
/// holding anything but scalars.
pub fn query_pairs(params: &Map<String, Value>, skip: &[&str]) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        if skip.contains(&key.as_str()) {
            continue;
        }
        match value {
            Value::Null => {}
            Value::Array(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Null => {}
                        Value::Array(_) | Value::Object(_) => {
                            return Err(EbayError::InvalidParameter(format!(
                                "query parameter '{key}' holds {}",
                                kind(item)
                            )));
                        }
                        scalar => parts.push(scalar_to_string(scalar)),
                    }
                }
                pairs.push((key.clone(), parts.join(",")));
            }
            Value::Object(_) => {
                return Err(EbayError::InvalidParameter(format!(
                    "query parameter '{key}' cannot be a mapping"
                )));
            }
            scalar => pairs.push((key.clone(), scalar_to_string(scalar))),
        }
    }
    Ok(pairs)
}

/// Appends query pairs to a URL, percent-encoding keys and values.
pub fn append_query(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        return;
    }
    let mut query = url.query_pairs_mut();
    for (key, value) in pairs {
        query.append_pair(key, value);
    }
}

/// Renders a scalar parameter the way it appears in a URL.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
