//! Response unwrapping
//!
//! The backend answers with several success envelopes. They are resolved
//! here, in a fixed order, into plain values:
//!
//! - lists: bare array, then `data`, `items`, `documents`, else empty
//! - totals: `meta.total`, `meta.totalCount`, `totalCount`, else list length
//! - single values: `{data: ...}` or the body itself
//! - proxy documents: `{document_id, data}` becomes `{id, ...data}`

use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};

/// Known list envelope shapes, in precedence order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListEnvelope<'a> {
    Bare(&'a [Value]),
    Data(&'a [Value]),
    Items(&'a [Value]),
    Documents(&'a [Value]),
    Unrecognized,
}

impl<'a> ListEnvelope<'a> {
    pub fn classify(body: &'a Value) -> Self {
        if let Value::Array(records) = body {
            return ListEnvelope::Bare(records);
        }
        let field = |name: &str| body.get(name).and_then(Value::as_array).map(Vec::as_slice);
        if let Some(records) = field("data") {
            ListEnvelope::Data(records)
        } else if let Some(records) = field("items") {
            ListEnvelope::Items(records)
        } else if let Some(records) = field("documents") {
            ListEnvelope::Documents(records)
        } else {
            ListEnvelope::Unrecognized
        }
    }

    pub fn records(&self) -> &'a [Value] {
        match *self {
            ListEnvelope::Bare(records)
            | ListEnvelope::Data(records)
            | ListEnvelope::Items(records)
            | ListEnvelope::Documents(records) => records,
            ListEnvelope::Unrecognized => &[],
        }
    }
}

/// Known single-value envelope shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SingleEnvelope<'a> {
    /// Proxy document `{document_id, data}`
    Document(&'a Value),
    /// `{data: ...}`
    Data(&'a Value),
    /// The body is the value
    Bare(&'a Value),
}

impl<'a> SingleEnvelope<'a> {
    pub fn classify(body: &'a Value, proxy: bool) -> Self {
        if proxy && is_document_envelope(body) {
            return SingleEnvelope::Document(body);
        }
        match body.get("data") {
            Some(inner) if body.is_object() => SingleEnvelope::Data(inner),
            _ => SingleEnvelope::Bare(body),
        }
    }
}

/// Unwrap a list body; in proxy mode each record is also envelope-unwrapped
pub fn unwrap_list(body: &Value, proxy: bool) -> Vec<Value> {
    ListEnvelope::classify(body)
        .records()
        .iter()
        .map(|record| {
            if proxy && is_document_envelope(record) {
                unwrap_document_envelope(record).unwrap_or(Value::Null)
            } else {
                record.clone()
            }
        })
        .collect()
}

/// Total record count advertised by a list body
pub fn total_count(body: &Value, fallback: u64) -> u64 {
    let meta = body.get("meta");
    meta.and_then(|m| m.get("total"))
        .and_then(as_count)
        .or_else(|| meta.and_then(|m| m.get("totalCount")).and_then(as_count))
        .or_else(|| body.get("totalCount").and_then(as_count))
        .unwrap_or(fallback)
}

/// Unwrap a single-value body; `null` becomes `None`
pub fn unwrap_one(body: &Value, proxy: bool) -> Option<Value> {
    match SingleEnvelope::classify(body, proxy) {
        SingleEnvelope::Document(doc) => unwrap_document_envelope(doc),
        SingleEnvelope::Data(inner) if proxy => unwrap_document_envelope(inner),
        SingleEnvelope::Data(inner) | SingleEnvelope::Bare(inner) => non_null(inner),
    }
}

/// Unwrap the body of a create or update
///
/// A 204 or empty response reaches here as `{}` and, like `null`, means the
/// write succeeded without returning the record.
pub fn unwrap_written(body: &Value, proxy: bool) -> Option<Value> {
    unwrap_one(body, proxy).filter(|value| !matches!(value, Value::Object(map) if map.is_empty()))
}

/// Whether a value looks like `{document_id, data}`
pub fn is_document_envelope(doc: &Value) -> bool {
    doc.get("data").is_some()
        && matches!(doc.get("document_id"), Some(Value::String(_)) | Some(Value::Number(_)))
}

/// Reconstruct `{id: document_id, ...data}` from a proxy document
///
/// A `data` string that is not a JSON object collapses to `{id}`. Values that
/// are not envelopes are returned unchanged.
pub fn unwrap_document_envelope(doc: &Value) -> Option<Value> {
    if !is_document_envelope(doc) {
        return non_null(doc);
    }

    let mut record = Map::new();
    record.insert("id".to_string(), doc["document_id"].clone());

    let fields = match &doc["data"] {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Map::new(),
            Err(e) => {
                tracing::debug!(error = %e, "Document data is not valid JSON; keeping id only");
                Map::new()
            }
        },
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    };
    record.extend(fields);

    Some(Value::Object(record))
}

/// Parse a success body; 204 and empty bodies become `{}`
pub fn parse_body(status: u16, text: &str) -> Result<Value> {
    if status == 204 || text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(text).map_err(|e| {
        Error::new(
            ErrorKind::ServerError,
            format!("Failed to parse response as JSON: {}", e),
        )
        .with_status(status)
    })
}

fn non_null(value: &Value) -> Option<Value> {
    if value.is_null() {
        None
    } else {
        Some(value.clone())
    }
}

fn as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_list_precedence() {
        assert_eq!(unwrap_list(&json!([{"id": 1}]), false), vec![json!({"id": 1})]);
        assert_eq!(
            unwrap_list(&json!({"data": [{"id": 1}], "items": [{"id": 2}]}), false),
            vec![json!({"id": 1})]
        );
        assert_eq!(
            unwrap_list(&json!({"items": [{"id": 2}], "documents": [{"id": 3}]}), false),
            vec![json!({"id": 2})]
        );
        assert_eq!(
            unwrap_list(&json!({"documents": [{"id": 3}]}), false),
            vec![json!({"id": 3})]
        );
        assert!(unwrap_list(&json!({"results": [{"id": 4}]}), false).is_empty());
        assert!(unwrap_list(&json!("nope"), false).is_empty());
    }

    #[test]
    fn test_non_array_data_is_skipped() {
        let body = json!({"data": {"id": 1}, "items": [{"id": 2}]});
        assert!(matches!(ListEnvelope::classify(&body), ListEnvelope::Items(_)));
    }

    #[test]
    fn test_proxy_list_unwraps_documents() {
        let body = json!({"documents": [
            {"document_id": "a", "data": "{\"title\":\"x\"}"},
            {"id": "b", "title": "y"}
        ]});
        assert_eq!(
            unwrap_list(&body, true),
            vec![json!({"id": "a", "title": "x"}), json!({"id": "b", "title": "y"})]
        );
    }

    #[test]
    fn test_total_precedence() {
        assert_eq!(total_count(&json!({"meta": {"total": 5, "totalCount": 6}, "totalCount": 7}), 0), 5);
        assert_eq!(total_count(&json!({"meta": {"totalCount": 6}, "totalCount": 7}), 0), 6);
        assert_eq!(total_count(&json!({"totalCount": 7}), 0), 7);
        assert_eq!(total_count(&json!({"data": []}), 3), 3);
        assert_eq!(total_count(&json!([1, 2]), 2), 2);
    }

    #[test]
    fn test_unwrap_one() {
        assert_eq!(unwrap_one(&json!({"data": {"id": 1}}), false), Some(json!({"id": 1})));
        assert_eq!(unwrap_one(&json!({"id": 1}), false), Some(json!({"id": 1})));
        assert_eq!(unwrap_one(&json!({"data": null}), false), None);
        assert_eq!(unwrap_one(&Value::Null, false), None);
    }

    #[test]
    fn test_unwrap_written_treats_empty_body_as_no_content() {
        assert_eq!(unwrap_written(&json!({}), false), None);
        assert_eq!(unwrap_written(&json!({}), true), None);
        assert_eq!(unwrap_written(&json!({"data": {}}), false), None);
        assert_eq!(unwrap_written(&json!({"data": null}), false), None);
        assert_eq!(unwrap_written(&json!({"id": 1}), false), Some(json!({"id": 1})));
        assert_eq!(
            unwrap_written(&json!({"document_id": "d1", "data": {}}), true),
            Some(json!({"id": "d1"}))
        );
    }

    #[test]
    fn test_unwrap_one_is_idempotent_for_plain_values() {
        for proxy in [false, true] {
            let plain = json!({"id": 9, "title": "plain"});
            let once = unwrap_one(&plain, proxy).unwrap();
            let twice = unwrap_one(&once, proxy).unwrap();
            assert_eq!(once, plain);
            assert_eq!(twice, plain);
        }
    }

    #[test]
    fn test_unwrap_one_proxy_envelopes() {
        let wrapped = json!({"data": {"document_id": 7, "data": {"name": "x"}}});
        assert_eq!(unwrap_one(&wrapped, true), Some(json!({"id": 7, "name": "x"})));

        let bare = json!({"document_id": 7, "data": "{\"name\":\"x\"}"});
        assert_eq!(unwrap_one(&bare, true), Some(json!({"id": 7, "name": "x"})));

        // Outside proxy mode the envelope rule does not apply
        assert_eq!(unwrap_one(&bare, false), Some(json!("{\"name\":\"x\"}")));
    }

    #[test]
    fn test_document_envelope_string_data() {
        let doc = json!({"document_id": 7, "data": "{\"name\":\"x\"}"});
        assert_eq!(unwrap_document_envelope(&doc), Some(json!({"id": 7, "name": "x"})));
    }

    #[test]
    fn test_document_envelope_invalid_json_keeps_id() {
        let doc = json!({"document_id": 7, "data": "not-json"});
        assert_eq!(unwrap_document_envelope(&doc), Some(json!({"id": 7})));

        let doc = json!({"document_id": "k", "data": "[1,2]"});
        assert_eq!(unwrap_document_envelope(&doc), Some(json!({"id": "k"})));
    }

    #[test]
    fn test_document_envelope_requires_scalar_id() {
        let doc = json!({"document_id": {"nested": true}, "data": {"a": 1}});
        assert!(!is_document_envelope(&doc));
        assert_eq!(unwrap_document_envelope(&doc), Some(doc.clone()));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(204, "").unwrap(), json!({}));
        assert_eq!(parse_body(200, "  \n").unwrap(), json!({}));
        assert_eq!(parse_body(200, "[1]").unwrap(), json!([1]));

        let err = parse_body(200, "<html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert_eq!(err.http_status(), Some(200));
    }
}
