//! JSON bodies of the `fpe-svc` HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Encrypt / decrypt
// ---------------------------------------------------------------------------

/// Request body for `POST /encrypt` and `POST /decrypt`.
///
/// Each record is a flat JSON object. Fields are classified by name against
/// the service's catalog; unclassified fields are echoed back untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Records to transform, in order.
    pub records: Vec<Map<String, Value>>,
}

/// Response body for `POST /encrypt` and `POST /decrypt`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformResponse {
    /// Transformed records, same order and keys as the request.
    pub records: Vec<Map<String, Value>>,
    /// Cells that were left as-is because they could not be transformed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FieldFailureBody>,
}

/// One failed cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailureBody {
    /// Zero-based record index.
    pub row: usize,
    /// Field name as sent by the caller.
    pub field: String,
    /// Why the cell was not transformed. Never contains the value.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Response body for `GET /catalog`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogResponse {
    /// Classified fields in name order.
    pub fields: Vec<CatalogEntryBody>,
    /// Problems found when the catalog was loaded.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntryBody {
    /// Normalised field name.
    pub name: String,
    /// `numeric`, `alphanumeric` or `passthrough`.
    #[serde(rename = "type")]
    pub category: String,
    /// Format template, e.g. `999-99-9999`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"`, or `"degraded"` when the catalog fell back to the builtin one.
    pub status: String,
    /// Short fingerprint of the loaded key; identifies it without revealing it.
    pub key_fingerprint: String,
    /// Number of classified fields.
    pub catalog_fields: usize,
    /// Number of warnings from the last catalog load.
    pub catalog_warnings: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transform_request_from_json() {
        let req: TransformRequest = serde_json::from_value(json!({
            "records": [{"ssn": "123-45-6789", "name": "Alice", "age": 41, "note": null}]
        }))
        .unwrap();
        assert_eq!(req.records.len(), 1);
        assert_eq!(req.records[0]["ssn"], "123-45-6789");
        assert!(req.records[0]["note"].is_null());
    }

    #[test]
    fn empty_failures_are_omitted() {
        let resp = TransformResponse {
            records: vec![Map::new()],
            failures: vec![],
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert!(v.get("failures").is_none());

        let parsed: TransformResponse = serde_json::from_value(json!({"records": []})).unwrap();
        assert!(parsed.failures.is_empty());
    }

    #[test]
    fn catalog_entry_uses_type_key() {
        let entry = CatalogEntryBody {
            name: "ssn".into(),
            category: "numeric".into(),
            format: Some("999-99-9999".into()),
            description: None,
        };
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["type"], "numeric");
        assert!(v.get("description").is_none());
    }

    #[test]
    fn error_response_new() {
        let e = ErrorResponse::new("bad_request", "records must be objects");
        assert_eq!(e.code, "bad_request");
        assert!(e.message.contains("objects"));
    }

    #[test]
    fn health_response_serde() {
        let h = HealthResponse {
            status: "ok".into(),
            key_fingerprint: "0a1b2c3d4e5f6071".into(),
            catalog_fields: 14,
            catalog_warnings: 0,
        };
        let json = serde_json::to_string(&h).unwrap();
        let decoded: HealthResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.catalog_fields, 14);
    }
}
