//! Axum request handlers for all service endpoints.

use std::collections::BTreeSet;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    CatalogEntryBody, CatalogResponse, ErrorResponse, FieldFailureBody, HealthResponse,
    TransformRequest, TransformResponse,
};
use common::ServiceError;
use fpe::{FieldFailure, FpeError, Record, TransformReport, Transformed};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::AppState;
use crate::engine::Engine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Encrypt,
    Decrypt,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Encrypt => "encrypt",
            Op::Decrypt => "decrypt",
        }
    }
}

/// `POST /encrypt`: encrypt every classified field of every record.
pub async fn encrypt(State(state): State<AppState>, Json(req): Json<TransformRequest>) -> Response {
    transform(state, req, Op::Encrypt).await
}

/// `POST /decrypt`: inverse of [`encrypt`].
pub async fn decrypt(State(state): State<AppState>, Json(req): Json<TransformRequest>) -> Response {
    transform(state, req, Op::Decrypt).await
}

/// `GET /catalog`: the field classifications currently in effect.
pub async fn catalog(State(state): State<AppState>) -> Response {
    let Some(engine) = state.engines.current() else {
        return error_response(ServiceError::Unavailable("transform engine not ready".into()));
    };

    let fields = engine
        .transformer
        .catalog()
        .iter()
        .map(|(name, config)| CatalogEntryBody {
            name: name.to_owned(),
            category: config.category.to_string(),
            format: config.format.as_ref().map(ToString::to_string),
            description: config.description.clone(),
        })
        .collect();
    let warnings = engine.warnings.iter().map(ToString::to_string).collect();

    (StatusCode::OK, Json(CatalogResponse { fields, warnings })).into_response()
}

/// `GET /health`: liveness and readiness check.
///
/// Returns `200 OK` once an engine is loaded; status is `"degraded"` when the
/// configured catalog could not be used. Returns `503` before startup
/// completes.
pub async fn health(State(state): State<AppState>) -> Response {
    let Some(engine) = state.engines.current() else {
        let body = HealthResponse {
            status: "unavailable".into(),
            key_fingerprint: String::new(),
            catalog_fields: 0,
            catalog_warnings: 0,
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    };

    let status = if engine.fell_back() { "degraded" } else { "ok" };
    let body = HealthResponse {
        status: status.into(),
        key_fingerprint: engine.key_fingerprint.clone(),
        catalog_fields: engine.transformer.catalog().len(),
        catalog_warnings: engine.warnings.len(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

fn error_response(err: ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::new(err.code(), err.to_string()))).into_response()
}

async fn transform(state: AppState, req: TransformRequest, op: Op) -> Response {
    let request_id = Uuid::new_v4();
    let Some(engine) = state.engines.current() else {
        return error_response(ServiceError::Unavailable("transform engine not ready".into()));
    };

    let rows = req.records.len();
    let result = tokio::task::spawn_blocking(move || run_batch(&engine, req.records, op)).await;

    match result {
        Ok(Ok((body, report))) => {
            info!(
                %request_id,
                op = op.as_str(),
                rows,
                failures = body.failures.len(),
                short_values = report.short_values.len(),
                "batch transformed"
            );
            for short in &report.short_values {
                debug!(
                    %request_id,
                    field = %short.field,
                    row = ?short.row,
                    "single-digit value passed through unmixed"
                );
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(Err(failure)) => {
            warn!(
                %request_id,
                op = op.as_str(),
                field = %failure.field,
                row = ?failure.row,
                "batch rejected in strict mode"
            );
            error_response(ServiceError::BadRequest(failure.to_string()))
        }
        Err(e) => {
            warn!(%request_id, error = %e, "transform task failed");
            error_response(ServiceError::Internal("transform task failed".into()))
        }
    }
}

/// Run one batch on the blocking pool.
///
/// Only string and number values of classified fields go through the
/// ciphers; numbers come back as strings. Everything else is copied through,
/// except that a classified field holding a bool, array or object is
/// reported as a failure (or aborts the batch in strict mode).
fn run_batch(
    engine: &Engine,
    records: Vec<Map<String, Value>>,
    op: Op,
) -> Result<(TransformResponse, TransformReport), FieldFailure> {
    let transformer = &engine.transformer;
    let catalog = transformer.catalog();
    let strict = transformer.options().strict;

    let mut failures = Vec::new();
    let mut inputs = Vec::with_capacity(records.len());
    for (row, record) in records.iter().enumerate() {
        let mut input = Record::new();
        for (field, value) in record {
            if !catalog.is_sensitive(field) {
                continue;
            }
            match value {
                Value::Null => {}
                Value::String(s) => {
                    input.insert(field.clone(), Some(s.clone()));
                }
                Value::Number(n) => {
                    input.insert(field.clone(), Some(n.to_string()));
                }
                other => {
                    let error = FpeError::InvalidInput {
                        reason: format!("unsupported JSON type `{}`", json_type(other)),
                    };
                    if strict {
                        return Err(FieldFailure {
                            field: field.clone(),
                            row: Some(row),
                            error,
                        });
                    }
                    failures.push(FieldFailureBody {
                        row,
                        field: field.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }
        inputs.push(input);
    }

    let Transformed { output, report } = match op {
        Op::Encrypt => transformer.encrypt_records(&inputs)?,
        Op::Decrypt => transformer.decrypt_records(&inputs)?,
    };

    let failed: BTreeSet<(usize, &str)> = report
        .failures
        .iter()
        .map(|f| (f.row.unwrap_or_default(), f.field.as_str()))
        .collect();
    failures.extend(report.failures.iter().map(|f| FieldFailureBody {
        row: f.row.unwrap_or_default(),
        field: f.field.clone(),
        reason: f.error.to_string(),
    }));
    failures.sort_by(|a, b| (a.row, &a.field).cmp(&(b.row, &b.field)));

    let records = records
        .into_iter()
        .zip(output)
        .enumerate()
        .map(|(row, (mut record, transformed))| {
            for (field, value) in transformed {
                if failed.contains(&(row, field.as_str())) {
                    continue;
                }
                if let Some(value) = value {
                    record.insert(field, Value::String(value));
                }
            }
            record
        })
        .collect();

    Ok((TransformResponse { records, failures }, report))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
