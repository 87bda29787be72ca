//! Middleware that logs the body of model validation rejections

use axum::{
    body::{to_bytes, Body, HttpBody},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{debug, Level};

const MAX_LOGGED_BODY: usize = 64 * 1024;

/// Logs the field-keyed report of every 422 response at debug level
///
/// Responses are returned unchanged when debug logging is off or the body
/// is larger than `MAX_LOGGED_BODY` (or of unknown length).
pub async fn log_validation_rejections(
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    if response.status() != StatusCode::UNPROCESSABLE_ENTITY || !tracing::enabled!(Level::DEBUG) {
        return Ok(response);
    }

    match response.body().size_hint().upper() {
        Some(len) if len <= MAX_LOGGED_BODY as u64 => {}
        len => {
            debug!(
                method = %method,
                uri = %uri,
                body_len = ?len,
                "Request rejected by validation, report too large to log"
            );
            return Ok(response);
        }
    }

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, MAX_LOGGED_BODY)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(serde_json::Value::Object(report)) => {
            let fields: Vec<&str> = report.keys().map(String::as_str).collect();
            debug!(
                method = %method,
                uri = %uri,
                fields = ?fields,
                report = %serde_json::Value::Object(report.clone()),
                "Request rejected by validation"
            );
        }
        _ => {
            debug!(
                method = %method,
                uri = %uri,
                body = %String::from_utf8_lossy(&bytes),
                "Request rejected with unprocessable entity"
            );
        }
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}
