//! Content negotiation checks, run before authentication.

use axum::extract::Request;
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;

use crate::errors::ApiError;

const JSON: &str = "application/json";

/// `Content-Type` must be JSON; parameters such as `charset` are ignored.
pub fn content_type_is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON))
}

/// A missing `Accept` means anything is fine. Ranges with `q=0` are refusals.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(header::ACCEPT) else { return true };
    let Ok(accept) = accept.to_str() else { return false };
    if accept.trim().is_empty() {
        return true;
    }
    accept.split(',').any(|range| {
        let mut parts = range.split(';');
        let media = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let refused = parts.any(|p| {
            let p = p.trim();
            p.strip_prefix("q=")
                .and_then(|q| q.trim().parse::<f32>().ok())
                .is_some_and(|q| q <= 0.0)
        });
        !refused && matches!(media.as_str(), JSON | "application/*" | "*/*")
    })
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// For routes whose writes take a JSON body: content type first, then `Accept`.
pub async fn require_json(req: Request, next: Next) -> Result<Response, ApiError> {
    if carries_body(req.method()) && !content_type_is_json(req.headers()) {
        return Err(ApiError::UnsupportedMediaType);
    }
    if !accepts_json(req.headers()) {
        return Err(ApiError::NotAcceptable);
    }
    Ok(next.run(req).await)
}

/// For routes that never read a body.
pub async fn require_accept_json(req: Request, next: Next) -> Result<Response, ApiError> {
    if !accepts_json(req.headers()) {
        return Err(ApiError::NotAcceptable);
    }
    Ok(next.run(req).await)
}
