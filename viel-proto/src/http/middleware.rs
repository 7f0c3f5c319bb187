use anyhow::Result;
use futures::future::BoxFuture;
use hyper::body::Incoming;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};

use super::codec::{empty_body, HttpResponse};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; object-src 'none'; frame-ancestors 'none'";
const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Wraps every exchange: answers CORS preflights
/// and sets the security headers on whatever comes back.
pub(super) async fn secure<'a>(
    req: Request<Incoming>,
    next: impl Fn(Request<Incoming>) -> BoxFuture<'a, Result<HttpResponse>>,
) -> Result<HttpResponse> {
    if req.method() == Method::OPTIONS {
        tracing::debug!(uri = %req.uri(), "CORS preflight");
        return Ok(with_headers(preflight()?));
    }

    let response = next(req).await?;
    Ok(with_headers(response))
}

pub(super) fn preflight() -> Result<HttpResponse> {
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS)
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "*")
        .header(header::ACCESS_CONTROL_MAX_AGE, "86400")
        .body(empty_body())?)
}

pub(super) fn with_headers(mut response: HttpResponse) -> HttpResponse {
    set_security_headers(response.headers_mut());
    response
}

fn set_security_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
}
