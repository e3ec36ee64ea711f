//! HTTP request metrics

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};

use crate::infrastructure::observability::record_http_request;

/// Record count and latency for every request, keyed by route template
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = route_label(&request);

    let response = next.run(request).await;

    record_http_request(
        method.as_str(),
        &route,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}

pub(crate) fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label_falls_back_to_uri() {
        let request = Request::builder()
            .uri("/portal/api-keys/7f1e7c66-3a2b-4b1c-9a53-0c1d2e3f4a5b?x=1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            route_label(&request),
            "/portal/api-keys/7f1e7c66-3a2b-4b1c-9a53-0c1d2e3f4a5b"
        );
    }
}
