//! Request statistics middleware
//!
//! Times every request, then hands method, path, status and the configured
//! request headers to the [`RequestStatsRecorder`], which emits one tagged
//! sample and logs requests over the slow-request threshold.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::{Request, State},
    http::HeaderMap,
    middleware::{self as axum_mw, Next},
    response::Response,
};
use reqstats_core::{CompletedRequest, RequestStatsRecorder};

/// Values of the headers the recorder mirrors into tags.
fn capture_headers(recorder: &RequestStatsRecorder, headers: &HeaderMap) -> Vec<(String, String)> {
    recorder
        .config()
        .add_headers()
        .iter()
        .filter_map(|name| {
            headers
                .get(name.as_str())
                .map(|value| (name.clone(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
        })
        .collect()
}

/// Middleware that records one metric sample per request.
///
/// Errors from the downstream handler are not intercepted; whatever response
/// it produces is returned unchanged.
pub async fn request_stats_middleware(
    State(recorder): State<Arc<RequestStatsRecorder>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let path = request.uri().path().to_string();
    let headers = capture_headers(&recorder, request.headers());

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    let completed = CompletedRequest {
        method,
        uri,
        path,
        status: response.status().as_u16(),
        elapsed,
        headers,
    };
    recorder.record(&completed);

    response
}

/// Wrap every route of `router` with the request statistics middleware.
pub fn instrument<S>(router: Router<S>, recorder: Arc<RequestStatsRecorder>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(axum_mw::from_fn_with_state(recorder, request_stats_middleware))
}
