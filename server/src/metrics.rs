use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Instant;

/// Label for requests that matched no route.
const UNMATCHED: &str = "unmatched";

pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Middleware state: the scrape path, which is never itself recorded.
#[derive(Clone)]
pub struct MetricsState {
    scrape_path: Arc<str>,
}

impl MetricsState {
    pub fn new(scrape_path: &str) -> Self {
        Self {
            scrape_path: Arc::from(scrape_path),
        }
    }
}

pub async fn metrics_middleware(
    State(state): State<MetricsState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == &*state.scrape_path {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path_label = path_label(request.extensions().get::<MatchedPath>());

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path_label),
        ("status", status),
    ];

    counter!("brewhouse_http_requests_total", &labels).increment(1);
    histogram!("brewhouse_http_request_duration_seconds", &labels).record(duration);

    response
}

/// Route template such as `/drinks/{id}`, so raw URLs never become labels.
fn path_label(matched: Option<&MatchedPath>) -> String {
    matched.map_or_else(|| UNMATCHED.to_string(), |m| m.as_str().to_string())
}

pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
