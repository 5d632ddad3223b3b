// src/server/handler.rs
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower::Service;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::aggregator::{Aggregator, CheckMatcher, Resolution};
use crate::metrics::MetricsCollector;
use crate::server::routes::{QueryOptions, Route};
use crate::version::BuildInfo;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const NOT_FOUND_BODY: &str = "404 page not found";
const NOT_FOUND_LABEL: &str = "not_found";

/// Routes inbound probe requests to the aggregator.
#[derive(Clone)]
pub struct RequestHandler {
    aggregator: Arc<Aggregator>,
    registry_url: Arc<str>,
    about: Arc<BuildInfo>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl RequestHandler {
    pub fn new(
        aggregator: Arc<Aggregator>,
        registry_url: impl Into<Arc<str>>,
        about: BuildInfo,
    ) -> Self {
        Self {
            aggregator,
            registry_url: registry_url.into(),
            about: Arc::new(about),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let span = info_span!(
            "request",
            id = %Uuid::new_v4(),
            method = %req.method(),
            path = %req.uri().path(),
        );

        async move {
            let start = Instant::now();
            let method = req.method().clone();
            let request_size = request_len(&req);
            let route = Route::parse(req.uri().path());

            let response = if method != Method::GET && method != Method::HEAD {
                method_not_allowed()
            } else {
                match &route {
                    Some(route) => {
                        let options = QueryOptions::parse(req.uri().query());
                        self.dispatch(route, &options, method == Method::HEAD).await
                    }
                    None => not_found(),
                }
            };

            let elapsed = start.elapsed();
            let size = body_len(&response);
            if let Some(metrics) = &self.metrics {
                let label = route.as_ref().map(Route::template).unwrap_or(NOT_FOUND_LABEL);
                metrics.record_request(
                    method.as_str(),
                    response.status().as_u16(),
                    label,
                    elapsed,
                    request_size,
                    size,
                );
            }

            info!(
                status = response.status().as_u16(),
                latency_ms = elapsed.as_millis() as u64,
                "request completed"
            );

            response
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, route: &Route, options: &QueryOptions, head: bool) -> Response<Body> {
        let (code, body) = match route {
            Route::About => (
                self.aggregator.status_codes().success,
                render(self.about.as_ref(), options.pretty),
            ),
            Route::Health => {
                let (code, result) = self.aggregator.health(&self.registry_url).await;
                (code, render(&result, options.pretty))
            }
            Route::Verify(matcher) => {
                let (code, result) = self.verify(matcher, options).await;
                (code, render(&result, options.pretty))
            }
        };

        match body {
            Ok(_) if head => json_response(code, Vec::new()),
            Ok(body) => json_response(code, body),
            Err(e) => {
                tracing::error!("Failed to encode response: {}", e);
                text_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }

    async fn verify(&self, matcher: &CheckMatcher, options: &QueryOptions) -> Resolution {
        // Reject a bad threshold before touching the registry.
        let threshold = match self.aggregator.resolve_threshold(options.status.as_deref()) {
            Ok(threshold) => threshold,
            Err(resolution) => return resolution,
        };

        self.aggregator
            .resolve(&self.registry_url, matcher, threshold, options.verbose)
            .await
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.handle(req).await) })
    }
}

fn render<T: Serialize + ?Sized>(value: &T, pretty: bool) -> serde_json::Result<Vec<u8>> {
    if !pretty {
        return serde_json::to_vec(value);
    }

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(buffer)
}

fn json_response(code: StatusCode, body: Vec<u8>) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = code;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

fn text_response(code: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = code;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
    response
}

fn not_found() -> Response<Body> {
    text_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

fn method_not_allowed() -> Response<Body> {
    let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
    response
}

/// Approximate wire size of the request line, headers and declared body.
fn request_len(req: &Request<Body>) -> usize {
    use hyper::body::HttpBody;
    let line = req.method().as_str().len() + req.uri().to_string().len();
    let headers: usize = req
        .headers()
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len())
        .sum();
    line + headers + req.body().size_hint().lower() as usize
}

fn body_len(response: &Response<Body>) -> usize {
    use hyper::body::HttpBody;
    response.body().size_hint().exact().unwrap_or(0) as usize
}
