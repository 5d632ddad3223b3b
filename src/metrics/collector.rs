// src/metrics/collector.rs
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use anyhow::Result;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
        }
        buffer
    }
}

pub struct MetricsCollector {
    // Inbound requests
    pub requests_total: IntCounterVec,
    pub request_duration_seconds: HistogramVec,
    pub request_size_bytes: HistogramVec,
    pub response_size_bytes: HistogramVec,

    // Registry queries
    pub registry_requests_total: IntCounterVec,
    pub registry_request_duration_seconds: HistogramVec,
    pub registry_in_flight: IntGauge,

    // Check-set cache
    pub cache_lookups_total: IntCounterVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let requests_total = IntCounterVec::new(
            Opts::new("consulate_requests_total", "Total number of HTTP requests made"),
            &["code", "method", "url"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "consulate_request_duration_seconds",
                "The HTTP request latencies in seconds",
            )
            .buckets(vec![0.5, 1.0, 2.0, 4.0, 8.0, 16.0]),
            &["code", "method", "url"],
        )?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        let request_size_bytes = HistogramVec::new(
            HistogramOpts::new(
                "consulate_request_size_bytes",
                "The HTTP request sizes in bytes",
            )
            .buckets(vec![256.0, 1024.0, 4096.0, 16384.0]),
            &["code", "method", "url"],
        )?;
        registry.register(Box::new(request_size_bytes.clone()))?;

        let response_size_bytes = HistogramVec::new(
            HistogramOpts::new(
                "consulate_response_size_bytes",
                "The HTTP response sizes in bytes",
            )
            .buckets(vec![512.0, 2048.0, 8192.0, 32768.0]),
            &["code", "method", "url"],
        )?;
        registry.register(Box::new(response_size_bytes.clone()))?;

        let registry_requests_total = IntCounterVec::new(
            Opts::new(
                "consulate_registry_requests_total",
                "Total registry queries by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(registry_requests_total.clone()))?;

        let registry_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "consulate_registry_request_duration_seconds",
                "Registry query latencies in seconds",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(registry_request_duration_seconds.clone()))?;

        let registry_in_flight = IntGauge::new(
            "consulate_registry_in_flight_requests",
            "Registry queries currently in flight",
        )?;
        registry.register(Box::new(registry_in_flight.clone()))?;

        let cache_lookups_total = IntCounterVec::new(
            Opts::new("consulate_cache_lookups_total", "Check-set cache lookups"),
            &["result"],
        )?;
        registry.register(Box::new(cache_lookups_total.clone()))?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
            request_size_bytes,
            response_size_bytes,
            registry_requests_total,
            registry_request_duration_seconds,
            registry_in_flight,
            cache_lookups_total,
        })
    }

    pub fn record_request(
        &self,
        method: &str,
        status_code: u16,
        url: &str,
        duration: Duration,
        request_size: usize,
        response_size: usize,
    ) {
        let status = status_code.to_string();
        self.requests_total
            .with_label_values(&[&status, method, url])
            .inc();

        self.request_duration_seconds
            .with_label_values(&[&status, method, url])
            .observe(duration.as_secs_f64());

        self.request_size_bytes
            .with_label_values(&[&status, method, url])
            .observe(request_size as f64);

        self.response_size_bytes
            .with_label_values(&[&status, method, url])
            .observe(response_size as f64);
    }

    pub fn record_registry_request(&self, outcome: &str, duration: Duration) {
        self.registry_requests_total
            .with_label_values(&[outcome])
            .inc();

        self.registry_request_duration_seconds
            .with_label_values(&[outcome])
            .observe(duration.as_secs_f64());
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.cache_lookups_total.with_label_values(&[result]).inc();
    }
}

// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
