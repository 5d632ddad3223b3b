// src/aggregator/resolver.rs
use super::matcher::CheckMatcher;
use super::verdict::Verdict;
use crate::cache::ResultCache;
use crate::checks::{
    AggregateResult, CheckSet, CheckStatus, HealthSeverity, SeverityScale, StatusCounts,
};
use crate::config::StatusCodes;
use crate::metrics::MetricsCollector;
use crate::registry::{CheckSource, RegistryError};
use hyper::StatusCode;
use std::sync::Arc;
use tracing::{debug, warn};

/// HTTP status plus body for one request.
pub type Resolution = (StatusCode, AggregateResult);

/// Turns registry snapshots into pass/warn/fail verdicts.
pub struct Aggregator {
    source: Arc<dyn CheckSource>,
    cache: Arc<dyn ResultCache<Arc<CheckSet>>>,
    status_codes: StatusCodes,
    scale: SeverityScale,
    default_threshold: HealthSeverity,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Aggregator {
    pub fn new(
        source: Arc<dyn CheckSource>,
        cache: Arc<dyn ResultCache<Arc<CheckSet>>>,
        status_codes: StatusCodes,
        scale: SeverityScale,
        default_threshold: HealthSeverity,
    ) -> Self {
        Self {
            source,
            cache,
            status_codes,
            scale,
            default_threshold,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn status_codes(&self) -> &StatusCodes {
        &self.status_codes
    }

    /// Parse a caller-supplied threshold. Absent means the configured default.
    pub fn resolve_threshold(&self, raw: Option<&str>) -> Result<HealthSeverity, Resolution> {
        match raw {
            None => Ok(self.default_threshold),
            Some(raw) => self.scale.parse(raw).ok_or_else(|| {
                (
                    self.status_codes.bad_request,
                    AggregateResult::failed(format!("Unsupported status: {}", raw)),
                )
            }),
        }
    }

    /// Fetch the check set for `url`, going to the registry only on a cache miss.
    pub async fn acquire(&self, url: &str) -> Result<Arc<CheckSet>, Resolution> {
        if let Some(checks) = self.cache.get(url) {
            debug!("Cache hit for {}", url);
            self.record_cache_lookup(true);
            return Ok(checks);
        }

        debug!("Cache miss for {}", url);
        self.record_cache_lookup(false);

        match self.source.fetch(url).await {
            Ok(checks) => {
                let checks = Arc::new(checks);
                self.cache.set(url, checks.clone());
                Ok(checks)
            }
            Err(e) => {
                let code = match &e {
                    RegistryError::Unprocessable(_) => self.status_codes.unprocessable,
                    _ => self.status_codes.registry_unavailable,
                };
                warn!("Unable to load checks from {}: {}", url, e);
                Err((code, AggregateResult::failed(e.to_string())))
            }
        }
    }

    /// Liveness of the relay itself: succeeds whenever the registry can be read.
    pub async fn health(&self, url: &str) -> Resolution {
        match self.acquire(url).await {
            Ok(_) => (self.status_codes.success, AggregateResult::ok()),
            Err(resolution) => resolution,
        }
    }

    pub async fn resolve(
        &self,
        url: &str,
        matcher: &CheckMatcher,
        threshold: HealthSeverity,
        verbose: bool,
    ) -> Resolution {
        match self.acquire(url).await {
            Ok(checks) => self.tally(&checks, matcher, threshold, verbose),
            Err(resolution) => resolution,
        }
    }

    /// Filter, classify and aggregate one snapshot.
    pub fn tally(
        &self,
        checks: &CheckSet,
        matcher: &CheckMatcher,
        threshold: HealthSeverity,
        verbose: bool,
    ) -> Resolution {
        let mut counts = StatusCounts::default();
        let mut notable = CheckSet::new();
        let mut matched = 0;

        for (id, check) in checks.iter().filter(|(_, check)| matcher.matches(check)) {
            matched += 1;

            let status = match check.classify(threshold, self.scale) {
                Ok(status) => status,
                Err(e) => {
                    warn!("Check {} has an unprocessable status: {}", id, e);
                    return (
                        self.status_codes.unprocessable,
                        AggregateResult::failed(e.to_string()),
                    );
                }
            };

            counts.record(status);
            if status != CheckStatus::Passing || verbose {
                notable.insert(id.clone(), check.clone());
            }
        }

        let verdict = Verdict::from_counts(&counts, checks.len(), matched);
        debug!(
            "{:?}: {} of {} checks matched, counts {:?}",
            verdict,
            matched,
            checks.len(),
            counts
        );

        let code = verdict.status_code(&self.status_codes);
        let result = match verdict {
            Verdict::NoChecks => AggregateResult::no_checks(matcher.no_checks_detail()),
            _ => AggregateResult::tallied(verdict.result_status(), counts, notable),
        };

        (code, result)
    }

    fn record_cache_lookup(&self, hit: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_cache_lookup(hit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{NoOpCache, TtlCache};
    use crate::checks::{CheckRecord, ResultStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Duration;

    const URL: &str = "http://localhost:8500/v1/agent/checks";

    struct StaticSource {
        checks: CheckSet,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn new(checks: CheckSet) -> Self {
            Self {
                checks,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CheckSource for StaticSource {
        async fn fetch(&self, _url: &str) -> Result<CheckSet, RegistryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.checks.clone())
        }
    }

    struct FailingSource(fn() -> RegistryError);

    #[async_trait]
    impl CheckSource for FailingSource {
        async fn fetch(&self, _url: &str) -> Result<CheckSet, RegistryError> {
            Err((self.0)())
        }
    }

    fn check(id: &str, service: &str, status: &str) -> (String, CheckRecord) {
        (
            id.to_string(),
            CheckRecord {
                node: "node-1".to_string(),
                check_id: id.to_string(),
                name: format!("check {}", &id[5..6]),
                status: status.to_string(),
                service_id: service.to_string(),
                service_name: service.to_string(),
                ..Default::default()
            },
        )
    }

    fn registry() -> CheckSet {
        [
            check("check1a", "service1", "passing"),
            check("check1b", "service1", "warning"),
            check("check1c", "service1", "critical"),
            check("check2a", "service2", "passing"),
            check("check3a", "service3", "passing"),
            check("check3b", "service3", "warning"),
        ]
        .into_iter()
        .collect()
    }

    fn aggregator_with(source: Arc<dyn CheckSource>, cache: Arc<dyn ResultCache<Arc<CheckSet>>>) -> Aggregator {
        Aggregator::new(
            source,
            cache,
            StatusCodes::default(),
            SeverityScale::Consul,
            HealthSeverity::Passing,
        )
    }

    fn aggregator(checks: CheckSet) -> Aggregator {
        aggregator_with(Arc::new(StaticSource::new(checks)), Arc::new(NoOpCache))
    }

    fn notable_ids(result: &AggregateResult) -> Vec<String> {
        result
            .checks
            .as_ref()
            .map(|checks| checks.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_failing_dominates() {
        let agg = aggregator(registry());
        let (code, result) = agg
            .resolve(URL, &CheckMatcher::ServiceId("service1".into()), HealthSeverity::Passing, false)
            .await;

        assert_eq!(code, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(result.status, ResultStatus::Failed);
        assert_eq!(
            result.counts,
            Some(StatusCounts {
                failing: 1,
                passing: 1,
                warning: 1
            })
        );
        assert_eq!(notable_ids(&result), vec!["check1b", "check1c"]);
    }

    #[tokio::test]
    async fn test_partial_success() {
        let agg = aggregator(registry());
        let (code, result) = agg
            .resolve(URL, &CheckMatcher::ServiceId("service3".into()), HealthSeverity::Passing, false)
            .await;

        assert_eq!(code, agg.status_codes().partial_success);
        assert_eq!(result.status, ResultStatus::Warning);
        assert_eq!(
            result.counts,
            Some(StatusCounts {
                failing: 0,
                passing: 1,
                warning: 1
            })
        );
        assert_eq!(notable_ids(&result), vec!["check3b"]);
    }

    #[tokio::test]
    async fn test_warning_only_is_failure_with_warning_code() {
        let mut codes = StatusCodes::default();
        codes.warning = StatusCode::EXPECTATION_FAILED;
        let agg = Aggregator::new(
            Arc::new(StaticSource::new(registry())),
            Arc::new(NoOpCache),
            codes,
            SeverityScale::Consul,
            HealthSeverity::Passing,
        );

        let (code, result) = agg
            .resolve(URL, &CheckMatcher::CheckId("check1b".into()), HealthSeverity::Passing, false)
            .await;

        assert_eq!(code, StatusCode::EXPECTATION_FAILED);
        assert_eq!(result.status, ResultStatus::Failed);
        assert_eq!(notable_ids(&result), vec!["check1b"]);
    }

    #[tokio::test]
    async fn test_no_matches() {
        let agg = aggregator(registry());
        let (code, result) = agg
            .resolve(URL, &CheckMatcher::ServiceName("unknown".into()), HealthSeverity::Passing, false)
            .await;

        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(result.status, ResultStatus::NoChecks);
        assert_eq!(
            result.detail.as_deref(),
            Some("No checks for services with ServiceName: unknown")
        );
        assert_eq!(result.counts, None);
        assert_eq!(result.checks, None);
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let agg = aggregator(CheckSet::new());
        let (code, result) = agg
            .resolve(URL, &CheckMatcher::All, HealthSeverity::Passing, false)
            .await;

        assert_eq!(code, StatusCode::NOT_FOUND);
        assert_eq!(result.detail.as_deref(), Some("No checks"));
    }

    #[tokio::test]
    async fn test_ok_hides_passing_checks_unless_verbose() {
        let agg = aggregator(registry());
        let matcher = CheckMatcher::ServiceId("service2".into());

        let (code, result) = agg.resolve(URL, &matcher, HealthSeverity::Passing, false).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(result.status, ResultStatus::Ok);
        assert_eq!(result.checks, None);

        let (_, verbose) = agg.resolve(URL, &matcher, HealthSeverity::Passing, true).await;
        assert_eq!(notable_ids(&verbose), vec!["check2a"]);
    }

    #[tokio::test]
    async fn test_permissive_threshold_collapses_warnings() {
        let agg = aggregator(registry());
        let (code, result) = agg
            .resolve(URL, &CheckMatcher::All, HealthSeverity::Warning, false)
            .await;

        assert_eq!(code, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            result.counts,
            Some(StatusCounts {
                failing: 1,
                passing: 5,
                warning: 0
            })
        );
        assert_eq!(notable_ids(&result), vec!["check1c"]);

        let (code, result) = agg
            .resolve(URL, &CheckMatcher::All, HealthSeverity::Critical, false)
            .await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(result.status, ResultStatus::Ok);
    }

    #[tokio::test]
    async fn test_unknown_status_is_unprocessable() {
        let mut checks = registry();
        checks.insert("check9".to_string(), check("check9", "service9", "exploded").1);
        let agg = aggregator(checks);

        let (code, result) = agg
            .resolve(URL, &CheckMatcher::ServiceId("service9".into()), HealthSeverity::Passing, false)
            .await;
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(result.status, ResultStatus::Failed);
        assert_eq!(result.detail.as_deref(), Some("Unsupported status: exploded"));

        // Unmatched records are never classified.
        let (code, _) = agg
            .resolve(URL, &CheckMatcher::ServiceId("service2".into()), HealthSeverity::Passing, false)
            .await;
        assert_eq!(code, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_registry_unavailable_leaves_cache_untouched() {
        let cache: Arc<TtlCache<Arc<CheckSet>>> = Arc::new(TtlCache::new(Duration::from_secs(60)));
        let agg = aggregator_with(
            Arc::new(FailingSource(|| {
                RegistryError::Unavailable("connection refused".to_string())
            })),
            cache.clone(),
        );

        let (code, result) = agg
            .resolve(URL, &CheckMatcher::All, HealthSeverity::Passing, false)
            .await;

        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(result.status, ResultStatus::Failed);
        assert_eq!(result.detail.as_deref(), Some("connection refused"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_unprocessable_registry_response() {
        let agg = aggregator_with(
            Arc::new(FailingSource(|| {
                RegistryError::Unprocessable("expected value at line 1 column 1".to_string())
            })),
            Arc::new(NoOpCache),
        );

        let (code, result) = agg.health(URL).await;
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(result.status, ResultStatus::Failed);
    }

    #[tokio::test]
    async fn test_cache_avoids_second_fetch() {
        let source = Arc::new(StaticSource::new(registry()));
        let cache: Arc<dyn ResultCache<Arc<CheckSet>>> =
            Arc::new(TtlCache::new(Duration::from_secs(60)));
        let agg = aggregator_with(source.clone(), cache);

        agg.resolve(URL, &CheckMatcher::All, HealthSeverity::Passing, false).await;
        agg.resolve(URL, &CheckMatcher::All, HealthSeverity::Passing, false).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_noop_cache_fetches_every_time() {
        let source = Arc::new(StaticSource::new(registry()));
        let agg = aggregator_with(source.clone(), Arc::new(NoOpCache));

        agg.health(URL).await;
        agg.health(URL).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolve_threshold() {
        let agg = aggregator(CheckSet::new());
        assert_eq!(agg.resolve_threshold(None), Ok(HealthSeverity::Passing));
        assert_eq!(agg.resolve_threshold(Some("warning")), Ok(HealthSeverity::Warning));

        let (code, result) = agg.resolve_threshold(Some("Warning")).unwrap_err();
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(result.detail.as_deref(), Some("Unsupported status: Warning"));
    }
}
