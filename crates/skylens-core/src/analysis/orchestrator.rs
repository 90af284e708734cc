//! Provider orchestration: selection policy and sequential fallback.
//!
//! The orchestrator holds the registered providers in registration order and
//! resolves each request to one of them under an explicit-name-or-random
//! policy informed by live availability state. Fallback is strictly
//! sequential, one backend at a time, because speculative concurrent calls
//! would burn quota against rate-limited upstreams.

use crate::error::{AnalysisError, AvailabilityError, ProviderError};
use crate::types::{AnalysisResult, AvailabilityRecord, ProviderDescriptor, ProviderFamily};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::sync::Arc;

use super::provider::{AnalysisProvider, AnalysisRequest};

/// Caller-supplied model name requesting random selection.
pub const RANDOM_PROVIDER: &str = "random";

/// Live availability state for registered backends.
///
/// Backed by durable storage in production; read-only from this core's
/// perspective. Queried per request because operators flip availability
/// without restarting the process.
#[async_trait]
pub trait AvailabilityLookup: Send + Sync {
    async fn registered_model_availability(
        &self,
    ) -> Result<Vec<AvailabilityRecord>, AvailabilityError>;
}

/// Fixed availability records, for configurations without an external store
/// and for tests.
pub struct StaticAvailability {
    records: Vec<AvailabilityRecord>,
}

impl StaticAvailability {
    pub fn new(records: Vec<AvailabilityRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl AvailabilityLookup for StaticAvailability {
    async fn registered_model_availability(
        &self,
    ) -> Result<Vec<AvailabilityRecord>, AvailabilityError> {
        Ok(self.records.clone())
    }
}

/// Registry of named analysis providers with selection and fallback.
pub struct Orchestrator {
    providers: Vec<Arc<dyn AnalysisProvider>>,
    availability: Arc<dyn AvailabilityLookup>,
}

impl Orchestrator {
    /// Build an orchestrator over providers in registration order.
    pub fn new(
        providers: Vec<Arc<dyn AnalysisProvider>>,
        availability: Arc<dyn AvailabilityLookup>,
    ) -> Self {
        Self {
            providers,
            availability,
        }
    }

    /// Names of registered providers, in registration order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Diagnostic descriptors for every registered provider.
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.providers.iter().map(|p| p.describe()).collect()
    }

    /// Look up a registered provider by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn AnalysisProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// Run one analysis request under the selection/fallback policy.
    ///
    /// `model_name` is the caller's explicit choice; `None` or "random"
    /// selects among available providers. An explicit name that is not
    /// registered logs a warning and falls through to random selection
    /// rather than erroring.
    pub async fn generate(
        &self,
        request: &AnalysisRequest,
        model_name: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        if self.providers.is_empty() {
            return Err(AnalysisError::NoProvidersRegistered);
        }

        let selected = self.select(model_name).await;
        tracing::debug!(provider = selected.name(), "provider selected");

        let original_error = match self.invoke(&selected, request).await {
            Ok(mut result) => {
                result.provider_name = selected.name().to_string();
                result.fallback_used = false;
                return Ok(result);
            }
            Err(err) => err,
        };

        tracing::warn!(
            provider = selected.name(),
            reason = original_error.reason(),
            "provider failed, cascading through remaining providers"
        );

        // Walk every other registered provider in registration order;
        // upstream outages are uncorrelated across backends.
        let first_reason = original_error.reason().to_string();
        let mut last_reason = first_reason.clone();
        let mut attempted = 1usize;

        for provider in &self.providers {
            if provider.name() == selected.name() {
                continue;
            }
            attempted += 1;
            match self.invoke(provider, request).await {
                Ok(mut result) => {
                    result.provider_name = provider.name().to_string();
                    result.fallback_used = true;
                    result.original_provider_name = Some(selected.name().to_string());
                    result.fallback_reason = Some(first_reason);
                    tracing::info!(
                        provider = provider.name(),
                        original = selected.name(),
                        "fallback provider succeeded"
                    );
                    return Ok(result);
                }
                Err(err) => {
                    tracing::warn!(
                        provider = provider.name(),
                        reason = err.reason(),
                        "fallback provider failed"
                    );
                    last_reason = err.reason().to_string();
                }
            }
        }

        Err(AnalysisError::AllProvidersFailed {
            attempted,
            last_reason,
        })
    }

    /// Invoke one provider with its timeout applied.
    async fn invoke(
        &self,
        provider: &Arc<dyn AnalysisProvider>,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ProviderError> {
        match tokio::time::timeout(provider.timeout(), provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::unavailable(
                provider.name(),
                format!("no response within {:?}", provider.timeout()),
            )),
        }
    }

    /// Resolve the provider for this request.
    async fn select(&self, model_name: Option<&str>) -> Arc<dyn AnalysisProvider> {
        if let Some(name) = model_name {
            if name != RANDOM_PROVIDER {
                if let Some(provider) = self.get(name) {
                    return provider.clone();
                }
                tracing::warn!(
                    requested = name,
                    "requested provider is not registered; selecting at random"
                );
            }
        }
        self.select_random().await
    }

    /// Random selection among available, non-manual providers.
    ///
    /// Prefers the durable availability set; degrades to local hints when
    /// the lookup fails. An empty candidate pool resolves fallback-default,
    /// then stub, then the first registered provider; selection never
    /// fails while at least one provider is registered.
    async fn select_random(&self) -> Arc<dyn AnalysisProvider> {
        let mut candidates: Vec<Arc<dyn AnalysisProvider>> = Vec::new();
        let mut fallback_default: Option<Arc<dyn AnalysisProvider>> = None;

        match self.availability.registered_model_availability().await {
            Ok(records) => {
                for provider in &self.providers {
                    if provider.family() == ProviderFamily::Manual {
                        continue;
                    }
                    let Some(record) = records.iter().find(|r| r.name == provider.name()) else {
                        continue;
                    };
                    if record.is_fallback_default {
                        fallback_default = Some(provider.clone());
                    }
                    if record.is_available {
                        candidates.push(provider.clone());
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "degrading to local availability hints");
                for provider in &self.providers {
                    if provider.family() == ProviderFamily::Manual {
                        continue;
                    }
                    if provider.is_available().await {
                        candidates.push(provider.clone());
                    }
                }
            }
        }

        let shuffled_pick = {
            let mut rng = rand::thread_rng();
            candidates.shuffle(&mut rng);
            candidates.into_iter().next()
        };
        if let Some(provider) = shuffled_pick {
            return provider;
        }

        if let Some(provider) = fallback_default {
            tracing::debug!(
                provider = provider.name(),
                "no available candidates, using fallback default"
            );
            return provider;
        }
        if let Some(provider) = self
            .providers
            .iter()
            .find(|p| p.family() == ProviderFamily::Stub)
        {
            return provider.clone();
        }
        // Registry checked non-empty in generate().
        self.providers[0].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::provider::ImageInput;
    use serde_json::{json, Map};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// A configurable mock provider for orchestrator tests.
    struct MockProvider {
        name: String,
        family: ProviderFamily,
        hint: bool,
        fail: bool,
        delay: Option<Duration>,
        timeout: Duration,
        calls: Arc<AtomicU32>,
        call_log: Option<Arc<Mutex<Vec<String>>>>,
    }

    impl MockProvider {
        fn succeeding(name: &str) -> Self {
            Self {
                name: name.to_string(),
                family: ProviderFamily::Hosted,
                hint: true,
                fail: false,
                delay: None,
                timeout: Duration::from_secs(5),
                calls: Arc::new(AtomicU32::new(0)),
                call_log: None,
            }
        }

        fn failing(name: &str) -> Self {
            Self {
                fail: true,
                ..Self::succeeding(name)
            }
        }

        fn with_family(mut self, family: ProviderFamily) -> Self {
            self.family = family;
            self
        }

        fn with_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
            self.call_log = Some(log);
            self
        }

        fn with_delay(mut self, delay: Duration, timeout: Duration) -> Self {
            self.delay = Some(delay);
            self.timeout = timeout;
            self
        }

        fn calls_handle(&self) -> Arc<AtomicU32> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl AnalysisProvider for MockProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn family(&self) -> ProviderFamily {
            self.family
        }

        fn describe(&self) -> ProviderDescriptor {
            ProviderDescriptor {
                name: self.name.clone(),
                family: self.family,
                available_hint: self.hint,
            }
        }

        async fn is_available(&self) -> bool {
            self.hint
        }

        async fn generate(
            &self,
            _request: &AnalysisRequest,
        ) -> Result<AnalysisResult, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(log) = &self.call_log {
                log.lock().unwrap().push(self.name.clone());
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(ProviderError::unavailable(&self.name, "mock outage"));
            }
            Ok(AnalysisResult::new(
                &self.name,
                format!("caption from {}", self.name),
                json!({"description": "d", "analysis": "a", "recommended_actions": "r", "metadata": {}}),
                Map::new(),
            ))
        }

        fn timeout(&self) -> Duration {
            self.timeout
        }
    }

    fn record(name: &str, available: bool, fallback_default: bool) -> AvailabilityRecord {
        AvailabilityRecord {
            name: name.to_string(),
            is_available: available,
            is_fallback_default: fallback_default,
        }
    }

    fn all_available(names: &[&str]) -> Arc<StaticAvailability> {
        Arc::new(StaticAvailability::new(
            names.iter().map(|n| record(n, true, false)).collect(),
        ))
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF]), "prompt", "")
    }

    struct FailingLookup;

    #[async_trait]
    impl AvailabilityLookup for FailingLookup {
        async fn registered_model_availability(
            &self,
        ) -> Result<Vec<AvailabilityRecord>, AvailabilityError> {
            Err(AvailabilityError::new("store unreachable"))
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_explicit_available_name_never_falls_back() {
        let orchestrator = Orchestrator::new(
            vec![
                Arc::new(MockProvider::succeeding("alpha")),
                Arc::new(MockProvider::succeeding("beta")),
            ],
            all_available(&["alpha", "beta"]),
        );

        let result = orchestrator.generate(&request(), Some("beta")).await.unwrap();
        assert_eq!(result.provider_name, "beta");
        assert!(!result.fallback_used);
        assert!(result.original_provider_name.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_explicit_failure_tries_every_other_provider() {
        let a = MockProvider::failing("alpha");
        let b = MockProvider::failing("beta");
        let c = MockProvider::failing("gamma");
        let (calls_a, calls_b, calls_c) = (a.calls_handle(), b.calls_handle(), c.calls_handle());

        let orchestrator = Orchestrator::new(
            vec![Arc::new(a), Arc::new(b), Arc::new(c)],
            all_available(&["alpha", "beta", "gamma"]),
        );

        let err = orchestrator
            .generate(&request(), Some("alpha"))
            .await
            .unwrap_err();
        match err {
            AnalysisError::AllProvidersFailed { attempted, .. } => assert_eq!(attempted, 3),
            other => panic!("expected AllProvidersFailed, got {other}"),
        }
        assert_eq!(calls_a.load(Ordering::SeqCst), 1);
        assert_eq!(calls_b.load(Ordering::SeqCst), 1);
        assert_eq!(calls_c.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fallback_walks_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let orchestrator = Orchestrator::new(
            vec![
                Arc::new(MockProvider::failing("alpha").with_log(log.clone())),
                Arc::new(MockProvider::failing("beta").with_log(log.clone())),
                Arc::new(MockProvider::failing("gamma").with_log(log.clone())),
            ],
            all_available(&["alpha", "beta", "gamma"]),
        );

        // Start from the middle: fallback should walk the others in
        // registration order, not resume after the failed one.
        let _ = orchestrator.generate(&request(), Some("beta")).await;
        assert_eq!(*log.lock().unwrap(), vec!["beta", "alpha", "gamma"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fallback_tags_original_provider_and_reason() {
        let orchestrator = Orchestrator::new(
            vec![
                Arc::new(MockProvider::failing("alpha")),
                Arc::new(MockProvider::succeeding("beta")),
            ],
            all_available(&["alpha", "beta"]),
        );

        let result = orchestrator
            .generate(&request(), Some("alpha"))
            .await
            .unwrap();
        assert_eq!(result.provider_name, "beta");
        assert!(result.fallback_used);
        assert_eq!(result.original_provider_name.as_deref(), Some("alpha"));
        assert!(result.fallback_reason.as_deref().unwrap().contains("mock outage"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_explicit_name_not_found_falls_through_to_random() {
        let orchestrator = Orchestrator::new(
            vec![Arc::new(MockProvider::succeeding("alpha"))],
            all_available(&["alpha"]),
        );

        let result = orchestrator
            .generate(&request(), Some("no-such-model"))
            .await
            .unwrap();
        assert_eq!(result.provider_name, "alpha");
        assert!(!result.fallback_used);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_random_never_selects_manual() {
        let orchestrator = Orchestrator::new(
            vec![
                Arc::new(MockProvider::succeeding("alpha")),
                Arc::new(MockProvider::succeeding("manual").with_family(ProviderFamily::Manual)),
                Arc::new(MockProvider::succeeding("beta")),
            ],
            all_available(&["alpha", "manual", "beta"]),
        );

        for _ in 0..50 {
            let result = orchestrator.generate(&request(), None).await.unwrap();
            assert_ne!(result.provider_name, "manual");
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_manual_reachable_by_explicit_name() {
        let orchestrator = Orchestrator::new(
            vec![
                Arc::new(MockProvider::succeeding("alpha")),
                Arc::new(MockProvider::succeeding("manual").with_family(ProviderFamily::Manual)),
            ],
            all_available(&["alpha", "manual"]),
        );

        let result = orchestrator
            .generate(&request(), Some("manual"))
            .await
            .unwrap();
        assert_eq!(result.provider_name, "manual");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_pool_prefers_fallback_default() {
        let availability = Arc::new(StaticAvailability::new(vec![
            record("alpha", false, false),
            record("beta", false, true),
        ]));
        let orchestrator = Orchestrator::new(
            vec![
                Arc::new(MockProvider::succeeding("alpha")),
                Arc::new(MockProvider::succeeding("beta")),
                Arc::new(MockProvider::succeeding("stub").with_family(ProviderFamily::Stub)),
            ],
            availability,
        );

        let result = orchestrator.generate(&request(), None).await.unwrap();
        assert_eq!(result.provider_name, "beta");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_pool_without_default_prefers_stub() {
        let availability = Arc::new(StaticAvailability::new(vec![record("alpha", false, false)]));
        let orchestrator = Orchestrator::new(
            vec![
                Arc::new(MockProvider::succeeding("alpha")),
                Arc::new(MockProvider::succeeding("stub").with_family(ProviderFamily::Stub)),
            ],
            availability,
        );

        let result = orchestrator.generate(&request(), None).await.unwrap();
        assert_eq!(result.provider_name, "stub");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_pool_resolves_any_registered_provider() {
        // No availability records at all, no stub registered: selection
        // still resolves rather than failing.
        let availability = Arc::new(StaticAvailability::new(Vec::new()));
        let orchestrator = Orchestrator::new(
            vec![Arc::new(MockProvider::succeeding("alpha"))],
            availability,
        );

        let result = orchestrator.generate(&request(), None).await.unwrap();
        assert_eq!(result.provider_name, "alpha");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_lookup_failure_degrades_to_local_hints() {
        let unavailable = MockProvider {
            hint: false,
            ..MockProvider::succeeding("alpha")
        };
        let orchestrator = Orchestrator::new(
            vec![
                Arc::new(unavailable),
                Arc::new(MockProvider::succeeding("beta")),
            ],
            Arc::new(FailingLookup),
        );

        for _ in 0..10 {
            let result = orchestrator.generate(&request(), None).await.unwrap();
            assert_eq!(result.provider_name, "beta");
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_timeout_is_unavailable_and_triggers_fallback() {
        let slow = MockProvider::succeeding("slow")
            .with_delay(Duration::from_secs(5), Duration::from_millis(50));
        let orchestrator = Orchestrator::new(
            vec![Arc::new(slow), Arc::new(MockProvider::succeeding("beta"))],
            all_available(&["slow", "beta"]),
        );

        let result = orchestrator.generate(&request(), Some("slow")).await.unwrap();
        assert_eq!(result.provider_name, "beta");
        assert!(result.fallback_used);
        assert!(result.fallback_reason.as_deref().unwrap().contains("no response"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_registry_is_an_error() {
        let orchestrator = Orchestrator::new(Vec::new(), all_available(&[]));
        let err = orchestrator.generate(&request(), None).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NoProvidersRegistered));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_all_failed_reports_last_reason() {
        let orchestrator = Orchestrator::new(
            vec![
                Arc::new(MockProvider::failing("alpha")),
                Arc::new(MockProvider::failing("beta")),
            ],
            all_available(&["alpha", "beta"]),
        );

        let err = orchestrator
            .generate(&request(), Some("alpha"))
            .await
            .unwrap_err();
        match err {
            AnalysisError::AllProvidersFailed {
                attempted,
                last_reason,
            } => {
                assert_eq!(attempted, 2);
                assert!(last_reason.contains("mock outage"));
            }
            other => panic!("expected AllProvidersFailed, got {other}"),
        }
    }

    #[test]
    fn test_descriptors_follow_registration_order() {
        let orchestrator = Orchestrator::new(
            vec![
                Arc::new(MockProvider::succeeding("alpha")),
                Arc::new(MockProvider::succeeding("stub").with_family(ProviderFamily::Stub)),
            ],
            Arc::new(StaticAvailability::new(Vec::new())),
        );
        let descriptors = orchestrator.descriptors();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name, "alpha");
        assert_eq!(descriptors[1].family, ProviderFamily::Stub);
        assert_eq!(orchestrator.provider_names(), vec!["alpha", "stub"]);
    }
}
