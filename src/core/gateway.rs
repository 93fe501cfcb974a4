//! Gateway orchestrator: cache, admission, provider chain, degraded result

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::cache::ResultCache;
use crate::core::config::{CredentialStore, GatewayConfig};
use crate::core::errors::{GatewayError, Result};
use crate::core::health::HealthTracker;
use crate::core::models::{
    HealthStatus, ProviderHealth, ProviderTestResult, RequestStats, TranslationRequest,
};
use crate::core::rate_limiter::RateLimiter;
use crate::providers::ProviderChain;

/// Fixed phrase sent by [`Gateway::test_provider`]
const CHECK_TEXT: &str = "Hello";
const CHECK_SOURCE: &str = "en";
const CHECK_TARGET: &str = "es";

enum ChainOutcome {
    Translated { provider_id: String, text: String },
    Exhausted,
}

/// Translation gateway.
///
/// Cheap to clone; clones share cache, rate window and health state.
#[derive(Debug, Clone)]
pub struct Gateway {
    chain: ProviderChain,
    cache: ResultCache,
    rate_limiter: RateLimiter,
    health: HealthTracker,
    health_check_interval: Duration,
    credentials: Option<Arc<CredentialStore>>,
}

impl Gateway {
    /// Create a gateway with HTTP providers built from `config`; the
    /// credentials in `config` are used as-is for the gateway's lifetime.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let credentials = CredentialStore::fixed(config.credentials.clone());
        Self::with_credentials(config, credentials)
    }

    /// Create a gateway whose providers read credentials from `credentials`.
    ///
    /// The health monitor reloads the store on every tick, so credentials
    /// that appear or disappear at their source change provider status
    /// without a restart.
    pub fn with_credentials(config: GatewayConfig, credentials: Arc<CredentialStore>) -> Result<Self> {
        config.validate()?;
        let chain = ProviderChain::from_config(&config, credentials.clone())?;
        let mut gateway = Self::with_chain(chain, &config);
        gateway.credentials = Some(credentials);
        Ok(gateway)
    }

    /// Create from environment, re-reading credential variables on each health check
    pub fn from_env() -> Result<Self> {
        Self::with_credentials(GatewayConfig::from_env()?, CredentialStore::from_env())
    }

    /// Create a gateway over an explicit provider chain; provider settings
    /// in `config` are ignored.
    pub fn with_chain(chain: ProviderChain, config: &GatewayConfig) -> Self {
        let health = HealthTracker::new(
            chain
                .iter()
                .map(|provider| (provider.id().to_string(), provider.is_configured())),
        );

        for provider in chain.iter() {
            if !provider.is_configured() {
                info!("Provider {} has no credentials; it will be skipped", provider.id());
            }
        }

        Self {
            chain,
            cache: ResultCache::new(config.cache_ttl()),
            rate_limiter: RateLimiter::new(
                config.rate_limit_window(),
                config.rate_limit_max_requests,
            ),
            health,
            health_check_interval: config.health_check_interval(),
            credentials: None,
        }
    }

    /// Translate a request.
    ///
    /// Only [`GatewayError::InvalidRequest`] and [`GatewayError::RateLimited`]
    /// are returned; provider failures resolve to a degraded passthrough.
    pub async fn translate(&self, request: &TranslationRequest) -> Result<String> {
        let key = request.cache_key();
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Cache hit for target {}", request.target_lang());
            return Ok(cached);
        }

        if request.text().trim().is_empty() {
            return Err(GatewayError::invalid("text is required"));
        }
        if request.target_lang().trim().is_empty() {
            return Err(GatewayError::invalid("target language is required"));
        }

        if !self.has_candidate().await {
            warn!(
                "No configured providers for target {}; returning passthrough",
                request.target_lang()
            );
            return Ok(degraded_fallback(request));
        }

        if !self.rate_limiter.try_admit().await {
            let retry_after = self.rate_limiter.retry_after().await;
            warn!("Rate limit reached; retry after {:?}", retry_after);
            return Err(GatewayError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        match self.attempt_chain(request).await {
            ChainOutcome::Translated { provider_id, text } => {
                debug!("Translated by {}", provider_id);
                self.cache.put(key, text.clone()).await;
                Ok(text)
            }
            ChainOutcome::Exhausted => {
                warn!(
                    "All providers failed for target {}; returning passthrough",
                    request.target_lang()
                );
                Ok(degraded_fallback(request))
            }
        }
    }

    /// Convenience wrapper taking loose arguments
    pub async fn translate_text(
        &self,
        text: &str,
        source_lang: Option<&str>,
        target_lang: &str,
    ) -> Result<String> {
        let mut request = TranslationRequest::new(text, target_lang);
        if let Some(source_lang) = source_lang {
            request = request.with_source_lang(source_lang);
        }
        self.translate(&request).await
    }

    /// Whether any provider in the chain would be attempted
    async fn has_candidate(&self) -> bool {
        for provider in self.chain.iter() {
            if self.health.status(provider.id()).await != Some(HealthStatus::Unconfigured) {
                return true;
            }
        }
        false
    }

    /// Walk primary then fallbacks in configuration order
    async fn attempt_chain(&self, request: &TranslationRequest) -> ChainOutcome {
        for provider in self.chain.iter() {
            let provider_id = provider.id();

            if self.health.status(provider_id).await == Some(HealthStatus::Unconfigured) {
                debug!("Skipping unconfigured provider {}", provider_id);
                continue;
            }

            match provider
                .translate(request.text(), request.source_lang(), request.target_lang())
                .await
            {
                Ok(text) => {
                    self.health.record_success(provider_id).await;
                    return ChainOutcome::Translated {
                        provider_id: provider_id.to_string(),
                        text,
                    };
                }
                Err(e) => {
                    warn!("Provider {} failed: {}", provider_id, e);
                    self.health.record_failure(provider_id, &e).await;
                }
            }
        }

        ChainOutcome::Exhausted
    }

    /// Provider id -> status string
    pub async fn service_status(&self) -> BTreeMap<String, String> {
        self.health
            .snapshot()
            .await
            .into_iter()
            .map(|(id, record)| (id, record.status.to_string()))
            .collect()
    }

    /// Provider id -> full health record
    pub async fn detailed_service_status(&self) -> BTreeMap<String, ProviderHealth> {
        self.health.snapshot().await
    }

    pub async fn request_stats(&self) -> RequestStats {
        self.rate_limiter.stats().await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("Translation cache cleared");
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.len().await
    }

    /// Call one provider directly with a fixed phrase, bypassing the cache
    pub async fn test_provider(&self, provider_id: &str) -> ProviderTestResult {
        let Some(provider) = self.chain.find(provider_id) else {
            return ProviderTestResult::failed(format!("Unknown provider: {}", provider_id));
        };

        if !provider.is_configured() {
            return ProviderTestResult::failed(format!("Provider {} is not configured", provider_id));
        }

        if !self.rate_limiter.try_admit().await {
            return ProviderTestResult::failed("Rate limit exceeded");
        }

        match provider.translate(CHECK_TEXT, CHECK_SOURCE, CHECK_TARGET).await {
            Ok(text) => {
                self.health.record_success(provider_id).await;
                ProviderTestResult::ok(text)
            }
            Err(e) => {
                self.health.record_failure(provider_id, &e).await;
                ProviderTestResult::failed(e.to_string())
            }
        }
    }

    /// Passive re-check: reload credentials from their source, refresh
    /// configuration presence for providers that have not been exercised,
    /// and drop expired cache entries. Never calls a provider.
    pub async fn run_health_check(&self) {
        if let Some(credentials) = &self.credentials {
            match credentials.reload() {
                Ok(true) => info!("Provider credentials reloaded"),
                Ok(false) => {}
                Err(e) => warn!("Failed to reload provider credentials: {}", e),
            }
        }

        for provider in self.chain.iter() {
            match self.health.status(provider.id()).await {
                Some(HealthStatus::Unconfigured) | Some(HealthStatus::Configured) | None => {
                    self.health
                        .record_config_state(provider.id(), provider.is_configured())
                        .await;
                }
                Some(HealthStatus::Healthy) | Some(HealthStatus::Error) => {}
            }
        }

        let purged = self.cache.purge_expired().await;
        if purged > 0 {
            debug!("Purged {} expired cache entries", purged);
        }
    }

    /// Run [`Gateway::run_health_check`] on the configured interval
    pub fn spawn_health_monitor(&self) -> JoinHandle<()> {
        let gateway = self.clone();
        let mut ticker = tokio::time::interval(self.health_check_interval);

        tokio::spawn(async move {
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                gateway.run_health_check().await;
            }
        })
    }
}

/// Last-resort result when every provider failed
fn degraded_fallback(request: &TranslationRequest) -> String {
    format!(
        "[{}] {}",
        request.target_lang().to_uppercase(),
        request.text()
    )
}
