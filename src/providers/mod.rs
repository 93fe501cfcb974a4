//! Provider adapters: one external translation backend each

pub mod deepl;
pub mod google;
pub mod libretranslate;
pub mod microsoft;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::{CredentialStore, GatewayConfig};
use crate::core::errors::{GatewayError, ProviderError, ProviderErrorKind, Result};

pub use deepl::DeeplProvider;
pub use google::GoogleProvider;
pub use libretranslate::LibreTranslateProvider;
pub use microsoft::MicrosoftProvider;

/// Result of a single provider attempt
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Uniform translation call over one backend.
///
/// Adapters do not retry and do not touch shared state; each failure comes
/// back as a [`ProviderError`] for the orchestrator to record.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Stable identifier used in health records and configuration
    fn id(&self) -> &str;

    /// Whether the credentials this adapter needs are present
    fn is_configured(&self) -> bool;

    /// Translate `text`; `source_lang` may be the auto-detect sentinel
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ProviderResult<String>;
}

/// Primary provider followed by fallbacks, fixed at construction
#[derive(Clone)]
pub struct ProviderChain {
    primary: Arc<dyn TranslationProvider>,
    fallbacks: Vec<Arc<dyn TranslationProvider>>,
}

impl fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderChain")
            .field("primary", &self.primary.id())
            .field(
                "fallbacks",
                &self.fallbacks.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ProviderChain {
    pub fn new(
        primary: Arc<dyn TranslationProvider>,
        fallbacks: Vec<Arc<dyn TranslationProvider>>,
    ) -> Self {
        Self { primary, fallbacks }
    }

    /// Build the HTTP adapters named by the configuration.
    ///
    /// Adapters read their credentials from `credentials` on every call, so a
    /// reload of the store is picked up without rebuilding the chain.
    pub fn from_config(config: &GatewayConfig, credentials: Arc<CredentialStore>) -> Result<Self> {
        let timeout = config.provider_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        let primary = build_provider(&config.primary_provider, &credentials, timeout, &client)?;
        let fallbacks = config
            .fallback_providers
            .iter()
            .map(|id| build_provider(id, &credentials, timeout, &client))
            .collect::<Result<Vec<_>>>()?;

        let chain = Self::new(primary, fallbacks);
        info!("Provider chain: {:?}", chain);
        Ok(chain)
    }

    /// All providers in attempt order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TranslationProvider>> {
        std::iter::once(&self.primary).chain(self.fallbacks.iter())
    }

    pub fn find(&self, provider_id: &str) -> Option<&Arc<dyn TranslationProvider>> {
        self.iter().find(|provider| provider.id() == provider_id)
    }
}

fn build_provider(
    provider_id: &str,
    credentials: &Arc<CredentialStore>,
    timeout: Duration,
    client: &reqwest::Client,
) -> Result<Arc<dyn TranslationProvider>> {
    let provider: Arc<dyn TranslationProvider> = match provider_id {
        google::PROVIDER_ID => Arc::new(GoogleProvider::new(
            client.clone(),
            credentials.clone(),
            timeout,
        )),
        deepl::PROVIDER_ID => Arc::new(DeeplProvider::new(
            client.clone(),
            credentials.clone(),
            timeout,
        )),
        microsoft::PROVIDER_ID => Arc::new(MicrosoftProvider::new(
            client.clone(),
            credentials.clone(),
            timeout,
        )),
        libretranslate::PROVIDER_ID => Arc::new(LibreTranslateProvider::new(
            client.clone(),
            credentials.clone(),
            timeout,
        )),
        other => {
            return Err(GatewayError::config(format!("Unknown provider: {}", other)));
        }
    };

    Ok(provider)
}

/// Send a request and decode its JSON body, bounded by `timeout` end to end
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider_id: &str,
    timeout: Duration,
    request: reqwest::RequestBuilder,
) -> ProviderResult<T> {
    let call = async {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(provider_id, e))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            let kind = match status_code {
                401 | 403 => ProviderErrorKind::Unauthorized(status_code),
                429 => ProviderErrorKind::Throttled,
                _ => ProviderErrorKind::Status(status_code, error_text),
            };
            return Err(ProviderError::new(provider_id, kind));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(provider_id, e))?;

        serde_json::from_str::<T>(&body).map_err(|e| {
            ProviderError::new(provider_id, ProviderErrorKind::InvalidResponse(e.to_string()))
        })
    };

    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            debug!("{} call exceeded {:?}", provider_id, timeout);
            Err(ProviderError::new(provider_id, ProviderErrorKind::Timeout))
        }
    }
}

/// Error for a well-formed body that carries no translation
pub(crate) fn empty_response(provider_id: &str) -> ProviderError {
    ProviderError::new(
        provider_id,
        ProviderErrorKind::InvalidResponse("No translation in response".to_string()),
    )
}
