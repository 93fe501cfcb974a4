//! Configuration management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::errors::{GatewayError, Result};

/// Ids of the providers this gateway knows how to build
pub const KNOWN_PROVIDERS: &[&str] = &["google", "deepl", "microsoft", "libretranslate"];

/// Credential material per provider. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCredentials {
    pub google_api_key: Option<String>,
    pub deepl_api_key: Option<String>,
    pub microsoft_key: Option<String>,
    pub microsoft_region: Option<String>,
    pub libretranslate_url: Option<String>,
    pub libretranslate_api_key: Option<String>,
}

impl ProviderCredentials {
    /// Read credentials from environment variables
    pub fn from_env() -> Self {
        Self {
            google_api_key: env_non_empty("GOOGLE_TRANSLATE_API_KEY"),
            deepl_api_key: env_non_empty("DEEPL_API_KEY"),
            microsoft_key: env_non_empty("MICROSOFT_TRANSLATOR_KEY"),
            microsoft_region: env_non_empty("MICROSOFT_TRANSLATOR_REGION"),
            libretranslate_url: env_non_empty("LIBRETRANSLATE_URL"),
            libretranslate_api_key: env_non_empty("LIBRETRANSLATE_API_KEY"),
        }
    }

    fn normalized(self) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            google_api_key: present(self.google_api_key),
            deepl_api_key: present(self.deepl_api_key),
            microsoft_key: present(self.microsoft_key),
            microsoft_region: present(self.microsoft_region),
            libretranslate_url: present(self.libretranslate_url)
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            libretranslate_api_key: present(self.libretranslate_api_key),
        }
    }
}

type CredentialLoader = Box<dyn Fn() -> Result<ProviderCredentials> + Send + Sync>;

/// Live credentials shared by every provider adapter.
///
/// Adapters read through the store on each call, so a [`reload`](Self::reload)
/// is visible to the next attempt and to the next health check.
pub struct CredentialStore {
    current: RwLock<ProviderCredentials>,
    loader: Option<CredentialLoader>,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("reloadable", &self.loader.is_some())
            .finish()
    }
}

impl CredentialStore {
    /// Credentials that never change
    pub fn fixed(credentials: ProviderCredentials) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(credentials.normalized()),
            loader: None,
        })
    }

    /// Credentials re-read from `loader` on every reload
    pub fn with_loader<F>(loader: F) -> Result<Arc<Self>>
    where
        F: Fn() -> Result<ProviderCredentials> + Send + Sync + 'static,
    {
        let initial = loader()?;
        Ok(Arc::new(Self {
            current: RwLock::new(initial.normalized()),
            loader: Some(Box::new(loader)),
        }))
    }

    /// Credentials backed by environment variables
    pub fn from_env() -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(ProviderCredentials::from_env().normalized()),
            loader: Some(Box::new(|| -> Result<ProviderCredentials> {
                Ok(ProviderCredentials::from_env())
            })),
        })
    }

    /// Credentials backed by the `credentials` section of a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let path = path.as_ref().to_path_buf();
        Self::with_loader(move || Ok(GatewayConfig::from_file(&path)?.credentials))
    }

    /// Run `f` against the current credentials
    pub fn read<T>(&self, f: impl FnOnce(&ProviderCredentials) -> T) -> T {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(&current)
    }

    pub fn replace(&self, credentials: ProviderCredentials) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = credentials.normalized();
    }

    /// Re-read from the loader; `Ok(true)` when anything changed
    pub fn reload(&self) -> Result<bool> {
        let Some(loader) = &self.loader else {
            return Ok(false);
        };

        let fresh = loader()?.normalized();
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if *current == fresh {
            return Ok(false);
        }

        debug!("Provider credentials changed");
        *current = fresh;
        Ok(true)
    }
}

/// Configuration for the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub primary_provider: String,
    pub fallback_providers: Vec<String>,
    pub cache_ttl_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max_requests: usize,
    pub provider_timeout_ms: u64,
    pub health_check_interval_secs: u64,
    pub credentials: ProviderCredentials,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            primary_provider: "google".to_string(),
            fallback_providers: vec![
                "deepl".to_string(),
                "microsoft".to_string(),
                "libretranslate".to_string(),
            ],
            cache_ttl_secs: 3600,
            rate_limit_window_secs: 60,
            rate_limit_max_requests: 100,
            provider_timeout_ms: 10_000,
            health_check_interval_secs: 300,
            credentials: ProviderCredentials::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let primary_provider =
            env_non_empty("PRIMARY_PROVIDER").unwrap_or(defaults.primary_provider);

        let fallback_providers = match env_non_empty("FALLBACK_PROVIDERS") {
            Some(list) => list
                .split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
            None => defaults.fallback_providers,
        };

        let config = Self {
            primary_provider,
            fallback_providers,
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            rate_limit_window_secs: env_parse(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            )?,
            rate_limit_max_requests: env_parse(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            )?,
            provider_timeout_ms: env_parse("PROVIDER_TIMEOUT_MS", defaults.provider_timeout_ms)?,
            health_check_interval_secs: env_parse(
                "HEALTH_CHECK_INTERVAL_SECS",
                defaults.health_check_interval_secs,
            )?,
            credentials: ProviderCredentials::from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON or YAML file, chosen by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs == 0 {
            return Err(GatewayError::config("cache_ttl_secs must be greater than 0"));
        }

        if self.rate_limit_window_secs == 0 {
            return Err(GatewayError::config(
                "rate_limit_window_secs must be greater than 0",
            ));
        }

        if self.rate_limit_max_requests == 0 {
            return Err(GatewayError::config(
                "rate_limit_max_requests must be greater than 0",
            ));
        }

        if self.provider_timeout_ms == 0 {
            return Err(GatewayError::config("provider_timeout_ms must be greater than 0"));
        }

        if self.health_check_interval_secs == 0 {
            return Err(GatewayError::config(
                "health_check_interval_secs must be greater than 0",
            ));
        }

        let mut seen: Vec<&str> = Vec::new();
        for id in self.provider_order() {
            if !KNOWN_PROVIDERS.contains(&id) {
                return Err(GatewayError::config(format!("Unknown provider: {}", id)));
            }
            if seen.contains(&id) {
                return Err(GatewayError::config(format!(
                    "Provider listed more than once: {}",
                    id
                )));
            }
            seen.push(id);
        }

        if self.fallback_providers.is_empty() {
            warn!("No fallback providers configured");
        }

        Ok(())
    }

    /// Primary followed by fallbacks, in attempt order
    pub fn provider_order(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_provider.as_str())
            .chain(self.fallback_providers.iter().map(String::as_str))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_non_empty(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| GatewayError::config(format!("{}: {}", name, e))),
        None => Ok(default),
    }
}
