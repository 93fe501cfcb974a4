//! Provider health bookkeeping

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::errors::ProviderError;
use crate::core::models::{HealthStatus, ProviderHealth};

/// Tracks one [`ProviderHealth`] record per known provider.
///
/// Records are created up front and never removed. `unconfigured` only
/// changes through [`HealthTracker::record_config_state`]; call outcomes
/// still refresh its timestamp and error text.
#[derive(Debug, Clone, Default)]
pub struct HealthTracker {
    records: Arc<RwLock<BTreeMap<String, ProviderHealth>>>,
}

impl HealthTracker {
    /// Create a tracker seeded with `(provider_id, configured)` pairs
    pub fn new<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        let records = providers
            .into_iter()
            .map(|(id, configured)| {
                let id = id.into();
                (id.clone(), ProviderHealth::new(id, configured))
            })
            .collect();

        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn record_success(&self, provider_id: &str) {
        let mut records = self.records.write().await;
        let record = records
            .entry(provider_id.to_string())
            .or_insert_with(|| ProviderHealth::new(provider_id, true));

        if record.status != HealthStatus::Unconfigured {
            record.status = HealthStatus::Healthy;
        }
        record.last_checked_at = Utc::now();
        record.last_error = None;
    }

    pub async fn record_failure(&self, provider_id: &str, error: &ProviderError) {
        let mut records = self.records.write().await;
        let record = records
            .entry(provider_id.to_string())
            .or_insert_with(|| ProviderHealth::new(provider_id, true));

        if record.status != HealthStatus::Unconfigured {
            record.status = HealthStatus::Error;
        }
        record.last_checked_at = Utc::now();
        record.last_error = Some(error.kind.to_string());
    }

    /// Apply the current credential presence for a provider
    pub async fn record_config_state(&self, provider_id: &str, configured: bool) {
        let mut records = self.records.write().await;
        let record = records
            .entry(provider_id.to_string())
            .or_insert_with(|| ProviderHealth::new(provider_id, configured));

        let next = match (record.status, configured) {
            (_, false) => HealthStatus::Unconfigured,
            (HealthStatus::Unconfigured, true) => HealthStatus::Configured,
            (status, true) => status,
        };

        if next != record.status {
            info!("Provider {} status {} -> {}", provider_id, record.status, next);
        } else {
            debug!("Provider {} re-checked: {}", provider_id, next);
        }

        record.status = next;
        record.last_checked_at = Utc::now();
    }

    pub async fn status(&self, provider_id: &str) -> Option<HealthStatus> {
        self.records
            .read()
            .await
            .get(provider_id)
            .map(|record| record.status)
    }

    pub async fn snapshot(&self) -> BTreeMap<String, ProviderHealth> {
        self.records.read().await.clone()
    }
}
