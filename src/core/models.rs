//! Core data models for the gateway

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source language sentinel meaning "let the provider detect it"
pub const AUTO_DETECT: &str = "auto";

/// Whether a source language asks the provider to detect the language
pub fn is_auto_detect(lang: &str) -> bool {
    lang.eq_ignore_ascii_case(AUTO_DETECT)
}

/// Translation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    text: String,
    source_lang: String,
    target_lang: String,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_lang: AUTO_DETECT.to_string(),
            target_lang: target_lang.into(),
        }
    }

    /// Set the source language; an empty value falls back to auto-detect
    pub fn with_source_lang(mut self, source_lang: impl Into<String>) -> Self {
        let source_lang = source_lang.into();
        self.source_lang = if source_lang.trim().is_empty() {
            AUTO_DETECT.to_string()
        } else {
            source_lang
        };
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            text: self.text.clone(),
            source_lang: self.source_lang.clone(),
            target_lang: self.target_lang.clone(),
        }
    }
}

/// Key of the result cache: the full (text, source, target) triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// Provider status as tracked by the health tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// No credentials; skipped by the orchestrator
    Unconfigured,
    /// Credentials present, not yet exercised
    Configured,
    /// Last call succeeded
    Healthy,
    /// Last call failed
    Error,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Unconfigured => write!(f, "unconfigured"),
            HealthStatus::Configured => write!(f, "configured"),
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Error => write!(f, "error"),
        }
    }
}

/// Health record of one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub provider_id: String,
    pub status: HealthStatus,
    pub last_checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ProviderHealth {
    pub fn new(provider_id: impl Into<String>, configured: bool) -> Self {
        Self {
            provider_id: provider_id.into(),
            status: if configured {
                HealthStatus::Configured
            } else {
                HealthStatus::Unconfigured
            },
            last_checked_at: Utc::now(),
            last_error: None,
        }
    }
}

/// Snapshot of the rate window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStats {
    pub total_requests_in_window: usize,
    pub max_requests: usize,
    pub window_secs: u64,
    pub is_rate_limited: bool,
}

/// Outcome of a diagnostic provider call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTestResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderTestResult {
    pub fn ok(result: String) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}
