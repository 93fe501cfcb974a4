//! Translation Gateway - resilient translation across unreliable providers
//!
//! This library routes (text, source, target) requests through a primary
//! translation provider and an ordered fallback chain, with a result cache,
//! per-provider health tracking and a global request-rate ceiling.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod providers;
pub mod server;

// Re-export key types for convenience
pub use crate::core::{
    config::{CredentialStore, GatewayConfig, ProviderCredentials},
    errors::{GatewayError, ProviderError, ProviderErrorKind},
    gateway::Gateway,
    models::{HealthStatus, ProviderHealth, ProviderTestResult, RequestStats, TranslationRequest},
};

pub use crate::providers::{ProviderChain, TranslationProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
