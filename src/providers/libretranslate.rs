//! LibreTranslate adapter (self-hosted or public instance)

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{send_json, ProviderResult, TranslationProvider};
use crate::core::config::CredentialStore;
use crate::core::errors::{ProviderError, ProviderErrorKind};

pub const PROVIDER_ID: &str = "libretranslate";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    translated_text: String,
}

#[derive(Debug, Clone)]
pub struct LibreTranslateProvider {
    client: reqwest::Client,
    credentials: Arc<CredentialStore>,
    timeout: Duration,
}

impl LibreTranslateProvider {
    /// The instance URL is the credential; the provider is unconfigured without it
    pub fn new(client: reqwest::Client, credentials: Arc<CredentialStore>, timeout: Duration) -> Self {
        Self {
            client,
            credentials,
            timeout,
        }
    }
}

#[async_trait]
impl TranslationProvider for LibreTranslateProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn is_configured(&self) -> bool {
        self.credentials.read(|c| c.libretranslate_url.is_some())
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ProviderResult<String> {
        let (url, api_key) = self
            .credentials
            .read(|c| {
                c.libretranslate_url
                    .clone()
                    .map(|url| (url, c.libretranslate_api_key.clone()))
            })
            .ok_or_else(|| ProviderError::new(PROVIDER_ID, ProviderErrorKind::MissingCredentials))?;

        // LibreTranslate understands "auto" natively.
        let mut body = serde_json::json!({
            "q": text,
            "source": source_lang,
            "target": target_lang,
            "format": "text",
        });
        if let Some(api_key) = api_key {
            body["api_key"] = serde_json::json!(api_key);
        }

        let request = self.client.post(format!("{}/translate", url)).json(&body);
        let response: LibreResponse = send_json(PROVIDER_ID, self.timeout, request).await?;

        Ok(response.translated_text)
    }
}
