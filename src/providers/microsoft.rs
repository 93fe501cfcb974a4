//! Microsoft Translator (Azure AI Translator v3) adapter

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{empty_response, send_json, ProviderResult, TranslationProvider};
use crate::core::config::CredentialStore;
use crate::core::errors::{ProviderError, ProviderErrorKind};
use crate::core::models::is_auto_detect;

pub const PROVIDER_ID: &str = "microsoft";

const DEFAULT_BASE_URL: &str = "https://api.cognitive.microsofttranslator.com";

#[derive(Debug, Deserialize)]
struct MicrosoftItem {
    translations: Vec<MicrosoftTranslation>,
}

#[derive(Debug, Deserialize)]
struct MicrosoftTranslation {
    text: String,
}

#[derive(Debug, Clone)]
pub struct MicrosoftProvider {
    client: reqwest::Client,
    credentials: Arc<CredentialStore>,
    base_url: String,
    timeout: Duration,
}

impl MicrosoftProvider {
    pub fn new(client: reqwest::Client, credentials: Arc<CredentialStore>, timeout: Duration) -> Self {
        Self {
            client,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl TranslationProvider for MicrosoftProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn is_configured(&self) -> bool {
        self.credentials.read(|c| c.microsoft_key.is_some())
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ProviderResult<String> {
        let (key, region) = self
            .credentials
            .read(|c| c.microsoft_key.clone().map(|key| (key, c.microsoft_region.clone())))
            .ok_or_else(|| ProviderError::new(PROVIDER_ID, ProviderErrorKind::MissingCredentials))?;

        let mut query = vec![("api-version", "3.0"), ("to", target_lang)];
        if !is_auto_detect(source_lang) {
            query.push(("from", source_lang));
        }

        let mut request = self
            .client
            .post(format!("{}/translate", self.base_url))
            .query(&query)
            .header("Ocp-Apim-Subscription-Key", key)
            .json(&serde_json::json!([{ "Text": text }]));

        if let Some(region) = region {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }

        let response: Vec<MicrosoftItem> = send_json(PROVIDER_ID, self.timeout, request).await?;

        response
            .into_iter()
            .next()
            .and_then(|item| item.translations.into_iter().next())
            .map(|t| t.text)
            .ok_or_else(|| empty_response(PROVIDER_ID))
    }
}
