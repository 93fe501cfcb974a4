//! DeepL adapter

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{empty_response, send_json, ProviderResult, TranslationProvider};
use crate::core::config::CredentialStore;
use crate::core::errors::{ProviderError, ProviderErrorKind};
use crate::core::models::is_auto_detect;

pub const PROVIDER_ID: &str = "deepl";

const PRO_BASE_URL: &str = "https://api.deepl.com";
const FREE_BASE_URL: &str = "https://api-free.deepl.com";

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    text: String,
}

#[derive(Debug, Clone)]
pub struct DeeplProvider {
    client: reqwest::Client,
    credentials: Arc<CredentialStore>,
    base_url: Option<String>,
    timeout: Duration,
}

impl DeeplProvider {
    pub fn new(client: reqwest::Client, credentials: Arc<CredentialStore>, timeout: Duration) -> Self {
        Self {
            client,
            credentials,
            base_url: None,
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Host for a given key; free-tier keys end in ":fx" and live elsewhere
    fn base_url_for(&self, auth_key: &str) -> &str {
        match &self.base_url {
            Some(base_url) => base_url.as_str(),
            None if auth_key.ends_with(":fx") => FREE_BASE_URL,
            None => PRO_BASE_URL,
        }
    }
}

#[async_trait]
impl TranslationProvider for DeeplProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn is_configured(&self) -> bool {
        self.credentials.read(|c| c.deepl_api_key.is_some())
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ProviderResult<String> {
        let auth_key = self
            .credentials
            .read(|c| c.deepl_api_key.clone())
            .ok_or_else(|| ProviderError::new(PROVIDER_ID, ProviderErrorKind::MissingCredentials))?;

        let mut body = serde_json::json!({
            "text": [text],
            "target_lang": target_lang.to_uppercase(),
        });
        if !is_auto_detect(source_lang) {
            body["source_lang"] = serde_json::json!(source_lang.to_uppercase());
        }

        let request = self
            .client
            .post(format!("{}/v2/translate", self.base_url_for(&auth_key)))
            .header("Authorization", format!("DeepL-Auth-Key {}", auth_key))
            .json(&body);

        let response: DeeplResponse = send_json(PROVIDER_ID, self.timeout, request).await?;

        response
            .translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| empty_response(PROVIDER_ID))
    }
}
