//! Google Cloud Translation (v2 basic) adapter

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{empty_response, send_json, ProviderResult, TranslationProvider};
use crate::core::config::CredentialStore;
use crate::core::errors::{ProviderError, ProviderErrorKind};
use crate::core::models::is_auto_detect;

pub const PROVIDER_ID: &str = "google";

const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com";

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
}

#[derive(Debug, Clone)]
pub struct GoogleProvider {
    client: reqwest::Client,
    credentials: Arc<CredentialStore>,
    base_url: String,
    timeout: Duration,
}

impl GoogleProvider {
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

    fn api_key(&self) -> Option<String> {
        self.credentials.read(|c| c.google_api_key.clone())
    }
}

#[async_trait]
impl TranslationProvider for GoogleProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn is_configured(&self) -> bool {
        self.credentials.read(|c| c.google_api_key.is_some())
    }

    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> ProviderResult<String> {
        let api_key = self
            .api_key()
            .ok_or_else(|| ProviderError::new(PROVIDER_ID, ProviderErrorKind::MissingCredentials))?;

        let mut body = serde_json::json!({
            "q": text,
            "target": target_lang,
            "format": "text",
        });
        if !is_auto_detect(source_lang) {
            body["source"] = serde_json::json!(source_lang);
        }

        let request = self
            .client
            .post(format!("{}/language/translate/v2", self.base_url))
            .query(&[("key", api_key.as_str())])
            .json(&body);

        let response: GoogleResponse = send_json(PROVIDER_ID, self.timeout, request).await?;

        response
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| empty_response(PROVIDER_ID))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ProviderCredentials;
    use wiremock::{
        matchers::{body_partial_json, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_key() -> Arc<CredentialStore> {
        CredentialStore::fixed(ProviderCredentials {
            google_api_key: Some("test-google-key".to_string()),
            ..Default::default()
        })
    }

    fn provider(server: &MockServer) -> GoogleProvider {
        GoogleProvider::new(reqwest::Client::new(), test_key(), Duration::from_secs(5))
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_translate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/language/translate/v2"))
            .and(query_param("key", "test-google-key"))
            .and(body_partial_json(serde_json::json!({
                "q": "hello",
                "source": "en",
                "target": "es"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "translations": [{ "translatedText": "hola" }] }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server).translate("hello", "en", "es").await;
        assert_eq!(result.unwrap(), "hola");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let provider = GoogleProvider::new(
            reqwest::Client::new(),
            CredentialStore::fixed(ProviderCredentials::default()),
            Duration::from_secs(5),
        );
        assert!(!provider.is_configured());

        let err = provider.translate("hello", "en", "es").await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::MissingCredentials);
        assert_eq!(err.provider_id, "google");
    }

    #[tokio::test]
    async fn test_forbidden_is_unauthorized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .translate("hello", "auto", "es")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Unauthorized(403));
    }

    #[tokio::test]
    async fn test_empty_translations_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "translations": [] }
            })))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server)
            .translate("hello", "en", "es")
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ProviderErrorKind::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "data": { "translations": [{ "translatedText": "hola" }] }
                    }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let provider = GoogleProvider::new(reqwest::Client::new(), test_key(), Duration::from_millis(50))
            .with_base_url(mock_server.uri());

        let err = provider.translate("hello", "en", "es").await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Timeout);
    }
}
