//! HTTP API server implementation

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::errors::GatewayError;
use crate::core::gateway::Gateway;
use crate::core::models::{ProviderHealth, ProviderTestResult, RequestStats, TranslationRequest};

/// Application state
#[derive(Clone)]
pub struct AppState {
    gateway: Gateway,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

/// Translation request body; missing fields are reported as invalid requests
#[derive(Deserialize)]
pub struct TranslateRequest {
    pub text: Option<String>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

/// Translation response body
#[derive(Serialize)]
pub struct TranslateResponse {
    pub translation: String,
}

#[derive(Serialize)]
struct ClearCacheResponse {
    cleared: bool,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

type ApiError = (StatusCode, axum::Json<ErrorResponse>);

fn api_error(err: GatewayError) -> ApiError {
    let (status, code, retry_after_secs) = match &err {
        GatewayError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request", None),
        GatewayError::RateLimited { retry_after_secs } => (
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            Some(*retry_after_secs),
        ),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
    };

    (
        status,
        axum::Json(ErrorResponse {
            error: ErrorDetail {
                message: err.to_string(),
                code: Some(code.to_string()),
                retry_after_secs,
            },
        }),
    )
}

/// Health check handler
async fn health_check() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok".to_string(),
        service: crate::NAME.to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// Translation handler
async fn translate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<axum::Json<TranslateResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        warn!("Malformed translate body: {}", rejection.body_text());
        api_error(GatewayError::invalid(rejection.body_text()))
    })?;

    let mut request = TranslationRequest::new(
        payload.text.unwrap_or_default(),
        payload.target_lang.unwrap_or_default(),
    );
    if let Some(source_lang) = payload.source_lang {
        request = request.with_source_lang(source_lang);
    }

    match state.gateway.translate(&request).await {
        Ok(translation) => Ok(axum::Json(TranslateResponse { translation })),
        Err(e) => {
            warn!("Translation rejected: {}", e);
            Err(api_error(e))
        }
    }
}

async fn service_status(State(state): State<Arc<AppState>>) -> axum::Json<BTreeMap<String, String>> {
    axum::Json(state.gateway.service_status().await)
}

async fn detailed_service_status(
    State(state): State<Arc<AppState>>,
) -> axum::Json<BTreeMap<String, ProviderHealth>> {
    axum::Json(state.gateway.detailed_service_status().await)
}

async fn request_stats(State(state): State<Arc<AppState>>) -> axum::Json<RequestStats> {
    axum::Json(state.gateway.request_stats().await)
}

async fn clear_cache(State(state): State<Arc<AppState>>) -> axum::Json<ClearCacheResponse> {
    state.gateway.clear_cache().await;
    axum::Json(ClearCacheResponse { cleared: true })
}

async fn test_provider(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
) -> axum::Json<ProviderTestResult> {
    axum::Json(state.gateway.test_provider(&provider_id).await)
}

/// Build the router over a gateway
pub fn router(gateway: Gateway) -> Router {
    let state = Arc::new(AppState { gateway });

    Router::new()
        .route("/", get(health_check))
        .route("/translate", post(translate))
        .route("/status", get(service_status))
        .route("/status/detailed", get(detailed_service_status))
        .route("/stats", get(request_stats))
        .route("/cache/clear", post(clear_cache))
        .route("/providers/:id/test", post(test_provider))
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(gateway: Gateway, host: String, port: u16) -> anyhow::Result<()> {
    let monitor = gateway.spawn_health_monitor();
    let app = router(gateway);

    // Bind address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app).await;

    monitor.abort();
    served?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CredentialStore, GatewayConfig, ProviderCredentials};
    use crate::providers::{GoogleProvider, ProviderChain};
    use assert_json_diff::assert_json_eq;
    use std::time::Duration;
    use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

    async fn spawn_app(config: GatewayConfig, provider_uri: String) -> String {
        let credentials = CredentialStore::fixed(ProviderCredentials {
            google_api_key: Some("test-google-key".to_string()),
            ..Default::default()
        });
        let google = GoogleProvider::new(reqwest::Client::new(), credentials, Duration::from_secs(5))
            .with_base_url(provider_uri);
        let gateway = Gateway::with_chain(ProviderChain::new(Arc::new(google), vec![]), &config);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(gateway)).await.unwrap();
        });

        format!("http://{}", addr)
    }

    async fn mock_google(reply: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "translations": [{ "translatedText": reply }] }
            })))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_translate_endpoint() {
        let provider = mock_google("hola").await;
        let base = spawn_app(GatewayConfig::default(), provider.uri()).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/translate", base))
            .json(&serde_json::json!({ "text": "hello", "source_lang": "en", "target_lang": "es" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_json_eq!(body, serde_json::json!({ "translation": "hola" }));

        let status: serde_json::Value = client
            .get(format!("{}/status", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_json_eq!(status, serde_json::json!({ "google": "healthy" }));

        let stats: serde_json::Value = client
            .get(format!("{}/stats", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_json_eq!(
            stats,
            serde_json::json!({
                "total_requests_in_window": 1,
                "max_requests": 100,
                "window_secs": 60,
                "is_rate_limited": false
            })
        );
    }

    #[tokio::test]
    async fn test_missing_target_is_bad_request() {
        let provider = mock_google("hola").await;
        let base = spawn_app(GatewayConfig::default(), provider.uri()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/translate", base))
            .json(&serde_json::json!({ "text": "hello" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_missing_text_is_bad_request() {
        let provider = mock_google("hola").await;
        let base = spawn_app(GatewayConfig::default(), provider.uri()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/translate", base))
            .json(&serde_json::json!({ "target_lang": "es" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let provider = mock_google("hola").await;
        let base = spawn_app(GatewayConfig::default(), provider.uri()).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/translate", base))
            .header("content-type", "application/json")
            .body("{\"text\": ")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], "invalid_request");

        let response = client
            .post(format!("{}/translate", base))
            .json(&serde_json::json!({ "text": 42, "target_lang": "es" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn test_rate_limited_is_429() {
        let provider = mock_google("hola").await;
        let config = GatewayConfig {
            rate_limit_max_requests: 1,
            ..Default::default()
        };
        let base = spawn_app(config, provider.uri()).await;
        let client = reqwest::Client::new();

        let first = client
            .post(format!("{}/translate", base))
            .json(&serde_json::json!({ "text": "one", "target_lang": "es" }))
            .send()
            .await
            .unwrap();
        assert_eq!(first.status(), 200);

        let second = client
            .post(format!("{}/translate", base))
            .json(&serde_json::json!({ "text": "two", "target_lang": "es" }))
            .send()
            .await
            .unwrap();
        assert_eq!(second.status(), 429);
        let body: serde_json::Value = second.json().await.unwrap();
        assert_eq!(body["error"]["code"], "rate_limited");
    }

    #[tokio::test]
    async fn test_provider_check_and_cache_clear() {
        let provider = mock_google("hola").await;
        let base = spawn_app(GatewayConfig::default(), provider.uri()).await;
        let client = reqwest::Client::new();

        let checked: serde_json::Value = client
            .post(format!("{}/providers/google/test", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_json_eq!(checked, serde_json::json!({ "success": true, "result": "hola" }));

        let unknown: serde_json::Value = client
            .post(format!("{}/providers/babelfish/test", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(unknown["success"], false);

        let cleared: serde_json::Value = client
            .post(format!("{}/cache/clear", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_json_eq!(cleared, serde_json::json!({ "cleared": true }));

        let detailed: serde_json::Value = client
            .get(format!("{}/status/detailed", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(detailed["google"]["status"], "healthy");
        assert_eq!(detailed["google"]["provider_id"], "google");
    }
}
