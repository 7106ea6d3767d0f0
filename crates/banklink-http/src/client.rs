use async_trait::async_trait;
use banklink_core::{
    AccessCredential, BankLinkError, InitToken, LinkBackend, PublicAuthorization, SyncPayload,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Default backend address.
pub const DEFAULT_API_URL: &str = "http://localhost:3333";

const CREATE_LINK_TOKEN_PATH: &str = "create-link-token";
const EXCHANGE_PUBLIC_TOKEN_PATH: &str = "exchange-public-token";
const SYNC_ITEM_PATH: &str = "sync-item";

#[derive(Serialize)]
struct CreateLinkTokenRequest<'a> {
    client: &'a str,
}

#[derive(Deserialize)]
struct CreateLinkTokenResponse {
    #[serde(default)]
    link_token: Option<String>,
}

#[derive(Serialize)]
struct ExchangePublicTokenRequest<'a> {
    public_token: &'a str,
}

#[derive(Deserialize)]
struct ExchangePublicTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Serialize)]
struct SyncItemRequest<'a> {
    access_token: &'a str,
}

/// Link backend over HTTP/JSON.
///
/// No timeout or retry is configured; a hung call stays pending until the
/// caller drops it.
#[derive(Debug, Clone)]
pub struct HttpLinkBackend {
    http_client: Client,
    base_url: String,
    client_name: String,
}

impl HttpLinkBackend {
    /// Create a new backend client.
    ///
    /// # Arguments
    /// * `base_url` - Backend address, e.g. `http://localhost:3333`
    /// * `client_name` - Value sent as `client` when requesting a link token
    pub fn new(base_url: impl Into<String>, client_name: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client: Client::new(),
            base_url,
            client_name: client_name.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST a JSON body and decode the JSON response.
    ///
    /// Every failure is reported through `kind` so each operation surfaces
    /// its own error variant.
    async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        kind: fn(String) -> BankLinkError,
    ) -> Result<R, BankLinkError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| kind(format!("POST {} request failed: {}", path, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| kind(format!("Failed to read {} response: {}", path, e)))?;

        if !status.is_success() {
            return Err(kind(format!(
                "POST {} returned {}: {}",
                path, status, text
            )));
        }

        debug!("POST {} -> {} ({} bytes)", path, status, text.len());

        serde_json::from_str(&text)
            .map_err(|e| kind(format!("Malformed {} response: {}", path, e)))
    }
}

#[async_trait]
impl LinkBackend for HttpLinkBackend {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self), level = "debug")]
    async fn create_link_token(&self) -> Result<InitToken, BankLinkError> {
        let request = CreateLinkTokenRequest {
            client: &self.client_name,
        };
        let response: CreateLinkTokenResponse = self
            .post_json(CREATE_LINK_TOKEN_PATH, &request, BankLinkError::Initialization)
            .await?;

        match response.link_token {
            Some(token) if !token.is_empty() => Ok(InitToken::new(token)),
            _ => Err(BankLinkError::Initialization(
                "create-link-token returned no token".to_string(),
            )),
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn exchange_public_token(
        &self,
        public: &PublicAuthorization,
    ) -> Result<AccessCredential, BankLinkError> {
        let request = ExchangePublicTokenRequest {
            public_token: public.token(),
        };
        let response: ExchangePublicTokenResponse = self
            .post_json(EXCHANGE_PUBLIC_TOKEN_PATH, &request, BankLinkError::Exchange)
            .await?;

        match response.access_token {
            Some(token) if !token.is_empty() => Ok(AccessCredential::new(token)),
            _ => Err(BankLinkError::Exchange(
                "exchange-public-token returned no access token".to_string(),
            )),
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn sync_item(&self, credential: &AccessCredential) -> Result<SyncPayload, BankLinkError> {
        let request = SyncItemRequest {
            access_token: credential.as_str(),
        };
        let payload: SyncPayload = self
            .post_json(SYNC_ITEM_PATH, &request, BankLinkError::Sync)
            .await?;

        debug!(
            "sync-item returned {} accounts and {} transactions",
            payload.accounts.len(),
            payload.transactions.len()
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banklink_core::Metadata;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, HttpLinkBackend) {
        let server = MockServer::start().await;
        let backend = HttpLinkBackend::new(server.uri(), "");
        (server, backend)
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let backend = HttpLinkBackend::new("http://localhost:3333/", "");
        assert_eq!(backend.base_url(), "http://localhost:3333");
        assert_eq!(
            backend.endpoint(SYNC_ITEM_PATH),
            "http://localhost:3333/sync-item"
        );
    }

    #[tokio::test]
    async fn test_create_link_token() {
        let (server, backend) = setup().await;

        Mock::given(method("POST"))
            .and(path("/create-link-token"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "client": "" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "link_token": "link-sandbox-1" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let token = backend.create_link_token().await.unwrap();
        assert_eq!(token.as_str(), "link-sandbox-1");
    }

    #[tokio::test]
    async fn test_create_link_token_sends_client_name() {
        let server = MockServer::start().await;
        let backend = HttpLinkBackend::new(server.uri(), "desktop");

        Mock::given(method("POST"))
            .and(path("/create-link-token"))
            .and(body_json(json!({ "client": "desktop" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "link_token": "link-sandbox-2" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        assert!(backend.create_link_token().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_link_token_without_token() {
        let (server, backend) = setup().await;

        Mock::given(method("POST"))
            .and(path("/create-link-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let result = backend.create_link_token().await;
        assert!(matches!(result, Err(BankLinkError::Initialization(_))));
        assert!(result.unwrap_err().to_string().contains("no token"));
    }

    #[tokio::test]
    async fn test_create_link_token_server_error() {
        let (server, backend) = setup().await;

        Mock::given(method("POST"))
            .and(path("/create-link-token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = backend.create_link_token().await.unwrap_err();
        assert!(matches!(err, BankLinkError::Initialization(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_exchange_public_token() {
        let (server, backend) = setup().await;

        Mock::given(method("POST"))
            .and(path("/exchange-public-token"))
            .and(body_json(json!({ "public_token": "pub-123" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "acc-456" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let public = PublicAuthorization::new("pub-123", Metadata::new());
        let credential = backend.exchange_public_token(&public).await.unwrap();
        assert_eq!(credential.as_str(), "acc-456");
    }

    #[tokio::test]
    async fn test_exchange_null_access_token() {
        let (server, backend) = setup().await;

        Mock::given(method("POST"))
            .and(path("/exchange-public-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": null })),
            )
            .mount(&server)
            .await;

        let public = PublicAuthorization::new("pub-123", Metadata::new());
        let result = backend.exchange_public_token(&public).await;
        assert!(matches!(result, Err(BankLinkError::Exchange(_))));
    }

    #[tokio::test]
    async fn test_sync_item() {
        let (server, backend) = setup().await;

        Mock::given(method("POST"))
            .and(path("/sync-item"))
            .and(body_json(json!({ "access_token": "acc-456" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accounts": [{ "id": "a1" }, { "id": "a2" }],
                "transactions": [{ "id": "t1" }, { "id": "t2" }, { "id": "t3" }],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = backend
            .sync_item(&AccessCredential::new("acc-456"))
            .await
            .unwrap();
        assert_eq!(payload.accounts.len(), 2);
        assert_eq!(payload.transactions.len(), 3);
        assert_eq!(payload.accounts[0], json!({ "id": "a1" }));
    }

    #[tokio::test]
    async fn test_sync_item_malformed_response() {
        let (server, backend) = setup().await;

        // transactions missing entirely
        Mock::given(method("POST"))
            .and(path("/sync-item"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "accounts": [] })),
            )
            .mount(&server)
            .await;

        let err = backend
            .sync_item(&AccessCredential::new("acc-456"))
            .await
            .unwrap_err();
        assert!(matches!(err, BankLinkError::Sync(_)));
        assert!(err.to_string().contains("Malformed"));
    }

    #[tokio::test]
    async fn test_sync_item_non_array_field() {
        let (server, backend) = setup().await;

        Mock::given(method("POST"))
            .and(path("/sync-item"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accounts": [],
                "transactions": "nope",
            })))
            .mount(&server)
            .await;

        let result = backend.sync_item(&AccessCredential::new("acc-456")).await;
        assert!(matches!(result, Err(BankLinkError::Sync(_))));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // Nothing listens on port 9 on loopback
        let backend = HttpLinkBackend::new("http://127.0.0.1:9", "");
        let result = backend.sync_item(&AccessCredential::new("acc-456")).await;
        assert!(matches!(result, Err(BankLinkError::Sync(_))));
    }
}
