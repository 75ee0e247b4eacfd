//! Management-plane HTTP client
//!
//! Thin async client over the document-database management API. Responses
//! come back as raw `serde_json::Value`; HTTP status classes map onto
//! [`RestError`] variants and are handed to callers without retry.

use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

/// Error from the management plane or the transport underneath it.
#[derive(Error, Debug)]
pub enum RestError {
    #[error("401 Unauthorized: invalid or missing API token")]
    Unauthorized,

    #[error("404 Not Found: the requested resource does not exist")]
    NotFound,

    #[error("HTTP {code}: {message}")]
    ApiError { code: u16, message: String },

    #[error("server error (5xx): {0}")]
    ServerError(String),

    #[error("request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl RestError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, RestError::NotFound)
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RestError::Unauthorized)
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, RestError::ServerError(_))
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, RestError>;

/// Async client for account, database, and collection operations.
#[derive(Debug, Clone)]
pub struct AccountClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl AccountClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url).map_err(|e| RestError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        trace!(%method, %url, "management API request");
        let mut req = self.http.request(method, &url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!(%url, status = status.as_u16(), "management API response");

        if status.is_success() {
            if text.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)));
        }
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RestError::Unauthorized,
            StatusCode::NOT_FOUND => RestError::NotFound,
            s if s.is_server_error() => RestError::ServerError(truncated(&text)),
            s => RestError::ApiError {
                code: s.as_u16(),
                message: truncated(&text),
            },
        })
    }

    pub async fn get_raw(&self, path: &str) -> Result<Value> {
        self.execute(Method::GET, path, None).await
    }

    pub async fn post_raw(&self, path: &str, body: Value) -> Result<Value> {
        self.execute(Method::POST, path, Some(body)).await
    }

    pub async fn put_raw(&self, path: &str, body: Value) -> Result<Value> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    pub async fn patch_raw(&self, path: &str, body: Value) -> Result<Value> {
        self.execute(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete_raw(&self, path: &str) -> Result<Value> {
        self.execute(Method::DELETE, path, None).await
    }

    // Account operations

    pub async fn list_accounts(&self) -> Result<Value> {
        self.get_raw("/v1/accounts").await
    }

    pub async fn get_account(&self, name: &str) -> Result<Value> {
        self.get_raw(&format!("/v1/accounts/{}", name)).await
    }

    pub async fn create_account(&self, name: &str, body: Value) -> Result<Value> {
        self.put_raw(&format!("/v1/accounts/{}", name), body).await
    }

    pub async fn update_account(&self, name: &str, body: Value) -> Result<Value> {
        self.patch_raw(&format!("/v1/accounts/{}", name), body).await
    }

    pub async fn delete_account(&self, name: &str) -> Result<Value> {
        self.delete_raw(&format!("/v1/accounts/{}", name)).await
    }

    pub async fn list_keys(&self, name: &str) -> Result<Value> {
        self.get_raw(&format!("/v1/accounts/{}/keys", name)).await
    }

    pub async fn regenerate_key(&self, name: &str, key_kind: &str) -> Result<Value> {
        self.post_raw(
            &format!("/v1/accounts/{}/regenerate-key", name),
            serde_json::json!({"keyKind": key_kind}),
        )
        .await
    }

    pub async fn change_failover_priorities(&self, name: &str, policies: Value) -> Result<Value> {
        self.post_raw(
            &format!("/v1/accounts/{}/failover-priority-change", name),
            serde_json::json!({"failoverPolicies": policies}),
        )
        .await
    }

    pub async fn list_network_rules(&self, name: &str) -> Result<Value> {
        self.get_raw(&format!("/v1/accounts/{}/network-rules", name)).await
    }

    pub async fn add_network_rule(&self, name: &str, body: Value) -> Result<Value> {
        self.post_raw(&format!("/v1/accounts/{}/network-rules", name), body).await
    }

    pub async fn remove_network_rule(&self, name: &str, body: Value) -> Result<Value> {
        self.execute(
            Method::DELETE,
            &format!("/v1/accounts/{}/network-rules", name),
            Some(body),
        )
        .await
    }

    // Database and collection operations

    pub async fn list_databases(&self, account: &str) -> Result<Value> {
        self.get_raw(&format!("/v1/accounts/{}/databases", account)).await
    }

    pub async fn get_database(&self, account: &str, db: &str) -> Result<Value> {
        self.get_raw(&format!("/v1/accounts/{}/databases/{}", account, db)).await
    }

    pub async fn create_database(&self, account: &str, db: &str, body: Value) -> Result<Value> {
        self.put_raw(&format!("/v1/accounts/{}/databases/{}", account, db), body)
            .await
    }

    pub async fn delete_database(&self, account: &str, db: &str) -> Result<Value> {
        self.delete_raw(&format!("/v1/accounts/{}/databases/{}", account, db))
            .await
    }

    pub async fn list_collections(&self, account: &str, db: &str) -> Result<Value> {
        self.get_raw(&format!(
            "/v1/accounts/{}/databases/{}/collections",
            account, db
        ))
        .await
    }

    pub async fn get_collection(&self, account: &str, db: &str, coll: &str) -> Result<Value> {
        self.get_raw(&format!(
            "/v1/accounts/{}/databases/{}/collections/{}",
            account, db, coll
        ))
        .await
    }

    pub async fn create_collection(
        &self,
        account: &str,
        db: &str,
        coll: &str,
        body: Value,
    ) -> Result<Value> {
        self.put_raw(
            &format!("/v1/accounts/{}/databases/{}/collections/{}", account, db, coll),
            body,
        )
        .await
    }

    pub async fn delete_collection(&self, account: &str, db: &str, coll: &str) -> Result<Value> {
        self.delete_raw(&format!(
            "/v1/accounts/{}/databases/{}/collections/{}",
            account, db, coll
        ))
        .await
    }
}

fn truncated(text: &str) -> String {
    const LIMIT: usize = 500;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> AccountClient {
        AccountClient::new(server.uri(), Some("test-token".into())).unwrap()
    }

    #[tokio::test]
    async fn get_account_parses_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/accounts/acct1"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "acct1",
                "kind": "GlobalDocumentDB",
                "consistencyPolicy": {"defaultConsistencyLevel": "Session"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let account = client.get_account("acct1").await.unwrap();
        assert_eq!(account["name"], "acct1");
        assert_eq!(
            account["consistencyPolicy"]["defaultConsistencyLevel"],
            "Session"
        );
    }

    #[tokio::test]
    async fn status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/accounts/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/accounts/secret"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/accounts/broken"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.get_account("missing").await.unwrap_err().is_not_found());
        assert!(client.get_account("secret").await.unwrap_err().is_unauthorized());
        match client.get_account("broken").await.unwrap_err() {
            RestError::ServerError(msg) => assert_eq!(msg, "overloaded"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn regenerate_key_posts_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts/acct1/regenerate-key"))
            .and(body_json(json!({"keyKind": "secondary"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "accepted"})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let out = client.regenerate_key("acct1", "secondary").await.unwrap();
        assert_eq!(out["status"], "accepted");
    }

    #[tokio::test]
    async fn empty_body_becomes_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/accounts/acct1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(client.delete_account("acct1").await.unwrap(), Value::Null);
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            AccountClient::new("not a url", None),
            Err(RestError::InvalidUrl(_))
        ));
    }
}
