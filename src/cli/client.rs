use anyhow::{anyhow, Context};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

/// Thin JSON client for the API
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

/// A decoded API reply; non-2xx statuses are kept rather than turned into errors
#[derive(Debug)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The `error` message of a failed reply
    pub fn error_message(&self) -> String {
        self.body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {}", self.status))
    }
}

impl ApiClient {
    pub fn new(server: &str, token: Option<String>) -> anyhow::Result<Self> {
        let base = Url::parse(server).with_context(|| format!("invalid server URL '{}'", server))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token,
        })
    }

    pub fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base
            .join(path)
            .map_err(|e| anyhow!("invalid API path '{}': {}", path, e))
    }

    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> anyhow::Result<ApiReply> {
        let url = self.url(path)?;
        tracing::debug!(%method, %url, "sending request");

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.context("request to API server failed")?;
        let status = response.status();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(ApiReply { status, body })
    }
}
