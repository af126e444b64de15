#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use school_nexus_api::config::AppConfig;
use school_nexus_api::database::seed;
use school_nexus_api::{app, AppState};

pub const PASSWORD: &str = "password123";
pub const SUPER_ADMIN: &str = "superadmin@schoolnexus.com";
pub const SCHOOL_ADMIN: &str = "admin@example.com";
pub const TEACHER: &str = "sarah.johnson@riverside.edu";
pub const STUDENT: &str = "emma.wilson@student.riverside.edu";

/// An in-process server with its own seeded store, bound to a free port
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let mut config = AppConfig::development();
        config.security.bcrypt_cost = 4;
        Self::start_with(config).await
    }

    pub async fn start_with(config: AppConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::new(config);
        seed::load_sample_data(&state.store, state.config.security.bcrypt_cost).await?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let router = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            port,
            base_url,
            state,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/api/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in with the seed password and return the bearer token
    pub async fn login(&self, email: &str) -> Result<String> {
        let (status, body) = self
            .send(Method::POST, "/api/auth/login", None, Some(json!({ "email": email, "password": PASSWORD })))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login for {} failed: {} {}", email, status, body);
        body["token"].as_str().map(str::to_string).context("login response had no token")
    }

    pub async fn send(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let res = request.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, path, Some(token), None).await
    }
}
