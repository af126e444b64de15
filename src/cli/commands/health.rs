use reqwest::Method;
use serde_json::Value;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_reply, output_success};
use crate::cli::OutputFormat;

pub async fn handle(client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let reply = client.send(Method::GET, "/api/health", None).await?;
    if !reply.is_success() {
        return output_reply(&output_format, reply);
    }

    let version = reply.body.get("version").and_then(Value::as_str).unwrap_or("unknown");
    output_success(
        &output_format,
        &format!("Server is healthy (version {})", version),
        Some(reply.body.clone()),
    )
}
