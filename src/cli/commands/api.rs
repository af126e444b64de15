use anyhow::Context;
use reqwest::Method;
use serde_json::Value;

use crate::cli::client::ApiClient;
use crate::cli::utils::output_reply;
use crate::cli::OutputFormat;

pub async fn get(client: &ApiClient, path: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let reply = client.send(Method::GET, path, None).await?;
    output_reply(&output_format, reply)
}

pub async fn post(client: &ApiClient, path: &str, data: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let reply = client.send(Method::POST, path, Some(parse_body(data)?)).await?;
    output_reply(&output_format, reply)
}

pub async fn put(client: &ApiClient, path: &str, data: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let reply = client.send(Method::PUT, path, Some(parse_body(data)?)).await?;
    output_reply(&output_format, reply)
}

pub async fn delete(client: &ApiClient, path: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let reply = client.send(Method::DELETE, path, None).await?;
    output_reply(&output_format, reply)
}

fn parse_body(data: &str) -> anyhow::Result<Value> {
    serde_json::from_str(data).context("--data must be valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_body_rejects_invalid_json() {
        assert!(parse_body("{\"name\": \"Ana\"}").is_ok());
        assert!(parse_body("{name}").is_err());
    }
}
