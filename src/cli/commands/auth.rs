use reqwest::Method;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_reply, output_success};
use crate::cli::OutputFormat;

/// Log in and print the token, ready for `export NEXUS_TOKEN=...`
pub async fn login(client: &ApiClient, email: &str, password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let body = json!({ "email": email, "password": password });
    let reply = client.send(Method::POST, "/api/auth/login", Some(body)).await?;
    if !reply.is_success() {
        return output_reply(&output_format, reply);
    }

    let token = reply.body.get("token").and_then(Value::as_str).unwrap_or_default().to_string();
    match output_format {
        OutputFormat::Json => output_success(&output_format, "Login successful", Some(json!({ "token": token }))),
        OutputFormat::Text => {
            println!("export NEXUS_TOKEN={}", token);
            Ok(())
        }
    }
}
