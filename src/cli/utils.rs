use serde_json::{json, Value};

use crate::cli::client::ApiReply;
use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Print an API reply body, or its error, and fail on non-2xx statuses
pub fn output_reply(output_format: &OutputFormat, reply: ApiReply) -> anyhow::Result<()> {
    if !reply.is_success() {
        let code = reply.body.get("code").and_then(Value::as_str);
        output_error(output_format, &reply.error_message(), code)?;
        anyhow::bail!("server answered {}", reply.status);
    }

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&reply.body)?),
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(&reply.body)?),
    }
    Ok(())
}
