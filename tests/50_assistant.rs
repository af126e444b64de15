mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

use common::{TestServer, SCHOOL_ADMIN, STUDENT, TEACHER};

#[tokio::test]
async fn chat_answers_and_keeps_history() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(SCHOOL_ADMIN).await?;

    let (status, body) = server.post("/api/ai/chat", &token, json!({ "message": "   " })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message is required");

    let (status, body) = server
        .post("/api/ai/chat", &token, json!({ "message": "How is attendance this week?" }))
        .await?;
    assert_eq!(status, StatusCode::OK, "chat failed: {}", body);
    assert!(body["response"].as_str().is_some_and(|r| r.contains("attendance")));
    assert!(body["messageId"].as_str().is_some_and(|id| id.starts_with("chat-")));
    assert!(body["timestamp"].is_string());

    server.post("/api/ai/chat", &token, json!({ "message": "Second question" })).await?;

    let (_, body) = server.get("/api/chat/history", &token).await?;
    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["message"], "How is attendance this week?");

    let (_, body) = server.get("/api/ai/chat-history?limit=1", &token).await?;
    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["message"], "Second question");

    let (status, _) = server.delete("/api/ai/chat-history", &token).await?;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = server.get("/api/chat/history", &token).await?;
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn chat_history_is_per_user() -> Result<()> {
    let server = TestServer::start().await?;
    let teacher = server.login(TEACHER).await?;
    let student = server.login(STUDENT).await?;

    server.post("/api/ai/chat", &teacher, json!({ "message": "grades?" })).await?;

    let (_, body) = server.get("/api/ai/chat-history", &student).await?;
    assert_eq!(body["messages"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn suggestions_and_voice() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(TEACHER).await?;

    let (status, body) = server.get("/api/ai/suggestions", &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["suggestions"].as_array().is_some_and(|s| !s.is_empty()));

    let (status, body) = server.post("/api/ai/voice", &token, json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcription"], "Show me today's attendance");
    assert!(body["response"].is_string());
    Ok(())
}

#[tokio::test]
async fn generated_documents_can_be_downloaded() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.login(SCHOOL_ADMIN).await?;

    let (status, body) = server
        .post("/api/ai/generate-document", &token, json!({ "type": "transcript", "data": {} }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid document type");

    let (status, body) = server.post("/api/ai/generate-document", &token, json!({ "type": "certificate" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Document type and data are required");

    let (status, body) = server
        .post(
            "/api/ai/generate-document",
            &token,
            json!({ "type": "certificate", "data": { "name": "Emma <Wilson>" } }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "generate failed: {}", body);
    let document = &body["document"];
    assert_eq!(document["type"], "pdf");
    assert!(document["filename"].as_str().is_some_and(|f| f.starts_with("certificate-") && f.ends_with(".pdf")));
    assert!(document["content"].as_str().is_some_and(|c| c.contains("Emma &lt;Wilson&gt;")));

    let id = document["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(document["downloadUrl"], format!("/api/documents/download/{}", id));

    let (_, body) = server.get("/api/documents", &token).await?;
    assert_eq!(body["documents"].as_array().map(Vec::len), Some(1));

    let res = reqwest::Client::new()
        .get(server.url(&format!("/api/documents/download/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = res.headers()[header::CONTENT_DISPOSITION].to_str()?.to_string();
    assert!(disposition.starts_with("attachment; filename=\"certificate-"), "{}", disposition);
    assert!(res.text().await?.contains("Emma &lt;Wilson&gt;"));

    // documents belong to their owner
    let student = server.login(STUDENT).await?;
    let (status, _) = server.get(&format!("/api/documents/{}", id), &student).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body): (StatusCode, Value) = server.delete(&format!("/api/documents/{}", id), &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["document"]["id"], id);
    Ok(())
}
