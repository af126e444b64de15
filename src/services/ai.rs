// services/ai.rs - school assistant
//
// With a completion key configured, messages go to an OpenAI-compatible
// chat-completions endpoint. Without one, or when the call fails, replies come
// from a fixed per-role keyword table.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::Role;
use crate::config::AiConfig;
use crate::database::Record;

/// Fixed transcription returned by the voice endpoint
pub const VOICE_TRANSCRIPTION: &str = "Show me today's attendance";

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion service returned status {0}")]
    Status(u16),
    #[error("completion service returned no content")]
    EmptyResponse,
}

/// Something that can answer a chat message given a system prompt
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, system_prompt: &str, message: &str) -> Result<String, AiError>;
}

// ========================================
// OpenAI-compatible backend
// ========================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiBackend {
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, system_prompt: &str, message: &str) -> Result<String, AiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: message },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiError::Status(response.status().as_u16()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

// ========================================
// Assistant
// ========================================

#[derive(Clone, Default)]
pub struct AiAssistant {
    backend: Option<Arc<dyn CompletionBackend>>,
}

impl AiAssistant {
    /// Use the completion service when a key is configured
    pub fn from_config(config: &AiConfig) -> Self {
        let Some(api_key) = config.api_key.clone() else {
            tracing::info!("no completion key configured, using canned assistant replies");
            return Self::canned();
        };

        match OpenAiBackend::new(config, api_key) {
            Ok(backend) => {
                tracing::info!(model = %config.model, "completion service enabled");
                Self::with_backend(Arc::new(backend))
            }
            Err(e) => {
                tracing::warn!("completion client setup failed, using canned replies: {}", e);
                Self::canned()
            }
        }
    }

    pub fn canned() -> Self {
        Self { backend: None }
    }

    pub fn with_backend(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend: Some(backend) }
    }

    /// Answer a message for a user of the given role and school
    pub async fn respond(&self, message: &str, role: Option<Role>, school: Option<&Record>) -> String {
        if let Some(backend) = &self.backend {
            let prompt = system_prompt(role, school);
            match backend.complete(&prompt, message).await {
                Ok(reply) => return reply,
                Err(e) => tracing::warn!("completion failed, falling back to canned reply: {}", e),
            }
        }
        canned_response(role, message).to_string()
    }
}

/// Prompt describing the assistant, the caller's role and the school
pub fn system_prompt(role: Option<Role>, school: Option<&Record>) -> String {
    let field = |key: &str| -> String {
        school
            .and_then(|s| s.get(key))
            .and_then(Value::as_str)
            .unwrap_or("N/A")
            .to_string()
    };
    let school_name = school
        .and_then(|s| s.get_str("name"))
        .unwrap_or("School Nexus");
    let role = role.map(|r| r.as_str()).unwrap_or("user");

    format!(
        "You are School Nexus AI Assistant, a helpful AI assistant for {name}.\n\n\
         User Role: {role}\n\
         School: {name}\n\n\
         You can help with student information and records, attendance tracking, assignment management, \
         grade inquiries, schedule information, report generation and general school operations.\n\n\
         Keep responses concise and professional, and only share information appropriate for the user's role.\n\n\
         School Context:\n\
         - School Name: {name}\n\
         - Address: {address}\n\
         - Phone: {phone}\n\
         - Email: {email}\n\
         - Website: {website}\n\
         - Subscription Plan: {plan}",
        name = school_name,
        role = role,
        address = field("address"),
        phone = field("phone"),
        email = field("email"),
        website = field("website"),
        plan = field("subscriptionPlan"),
    )
}

struct RoleReplies {
    keywords: &'static [(&'static str, &'static str)],
    default: &'static str,
}

const SUPER_ADMIN_REPLIES: RoleReplies = RoleReplies {
    keywords: &[
        ("attendance", "I can see attendance data across all schools. The overall attendance rate is 94.2%. Would you like a detailed report?"),
        ("report", "I can generate reports across every school. Which metrics should the report include?"),
        ("schools", "I can see every school on the platform along with its subscription and user counts."),
        ("revenue", "I can break down monthly subscription revenue by school and plan. Would you like that breakdown?"),
    ],
    default: "As a super admin, I can help you manage all schools, view system-wide metrics and generate reports. What would you like to know?",
};

const SCHOOL_ADMIN_REPLIES: RoleReplies = RoleReplies {
    keywords: &[
        ("attendance", "Current school attendance rate is 94.2%. Would you like a detailed attendance report by grade?"),
        ("report", "Your monthly report is ready. It shows improved performance across departments."),
        ("students", "I can show enrollment numbers and trends for your school. Would you like this month's figures?"),
        ("teachers", "I can list your teaching staff and recent hires. Would you like to see teacher metrics?"),
        ("revenue", "I can summarise your school's billing and subscription usage."),
    ],
    default: "I can help you manage school operations, generate reports and track student performance. What would you like to know?",
};

const TEACHER_REPLIES: RoleReplies = RoleReplies {
    keywords: &[
        ("grade", "Your students' average grade is 85.4%. Would you like a grade report by subject?"),
        ("assignment", "You have assignments waiting for review. Would you like them ordered by due date?"),
        ("attendance", "Attendance for your classes averages 96.8%. Here is the breakdown by class."),
        ("students", "I can show performance for each student in your classes."),
    ],
    default: "I can help you with grading, attendance tracking, lesson planning and student progress. How can I assist?",
};

const STUDENT_REPLIES: RoleReplies = RoleReplies {
    keywords: &[
        ("assignment", "You have pending assignments. Would you like to see the next due dates?"),
        ("grade", "Your current GPA is 3.7. Would you like a subject-wise breakdown?"),
        ("schedule", "I can show tomorrow's classes and set reminders for them."),
        ("attendance", "Your attendance rate is 96.5%. Would you like to see the days you missed?"),
    ],
    default: "I can help you track assignments, check grades, view your schedule and find study tips. What do you need?",
};

const PARENT_REPLIES: RoleReplies = RoleReplies {
    keywords: &[
        ("child", "I can show your child's recent grades and attendance."),
        ("schedule", "I can show your child's class schedule and upcoming school events."),
        ("communication", "I can help you contact teachers and schedule parent-teacher meetings."),
    ],
    default: "I can help you follow your child's progress and stay in touch with teachers. How can I assist?",
};

fn replies_for(role: Option<Role>) -> &'static RoleReplies {
    match role {
        Some(Role::SuperAdmin) => &SUPER_ADMIN_REPLIES,
        Some(Role::SchoolAdmin) => &SCHOOL_ADMIN_REPLIES,
        Some(Role::Teacher) => &TEACHER_REPLIES,
        Some(Role::Parent) => &PARENT_REPLIES,
        Some(Role::Student) | None => &STUDENT_REPLIES,
    }
}

/// First keyword contained in the lower-cased message wins
pub fn canned_response(role: Option<Role>, message: &str) -> &'static str {
    let replies = replies_for(role);
    let lower = message.to_lowercase();
    replies
        .keywords
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, reply)| *reply)
        .unwrap_or(replies.default)
}

/// Prompt suggestions shown in the chat panel
pub fn suggestions(role: Option<Role>) -> &'static [&'static str] {
    match role {
        Some(Role::SuperAdmin) => &[
            "Show me system-wide attendance statistics",
            "Generate a revenue report for all schools",
            "List all schools with expiring subscriptions",
            "Show platform usage metrics",
        ],
        Some(Role::SchoolAdmin) => &[
            "Show today's attendance summary",
            "Generate monthly student performance report",
            "List teachers with upcoming evaluations",
            "Show enrollment trends for this month",
        ],
        Some(Role::Teacher) => &[
            "Show my class attendance for today",
            "List pending assignments to grade",
            "Generate student performance report",
            "Show upcoming parent-teacher meetings",
        ],
        Some(Role::Parent) => &[
            "Show my child's recent grades",
            "Check upcoming parent-teacher meetings",
            "Show my child's attendance record",
            "Generate progress report for my child",
        ],
        Some(Role::Student) | None => &[
            "Show my upcoming assignments",
            "Check my current grades",
            "Show my class schedule for tomorrow",
            "Generate my attendance report",
        ],
    }
}
