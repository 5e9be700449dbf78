use crate::errors::ClientError;
use crate::storage::Session;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Server directive carried in a daily status result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusAction {
    RedirectToLogin,
    RedirectToAiConversation,
    ShowTodayTask,
    ShowReflectionPage,
    ShowPauseScreen,
    ShowCompletionDashboard,
    ShowErrorPage,
    Unknown(String),
}

impl StatusAction {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "redirect_to_login" => StatusAction::RedirectToLogin,
            "redirect_to_ai_conversation" => StatusAction::RedirectToAiConversation,
            "show_today_task" => StatusAction::ShowTodayTask,
            "show_reflection_page" => StatusAction::ShowReflectionPage,
            "show_pause_screen" => StatusAction::ShowPauseScreen,
            "show_completion_dashboard" => StatusAction::ShowCompletionDashboard,
            "show_error_page" => StatusAction::ShowErrorPage,
            other => StatusAction::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StatusResult {
    pub success: bool,
    pub action: String,
    pub data: Value,
    pub message: Option<String>,
}

impl StatusResult {
    pub fn action(&self) -> StatusAction {
        StatusAction::parse(&self.action)
    }

    pub fn needs_task_generation(&self) -> bool {
        self.data
            .get("needs_task_generation")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn missed_days(&self) -> u64 {
        self.data.get("missed_days").and_then(Value::as_u64).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TaskGeneration {
    pub success: bool,
    pub error: Option<String>,
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GenerationGate {
    pub can_generate: bool,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub next_available: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeWindow {
    pub allowed: bool,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub available_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TaskStatus {
    pub success: bool,
    pub error: Option<String>,
    pub can_generate_task: GenerationGate,
    pub time_window: TimeWindow,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LockStatus {
    pub success: bool,
    pub locked: bool,
    pub reason: Option<String>,
    pub message: Option<String>,
}

/// Sent to the backend in its snake_case shape; accepted locally in camelCase.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, rename_all(deserialize = "camelCase"))]
pub struct ReflectionSubmission {
    pub learning: String,
    pub feeling: String,
    pub improvement: String,
    pub task_id: String,
}

impl ReflectionSubmission {
    pub fn combined_text(&self) -> String {
        [&self.learning, &self.feeling, &self.improvement]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct ValidationResult {
    pub can_submit: bool,
    pub message: Option<String>,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub score: Option<f64>,
    pub encouragement: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ValidationResponse {
    pub success: bool,
    pub error: Option<String>,
    pub validation: ValidationResult,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeWindowCheck {
    pub success: bool,
    pub error: Option<String>,
    pub allowed: bool,
    pub reason: Option<String>,
    pub message: Option<String>,
}

/// Every backend call the client makes.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn daily_status(&self, session: &Session, timezone: &str) -> Result<StatusResult, ClientError>;
    async fn next_available(&self, session: &Session) -> Result<Value, ClientError>;
    async fn mark_active(&self, session: &Session) -> Result<(), ClientError>;
    async fn todays_task(&self, session: &Session) -> Result<TaskGeneration, ClientError>;
    async fn task_status(&self, session: &Session) -> Result<TaskStatus, ClientError>;
    async fn lock_status(&self, session: &Session) -> Result<LockStatus, ClientError>;
    async fn next_available_task(&self, session: &Session) -> Result<Value, ClientError>;
    async fn validate_reflection(
        &self,
        session: &Session,
        submission: &ReflectionSubmission,
    ) -> Result<ValidationResponse, ClientError>;
    async fn enforce_time_window(&self, session: &Session, action: &str) -> Result<TimeWindowCheck, ClientError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request
            .bearer_auth(&session.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
    }

    /// Bodies are decoded regardless of HTTP status; the backend reports
    /// failures in its JSON envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        debug!(status = %response.status(), url = %response.url(), "backend response");
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, session: &Session) -> Result<T, ClientError> {
        let request = self.authorized(self.http.get(self.url(path)), session);
        self.send(request).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        session: &Session,
        body: &B,
    ) -> Result<T, ClientError> {
        let request = self.authorized(self.http.post(self.url(path)), session).json(body);
        self.send(request).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn daily_status(&self, session: &Session, timezone: &str) -> Result<StatusResult, ClientError> {
        let request = self
            .authorized(self.http.get(self.url(&format!("/daily-check/{}", session.user_id))), session)
            .header("X-Timezone", timezone);
        self.send(request).await
    }

    async fn next_available(&self, session: &Session) -> Result<Value, ClientError> {
        self.get(&format!("/daily-check/{}/next-available", session.user_id), session)
            .await
    }

    async fn mark_active(&self, session: &Session) -> Result<(), ClientError> {
        let request = self.authorized(
            self.http
                .post(self.url(&format!("/daily-check/{}/mark-active", session.user_id))),
            session,
        );
        request.send().await?;
        Ok(())
    }

    async fn todays_task(&self, session: &Session) -> Result<TaskGeneration, ClientError> {
        self.get("/tasks/today", session).await
    }

    async fn task_status(&self, session: &Session) -> Result<TaskStatus, ClientError> {
        self.get(&format!("/task-rules/{}/status", session.user_id), session)
            .await
    }

    async fn lock_status(&self, session: &Session) -> Result<LockStatus, ClientError> {
        self.get(&format!("/task-rules/{}/lock-status", session.user_id), session)
            .await
    }

    async fn next_available_task(&self, session: &Session) -> Result<Value, ClientError> {
        self.get(&format!("/task-rules/{}/next-available", session.user_id), session)
            .await
    }

    async fn validate_reflection(
        &self,
        session: &Session,
        submission: &ReflectionSubmission,
    ) -> Result<ValidationResponse, ClientError> {
        let mut body = serde_json::to_value(submission)?;
        if let Value::Object(fields) = &mut body {
            fields.insert("user_id".to_string(), Value::String(session.user_id.clone()));
        }
        self.post("/task-rules/validate", session, &body).await
    }

    async fn enforce_time_window(&self, session: &Session, action: &str) -> Result<TimeWindowCheck, ClientError> {
        let body = serde_json::json!({ "action": action });
        self.post(
            &format!("/task-rules/{}/enforce-time-window", session.user_id),
            session,
            &body,
        )
        .await
    }
}
