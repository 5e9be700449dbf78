use crate::client::{Backend, StatusAction, StatusResult};
use crate::errors::StoreError;
use crate::storage::{clear_session, load_session, ProfileStore, Session};
use serde::Serialize;
use tracing::{error, info, warn};

const CONNECTIVITY_MESSAGE: &str = "Unable to connect to server";
const GENERIC_ERROR: &str = "Something went wrong";
const TASK_GENERATION_FAILED: &str = "Failed to generate task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Login,
    AiConversation,
    Tasks,
    DailyReflection,
    Dashboard,
}

impl Page {
    pub fn path(self) -> &'static str {
        match self {
            Page::Login => "/login",
            Page::AiConversation => "/ai-conversation",
            Page::Tasks => "/tasks",
            Page::DailyReflection => "/daily-reflection",
            Page::Dashboard => "/dashboard",
        }
    }
}

/// Where the client goes after a status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Navigation {
    Redirect { page: Page },
    PauseScreen { message: String, missed_days: u64 },
    ErrorPage { message: String },
}

impl Navigation {
    fn to(page: Page) -> Self {
        Navigation::Redirect { page }
    }

    fn error(message: impl Into<String>) -> Self {
        Navigation::ErrorPage {
            message: message.into(),
        }
    }
}

/// Checks today's status with the backend and picks the next screen.
///
/// Missing credentials never reach the network. Transport failures become an
/// error screen; nothing is retried.
pub async fn route_status(
    store: &dyn ProfileStore,
    backend: &dyn Backend,
    timezone: &str,
) -> Result<Navigation, StoreError> {
    let Some(session) = load_session(store).await? else {
        info!("no stored session, sending to login");
        clear_session(store).await?;
        return Ok(Navigation::to(Page::Login));
    };

    let status = match backend.daily_status(&session, timezone).await {
        Ok(status) => status,
        Err(err) => {
            error!("daily check failed: {err}");
            return Ok(Navigation::error(CONNECTIVITY_MESSAGE));
        }
    };

    if !status.success {
        if status.action() == StatusAction::RedirectToLogin {
            clear_session(store).await?;
        }
        return Ok(Navigation::to(Page::Login));
    }

    if let Err(err) = backend.mark_active(&session).await {
        warn!("mark active failed: {err}");
    }

    Ok(dispatch(backend, &session, status).await)
}

async fn dispatch(backend: &dyn Backend, session: &Session, status: StatusResult) -> Navigation {
    match status.action() {
        StatusAction::RedirectToLogin => Navigation::to(Page::Login),
        StatusAction::RedirectToAiConversation => Navigation::to(Page::AiConversation),
        StatusAction::ShowTodayTask if status.needs_task_generation() => generate_today(backend, session).await,
        StatusAction::ShowTodayTask => Navigation::to(Page::Tasks),
        StatusAction::ShowReflectionPage => Navigation::to(Page::DailyReflection),
        StatusAction::ShowPauseScreen => Navigation::PauseScreen {
            missed_days: status.missed_days(),
            message: status.message.unwrap_or_default(),
        },
        StatusAction::ShowCompletionDashboard => Navigation::to(Page::Dashboard),
        StatusAction::ShowErrorPage => {
            Navigation::error(status.message.unwrap_or_else(|| GENERIC_ERROR.to_string()))
        }
        StatusAction::Unknown(action) => {
            warn!(%action, "unknown status action, falling back to dashboard");
            Navigation::to(Page::Dashboard)
        }
    }
}

async fn generate_today(backend: &dyn Backend, session: &Session) -> Navigation {
    match backend.todays_task(session).await {
        Ok(result) if result.success => Navigation::to(Page::Tasks),
        Ok(result) => Navigation::error(result.error.unwrap_or_else(|| GENERIC_ERROR.to_string())),
        Err(err) => {
            error!("task generation failed: {err}");
            Navigation::error(TASK_GENERATION_FAILED)
        }
    }
}
