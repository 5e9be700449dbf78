use crate::client::{Backend, LockStatus, ReflectionSubmission, TimeWindow, ValidationResult};
use crate::errors::ClientError;
use crate::reflection::{analyze, feedback, ReflectionAnalysis};
use crate::storage::Session;
use chrono::NaiveTime;
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAccess {
    pub can_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_available: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_at: Option<String>,
}

impl TaskAccess {
    fn granted() -> Self {
        Self {
            can_access: true,
            reason: None,
            message: None,
            next_available: None,
            available_at: None,
        }
    }

    fn denied(reason: Option<String>, message: Option<String>) -> Self {
        Self {
            can_access: false,
            reason,
            message,
            ..Self::granted()
        }
    }
}

/// Generation gate first, then the time window.
pub async fn can_access_today_task(backend: &dyn Backend, session: &Session) -> TaskAccess {
    let status = match backend.task_status(session).await {
        Ok(status) if status.success => status,
        Ok(status) => return TaskAccess::denied(Some("error".into()), status.error),
        Err(err) => {
            error!("task status check failed: {err}");
            return TaskAccess::denied(Some("error".into()), Some(err.to_string()));
        }
    };

    let gate = status.can_generate_task;
    if !gate.can_generate {
        return TaskAccess {
            next_available: gate.next_available,
            ..TaskAccess::denied(gate.reason, gate.message)
        };
    }

    let window = status.time_window;
    if !window.allowed {
        return TaskAccess {
            available_at: window.available_at,
            ..TaskAccess::denied(window.reason, window.message)
        };
    }

    TaskAccess::granted()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDecision {
    pub can_submit: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<ReflectionAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

/// Local pre-check, then the backend's verdict.
///
/// A local rejection never reaches the network.
pub async fn submit_reflection(
    backend: &dyn Backend,
    session: &Session,
    submission: &ReflectionSubmission,
) -> SubmissionDecision {
    let analysis = analyze(&submission.combined_text());
    let verdict = feedback(&analysis);
    if !verdict.can_continue {
        info!(words = analysis.word_count, "reflection held back by local check");
        return SubmissionDecision {
            can_submit: false,
            message: verdict.message,
            local: Some(analysis),
            validation: None,
        };
    }

    let response = match backend.validate_reflection(session, submission).await {
        Ok(response) if response.success => response,
        Ok(response) => {
            return SubmissionDecision {
                can_submit: false,
                message: "Validation failed".to_string(),
                local: Some(analysis),
                validation: Some(response.validation),
            };
        }
        Err(err) => {
            error!("reflection validation failed: {err}");
            return SubmissionDecision {
                can_submit: false,
                message: "Validation failed".to_string(),
                local: Some(analysis),
                validation: None,
            };
        }
    };

    let validation = response.validation;
    SubmissionDecision {
        can_submit: validation.can_submit,
        message: validation.message.clone().unwrap_or_default(),
        local: Some(analysis),
        validation: Some(validation),
    }
}

/// Title, message and call to action for a blocking screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub action: String,
}

fn notice(title: &str, message: impl Into<String>, action: &str) -> Notice {
    Notice {
        title: title.to_string(),
        message: message.into(),
        action: action.to_string(),
    }
}

/// `None` when the task is not locked.
pub fn lock_notice(lock: &LockStatus) -> Option<Notice> {
    if !lock.locked {
        return None;
    }
    Some(match lock.reason.as_deref() {
        Some("today_incomplete") => notice(
            "🔒 Task Locked",
            "Complete today's task to unlock tomorrow's challenge.",
            "Complete Today's Task",
        ),
        Some("reflection_incomplete") => notice(
            "🤔 Reflection Needed",
            "Complete today's reflection to unlock tomorrow's task.",
            "Complete Reflection",
        ),
        Some("too_early") => notice("⏰ Not Yet", "Tasks are available from 12:00 AM.", "Check Back Later"),
        Some("too_late") => notice(
            "😴 Window Closed",
            "Task window closed at 11:59 PM. Try again tomorrow!",
            "Try Tomorrow",
        ),
        _ => notice(
            "🔒 Task Unavailable",
            lock.message.clone().unwrap_or_default(),
            "Check Back Later",
        ),
    })
}

/// `None` inside the window.
pub fn time_window_notice(window: &TimeWindow, now: NaiveTime) -> Option<Notice> {
    if window.allowed {
        return None;
    }
    Some(match window.reason.as_deref() {
        Some("before_window") => notice(
            "⏰ Too Early",
            format!(
                "Tasks are available from 12:00 AM. Current time: {}",
                now.format("%-I:%M:%S %p")
            ),
            "Check Back Later",
        ),
        Some("after_window") => notice(
            "😴 Window Closed",
            "Task window closed at 11:59 PM. Available tomorrow at 12:00 AM",
            "Try Tomorrow",
        ),
        _ => notice(
            "⏰ Time Restricted",
            window.message.clone().unwrap_or_default(),
            "Check Back Later",
        ),
    })
}

pub async fn task_lock_notice(backend: &dyn Backend, session: &Session) -> Result<Option<Notice>, ClientError> {
    let lock = backend.lock_status(session).await?;
    Ok(lock_notice(&lock))
}

/// Asks the backend whether `action` may run now; a refusal becomes a notice.
pub async fn check_time_window(
    backend: &dyn Backend,
    session: &Session,
    action: &str,
    now: NaiveTime,
) -> Result<Option<Notice>, ClientError> {
    let check = backend.enforce_time_window(session, action).await?;
    let window = TimeWindow {
        allowed: check.success && check.allowed,
        reason: check.reason,
        message: check.message.or(check.error),
        available_at: None,
    };
    Ok(time_window_notice(&window, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::tests::{session, StubBackend};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    const THOUGHTFUL: &str = "I learned that short review sessions help because I feel less \
        overwhelmed when the material is split into clear pieces.";

    fn submission(learning: &str) -> ReflectionSubmission {
        ReflectionSubmission {
            learning: learning.to_string(),
            feeling: "Calmer than yesterday.".to_string(),
            improvement: String::new(),
            task_id: "task-7".to_string(),
        }
    }

    #[tokio::test]
    async fn open_gate_and_window_grant_access() {
        let backend = StubBackend {
            task_status: Some(json!({
                "success": true,
                "can_generate_task": { "can_generate": true },
                "time_window": { "allowed": true }
            })),
            ..StubBackend::default()
        };
        assert!(can_access_today_task(&backend, &session()).await.can_access);
    }

    #[tokio::test]
    async fn generation_gate_is_checked_before_window() {
        let backend = StubBackend {
            task_status: Some(json!({
                "success": true,
                "can_generate_task": {
                    "can_generate": false,
                    "reason": "today_incomplete",
                    "message": "Finish today first",
                    "next_available": "2026-01-06T00:00:00"
                },
                "time_window": { "allowed": false, "reason": "after_window" }
            })),
            ..StubBackend::default()
        };
        let access = can_access_today_task(&backend, &session()).await;
        assert!(!access.can_access);
        assert_eq!(access.reason.as_deref(), Some("today_incomplete"));
        assert_eq!(access.next_available.as_deref(), Some("2026-01-06T00:00:00"));
        assert_eq!(access.available_at, None);
    }

    #[tokio::test]
    async fn closed_window_denies_access() {
        let backend = StubBackend {
            task_status: Some(json!({
                "success": true,
                "can_generate_task": { "can_generate": true },
                "time_window": { "allowed": false, "reason": "before_window", "available_at": "00:00" }
            })),
            ..StubBackend::default()
        };
        let access = can_access_today_task(&backend, &session()).await;
        assert_eq!(access.reason.as_deref(), Some("before_window"));
        assert_eq!(access.available_at.as_deref(), Some("00:00"));
    }

    #[tokio::test]
    async fn unreachable_backend_denies_with_error_reason() {
        let access = can_access_today_task(&StubBackend::default(), &session()).await;
        assert!(!access.can_access);
        assert_eq!(access.reason.as_deref(), Some("error"));
    }

    #[tokio::test]
    async fn rushed_reflection_never_reaches_backend() {
        let backend = StubBackend::default();
        let decision = submit_reflection(&backend, &session(), &submission("ok")).await;
        assert!(!decision.can_submit);
        assert!(decision.message.starts_with("Please provide a more honest reflection"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn server_verdict_wins_after_local_pass() {
        let rejected = StubBackend {
            validation: Some(json!({
                "success": true,
                "validation": {
                    "can_submit": false,
                    "message": "Looks copied",
                    "issues": ["Matches a previous entry"],
                    "suggestions": ["Write about today"]
                }
            })),
            ..StubBackend::default()
        };
        let decision = submit_reflection(&rejected, &session(), &submission(THOUGHTFUL)).await;
        assert!(!decision.can_submit);
        assert_eq!(decision.message, "Looks copied");
        assert_eq!(
            decision.validation.unwrap().issues,
            vec!["Matches a previous entry".to_string()]
        );

        let accepted = StubBackend {
            validation: Some(json!({
                "success": true,
                "validation": { "can_submit": true, "message": "Great", "score": 8.5, "encouragement": "Keep going" }
            })),
            ..StubBackend::default()
        };
        let decision = submit_reflection(&accepted, &session(), &submission(THOUGHTFUL)).await;
        assert!(decision.can_submit);
        assert_eq!(decision.validation.unwrap().score, Some(8.5));
    }

    #[tokio::test]
    async fn failed_validation_call_blocks_submission() {
        let decision = submit_reflection(&StubBackend::default(), &session(), &submission(THOUGHTFUL)).await;
        assert!(!decision.can_submit);
        assert_eq!(decision.message, "Validation failed");
    }

    #[test]
    fn lock_notices_by_reason() {
        let unlocked = LockStatus::default();
        assert_eq!(lock_notice(&unlocked), None);

        let locked = LockStatus {
            locked: true,
            reason: Some("reflection_incomplete".into()),
            ..LockStatus::default()
        };
        assert_eq!(lock_notice(&locked).unwrap().action, "Complete Reflection");

        let custom = LockStatus {
            locked: true,
            reason: Some("maintenance".into()),
            message: Some("Back soon".into()),
            ..LockStatus::default()
        };
        let notice = lock_notice(&custom).unwrap();
        assert_eq!(notice.title, "🔒 Task Unavailable");
        assert_eq!(notice.message, "Back soon");
    }

    #[test]
    fn early_window_notice_shows_clock() {
        let window = TimeWindow {
            allowed: false,
            reason: Some("before_window".into()),
            ..TimeWindow::default()
        };
        let notice = time_window_notice(&window, NaiveTime::from_hms_opt(23, 5, 9).unwrap()).unwrap();
        assert_eq!(
            notice.message,
            "Tasks are available from 12:00 AM. Current time: 11:05:09 PM"
        );
        assert_eq!(
            time_window_notice(&TimeWindow { allowed: true, ..TimeWindow::default() }, NaiveTime::MIN),
            None
        );
    }

    #[tokio::test]
    async fn lock_status_becomes_notice() {
        let backend = StubBackend {
            lock: Some(json!({ "success": true, "locked": true, "reason": "today_incomplete" })),
            ..StubBackend::default()
        };
        let notice = task_lock_notice(&backend, &session()).await.unwrap().unwrap();
        assert_eq!(notice.action, "Complete Today's Task");

        let open = StubBackend {
            lock: Some(json!({ "success": true, "locked": false })),
            ..StubBackend::default()
        };
        assert_eq!(task_lock_notice(&open, &session()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn refused_time_window_uses_backend_reason() {
        let backend = StubBackend {
            window: Some(json!({ "success": true, "allowed": false, "reason": "after_window" })),
            ..StubBackend::default()
        };
        let notice = check_time_window(&backend, &session(), "submit_reflection", NaiveTime::MIN)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notice.title, "😴 Window Closed");

        let failed = StubBackend {
            window: Some(json!({ "success": false, "allowed": true, "error": "Rules unavailable" })),
            ..StubBackend::default()
        };
        let notice = check_time_window(&failed, &session(), "generate_task", NaiveTime::MIN)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notice.message, "Rules unavailable");
    }

    #[tokio::test]
    async fn time_window_transport_failure_is_an_error() {
        let backend = StubBackend::default();
        assert!(check_time_window(&backend, &session(), "generate_task", NaiveTime::MIN)
            .await
            .is_err());
    }
}
