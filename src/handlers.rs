use crate::client::{Backend, ReflectionSubmission};
use crate::errors::AppError;
use crate::journey::{final_feedback, FinalFeedback};
use crate::models::{date_key, parse_date_key, DayEntry, Mood, NotificationKind, Reflection};
use crate::notifications::{
    browser_notification, generate, smart_notification, streak_message, BrowserNotification, SmartNotification,
};
use crate::reflection::{analyze, feedback, micro_appreciation, ReflectionAnalysis, ReflectionFeedback};
use crate::router::{route_status, Navigation};
use crate::rules::{
    can_access_today_task, check_time_window, submit_reflection, task_lock_notice, Notice, SubmissionDecision,
    TaskAccess,
};
use crate::state::AppState;
use crate::stats::{analyze_consistency, current_streak, Consistency};
use crate::storage::{clear_session, load_session, load_user, save_session, save_user, Session};
use crate::tasks::{day_number, task_for_day};
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MoodQuery {
    pub mood: Option<String>,
    pub kind: Option<String>,
}

impl MoodQuery {
    fn mood(&self) -> Option<Mood> {
        self.mood.as_deref().and_then(Mood::parse)
    }
}

pub async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let navigation = resolve(&state).await?;
    Ok(match navigation {
        Navigation::Redirect { page } => Redirect::to(page.path()).into_response(),
        other => Json(other).into_response(),
    })
}

pub async fn get_route(State(state): State<AppState>) -> Result<Json<Navigation>, AppError> {
    Ok(Json(resolve(&state).await?))
}

async fn resolve(state: &AppState) -> Result<Navigation, AppError> {
    let navigation = route_status(state.store.as_ref(), state.backend.as_ref(), &state.timezone).await?;
    info!(?navigation, "routed daily status");
    Ok(navigation)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub token: String,
    pub user_id: String,
}

pub async fn post_session(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = payload.token.trim();
    let user_id = payload.user_id.trim();
    if token.is_empty() || user_id.is_empty() {
        return Err(AppError::bad_request("token and user_id are required"));
    }

    let session = Session {
        token: token.to_string(),
        user_id: user_id.to_string(),
    };
    save_session(state.store.as_ref(), &session).await?;
    Ok(Json(serde_json::json!({ "userId": session.user_id })))
}

pub async fn delete_session(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    clear_session(state.store.as_ref()).await?;
    Ok(Json(serde_json::json!({ "cleared": true })))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRequest {
    pub date: Option<String>,
    pub mood: Option<String>,
    pub task_completed: Option<bool>,
    pub reflection_completed: Option<bool>,
    pub reflection: Option<Reflection>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub date: String,
    pub entry: DayEntry,
    pub current_streak: u32,
    pub appreciation: Option<String>,
}

pub async fn record_progress(
    State(state): State<AppState>,
    Json(payload): Json<ProgressRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    let today = today();
    let date = match payload.date.as_deref() {
        Some(raw) => parse_date_key(raw).ok_or_else(|| AppError::bad_request("date must be YYYY-MM-DD"))?,
        None => today,
    };
    let mood = match payload.mood.as_deref() {
        Some(raw) => Some(Mood::parse(raw).ok_or_else(|| AppError::bad_request("mood must be low, okay or good"))?),
        None => None,
    };

    let mut record = load_user(state.store.as_ref()).await?;
    let (entry, finished) = {
        let entry = record.daily_progress.entry(date_key(date)).or_default();
        let was_done = entry.task_completed || entry.reflection_completed;
        if mood.is_some() {
            entry.mood = mood;
        }
        if let Some(done) = payload.task_completed {
            entry.task_completed = done;
        }
        if let Some(done) = payload.reflection_completed {
            entry.reflection_completed = done;
        }
        if let Some(reflection) = payload.reflection {
            entry.reflection = Some(reflection);
        }
        let finished = !was_done && (entry.task_completed || entry.reflection_completed);
        (entry.clone(), finished)
    };

    save_user(state.store.as_ref(), &record).await?;

    let appreciation = finished.then(|| micro_appreciation(entry.mood, &mut StdRng::from_entropy()));
    Ok(Json(ProgressResponse {
        date: date_key(date),
        current_streak: current_streak(&record.daily_progress, today),
        entry,
        appreciation,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub kind: NotificationKind,
    pub message: Option<String>,
    pub notification: Option<BrowserNotification>,
}

pub async fn get_notification(
    State(state): State<AppState>,
    Query(query): Query<MoodQuery>,
) -> Result<Json<NotificationResponse>, AppError> {
    let kind = match query.kind.as_deref() {
        None | Some("daily") => NotificationKind::Daily,
        Some("missed") => NotificationKind::Missed,
        Some(_) => return Err(AppError::bad_request("kind must be 'daily' or 'missed'")),
    };

    let record = load_user(state.store.as_ref()).await?;
    let today = today();
    let mood = query.mood().or_else(|| record.mood_on(today));
    let message = generate(kind, &record, today, mood, &mut StdRng::from_entropy());
    let notification = message
        .as_deref()
        .map(|message| browser_notification(kind, message));

    Ok(Json(NotificationResponse {
        kind,
        message,
        notification,
    }))
}

pub async fn post_smart_notification(
    State(state): State<AppState>,
) -> Result<Json<Option<SmartNotification>>, AppError> {
    let record = load_user(state.store.as_ref()).await?;
    let (record, smart) = smart_notification(record, today(), &mut StdRng::from_entropy());
    if smart.is_some() {
        save_user(state.store.as_ref(), &record).await?;
    }
    Ok(Json(smart))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis: ReflectionAnalysis,
    pub feedback: ReflectionFeedback,
}

pub async fn analyze_reflection(Json(payload): Json<AnalyzeRequest>) -> Json<AnalyzeResponse> {
    let analysis = analyze(&payload.text);
    let feedback = feedback(&analysis);
    Json(AnalyzeResponse { analysis, feedback })
}

pub async fn post_reflection(
    State(state): State<AppState>,
    Json(payload): Json<ReflectionSubmission>,
) -> Result<Json<SubmissionDecision>, AppError> {
    let session = require_session(&state).await?;
    Ok(Json(
        submit_reflection(state.backend.as_ref(), &session, &payload).await,
    ))
}

pub async fn get_appreciation(Query(query): Query<MoodQuery>) -> Json<serde_json::Value> {
    let message = micro_appreciation(query.mood(), &mut StdRng::from_entropy());
    Json(serde_json::json!({ "message": message }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayTaskResponse {
    pub day_number: i64,
    pub task: String,
}

pub async fn get_today_task(
    State(state): State<AppState>,
    Query(query): Query<MoodQuery>,
) -> Result<Json<TodayTaskResponse>, AppError> {
    let record = load_user(state.store.as_ref()).await?;
    let today = today();
    let day = day_number(&record, today);
    let mood = query.mood().or_else(|| record.mood_on(today));
    let (record, task) = task_for_day(record, day, mood, &mut StdRng::from_entropy());
    save_user(state.store.as_ref(), &record).await?;

    Ok(Json(TodayTaskResponse { day_number: day, task }))
}

pub async fn get_task_access(State(state): State<AppState>) -> Result<Json<TaskAccess>, AppError> {
    let session = require_session(&state).await?;
    Ok(Json(
        can_access_today_task(state.backend.as_ref(), &session).await,
    ))
}

pub async fn get_task_lock(State(state): State<AppState>) -> Result<Json<Option<Notice>>, AppError> {
    let session = require_session(&state).await?;
    Ok(Json(task_lock_notice(state.backend.as_ref(), &session).await?))
}

#[derive(Debug, Deserialize)]
pub struct TimeWindowRequest {
    pub action: String,
}

pub async fn post_time_window(
    State(state): State<AppState>,
    Json(payload): Json<TimeWindowRequest>,
) -> Result<Json<Option<Notice>>, AppError> {
    let session = require_session(&state).await?;
    let now = Local::now().time();
    Ok(Json(
        check_time_window(state.backend.as_ref(), &session, &payload.action, now).await?,
    ))
}

pub async fn get_next_task(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let session = require_session(&state).await?;
    Ok(Json(state.backend.next_available_task(&session).await?))
}

pub async fn get_next_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let session = require_session(&state).await?;
    Ok(Json(state.backend.next_available(&session).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakResponse {
    pub current_streak: u32,
    pub consistency: Consistency,
    pub message: String,
}

pub async fn get_streak(State(state): State<AppState>) -> Result<Json<StreakResponse>, AppError> {
    let record = load_user(state.store.as_ref()).await?;
    let today = today();
    Ok(Json(StreakResponse {
        current_streak: current_streak(&record.daily_progress, today),
        consistency: analyze_consistency(&record.daily_progress, today),
        message: streak_message(&record, today),
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct JourneyQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyResponse {
    pub feedback: FinalFeedback,
    pub text: String,
}

pub async fn get_journey_feedback(
    State(state): State<AppState>,
    Query(query): Query<JourneyQuery>,
) -> Result<Json<JourneyResponse>, AppError> {
    let record = load_user(state.store.as_ref()).await?;
    let days = query.days.or(record.journey_duration).unwrap_or(30);
    let feedback = final_feedback(&record, days, today());
    Ok(Json(JourneyResponse {
        text: feedback.to_string(),
        feedback,
    }))
}

async fn require_session(state: &AppState) -> Result<Session, AppError> {
    load_session(state.store.as_ref())
        .await?
        .ok_or_else(|| AppError::unauthorized("Please login to continue"))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
