use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/route", get(handlers::get_route))
        .route("/api/session", post(handlers::post_session).delete(handlers::delete_session))
        .route("/api/progress", post(handlers::record_progress))
        .route("/api/notification", get(handlers::get_notification))
        .route("/api/notification/smart", post(handlers::post_smart_notification))
        .route("/api/reflection/analyze", post(handlers::analyze_reflection))
        .route("/api/reflection/submit", post(handlers::post_reflection))
        .route("/api/appreciation", get(handlers::get_appreciation))
        .route("/api/task/today", get(handlers::get_today_task))
        .route("/api/task/access", get(handlers::get_task_access))
        .route("/api/task/lock", get(handlers::get_task_lock))
        .route("/api/task/time-window", post(handlers::post_time_window))
        .route("/api/task/next-available", get(handlers::get_next_task))
        .route("/api/daily-check/next-available", get(handlers::get_next_check))
        .route("/api/streak", get(handlers::get_streak))
        .route("/api/journey/feedback", get(handlers::get_journey_feedback))
        .with_state(state)
}
