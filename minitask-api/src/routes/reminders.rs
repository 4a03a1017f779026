/// Reminder endpoint
///
/// ```text
/// GET /reminders
/// ```
///
/// Returns visible tasks due within the next hour, soonest first:
///
/// ```json
/// { "reminders": [ { "id": 7, "title": "Call client", "due_date": "..." } ] }
/// ```
///
/// Completed tasks are included; the client decides how to show them.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Duration, Utc};
use minitask_shared::{auth::init_data::InitDataUser, models::task::Task};
use serde::Serialize;

/// How far ahead reminders look, in minutes
pub const REMINDER_WINDOW_MINUTES: i64 = 60;

#[derive(Debug, Serialize)]
pub struct RemindersResponse {
    pub reminders: Vec<Task>,
}

/// Closed window `[now, now + REMINDER_WINDOW_MINUTES]`
pub fn reminder_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (now, now + Duration::minutes(REMINDER_WINDOW_MINUTES))
}

pub async fn list_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<InitDataUser>,
) -> ApiResult<Json<RemindersResponse>> {
    let (from, to) = reminder_window(Utc::now());
    let reminders = Task::list_due_between(&state.db, user.id, from, to).await?;

    tracing::debug!(user_id = user.id, count = reminders.len(), "Reminders listed");

    Ok(Json(RemindersResponse { reminders }))
}
